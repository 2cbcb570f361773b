//! Query cache for fetched collections
//!
//! Entries are keyed by collection plus request parameters and hold the
//! fetched rows as JSON. Invalidation marks entries stale instead of
//! dropping them, so the last known data stays readable until a refetch
//! replaces it.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use vfxtrack_common::Result;

/// Collections the view fetches from the pipeline API
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Collection {
    Projects,
    Sequences,
    Packages,
    Shots,
    Departments,
    Tasks,
    Users,
    Versions,
    InternalVersions,
}

impl Collection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Sequences => "sequences",
            Collection::Packages => "packages",
            Collection::Shots => "shots",
            Collection::Departments => "departments",
            Collection::Tasks => "tasks",
            Collection::Users => "users",
            Collection::Versions => "versions",
            Collection::InternalVersions => "internal_versions",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache key: a collection and the parameters it was requested with
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryKey {
    pub collection: Collection,
    pub params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new(collection: Collection) -> Self {
        Self {
            collection,
            params: Vec::new(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((name.into(), value.to_string()));
        self
    }

    pub fn with_params<'a>(
        collection: Collection,
        params: impl IntoIterator<Item = (&'a str, String)>,
    ) -> Self {
        params
            .into_iter()
            .fold(Self::new(collection), |key, (name, value)| key.param(name, value))
    }

    /// Value of a named parameter, if the key carries it
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.collection)?;
        for (i, (name, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            write!(f, "{sep}{name}={value}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    fetched_at: DateTime<Utc>,
    stale: bool,
}

#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    entries: BTreeMap<QueryKey, CacheEntry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value for `key`, stale or not. `None` when absent or when the
    /// stored rows do not decode as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
        let entry = self.entries.get(key)?;
        match serde_json::from_value(entry.value.clone()) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(key = %key, error = %e, "Cached entry has unexpected shape");
                None
            }
        }
    }

    /// Store a fresh value, replacing any previous entry
    pub fn insert<T: Serialize>(&mut self, key: QueryKey, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        tracing::debug!(key = %key, "Cache entry stored");
        self.entries.insert(
            key,
            CacheEntry {
                value,
                fetched_at: Utc::now(),
                stale: false,
            },
        );
        Ok(())
    }

    /// Mark every entry of `collection` stale. Returns how many were marked.
    pub fn invalidate(&mut self, collection: Collection) -> usize {
        let mut marked = 0;
        for (_, entry) in self
            .entries
            .iter_mut()
            .filter(|(key, _)| key.collection == collection)
        {
            entry.stale = true;
            marked += 1;
        }
        tracing::debug!(collection = %collection, count = marked, "Cache invalidated");
        marked
    }

    /// Drop entries whose key matches `predicate`. Returns how many were dropped.
    pub fn remove_where(&mut self, predicate: impl Fn(&QueryKey) -> bool) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !predicate(key));
        before - self.entries.len()
    }

    pub fn stale_keys(&self) -> Vec<QueryKey> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.stale)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Present and not invalidated since it was stored
    pub fn is_fresh(&self, key: &QueryKey) -> bool {
        self.entries.get(key).is_some_and(|entry| !entry.stale)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn fetched_at(&self, key: &QueryKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).map(|entry| entry.fetched_at)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
