//! Hierarchy view controller
//!
//! Owns the query cache, the expansion state and the version-menu selections
//! for one project view. Collections are fetched concurrently and
//! independently into the cache; the tree is rebuilt from whatever is cached
//! each time it is asked for, so a failed collection leaves the rest usable.
//! Writes go straight to the API and, only when they succeed, invalidate the
//! affected collections and reload.

use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use vfxtrack_client::{ApiError, PipelineApi};
use vfxtrack_pipeline::{
    Department, ExpansionState, HierarchyInputs, InternalVersion, NewTask, NodeClass, Package,
    Project, ProjectHierarchy, Sequence, Shot, Task, TaskFilter, UpdateTask, User, Version,
};

use crate::cache::{Collection, QueryCache, QueryKey};
use crate::rows::{self, Row};

#[derive(Error, Debug)]
pub enum ViewError {
    /// The API call failed; the error is passed through as returned
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Domain(#[from] vfxtrack_common::Error),
}

impl ViewError {
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            ViewError::Api(e) => Some(e),
            ViewError::Domain(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewError>;

/// Versions fetched for one task, not yet applied to the view
#[derive(Debug, Clone, PartialEq)]
pub struct VersionsFetched {
    pub task_id: i64,
    pub versions: Vec<Version>,
}

/// Internal versions fetched for one version, not yet applied to the view
#[derive(Debug, Clone, PartialEq)]
pub struct InternalVersionsFetched {
    pub version_id: i64,
    pub internal_versions: Vec<InternalVersion>,
}

fn versions_key(task_id: i64) -> QueryKey {
    QueryKey::new(Collection::Versions).param("task_id", task_id)
}

fn internal_versions_key(version_id: i64) -> QueryKey {
    QueryKey::new(Collection::InternalVersions).param("version_id", version_id)
}

async fn fetch_if<T, F>(needed: bool, fetch: F) -> std::result::Result<Option<Vec<T>>, ApiError>
where
    F: Future<Output = std::result::Result<Vec<T>, ApiError>>,
{
    if needed {
        fetch.await.map(Some)
    } else {
        Ok(None)
    }
}

/// Cached, expandable task tree for one project, backed by a [`PipelineApi`]
pub struct HierarchyView<A: PipelineApi + ?Sized = dyn PipelineApi> {
    api: Arc<A>,
    cache: QueryCache,
    expansion: ExpansionState,
    project_id: Option<i64>,
    filter: TaskFilter,
    version_menu: Option<i64>,
    internal_version_menu: Option<i64>,
}

impl<A: PipelineApi + ?Sized + 'static> HierarchyView<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            cache: QueryCache::new(),
            expansion: ExpansionState::new(),
            project_id: None,
            filter: TaskFilter::all(),
            version_menu: None,
            internal_version_menu: None,
        }
    }

    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub fn project_id(&self) -> Option<i64> {
        self.project_id
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn expansion(&self) -> &ExpansionState {
        &self.expansion
    }

    fn sequences_key(&self) -> QueryKey {
        match self.project_id {
            Some(id) => QueryKey::new(Collection::Sequences).param("project_id", id),
            None => QueryKey::new(Collection::Sequences),
        }
    }

    fn tasks_key(&self) -> QueryKey {
        QueryKey::with_params(Collection::Tasks, self.filter.query_params())
    }

    fn cached<T: DeserializeOwned>(&self, key: &QueryKey) -> Vec<T> {
        self.cache.get(key).unwrap_or_default()
    }

    /// Cache one fetch result. A failure is logged and kept in `failed` (first
    /// one wins) without touching what other collections stored.
    fn store<T: Serialize>(
        &mut self,
        key: QueryKey,
        fetched: std::result::Result<Option<Vec<T>>, ApiError>,
        failed: &mut Option<ViewError>,
    ) -> usize {
        let stored = match fetched {
            Ok(Some(rows)) => self.cache.insert(key.clone(), &rows).map_err(ViewError::from),
            Ok(None) => return 0,
            Err(e) => Err(ViewError::from(e)),
        };
        match stored {
            Ok(()) => 1,
            Err(e) => {
                tracing::warn!(query = %key, error = %e, "Collection fetch failed");
                failed.get_or_insert(e);
                0
            }
        }
    }

    /// Switch to another project. Sequence entries of the previous project are
    /// dropped and every node starts collapsed again.
    pub fn select_project(&mut self, project_id: i64) {
        if self.project_id == Some(project_id) {
            return;
        }
        let dropped = self
            .cache
            .remove_where(|key| key.collection == Collection::Sequences);
        self.project_id = Some(project_id);
        self.expansion = ExpansionState::new();
        self.version_menu = None;
        self.internal_version_menu = None;
        tracing::info!(project_id, dropped, "Project selected");
    }

    /// Change the task filter; the next `load` fetches the matching task list
    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
    }

    /// Fetch every collection that is missing or stale, concurrently.
    ///
    /// Fresh entries are not refetched. Every collection whose request
    /// succeeded is cached even when others fail; the first failure is
    /// returned afterwards. Open version menus are loaded as well.
    pub async fn load(&mut self) -> Result<()> {
        let projects_key = QueryKey::new(Collection::Projects);
        let sequences_key = self.sequences_key();
        let packages_key = QueryKey::new(Collection::Packages);
        let shots_key = QueryKey::new(Collection::Shots);
        let departments_key = QueryKey::new(Collection::Departments);
        let tasks_key = self.tasks_key();
        let users_key = QueryKey::new(Collection::Users);

        let api = &*self.api;
        let cache = &self.cache;
        let filter = self.filter;
        let (projects, sequences, packages, shots, departments, tasks, users) = tokio::join!(
            fetch_if(!cache.is_fresh(&projects_key), api.list_projects()),
            fetch_if(
                !cache.is_fresh(&sequences_key),
                api.list_sequences(self.project_id)
            ),
            fetch_if(!cache.is_fresh(&packages_key), api.list_packages(None)),
            fetch_if(!cache.is_fresh(&shots_key), api.list_shots(None)),
            fetch_if(!cache.is_fresh(&departments_key), api.list_departments()),
            fetch_if(!cache.is_fresh(&tasks_key), api.list_tasks(&filter)),
            fetch_if(!cache.is_fresh(&users_key), api.list_users()),
        );

        let mut failed = None;
        let fetched = self.store(projects_key, projects, &mut failed)
            + self.store(sequences_key, sequences, &mut failed)
            + self.store(packages_key, packages, &mut failed)
            + self.store(shots_key, shots, &mut failed)
            + self.store(departments_key, departments, &mut failed)
            + self.store(tasks_key, tasks, &mut failed)
            + self.store(users_key, users, &mut failed);
        tracing::debug!(
            project_id = ?self.project_id,
            count = fetched,
            failed = failed.is_some(),
            "Collections loaded"
        );

        if self.version_menu.is_some() {
            if let Err(e) = self.load_versions().await {
                failed.get_or_insert(e);
            }
        }
        if self.internal_version_menu.is_some() {
            if let Err(e) = self.load_internal_versions().await {
                failed.get_or_insert(e);
            }
        }
        match failed {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn projects(&self) -> Vec<Project> {
        self.cached(&QueryKey::new(Collection::Projects))
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.cached(&self.tasks_key())
    }

    /// Build the tree from the cached collections; anything not loaded yet
    /// counts as empty
    pub fn hierarchy(&self) -> ProjectHierarchy {
        let mut sequences: Vec<Sequence> = self.cached(&self.sequences_key());
        if let Some(project_id) = self.project_id {
            sequences.retain(|s| s.project_id == project_id);
        }
        let packages: Vec<Package> = self.cached(&QueryKey::new(Collection::Packages));
        let shots: Vec<Shot> = self.cached(&QueryKey::new(Collection::Shots));
        let departments: Vec<Department> = self.cached(&QueryKey::new(Collection::Departments));
        let tasks = self.tasks();

        ProjectHierarchy::build(&HierarchyInputs {
            sequences: &sequences,
            packages: &packages,
            shots: &shots,
            departments: &departments,
            tasks: &tasks,
        })
    }

    /// Rows currently visible under the expansion state
    pub fn rows(&self) -> Vec<Row> {
        rows::visible_rows(&self.hierarchy(), &self.expansion)
    }

    /// Flip one node; returns whether it is now expanded
    pub fn toggle(&mut self, class: NodeClass, id: i64) -> bool {
        self.expansion = self.expansion.toggle(class, id);
        self.expansion.is_expanded(class, id)
    }

    pub fn is_expanded(&self, class: NodeClass, id: i64) -> bool {
        self.expansion.is_expanded(class, id)
    }

    pub fn expand_all(&mut self) {
        self.expansion = rows::expand_all(&self.hierarchy(), &self.expansion);
    }

    pub fn collapse_all(&mut self) {
        self.expansion = self.expansion.collapse_all();
    }

    pub fn open_version_menu(&mut self, task_id: i64) {
        self.version_menu = Some(task_id);
    }

    pub fn close_version_menu(&mut self) {
        self.version_menu = None;
    }

    /// Task whose version menu is open
    pub fn version_menu(&self) -> Option<i64> {
        self.version_menu
    }

    /// Detached fetch of the selected task's versions.
    ///
    /// The future does not borrow the view, so the selection may change while
    /// it runs; hand the result to [`Self::apply_versions`].
    pub fn versions_fetch(
        &self,
    ) -> Option<impl Future<Output = std::result::Result<VersionsFetched, ApiError>> + Send + 'static>
    {
        let task_id = self.version_menu?;
        let api = Arc::clone(&self.api);
        Some(async move {
            let versions = api.list_versions(task_id).await?;
            Ok(VersionsFetched { task_id, versions })
        })
    }

    /// Cache fetched versions if their task is still the selected one.
    /// Returns `false` when the result was discarded as stale.
    pub fn apply_versions(&mut self, fetched: VersionsFetched) -> Result<bool> {
        if self.version_menu != Some(fetched.task_id) {
            tracing::debug!(
                task_id = fetched.task_id,
                selected = ?self.version_menu,
                "Discarding versions for a task that is no longer selected"
            );
            return Ok(false);
        }
        self.cache
            .insert(versions_key(fetched.task_id), &fetched.versions)?;
        Ok(true)
    }

    /// Fetch the selected task's versions unless they are cached and fresh.
    /// Returns the versions of the selected task (empty when the menu is closed).
    pub async fn load_versions(&mut self) -> Result<Vec<Version>> {
        if let Some(task_id) = self.version_menu {
            if !self.cache.is_fresh(&versions_key(task_id)) {
                if let Some(fetch) = self.versions_fetch() {
                    let fetched = fetch.await?;
                    self.apply_versions(fetched)?;
                }
            }
        }
        Ok(self.versions())
    }

    /// Cached versions of the selected task
    pub fn versions(&self) -> Vec<Version> {
        self.version_menu
            .map(|task_id| self.cached(&versions_key(task_id)))
            .unwrap_or_default()
    }

    pub fn open_internal_version_menu(&mut self, version_id: i64) {
        self.internal_version_menu = Some(version_id);
    }

    pub fn close_internal_version_menu(&mut self) {
        self.internal_version_menu = None;
    }

    pub fn internal_version_menu(&self) -> Option<i64> {
        self.internal_version_menu
    }

    /// Detached fetch of the selected version's internal versions; the
    /// counterpart of [`Self::versions_fetch`]
    pub fn internal_versions_fetch(
        &self,
    ) -> Option<
        impl Future<Output = std::result::Result<InternalVersionsFetched, ApiError>> + Send + 'static,
    > {
        let version_id = self.internal_version_menu?;
        let api = Arc::clone(&self.api);
        Some(async move {
            let internal_versions = api.list_internal_versions(version_id).await?;
            Ok(InternalVersionsFetched {
                version_id,
                internal_versions,
            })
        })
    }

    /// Cache fetched internal versions if their version is still selected.
    /// Returns `false` when the result was discarded as stale.
    pub fn apply_internal_versions(&mut self, fetched: InternalVersionsFetched) -> Result<bool> {
        if self.internal_version_menu != Some(fetched.version_id) {
            tracing::debug!(
                version_id = fetched.version_id,
                selected = ?self.internal_version_menu,
                "Discarding internal versions for a version that is no longer selected"
            );
            return Ok(false);
        }
        self.cache.insert(
            internal_versions_key(fetched.version_id),
            &fetched.internal_versions,
        )?;
        Ok(true)
    }

    /// Fetch the selected version's internal versions unless cached and fresh
    pub async fn load_internal_versions(&mut self) -> Result<Vec<InternalVersion>> {
        if let Some(version_id) = self.internal_version_menu {
            if !self.cache.is_fresh(&internal_versions_key(version_id)) {
                if let Some(fetch) = self.internal_versions_fetch() {
                    let fetched = fetch.await?;
                    self.apply_internal_versions(fetched)?;
                }
            }
        }
        Ok(self.internal_versions())
    }

    /// Cached internal versions of the selected version
    pub fn internal_versions(&self) -> Vec<InternalVersion> {
        self.internal_version_menu
            .map(|version_id| self.cached(&internal_versions_key(version_id)))
            .unwrap_or_default()
    }

    /// Label for the task's version button, from whatever versions of that
    /// task are cached
    pub fn current_internal_version_label(&self, task: &Task) -> String {
        let versions: Vec<Version> = self.cached(&versions_key(task.id));
        vfxtrack_pipeline::current_internal_version_label(task, &versions).to_string()
    }

    pub fn assignee_name(&self, task: &Task) -> Option<String> {
        let assignee_id = task.assignee_id?;
        let users: Vec<User> = self.cached(&QueryKey::new(Collection::Users));
        users
            .iter()
            .find(|u| u.id == assignee_id)
            .map(|u| u.display_name().to_string())
    }

    /// Reload after a successful write. A failed reload leaves the entries
    /// stale, so the next `load` retries them.
    async fn refresh(&mut self) {
        if let Err(e) = self.load().await {
            tracing::warn!(error = %e, "Reload after write failed");
        }
    }

    /// Validate the update, send it, reload tasks
    pub async fn update_task(&mut self, task_id: i64, update: UpdateTask) -> Result<Task> {
        let update = update.validated()?;
        let updated = self.api.update_task(task_id, &update).await?;
        self.cache.invalidate(Collection::Tasks);
        self.refresh().await;
        Ok(updated)
    }

    pub async fn create_version(&mut self, task_id: i64) -> Result<Version> {
        let created = self.api.create_version(task_id).await?;
        self.cache.invalidate(Collection::Tasks);
        self.cache.invalidate(Collection::Versions);
        self.refresh().await;
        Ok(created)
    }

    pub async fn create_internal_version(&mut self, version_id: i64) -> Result<InternalVersion> {
        let created = self.api.create_internal_version(version_id).await?;
        self.cache.invalidate(Collection::Tasks);
        self.cache.invalidate(Collection::Versions);
        self.cache.invalidate(Collection::InternalVersions);
        self.refresh().await;
        Ok(created)
    }

    /// Validate the draft, create the task with its initial version, reload tasks
    pub async fn create_task(&mut self, draft: NewTask) -> Result<Task> {
        let draft = draft.validated()?;
        let created = self.api.create_task(&draft).await?;
        self.cache.invalidate(Collection::Tasks);
        self.refresh().await;
        Ok(created)
    }
}
