//! Current-version lookups for the task rows

use regex::Regex;

use crate::domain::entities::{Task, Version};

/// Shown when a task's current version has no internal versions yet
pub const DEFAULT_INTERNAL_VERSION_LABEL: &str = "E001";

lazy_static::lazy_static! {
    /// Client version labels: `v` followed by at least three digits
    pub static ref VERSION_LABEL_REGEX: Regex = Regex::new(r"^v\d{3,}$").unwrap();

    /// Internal version labels: `E` followed by at least three digits
    pub static ref INTERNAL_VERSION_LABEL_REGEX: Regex = Regex::new(r"^E\d{3,}$").unwrap();
}

pub fn is_version_label(label: &str) -> bool {
    VERSION_LABEL_REGEX.is_match(label)
}

pub fn is_internal_version_label(label: &str) -> bool {
    INTERNAL_VERSION_LABEL_REGEX.is_match(label)
}

/// The fetched version matching `task.current_version`.
///
/// Exact label match; with duplicates the first one in input order wins.
pub fn find_current_version<'a>(task: &Task, versions: &'a [Version]) -> Option<&'a Version> {
    versions
        .iter()
        .find(|v| v.version_number == task.current_version)
}

/// Label of the latest internal version of the task's current version.
///
/// "Latest" is the last element as returned by the API; labels are not
/// compared. Falls back to [`DEFAULT_INTERNAL_VERSION_LABEL`] when the version
/// is not among `versions`, or its internal versions are absent or empty.
pub fn current_internal_version_label<'a>(task: &Task, versions: &'a [Version]) -> &'a str {
    find_current_version(task, versions)
        .and_then(|version| version.internal_versions.as_deref())
        .and_then(|internal| internal.last())
        .map(|latest| latest.internal_version_number.as_str())
        .unwrap_or(DEFAULT_INTERNAL_VERSION_LABEL)
}
