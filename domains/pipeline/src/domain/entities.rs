//! Domain entities for the pipeline
//!
//! Each entity mirrors the JSON shape returned by the pipeline REST API.
//! Identifiers are opaque integers, unique within their own collection.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use vfxtrack_common::Result;

/// Label given to the first version of every task
pub const INITIAL_VERSION_LABEL: &str = "v001";

/// Default department swatch color
pub const DEFAULT_DEPARTMENT_COLOR: &str = "#3498db";

fn default_active() -> String {
    "active".to_string()
}

fn default_version_label() -> String {
    INITIAL_VERSION_LABEL.to_string()
}

fn default_department_color() -> String {
    DEFAULT_DEPARTMENT_COLOR.to_string()
}

fn default_version_status() -> String {
    "work_in_progress".to_string()
}

fn default_role() -> String {
    "artist".to_string()
}

fn default_true() -> bool {
    true
}

/// Accepts `YYYY-MM-DD` or any ISO-8601 datetime and keeps the date part.
mod lenient_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => {
                let date_part = value.get(..10).unwrap_or(value);
                NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
                    .map(Some)
                    .map_err(|e| serde::de::Error::custom(format!("invalid date '{value}': {e}")))
            }
        }
    }
}

// ============================================================================
// Enums
// ============================================================================

/// Task workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    NotStarted,
    InProgress,
    PendingReview,
    Approved,
    Retake,
    Final,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 6] = [
        TaskStatus::NotStarted,
        TaskStatus::InProgress,
        TaskStatus::PendingReview,
        TaskStatus::Approved,
        TaskStatus::Retake,
        TaskStatus::Final,
    ];

    /// Wire value, as used in query strings
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not_started",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::PendingReview => "pending_review",
            TaskStatus::Approved => "approved",
            TaskStatus::Retake => "retake",
            TaskStatus::Final => "final",
        }
    }

    /// Display label for status chips (`IN PROGRESS`)
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }

    /// Approved and final work no longer needs artist time
    pub fn is_signed_off(&self) -> bool {
        matches!(self, TaskStatus::Approved | TaskStatus::Final)
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task priority
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Entities
// ============================================================================

/// Project entity (tree root)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub status: String,
    #[serde(default)]
    pub start_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub end_date: Option<NaiveDateTime>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Sequence entity, owned by a project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sequence {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub project_id: i64,
}

/// Package entity: a grouping of shots within a sequence (e.g. `CS_010`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub sequence_id: i64,
    #[serde(default)]
    pub frame_start: Option<i64>,
    #[serde(default)]
    pub frame_end: Option<i64>,
}

/// Shot entity (e.g. `CS_010_0010`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shot {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub package_id: i64,
    #[serde(default = "default_active")]
    pub status: String,
    #[serde(default)]
    pub frame_start: Option<i64>,
    #[serde(default)]
    pub frame_end: Option<i64>,
}

impl Shot {
    /// Inclusive frame count, when both bounds are known and ordered
    pub fn frame_count(&self) -> Option<i64> {
        match (self.frame_start, self.frame_end) {
            (Some(start), Some(end)) if end >= start => Some(end - start + 1),
            _ => None,
        }
    }
}

/// Department: a work discipline (Roto, Comp, ...) from the shared catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Department {
    pub id: i64,
    pub name: String,
    pub code: String,
    #[serde(default = "default_department_color")]
    pub color: String,
    #[serde(default)]
    pub order: i32,
}

/// Task entity, placed under a (shot, department) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub shot_id: i64,
    pub department_id: i64,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    /// Denormalized label of the task's current client version
    #[serde(default = "default_version_label")]
    pub current_version: String,
    #[serde(default)]
    pub approved_bid_days: f64,
    #[serde(default)]
    pub actual_bid_days: f64,
    #[serde(default, deserialize_with = "lenient_date::deserialize")]
    pub eta_date: Option<NaiveDate>,
    #[serde(default)]
    pub assignee_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

/// Client-facing delivery iteration of a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    /// Label such as `v001`
    pub version_number: String,
    pub task_id: i64,
    #[serde(default = "default_version_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    /// `None` when the API did not embed internal versions in this response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_versions: Option<Vec<InternalVersion>>,
}

/// Internal review iteration of a version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalVersion {
    pub id: i64,
    /// Label such as `E001`
    pub internal_version_number: String,
    pub version_id: i64,
    #[serde(default = "default_version_status")]
    pub status: String,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

/// Studio user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub department_id: Option<i64>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl User {
    /// Full name when set, otherwise the username
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.username,
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// Request for creating a task together with its initial version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewTask {
    /// Task name (1-255 chars)
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub shot_id: i64,

    pub department_id: i64,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub assignee_id: Option<i64>,

    /// Approved bid in days (0-365)
    #[validate(range(min = 0.0, max = 365.0, message = "must be between 0 and 365 days"))]
    pub approved_bid_days: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_date: Option<NaiveDate>,
}

impl NewTask {
    /// Draft with the defaults the task dialog starts from
    pub fn new(name: impl Into<String>, shot_id: i64, department_id: i64) -> Self {
        Self {
            name: name.into(),
            description: None,
            shot_id,
            department_id,
            priority: Priority::Medium,
            assignee_id: None,
            approved_bid_days: 1.0,
            eta_date: None,
        }
    }

    /// Validate and return the trimmed request
    pub fn validated(mut self) -> Result<Self> {
        self.name = self.name.trim().to_string();
        self.validate()?;
        Ok(self)
    }
}

/// Partial task update; only the fields that are set are sent.
///
/// `assignee_id: Some(None)` clears the assignee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 255, message = "must be 1-255 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Option<i64>>,

    #[validate(range(min = 0.0, max = 365.0, message = "must be between 0 and 365 days"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_bid_days: Option<f64>,

    #[validate(range(min = 0.0, message = "must not be negative"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_bid_days: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta_date: Option<NaiveDate>,
}

impl UpdateTask {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn assignee(mut self, assignee_id: Option<i64>) -> Self {
        self.assignee_id = Some(assignee_id);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Validate and return the trimmed request. An update that sets nothing
    /// is rejected.
    pub fn validated(mut self) -> Result<Self> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
        if self.is_empty() {
            return Err(vfxtrack_common::Error::Validation(
                "update sets no fields".to_string(),
            ));
        }
        self.validate()?;
        Ok(self)
    }

    /// Apply the set fields to a task
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(name) = &self.name {
            task.name = name.clone();
        }
        if let Some(status) = self.status {
            task.status = status;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(assignee_id) = self.assignee_id {
            task.assignee_id = assignee_id;
        }
        if let Some(days) = self.approved_bid_days {
            task.approved_bid_days = days;
        }
        if let Some(days) = self.actual_bid_days {
            task.actual_bid_days = days;
        }
        if self.eta_date.is_some() {
            task.eta_date = self.eta_date;
        }
    }
}
