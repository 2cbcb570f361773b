//! Mock Pipeline API Implementation
//!
//! In-memory stand-in for the pipeline REST API:
//! - `MockPipelineApi`: serves a `MockDataset`, records every request
//! - `MockApiBehavior`: programmable read/write failures
//! - `demo_dataset()`: small seeded project for local runs

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use vfxtrack_pipeline::domain::entities::INITIAL_VERSION_LABEL;
use vfxtrack_pipeline::{
    Department, InternalVersion, NewTask, Package, Priority, Project, Sequence, Shot, Task,
    TaskFilter, TaskStatus, UpdateTask, User, Version,
};

use crate::{paths, ApiError, PipelineApi};

/// Rows served by the mock, one vector per collection
#[derive(Debug, Clone, Default)]
pub struct MockDataset {
    pub projects: Vec<Project>,
    pub sequences: Vec<Sequence>,
    pub packages: Vec<Package>,
    pub shots: Vec<Shot>,
    pub departments: Vec<Department>,
    pub tasks: Vec<Task>,
    pub users: Vec<User>,
    /// Stored without embedded internal versions; `list_versions` embeds them
    pub versions: Vec<Version>,
    pub internal_versions: Vec<InternalVersion>,
}

/// A failure the mock answers with instead of data
#[derive(Debug, Clone, PartialEq)]
pub struct MockFailure {
    pub status: u16,
    pub body: String,
}

impl MockFailure {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn to_error(&self) -> ApiError {
        ApiError::Response {
            status: self.status,
            body: self.body.clone(),
        }
    }
}

/// Programmable behavior for the mock API
#[derive(Debug, Clone, Default)]
pub struct MockApiBehavior {
    pub read_failure: Arc<RwLock<Option<MockFailure>>>,
    pub write_failure: Arc<RwLock<Option<MockFailure>>>,
    /// Per-path list failures, checked after `read_failure`
    pub path_failures: Arc<RwLock<HashMap<String, MockFailure>>>,
}

impl MockApiBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every list request fail (or succeed again with `None`)
    pub fn set_read_failure(&self, failure: Option<MockFailure>) {
        *self
            .read_failure
            .write()
            .expect("behavior lock poisoned: prior test panicked") = failure;
    }

    /// Make list requests to one path fail (or succeed again with `None`)
    pub fn set_path_failure(&self, path: impl Into<String>, failure: Option<MockFailure>) {
        let mut failures = self
            .path_failures
            .write()
            .expect("behavior lock poisoned: prior test panicked");
        let path = path.into();
        match failure {
            Some(f) => failures.insert(path, f),
            None => failures.remove(&path),
        };
    }

    /// Make every create or update request fail (or succeed again with `None`)
    pub fn set_write_failure(&self, failure: Option<MockFailure>) {
        *self
            .write_failure
            .write()
            .expect("behavior lock poisoned: prior test panicked") = failure;
    }

    /// Reset to default behavior
    pub fn reset(&self) {
        self.set_read_failure(None);
        self.set_write_failure(None);
        self.path_failures
            .write()
            .expect("behavior lock poisoned: prior test panicked")
            .clear();
    }

    fn check(slot: &RwLock<Option<MockFailure>>) -> Result<(), ApiError> {
        let failure = slot
            .read()
            .map_err(|e| ApiError::Request(format!("behavior lock poisoned: {e}")))?;
        match &*failure {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }

    fn check_read(&self, path: &str) -> Result<(), ApiError> {
        Self::check(&self.read_failure)?;
        let failures = self
            .path_failures
            .read()
            .map_err(|e| ApiError::Request(format!("behavior lock poisoned: {e}")))?;
        match failures.get(path) {
            Some(f) => Err(f.to_error()),
            None => Ok(()),
        }
    }

    fn check_write(&self) -> Result<(), ApiError> {
        Self::check(&self.write_failure)
    }
}

/// A recorded request for test assertions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub query: Vec<(&'static str, String)>,
}

impl RecordedRequest {
    /// `GET /api/tasks` style summary
    pub fn line(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Mock pipeline API backed by an in-memory dataset
#[derive(Debug, Clone, Default)]
pub struct MockPipelineApi {
    data: Arc<RwLock<MockDataset>>,
    behavior: Arc<MockApiBehavior>,
    history: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockPipelineApi {
    /// Empty mock: every list returns no rows
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_dataset(dataset: MockDataset) -> Self {
        Self {
            data: Arc::new(RwLock::new(dataset)),
            ..Self::default()
        }
    }

    /// Mock seeded with [`demo_dataset`]
    pub fn demo() -> Self {
        Self::with_dataset(demo_dataset())
    }

    /// Get the shared behavior for external configuration
    pub fn behavior(&self) -> &Arc<MockApiBehavior> {
        &self.behavior
    }

    /// Snapshot of the current rows
    pub fn dataset(&self) -> MockDataset {
        self.data
            .read()
            .expect("dataset lock poisoned: prior test panicked")
            .clone()
    }

    /// Replace rows in place (simulates another user editing data)
    pub fn update_dataset(&self, f: impl FnOnce(&mut MockDataset)) {
        let mut data = self
            .data
            .write()
            .expect("dataset lock poisoned: prior test panicked");
        f(&mut *data);
    }

    /// Get recorded requests
    pub fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.history
            .lock()
            .expect("history lock poisoned: prior test panicked")
            .clone()
    }

    /// Recorded requests as `METHOD path` lines
    pub fn request_lines(&self) -> Vec<String> {
        self.recorded_requests().iter().map(|r| r.line()).collect()
    }

    /// Clear history
    pub fn reset_history(&self) {
        self.history
            .lock()
            .expect("history lock poisoned: prior test panicked")
            .clear();
    }

    fn record(
        &self,
        method: &'static str,
        path: impl Into<String>,
        query: Vec<(&'static str, String)>,
    ) -> Result<(), ApiError> {
        let request = RecordedRequest {
            method,
            path: path.into(),
            query,
        };
        tracing::debug!(request = %request.line(), "Mock pipeline API: recording request");
        self.history
            .lock()
            .map_err(|e| ApiError::Request(format!("history lock poisoned: {e}")))?
            .push(request);
        Ok(())
    }

    fn read_data(&self) -> Result<RwLockReadGuard<'_, MockDataset>, ApiError> {
        self.data
            .read()
            .map_err(|e| ApiError::Request(format!("dataset lock poisoned: {e}")))
    }

    fn write_data(&self) -> Result<RwLockWriteGuard<'_, MockDataset>, ApiError> {
        self.data
            .write()
            .map_err(|e| ApiError::Request(format!("dataset lock poisoned: {e}")))
    }

    /// Record a list request, then serve it unless reads are failing
    fn list<T>(
        &self,
        path: impl Into<String>,
        query: Vec<(&'static str, String)>,
        select: impl Fn(&MockDataset) -> Vec<T>,
    ) -> Result<Vec<T>, ApiError> {
        let path = path.into();
        self.record("GET", path.clone(), query)?;
        self.behavior.check_read(&path)?;
        Ok(select(&*self.read_data()?))
    }

    fn before_write(&self, method: &'static str, path: impl Into<String>) -> Result<(), ApiError> {
        self.record(method, path, Vec::new())?;
        self.behavior.check_write()
    }
}

fn not_found(what: &str, id: i64) -> ApiError {
    ApiError::Response {
        status: 404,
        body: format!("{what} {id} not found"),
    }
}

fn next_id(ids: impl Iterator<Item = i64>) -> i64 {
    ids.max().unwrap_or(0) + 1
}

fn optional_param(name: &'static str, value: Option<i64>) -> Vec<(&'static str, String)> {
    value
        .map(|v| vec![(name, v.to_string())])
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl PipelineApi for MockPipelineApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.list(paths::PROJECTS, Vec::new(), |d| d.projects.clone())
    }

    async fn list_sequences(&self, project_id: Option<i64>) -> Result<Vec<Sequence>, ApiError> {
        self.list(
            paths::SEQUENCES,
            optional_param("project_id", project_id),
            |d| {
                d.sequences
                    .iter()
                    .filter(|s| project_id.is_none_or(|id| s.project_id == id))
                    .cloned()
                    .collect()
            },
        )
    }

    async fn list_packages(&self, sequence_id: Option<i64>) -> Result<Vec<Package>, ApiError> {
        self.list(
            paths::PACKAGES,
            optional_param("sequence_id", sequence_id),
            |d| {
                d.packages
                    .iter()
                    .filter(|p| sequence_id.is_none_or(|id| p.sequence_id == id))
                    .cloned()
                    .collect()
            },
        )
    }

    async fn list_shots(&self, package_id: Option<i64>) -> Result<Vec<Shot>, ApiError> {
        self.list(
            paths::SHOTS,
            optional_param("package_id", package_id),
            |d| {
                d.shots
                    .iter()
                    .filter(|s| package_id.is_none_or(|id| s.package_id == id))
                    .cloned()
                    .collect()
            },
        )
    }

    async fn list_departments(&self) -> Result<Vec<Department>, ApiError> {
        self.list(paths::DEPARTMENTS, Vec::new(), |d| d.departments.clone())
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.list(paths::TASKS, filter.query_params(), |d| {
            filter.apply(&d.tasks).into_iter().cloned().collect()
        })
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.list(paths::USERS, Vec::new(), |d| d.users.clone())
    }

    async fn list_versions(&self, task_id: i64) -> Result<Vec<Version>, ApiError> {
        self.list(paths::versions_of_task(task_id), Vec::new(), |d| {
            d.versions
                .iter()
                .filter(|v| v.task_id == task_id)
                .map(|v| Version {
                    internal_versions: Some(
                        d.internal_versions
                            .iter()
                            .filter(|iv| iv.version_id == v.id)
                            .cloned()
                            .collect(),
                    ),
                    ..v.clone()
                })
                .collect()
        })
    }

    async fn list_internal_versions(
        &self,
        version_id: i64,
    ) -> Result<Vec<InternalVersion>, ApiError> {
        self.list(
            paths::internal_versions_of_version(version_id),
            Vec::new(),
            |d| {
                d.internal_versions
                    .iter()
                    .filter(|iv| iv.version_id == version_id)
                    .cloned()
                    .collect()
            },
        )
    }

    async fn create_task(&self, draft: &NewTask) -> Result<Task, ApiError> {
        self.before_write("POST", paths::TASK_WITH_VERSION)?;
        let mut data = self.write_data()?;

        if !data.shots.iter().any(|s| s.id == draft.shot_id) {
            return Err(not_found("Shot", draft.shot_id));
        }
        if !data.departments.iter().any(|d| d.id == draft.department_id) {
            return Err(not_found("Department", draft.department_id));
        }

        let task = Task {
            id: next_id(data.tasks.iter().map(|t| t.id)),
            name: draft.name.clone(),
            description: draft.description.clone(),
            shot_id: draft.shot_id,
            department_id: draft.department_id,
            status: TaskStatus::NotStarted,
            priority: draft.priority,
            current_version: INITIAL_VERSION_LABEL.to_string(),
            approved_bid_days: draft.approved_bid_days,
            actual_bid_days: 0.0,
            eta_date: draft.eta_date,
            assignee_id: draft.assignee_id,
            created_at: None,
            updated_at: None,
        };
        let version = Version {
            id: next_id(data.versions.iter().map(|v| v.id)),
            version_number: task.current_version.clone(),
            task_id: task.id,
            status: "work_in_progress".to_string(),
            created_at: None,
            internal_versions: None,
        };
        data.tasks.push(task.clone());
        data.versions.push(version);

        tracing::info!(task_id = task.id, "Mock pipeline API: task created");
        Ok(task)
    }

    async fn update_task(&self, task_id: i64, update: &UpdateTask) -> Result<Task, ApiError> {
        self.before_write("PUT", paths::task(task_id))?;
        let mut data = self.write_data()?;

        if let Some(Some(assignee_id)) = update.assignee_id {
            if !data.users.iter().any(|u| u.id == assignee_id) {
                return Err(not_found("User", assignee_id));
            }
        }
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("Task", task_id))?;
        update.apply_to(task);

        tracing::info!(task_id, status = %task.status, "Mock pipeline API: task updated");
        Ok(task.clone())
    }

    async fn create_version(&self, task_id: i64) -> Result<Version, ApiError> {
        self.before_write("POST", paths::new_version(task_id))?;
        let mut data = self.write_data()?;

        let existing = data.versions.iter().filter(|v| v.task_id == task_id).count();
        let version = Version {
            id: next_id(data.versions.iter().map(|v| v.id)),
            version_number: format!("v{:03}", existing + 1),
            task_id,
            status: "work_in_progress".to_string(),
            created_at: None,
            internal_versions: None,
        };
        let task = data
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| not_found("Task", task_id))?;
        task.current_version = version.version_number.clone();
        data.versions.push(version.clone());

        tracing::info!(task_id, version = %version.version_number, "Mock pipeline API: version created");
        Ok(version)
    }

    async fn create_internal_version(
        &self,
        version_id: i64,
    ) -> Result<InternalVersion, ApiError> {
        self.before_write("POST", paths::new_internal_version(version_id))?;
        let mut data = self.write_data()?;

        if !data.versions.iter().any(|v| v.id == version_id) {
            return Err(not_found("Version", version_id));
        }
        let existing = data
            .internal_versions
            .iter()
            .filter(|iv| iv.version_id == version_id)
            .count();
        let internal = InternalVersion {
            id: next_id(data.internal_versions.iter().map(|iv| iv.id)),
            internal_version_number: format!("E{:03}", existing + 1),
            version_id,
            status: "work_in_progress".to_string(),
            created_at: None,
        };
        data.internal_versions.push(internal.clone());

        tracing::info!(
            version_id,
            internal_version = %internal.internal_version_number,
            "Mock pipeline API: internal version created"
        );
        Ok(internal)
    }
}

/// One project with two sequences, three departments and a few tasks
pub fn demo_dataset() -> MockDataset {
    let project = Project {
        id: 1,
        name: "Night Chase".to_string(),
        code: "NCH".to_string(),
        description: Some("Feature VFX package".to_string()),
        status: "active".to_string(),
        start_date: None,
        end_date: None,
        created_at: None,
    };

    let sequence = |id: i64, name: &str, code: &str| Sequence {
        id,
        name: name.to_string(),
        code: code.to_string(),
        description: None,
        project_id: 1,
    };
    let package = |id: i64, code: &str, sequence_id: i64| Package {
        id,
        name: format!("Package {code}"),
        code: code.to_string(),
        description: None,
        sequence_id,
        frame_start: None,
        frame_end: None,
    };
    let shot = |id: i64, code: &str, package_id: i64| Shot {
        id,
        name: format!("Shot {code}"),
        code: code.to_string(),
        description: None,
        package_id,
        status: "active".to_string(),
        frame_start: Some(1001),
        frame_end: Some(1096),
    };
    let department = |id: i64, name: &str, code: &str, color: &str| Department {
        id,
        name: name.to_string(),
        code: code.to_string(),
        color: color.to_string(),
        order: id as i32,
    };
    let task = |id: i64,
                name: &str,
                shot_id: i64,
                department_id: i64,
                status: TaskStatus,
                priority: Priority,
                current_version: &str,
                assignee_id: Option<i64>| Task {
        id,
        name: name.to_string(),
        description: None,
        shot_id,
        department_id,
        status,
        priority,
        current_version: current_version.to_string(),
        approved_bid_days: 2.0,
        actual_bid_days: 0.5,
        eta_date: None,
        assignee_id,
        created_at: None,
        updated_at: None,
    };
    let version = |id: i64, label: &str, task_id: i64| Version {
        id,
        version_number: label.to_string(),
        task_id,
        status: "work_in_progress".to_string(),
        created_at: None,
        internal_versions: None,
    };
    let internal = |id: i64, label: &str, version_id: i64| InternalVersion {
        id,
        internal_version_number: label.to_string(),
        version_id,
        status: "work_in_progress".to_string(),
        created_at: None,
    };

    MockDataset {
        projects: vec![project],
        sequences: vec![
            sequence(1, "Rooftops", "RTP"),
            sequence(2, "Tunnel", "TNL"),
        ],
        packages: vec![
            package(10, "RTP_010", 1),
            package(11, "RTP_020", 1),
            package(20, "TNL_010", 2),
        ],
        shots: vec![
            shot(100, "RTP_010_0010", 10),
            shot(101, "RTP_010_0020", 10),
            shot(110, "RTP_020_0010", 11),
            shot(200, "TNL_010_0010", 20),
        ],
        departments: vec![
            department(1, "Roto", "RT", "#e67e22"),
            department(2, "Paint", "PT", "#9b59b6"),
            department(3, "Comp", "CMP", "#3498db"),
        ],
        tasks: vec![
            task(1, "Roto hero", 100, 1, TaskStatus::InProgress, Priority::High, "v002", Some(1)),
            task(2, "Comp", 100, 3, TaskStatus::NotStarted, Priority::Medium, "v001", Some(2)),
            task(3, "Wire removal", 101, 2, TaskStatus::PendingReview, Priority::Urgent, "v001", None),
            task(4, "Comp", 110, 3, TaskStatus::Approved, Priority::Low, "v001", Some(2)),
            task(5, "Roto", 200, 1, TaskStatus::Retake, Priority::Medium, "v001", Some(1)),
        ],
        users: vec![
            User {
                id: 1,
                username: "amehta".to_string(),
                email: Some("amehta@studio.example".to_string()),
                full_name: Some("Asha Mehta".to_string()),
                role: "artist".to_string(),
                department_id: Some(1),
                is_active: true,
            },
            User {
                id: 2,
                username: "jlee".to_string(),
                email: Some("jlee@studio.example".to_string()),
                full_name: None,
                role: "lead".to_string(),
                department_id: Some(3),
                is_active: true,
            },
        ],
        versions: vec![
            version(1, "v001", 1),
            version(2, "v002", 1),
            version(3, "v001", 2),
            version(4, "v001", 3),
            version(5, "v001", 4),
            version(6, "v001", 5),
        ],
        internal_versions: vec![
            internal(1, "E001", 1),
            internal(2, "E001", 2),
            internal(3, "E002", 2),
            internal(4, "E001", 5),
        ],
    }
}
