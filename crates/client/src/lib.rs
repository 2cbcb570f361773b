//! VFXTrack Pipeline API Client
//!
//! Provides access to the pipeline REST API with support for:
//! - HTTP client against the real API for production
//! - In-memory mock API for testing and development
//! - Configurable provider, base URL, and request timeout

pub mod client;
pub mod mock;

use thiserror::Error;
use vfxtrack_common::{ApiProvider, Config};
use vfxtrack_pipeline::{
    Department, InternalVersion, NewTask, Package, Project, Sequence, Shot, Task, TaskFilter,
    UpdateTask, User, Version,
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("API configuration error: {0}")]
    Configuration(String),

    #[error("API request error: {0}")]
    Request(String),

    #[error("API returned {status}: {body}")]
    Response { status: u16, body: String },

    #[error("API response decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// HTTP status for non-2xx responses
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Response { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }
}

/// Request paths, shared by the HTTP client and the mock so recorded mock
/// calls read like real traffic
pub mod paths {
    pub const PROJECTS: &str = "/api/projects";
    pub const SEQUENCES: &str = "/api/sequences";
    pub const PACKAGES: &str = "/api/packages";
    pub const SHOTS: &str = "/api/shots";
    pub const DEPARTMENTS: &str = "/api/departments";
    pub const TASKS: &str = "/api/tasks";
    pub const USERS: &str = "/api/users";
    pub const TASK_WITH_VERSION: &str = "/api/tasks/with-version";

    pub fn task(task_id: i64) -> String {
        format!("/api/tasks/{task_id}")
    }

    pub fn versions_of_task(task_id: i64) -> String {
        format!("/api/versions/task/{task_id}")
    }

    pub fn internal_versions_of_version(version_id: i64) -> String {
        format!("/api/internal-versions/version/{version_id}")
    }

    pub fn new_version(task_id: i64) -> String {
        format!("/api/versions/new/{task_id}")
    }

    pub fn new_internal_version(version_id: i64) -> String {
        format!("/api/internal-versions/new/{version_id}")
    }
}

/// Pipeline API configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub provider: ApiProvider,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl ApiConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            provider: config.api_provider,
            base_url: config.api_base_url.clone(),
            request_timeout_secs: config.request_timeout_secs,
        }
    }

    /// Create API config from environment variables
    pub fn from_env() -> Result<Self, ApiError> {
        let config = Config::from_env().map_err(|e| ApiError::Configuration(e.to_string()))?;
        Ok(Self::from_config(&config))
    }
}

/// Pipeline REST API.
///
/// List operations return every matching row; a missing or `null` body is an
/// empty list. Create and update operations issue exactly one request and
/// never retry.
#[async_trait::async_trait]
pub trait PipelineApi: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError>;

    /// Sequences, narrowed to one project when `project_id` is set
    async fn list_sequences(&self, project_id: Option<i64>) -> Result<Vec<Sequence>, ApiError>;

    async fn list_packages(&self, sequence_id: Option<i64>) -> Result<Vec<Package>, ApiError>;

    async fn list_shots(&self, package_id: Option<i64>) -> Result<Vec<Shot>, ApiError>;

    async fn list_departments(&self) -> Result<Vec<Department>, ApiError>;

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;

    /// Versions of a task, with internal versions embedded when the API provides them
    async fn list_versions(&self, task_id: i64) -> Result<Vec<Version>, ApiError>;

    async fn list_internal_versions(
        &self,
        version_id: i64,
    ) -> Result<Vec<InternalVersion>, ApiError>;

    /// Create a task together with its initial version
    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError>;

    /// Change status, assignee, bids or other fields of an existing task
    async fn update_task(&self, task_id: i64, update: &UpdateTask) -> Result<Task, ApiError>;

    /// Create the next client version of a task
    async fn create_version(&self, task_id: i64) -> Result<Version, ApiError>;

    /// Create the next internal version of a version
    async fn create_internal_version(&self, version_id: i64)
        -> Result<InternalVersion, ApiError>;
}

/// Factory for creating PipelineApi implementations
pub struct PipelineApiFactory;

impl PipelineApiFactory {
    pub fn create(config: ApiConfig) -> Result<Box<dyn PipelineApi>, ApiError> {
        match config.provider {
            ApiProvider::Http => {
                tracing::info!(base_url = %config.base_url, "Creating HTTP pipeline API client");
                Ok(Box::new(client::HttpPipelineApi::new(&config)?))
            }
            ApiProvider::Mock => {
                tracing::info!("Creating mock pipeline API with demo dataset");
                Ok(Box::new(mock::MockPipelineApi::demo()))
            }
        }
    }
}
