//! Pipeline API HTTP Client Implementation
//!
//! Real HTTP client for the pipeline REST API at `{base_url}/api/...`.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

use vfxtrack_pipeline::{
    Department, InternalVersion, NewTask, Package, Project, Sequence, Shot, Task, TaskFilter,
    UpdateTask, User, Version,
};

use crate::{paths, ApiConfig, ApiError, PipelineApi};

/// Real HTTP client for the pipeline REST API.
pub struct HttpPipelineApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPipelineApi {
    /// Create a new client from configuration.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Configuration(format!(
                "Pipeline API base URL must be an http(s) URL, got '{}'",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Turn non-2xx responses into `ApiError::Response`
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Failed to read response body".to_string());
        Err(ApiError::Response { status, body })
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&'static str, String)],
    ) -> Result<Vec<T>, ApiError> {
        let mut request = self.http.get(self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let response = Self::check(response).await?;

        let items: Option<Vec<T>> = response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let items = items.unwrap_or_default();

        tracing::debug!(path, count = items.len(), "Pipeline API list fetched");
        Ok(items)
    }

    /// POST or PUT with an optional JSON body, decoding the JSON reply
    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError> {
        let mut request = self.http.request(method, self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let response = Self::check(response).await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn optional_param(name: &'static str, value: Option<i64>) -> Vec<(&'static str, String)> {
    value
        .map(|v| vec![(name, v.to_string())])
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl PipelineApi for HttpPipelineApi {
    async fn list_projects(&self) -> Result<Vec<Project>, ApiError> {
        self.get_list(paths::PROJECTS, &[]).await
    }

    async fn list_sequences(&self, project_id: Option<i64>) -> Result<Vec<Sequence>, ApiError> {
        self.get_list(paths::SEQUENCES, &optional_param("project_id", project_id))
            .await
    }

    async fn list_packages(&self, sequence_id: Option<i64>) -> Result<Vec<Package>, ApiError> {
        self.get_list(paths::PACKAGES, &optional_param("sequence_id", sequence_id))
            .await
    }

    async fn list_shots(&self, package_id: Option<i64>) -> Result<Vec<Shot>, ApiError> {
        self.get_list(paths::SHOTS, &optional_param("package_id", package_id))
            .await
    }

    async fn list_departments(&self) -> Result<Vec<Department>, ApiError> {
        self.get_list(paths::DEPARTMENTS, &[]).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        self.get_list(paths::TASKS, &filter.query_params()).await
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.get_list(paths::USERS, &[]).await
    }

    async fn list_versions(&self, task_id: i64) -> Result<Vec<Version>, ApiError> {
        self.get_list(&paths::versions_of_task(task_id), &[]).await
    }

    async fn list_internal_versions(
        &self,
        version_id: i64,
    ) -> Result<Vec<InternalVersion>, ApiError> {
        self.get_list(&paths::internal_versions_of_version(version_id), &[])
            .await
    }

    async fn create_task(&self, task: &NewTask) -> Result<Task, ApiError> {
        let created: Task = self
            .send_json(reqwest::Method::POST, paths::TASK_WITH_VERSION, Some(task))
            .await?;
        tracing::info!(task_id = created.id, shot_id = created.shot_id, "Task created");
        Ok(created)
    }

    async fn update_task(&self, task_id: i64, update: &UpdateTask) -> Result<Task, ApiError> {
        let updated: Task = self
            .send_json(reqwest::Method::PUT, &paths::task(task_id), Some(update))
            .await?;
        tracing::info!(task_id, status = %updated.status, "Task updated");
        Ok(updated)
    }

    async fn create_version(&self, task_id: i64) -> Result<Version, ApiError> {
        let created: Version = self
            .send_json(reqwest::Method::POST, &paths::new_version(task_id), None::<&()>)
            .await?;
        tracing::info!(
            task_id,
            version = %created.version_number,
            "Version created"
        );
        Ok(created)
    }

    async fn create_internal_version(
        &self,
        version_id: i64,
    ) -> Result<InternalVersion, ApiError> {
        let created: InternalVersion = self
            .send_json(
                reqwest::Method::POST,
                &paths::new_internal_version(version_id),
                None::<&()>,
            )
            .await?;
        tracing::info!(
            version_id,
            internal_version = %created.internal_version_number,
            "Internal version created"
        );
        Ok(created)
    }
}
