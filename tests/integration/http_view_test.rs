//! Hierarchy view over the HTTP client against a stub REST server
//!
//! Exercises the factory-built client, query strings, null list bodies,
//! partial load failures and the refetch after a successful write.

use std::sync::Arc;

use common::*;
use serde_json::json;
use vfxtrack_app::HierarchyView;
use vfxtrack_client::{ApiConfig, ApiError, PipelineApiFactory};
use vfxtrack_common::ApiProvider;
use vfxtrack_pipeline::{NodeClass, TaskStatus, UpdateTask};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_get(server: &MockServer, route: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Stub server serving the single-shot scenario
async fn scenario_server() -> MockServer {
    // some deployments answer an empty table with null
    scenario_server_with_users(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .await
}

async fn scenario_server_with_users(users: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    let data = scenario_dataset();

    mount_get(&server, "/api/projects", json!(data.projects)).await;
    Mock::given(method("GET"))
        .and(path("/api/sequences"))
        .and(query_param("project_id", PROJECT_ID.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(data.sequences)))
        .expect(1)
        .mount(&server)
        .await;
    mount_get(&server, "/api/packages", json!(data.packages)).await;
    mount_get(&server, "/api/shots", json!(data.shots)).await;
    mount_get(&server, "/api/departments", json!(data.departments)).await;
    mount_get(&server, "/api/tasks", json!(data.tasks)).await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(users)
        .mount(&server)
        .await;

    server
}

fn http_view(server: &MockServer) -> anyhow::Result<HierarchyView> {
    init_tracing();
    let api = PipelineApiFactory::create(ApiConfig {
        provider: ApiProvider::Http,
        base_url: server.uri(),
        request_timeout_secs: 5,
    })?;
    let mut view: HierarchyView = HierarchyView::new(Arc::from(api));
    view.select_project(PROJECT_ID);
    Ok(view)
}

#[tokio::test]
async fn test_load_and_expand_over_http() -> anyhow::Result<()> {
    let server = scenario_server().await;
    let mut view = http_view(&server)?;
    view.load().await?;

    let tree = view.hierarchy();
    assert_eq!(tree.task_count(), 2);
    assert!(view.toggle(NodeClass::Shot, SHOT_SH1));
    assert!(!view.is_expanded(NodeClass::Package, SHOT_SH1));

    let t1 = tree.find_task(TASK_T1).expect("T1 is in the tree");
    // users came back as null
    assert_eq!(view.assignee_name(t1), None);
    Ok(())
}

#[tokio::test]
async fn test_failing_endpoint_does_not_discard_other_collections() -> anyhow::Result<()> {
    let server =
        scenario_server_with_users(ResponseTemplate::new(500).set_body_string("users down")).await;
    let mut view = http_view(&server)?;

    let err = view.load().await.expect_err("users endpoint is down");
    assert_eq!(err.as_api().and_then(ApiError::status), Some(500));

    let tree = view.hierarchy();
    assert_eq!(tree.task_count(), 2);
    assert!(tree.find_shot(SHOT_SH1).is_some());
    assert_eq!(view.cache().len(), 6);
    Ok(())
}

#[tokio::test]
async fn test_version_menu_over_http() -> anyhow::Result<()> {
    let server = scenario_server().await;
    mount_get(
        &server,
        "/api/versions/task/2",
        json!([
            {"id": 2, "version_number": "v001", "task_id": 2},
            {"id": 3, "version_number": "v002", "task_id": 2, "internal_versions": [
                {"id": 1, "internal_version_number": "E001", "version_id": 3},
                {"id": 2, "internal_version_number": "E002", "version_id": 3}
            ]}
        ]),
    )
    .await;

    let mut view = http_view(&server)?;
    view.load().await?;
    view.open_version_menu(TASK_T2);
    view.load_versions().await?;

    let t2 = view.hierarchy().find_task(TASK_T2).cloned().expect("T2 is in the tree");
    assert_eq!(view.current_internal_version_label(&t2), "E002");
    Ok(())
}

#[tokio::test]
async fn test_write_then_refetch_over_http() -> anyhow::Result<()> {
    let server = scenario_server().await;
    Mock::given(method("POST"))
        .and(path("/api/versions/new/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(
            {"id": 9, "version_number": "v002", "task_id": 1}
        )))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = http_view(&server)?;
    view.load().await?;
    let created = view.create_version(TASK_T1).await?;
    assert_eq!(created.version_number, "v002");

    let requests = server.received_requests().await.unwrap_or_default();
    let task_fetches = requests
        .iter()
        .filter(|r| r.url.path() == "/api/tasks")
        .count();
    assert_eq!(task_fetches, 2, "tasks are refetched after the write");
    Ok(())
}

#[tokio::test]
async fn test_update_task_over_http() -> anyhow::Result<()> {
    let server = scenario_server().await;
    Mock::given(method("PUT"))
        .and(path("/api/tasks/1"))
        .and(body_json(json!({"status": "in_progress"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "name": "T1", "shot_id": SHOT_SH1, "department_id": DEPT_ROTO,
            "status": "in_progress", "current_version": "v001"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = http_view(&server)?;
    view.load().await?;
    let updated = view
        .update_task(TASK_T1, UpdateTask::status(TaskStatus::InProgress))
        .await?;
    assert_eq!(updated.status, TaskStatus::InProgress);

    let requests = server.received_requests().await.unwrap_or_default();
    let task_fetches = requests
        .iter()
        .filter(|r| r.url.path() == "/api/tasks")
        .count();
    assert_eq!(task_fetches, 2, "tasks are refetched after the update");
    Ok(())
}

#[tokio::test]
async fn test_server_error_reaches_caller() -> anyhow::Result<()> {
    let server = scenario_server().await;
    Mock::given(method("POST"))
        .and(path("/api/internal-versions/new/3"))
        .respond_with(ResponseTemplate::new(500).set_body_string("storage offline"))
        .expect(1)
        .mount(&server)
        .await;

    let mut view = http_view(&server)?;
    view.load().await?;
    let err = view
        .create_internal_version(3)
        .await
        .expect_err("server error must surface");
    assert_eq!(
        err.as_api(),
        Some(&ApiError::Response {
            status: 500,
            body: "storage offline".to_string()
        })
    );
    assert!(view.cache().stale_keys().is_empty());
    Ok(())
}

mod common;
