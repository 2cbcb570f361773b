//! Common test utilities and fixtures for integration tests
//!
//! - Tracing setup shared by every test binary
//! - The single-shot scenario dataset (S1 → PK1 → SH1, Roto and Comp)
//! - View construction over the mock pipeline API

#![allow(dead_code)]

use std::sync::{Arc, Once};

use serde_json::json;
use vfxtrack_app::HierarchyView;
use vfxtrack_client::mock::{MockDataset, MockPipelineApi};

static INIT: Once = Once::new();

/// Install a test-writer subscriber once per test binary
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vfxtrack=debug"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const PROJECT_ID: i64 = 1;
pub const SEQUENCE_S1: i64 = 1;
pub const PACKAGE_PK1: i64 = 10;
pub const SHOT_SH1: i64 = 100;
pub const DEPT_ROTO: i64 = 1;
pub const DEPT_COMP: i64 = 2;
pub const TASK_T1: i64 = 1;
pub const TASK_T2: i64 = 2;

fn rows<T: serde::de::DeserializeOwned>(value: serde_json::Value) -> Vec<T> {
    serde_json::from_value(value).expect("fixture rows must match the entity shape")
}

/// Project P with one sequence, one package, one shot, two departments and
/// one task per department. T2 has two client versions; the second carries
/// internal versions E001 and E002.
pub fn scenario_dataset() -> MockDataset {
    MockDataset {
        projects: rows(json!([
            {"id": PROJECT_ID, "name": "Project P", "code": "P"}
        ])),
        sequences: rows(json!([
            {"id": SEQUENCE_S1, "name": "Sequence 1", "code": "S1", "project_id": PROJECT_ID}
        ])),
        packages: rows(json!([
            {"id": PACKAGE_PK1, "name": "Package 1", "code": "PK1", "sequence_id": SEQUENCE_S1}
        ])),
        shots: rows(json!([
            {"id": SHOT_SH1, "name": "Shot 1", "code": "SH1", "package_id": PACKAGE_PK1}
        ])),
        departments: rows(json!([
            {"id": DEPT_ROTO, "name": "Roto", "code": "RT"},
            {"id": DEPT_COMP, "name": "Comp", "code": "CMP"}
        ])),
        tasks: rows(json!([
            {"id": TASK_T1, "name": "T1", "shot_id": SHOT_SH1, "department_id": DEPT_ROTO,
             "current_version": "v001", "assignee_id": 7},
            {"id": TASK_T2, "name": "T2", "shot_id": SHOT_SH1, "department_id": DEPT_COMP,
             "current_version": "v002"}
        ])),
        users: rows(json!([
            {"id": 7, "username": "roto.artist", "full_name": "Robin Oto"}
        ])),
        versions: rows(json!([
            {"id": 1, "version_number": "v001", "task_id": TASK_T1},
            {"id": 2, "version_number": "v001", "task_id": TASK_T2},
            {"id": 3, "version_number": "v002", "task_id": TASK_T2}
        ])),
        internal_versions: rows(json!([
            {"id": 1, "internal_version_number": "E001", "version_id": 3},
            {"id": 2, "internal_version_number": "E002", "version_id": 3}
        ])),
    }
}

/// View over a mock seeded with `dataset`, with the project selected and
/// loaded. The returned mock shares state with the one inside the view.
pub async fn loaded_view(
    dataset: MockDataset,
) -> anyhow::Result<(HierarchyView<MockPipelineApi>, MockPipelineApi)> {
    init_tracing();
    let api = MockPipelineApi::with_dataset(dataset);
    let mut view = HierarchyView::new(Arc::new(api.clone()));
    view.select_project(PROJECT_ID);
    view.load().await?;
    api.reset_history();
    Ok((view, api))
}
