//! Version menu and write workflows through the hierarchy view
//!
//! Covers lazy version loading, the current internal version label, and
//! the invalidate-and-reload cycle after successful writes.

use common::*;
use tokio_test::{assert_err, assert_ok};
use vfxtrack_app::{Collection, HierarchyView, QueryKey, ViewError};
use vfxtrack_client::mock::{MockFailure, MockPipelineApi};
use vfxtrack_client::ApiError;
use vfxtrack_pipeline::{NewTask, Task};

fn task_by_id(view: &HierarchyView<MockPipelineApi>, id: i64) -> Task {
    view.tasks()
        .into_iter()
        .find(|t| t.id == id)
        .expect("task is cached")
}

mod labels {
    use super::*;

    #[tokio::test]
    async fn test_latest_internal_version_is_last_in_list() -> anyhow::Result<()> {
        let (mut view, _api) = loaded_view(scenario_dataset()).await?;
        view.open_version_menu(TASK_T2);
        let versions = view.load_versions().await?;

        assert_eq!(versions.len(), 2);
        let t2 = task_by_id(&view, TASK_T2);
        assert_eq!(view.current_internal_version_label(&t2), "E002");
        Ok(())
    }

    #[tokio::test]
    async fn test_version_without_internal_versions_falls_back() -> anyhow::Result<()> {
        let (mut view, _api) = loaded_view(scenario_dataset()).await?;
        view.open_version_menu(TASK_T1);
        view.load_versions().await?;

        let t1 = task_by_id(&view, TASK_T1);
        assert_eq!(view.current_internal_version_label(&t1), "E001");
        Ok(())
    }

    #[tokio::test]
    async fn test_current_version_missing_from_list_falls_back() -> anyhow::Result<()> {
        let mut dataset = scenario_dataset();
        // T2 points at a version the API does not return
        dataset.tasks[1].current_version = "v003".to_string();
        let (mut view, _api) = loaded_view(dataset).await?;
        view.open_version_menu(TASK_T2);
        view.load_versions().await?;

        let t2 = task_by_id(&view, TASK_T2);
        assert_eq!(view.current_internal_version_label(&t2), "E001");
        Ok(())
    }

    #[tokio::test]
    async fn test_assignee_name_from_users() -> anyhow::Result<()> {
        let (view, _api) = loaded_view(scenario_dataset()).await?;
        let t1 = task_by_id(&view, TASK_T1);
        let t2 = task_by_id(&view, TASK_T2);
        assert_eq!(view.assignee_name(&t1).as_deref(), Some("Robin Oto"));
        assert_eq!(view.assignee_name(&t2), None);
        Ok(())
    }
}

mod lazy_loading {
    use super::*;

    #[tokio::test]
    async fn test_versions_fetched_only_for_selected_task() -> anyhow::Result<()> {
        let (mut view, api) = loaded_view(scenario_dataset()).await?;
        assert!(api.recorded_requests().is_empty());

        view.open_version_menu(TASK_T2);
        view.load().await?;
        assert_eq!(api.request_lines(), vec!["GET /api/versions/task/2"]);

        view.close_version_menu();
        assert!(view.versions().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_internal_version_menu_lists_selected_version() -> anyhow::Result<()> {
        let (mut view, api) = loaded_view(scenario_dataset()).await?;
        view.open_internal_version_menu(3);
        let labels: Vec<String> = view
            .load_internal_versions()
            .await?
            .into_iter()
            .map(|iv| iv.internal_version_number)
            .collect();

        assert_eq!(labels, vec!["E001", "E002"]);
        assert_eq!(api.request_lines(), vec!["GET /api/internal-versions/version/3"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_spawned_fetch_for_deselected_task_is_discarded() -> anyhow::Result<()> {
        let (mut view, _api) = loaded_view(scenario_dataset()).await?;
        view.open_version_menu(TASK_T1);
        let fetch = view.versions_fetch().expect("menu is open");
        let handle = tokio::spawn(fetch);

        // user moves on before the response lands
        view.open_version_menu(TASK_T2);
        let fetched = handle.await??;

        assert!(!view.apply_versions(fetched)?);
        let t1_key = QueryKey::new(Collection::Versions).param("task_id", TASK_T1);
        assert!(!view.cache().contains(&t1_key));
        Ok(())
    }
}

mod writes {
    use super::*;

    #[tokio::test]
    async fn test_create_internal_version_refreshes_label() -> anyhow::Result<()> {
        let (mut view, api) = loaded_view(scenario_dataset()).await?;
        view.open_version_menu(TASK_T2);
        view.load_versions().await?;
        api.reset_history();

        let created = view.create_internal_version(3).await?;
        assert_eq!(created.internal_version_number, "E003");
        assert_eq!(
            api.request_lines(),
            vec![
                "POST /api/internal-versions/new/3",
                "GET /api/tasks",
                "GET /api/versions/task/2",
            ]
        );

        let t2 = task_by_id(&view, TASK_T2);
        assert_eq!(view.current_internal_version_label(&t2), "E003");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_version_moves_current_version() -> anyhow::Result<()> {
        let (mut view, _api) = loaded_view(scenario_dataset()).await?;
        view.open_version_menu(TASK_T1);

        let created = view.create_version(TASK_T1).await?;
        assert_eq!(created.version_number, "v002");

        let t1 = task_by_id(&view, TASK_T1);
        assert_eq!(t1.current_version, "v002");
        // the new version has no internal versions yet
        assert_eq!(view.current_internal_version_label(&t1), "E001");
        assert_eq!(view.versions().len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_failed_write_leaves_cache_untouched() -> anyhow::Result<()> {
        let (mut view, api) = loaded_view(scenario_dataset()).await?;
        api.behavior()
            .set_write_failure(Some(MockFailure::new(409, "version locked")));

        let err = assert_err!(view.create_version(TASK_T2).await);
        match err {
            ViewError::Api(ApiError::Response { status, body }) => {
                assert_eq!(status, 409);
                assert_eq!(body, "version locked");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(view.cache().stale_keys().is_empty());
        assert_eq!(api.recorded_requests().len(), 1);
        assert_eq!(task_by_id(&view, TASK_T2).current_version, "v002");

        api.behavior().reset();
        let created = assert_ok!(view.create_version(TASK_T2).await);
        assert_eq!(created.version_number, "v003");
        Ok(())
    }

    #[tokio::test]
    async fn test_create_version_for_unknown_task_is_not_found() -> anyhow::Result<()> {
        let (mut view, _api) = loaded_view(scenario_dataset()).await?;
        let err = assert_err!(view.create_version(404).await);
        assert!(err.as_api().is_some_and(ApiError::is_not_found));
        Ok(())
    }

    #[tokio::test]
    async fn test_new_task_starts_at_v001() -> anyhow::Result<()> {
        let (mut view, _api) = loaded_view(scenario_dataset()).await?;
        let mut draft = NewTask::new("Paint", SHOT_SH1, DEPT_COMP);
        draft.assignee_id = Some(7);

        let created = view.create_task(draft).await?;
        assert_eq!(created.current_version, "v001");
        assert_eq!(view.hierarchy().task_count(), 3);

        view.open_version_menu(created.id);
        let versions = view.load_versions().await?;
        assert_eq!(versions.len(), 1);
        assert_eq!(view.current_internal_version_label(&created), "E001");
        assert_eq!(view.assignee_name(&created).as_deref(), Some("Robin Oto"));
        Ok(())
    }
}

mod common;
