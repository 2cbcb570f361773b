//! Hierarchy view end to end over the mock pipeline API
//!
//! Loads the single-shot scenario through `HierarchyView` and checks the
//! built tree, the visible rows and expansion isolation between node classes.

use common::*;
use vfxtrack_app::RowKind;
use vfxtrack_pipeline::{NodeClass, TaskFilter};

#[tokio::test]
async fn test_scenario_tree_shape() -> anyhow::Result<()> {
    let (view, _api) = loaded_view(scenario_dataset()).await?;
    let tree = view.hierarchy();

    assert_eq!(tree.sequences.len(), 1);
    let s1 = &tree.sequences[0];
    assert_eq!(s1.sequence.code, "S1");
    assert_eq!(s1.packages.len(), 1);

    let pk1 = &s1.packages[0];
    assert_eq!(pk1.package.id, PACKAGE_PK1);
    assert_eq!(pk1.shots.len(), 1);

    let sh1 = &pk1.shots[0];
    assert_eq!(sh1.shot.id, SHOT_SH1);
    let branches: Vec<(&str, Vec<&str>)> = sh1
        .departments
        .iter()
        .map(|b| {
            (
                b.department.name.as_str(),
                b.tasks.iter().map(|t| t.name.as_str()).collect(),
            )
        })
        .collect();
    assert_eq!(branches, vec![("Roto", vec!["T1"]), ("Comp", vec!["T2"])]);
    Ok(())
}

#[tokio::test]
async fn test_shot_expansion_is_isolated_from_package_with_same_id() -> anyhow::Result<()> {
    let mut dataset = scenario_dataset();
    // a package whose id collides with SH1's
    dataset.packages.push(serde_json::from_value(serde_json::json!({
        "id": SHOT_SH1, "name": "Package 100", "code": "PK100", "sequence_id": SEQUENCE_S1
    }))?);
    let (mut view, _api) = loaded_view(dataset).await?;

    assert!(view.toggle(NodeClass::Shot, SHOT_SH1));
    assert!(view.is_expanded(NodeClass::Shot, SHOT_SH1));
    assert!(!view.is_expanded(NodeClass::Package, SHOT_SH1));
    assert!(!view.is_expanded(NodeClass::Department, SHOT_SH1));

    // both packages still render collapsed
    let rows = view.rows();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.kind == RowKind::Package && r.expanded == Some(false)));
    Ok(())
}

#[tokio::test]
async fn test_drill_down_rows() -> anyhow::Result<()> {
    let (mut view, _api) = loaded_view(scenario_dataset()).await?;

    view.toggle(NodeClass::Package, PACKAGE_PK1);
    view.toggle(NodeClass::Shot, SHOT_SH1);
    view.toggle(NodeClass::Department, DEPT_COMP);

    let rendered: Vec<String> = view.rows().iter().map(|r| r.render()).collect();
    assert_eq!(
        rendered,
        vec![
            "v PK1 Package 1",
            "  v SH1",
            "    > Roto (1)",
            "    v Comp (1)",
            "      - T2 [NOT STARTED] v002",
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_tasks_missing_shots_are_left_out() -> anyhow::Result<()> {
    let mut dataset = scenario_dataset();
    dataset.tasks.push(serde_json::from_value(serde_json::json!({
        "id": 99, "name": "Orphan", "shot_id": 4242, "department_id": DEPT_ROTO
    }))?);
    let (view, _api) = loaded_view(dataset).await?;

    let tree = view.hierarchy();
    assert_eq!(tree.task_count(), 2);
    assert!(tree.find_task(99).is_none());
    Ok(())
}

#[tokio::test]
async fn test_no_tasks_keeps_shots_without_branches() -> anyhow::Result<()> {
    let mut dataset = scenario_dataset();
    dataset.tasks.clear();
    let (view, _api) = loaded_view(dataset).await?;

    let tree = view.hierarchy();
    let shot = tree.find_shot(SHOT_SH1).expect("shot stays in the tree");
    assert!(shot.departments.is_empty());
    assert_eq!(tree.task_count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_department_filter_prunes_other_branch() -> anyhow::Result<()> {
    let (mut view, api) = loaded_view(scenario_dataset()).await?;
    view.set_filter(TaskFilter::all().department(DEPT_ROTO));
    view.load().await?;

    let requests = api.recorded_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query, vec![("department_id", DEPT_ROTO.to_string())]);

    let tree = view.hierarchy();
    let shot = tree.find_shot(SHOT_SH1).expect("shot stays in the tree");
    let names: Vec<&str> = shot
        .departments
        .iter()
        .map(|b| b.department.name.as_str())
        .collect();
    assert_eq!(names, vec!["Roto"]);
    Ok(())
}

#[tokio::test]
async fn test_rebuild_is_stable() -> anyhow::Result<()> {
    let (view, _api) = loaded_view(scenario_dataset()).await?;
    assert_eq!(view.hierarchy(), view.hierarchy());
    assert_eq!(view.hierarchy().summaries()[0].task_count, 2);
    Ok(())
}

mod common;
