// VFXTrack - Local hierarchy runner

use std::sync::Arc;

use anyhow::anyhow;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use vfxtrack_app::{HierarchyView, RowKind};
use vfxtrack_client::{ApiConfig, PipelineApiFactory};
use vfxtrack_common::config::{Config, DEFAULT_LOG_FILTER};
use vfxtrack_common::Error;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .pretty()
        .init();

    info!("Starting VFXTrack local hierarchy runner");

    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!(provider = %config.api_provider, "Configuration loaded successfully");

    let api = PipelineApiFactory::create(ApiConfig::from_config(&config)).map_err(|e| {
        error!("Failed to create pipeline API client: {}", e);
        e
    })?;
    let mut view: HierarchyView = HierarchyView::new(Arc::from(api));

    let projects = view.api().list_projects().await.map_err(|e| {
        error!("Failed to list projects: {}", e);
        e
    })?;
    let project = match config.project_id {
        Some(id) => projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("Project {id}")))?,
        None => projects
            .first()
            .ok_or_else(|| anyhow!("No projects available"))?,
    };

    info!(project_id = project.id, code = %project.code, "Loading project");
    view.select_project(project.id);
    view.load().await.map_err(|e| {
        error!("Failed to load project data: {}", e);
        e
    })?;
    view.expand_all();

    let tree = view.hierarchy();
    println!("{} {}", project.code, project.name);
    for summary in tree.summaries() {
        println!(
            "  {}: {} packages, {} shots, {} tasks",
            summary.code, summary.package_count, summary.shot_count, summary.task_count
        );
    }
    println!();

    for row in view.rows() {
        let Some(task) = tree.find_task(row.id).filter(|_| row.kind == RowKind::Task) else {
            println!("{}", row.render());
            continue;
        };

        view.open_version_menu(task.id);
        view.load_versions().await?;
        let assignee = view
            .assignee_name(task)
            .unwrap_or_else(|| "unassigned".to_string());
        println!(
            "{}  {} / {}",
            row.render(),
            view.current_internal_version_label(task),
            assignee
        );
    }
    view.close_version_menu();

    info!(tasks = tree.task_count(), "Done");
    Ok(())
}
