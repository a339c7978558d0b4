use anyhow::{bail, Result};
use content_agents::{
    default_dataset, export_message_log, load_config, save_pages, ContentPipeline, WorkflowConfig,
};
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            load_config(&path)?
        }
        None => WorkflowConfig::default(),
    };

    info!("Content Pipeline");
    info!("================");

    let pipeline = ContentPipeline::new(config.clone()).await?;
    let report = pipeline.run_autonomous(default_dataset()).await?;

    let output_dir = Path::new(&config.output_dir);
    export_message_log(pipeline.coordinator().hub(), output_dir.join("message_log.json"))?;

    if !report.is_completed() {
        warn!("Workflow state: {:?}", report.system_state.workflow.status);
        bail!(
            "workflow did not complete within {}s",
            config.workflow_timeout_secs
        );
    }

    let written = save_pages(&report.pages, output_dir)?;
    info!("Generated {} pages", written.len());
    for page in &report.pages {
        info!("  {}: {}", page.page_type(), page.title());
    }

    if let Some(agents) = &report.agents {
        for (name, outcome) in &agents.outcomes {
            info!("  agent {}: {:?}", name, outcome);
        }
    }

    Ok(())
}
