//! Example usage of the content agents
//!
//! This example demonstrates:
//! 1. Setting up the hub and coordinator
//! 2. Registering the four workers
//! 3. Driving the workflow one agent step at a time
//! 4. Inspecting system state and the generated pages

use anyhow::Result;
use content_agents::{
    default_dataset, Coordinator, DataParser, Goal, MailboxHub, PageAssembler, QuestionGenerator,
    RivalGenerator, WorkerNames, WorkflowConfig, WorkflowResult,
};
use std::sync::Arc;
use tracing::{info, Level};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("Content Agents - Example");
    info!("========================");

    // Step 1: Create the hub and the coordinator
    let config = WorkflowConfig {
        rival_seed: Some(7),
        ..Default::default()
    };
    let hub = Arc::new(MailboxHub::new());
    let coordinator = Coordinator::new(config, Arc::clone(&hub));
    info!("Coordinator created as '{}'", coordinator.name());

    // Step 2: Register the workers
    let names = WorkerNames::with_coordinator(coordinator.name());
    coordinator.register(Box::new(DataParser::new(names.clone()))).await?;
    coordinator.register(Box::new(QuestionGenerator::new(names.clone()))).await?;
    coordinator.register(Box::new(RivalGenerator::new(names.clone(), Some(7)))).await?;
    coordinator.register(Box::new(PageAssembler::new(names))).await?;
    info!("Registered agents: {:?}", coordinator.registry().names());

    // Step 3: Start the goal and step every agent by hand
    let notified = coordinator
        .start_workflow(Goal::new("product_dataset", default_dataset()))
        .await?;
    info!("Task sent to {:?}", notified);

    for round in 1.. {
        let mut handled = 0;
        for name in coordinator.registry().names() {
            let count = coordinator.step_agent(&name).await?;
            if count > 0 {
                info!("  round {}: {} handled {} message(s)", round, name, count);
            }
            handled += count;
        }
        if handled == 0 {
            break;
        }
    }

    // Step 4: Inspect the outcome
    let state = coordinator.system_state().await;
    for (name, snapshot) in &state.agents {
        info!(
            "{}: {} ({} active, {} completed tasks)",
            name, snapshot.state, snapshot.active_tasks, snapshot.completed_tasks
        );
    }
    info!("{} messages logged", hub.log_len());

    match coordinator.check_completion().await {
        Some(payload) => {
            let result = WorkflowResult::Completed(payload);
            if let Some(outcome) = result.outcome()? {
                for page in &outcome.pages {
                    info!("Page: {} - {}", page.page_type(), page.title());
                }
            }
        }
        None => info!("Workflow did not complete"),
    }

    Ok(())
}
