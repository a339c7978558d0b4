//! Content pipeline - the hub, the coordinator and the four workers wired
//! together, runnable autonomously or stepwise

use crate::bus::MailboxHub;
use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::intents::Goal;
use crate::orchestrator::{Coordinator, RunReport, SystemState, WorkflowResult, WorkflowStatus};
use crate::workers::{DataParser, PageAssembler, QuestionGenerator, RivalGenerator, WorkerNames};
use common::{Page, PageType};
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Goal type the pipeline submits its dataset under
pub const DATASET_GOAL: &str = "product_dataset";

const MAX_STEP_ROUNDS: usize = 32;

/// The built-in sample dataset
pub fn default_dataset() -> Value {
    json!({
        "Product Name": "GlowBoost Vitamin C Serum",
        "Concentration": "10% Vitamin C",
        "Skin Type": "Oily, Combination",
        "Key Ingredients": "Vitamin C, Hyaluronic Acid",
        "Benefits": "Brightening, Fades dark spots",
        "How to Use": "Apply 2–3 drops in the morning before sunscreen",
        "Side Effects": "Mild tingling for sensitive skin",
        "Price": "₹699"
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub status: WorkflowStatus,
    pub pages: Vec<Page>,
    /// How each agent loop ended; absent for stepwise runs
    pub agents: Option<RunReport>,
    pub system_state: SystemState,
}

impl PipelineReport {
    pub fn is_completed(&self) -> bool {
        self.status == WorkflowStatus::Completed
    }

    pub fn page(&self, page_type: PageType) -> Option<&Page> {
        self.pages.iter().find(|p| p.page_type() == page_type)
    }
}

/// One pipeline instance serves one run; the workers' gating flags are
/// never reset
pub struct ContentPipeline {
    config: WorkflowConfig,
    coordinator: Coordinator,
}

impl ContentPipeline {
    pub async fn new(config: WorkflowConfig) -> Result<Self> {
        let hub = Arc::new(MailboxHub::new());
        let coordinator = Coordinator::new(config.clone(), hub);
        let names = WorkerNames::with_coordinator(coordinator.name());

        coordinator.register(Box::new(DataParser::new(names.clone()))).await?;
        coordinator.register(Box::new(QuestionGenerator::new(names.clone()))).await?;
        coordinator
            .register(Box::new(RivalGenerator::new(names.clone(), config.rival_seed)))
            .await?;
        coordinator.register(Box::new(PageAssembler::new(names))).await?;

        Ok(Self { config, coordinator })
    }

    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Spawn every agent loop, wait for WORKFLOW_COMPLETE, then give the
    /// loops `settle_timeout` to wind down
    pub async fn run_autonomous(&self, dataset: Value) -> Result<PipelineReport> {
        info!("Running pipeline autonomously");
        let agents = self.coordinator.spawn_agents();
        let result = self
            .coordinator
            .run_workflow(Goal::new(DATASET_GOAL, dataset), self.config.workflow_timeout())
            .await;

        // join before surfacing any error so no loop is left running
        let run = agents.join_within(self.config.settle_timeout()).await;
        let result = result?;

        let failures = run.failures();
        if !failures.is_empty() {
            warn!("Agents that did not finish cleanly: {:?}", failures);
        }
        self.report(&result, Some(run)).await
    }

    /// Drive every agent's queue in registration order until quiet
    pub async fn run_stepwise(&self, dataset: Value) -> Result<PipelineReport> {
        info!("Running pipeline stepwise");
        self.coordinator
            .start_workflow(Goal::new(DATASET_GOAL, dataset))
            .await?;
        let handled = self.coordinator.drive_until_quiet(MAX_STEP_ROUNDS).await;
        info!("Stepwise run handled {} messages", handled);

        let result = match self.coordinator.check_completion().await {
            Some(payload) => WorkflowResult::Completed(payload),
            None => WorkflowResult::TimedOut {
                waited: std::time::Duration::ZERO,
            },
        };
        self.report(&result, None).await
    }

    async fn report(&self, result: &WorkflowResult, agents: Option<RunReport>) -> Result<PipelineReport> {
        let pages = result.outcome()?.map(|o| o.pages).unwrap_or_default();
        let system_state = self.coordinator.system_state().await;
        Ok(PipelineReport {
            status: system_state.workflow.status,
            pages,
            agents,
            system_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentState;
    use crate::orchestrator::AgentOutcome;

    fn fast_config() -> WorkflowConfig {
        WorkflowConfig {
            tick_interval_ms: 5,
            completion_poll_ms: 10,
            workflow_timeout_secs: 10,
            settle_timeout_ms: 2000,
            rival_seed: Some(11),
            ..Default::default()
        }
    }

    fn assert_glowboost_pages(report: &PipelineReport) {
        assert!(report.is_completed());
        assert_eq!(report.pages.len(), 3);
        let Some(Page::Faq(faq)) = report.page(PageType::Faq) else {
            panic!("missing FAQ page");
        };
        assert!(faq.faq_items.len() >= 15);
        assert!(report.page(PageType::Product).is_some());
        let Some(Page::Comparison(comparison)) = report.page(PageType::Comparison) else {
            panic!("missing comparison page");
        };
        assert_eq!(comparison.product_a.name, "GlowBoost Vitamin C Serum");
        assert_eq!(comparison.product_b.product_id, "competitor_1");
    }

    #[tokio::test]
    async fn test_autonomous_run() {
        let pipeline = ContentPipeline::new(fast_config()).await.unwrap();
        let report = pipeline.run_autonomous(default_dataset()).await.unwrap();
        assert_glowboost_pages(&report);

        let agents = report.agents.as_ref().unwrap();
        assert!(agents.all_finished(), "unfinished: {:?}", agents.failures());
        assert_eq!(
            agents.outcomes.get("page-assembler"),
            Some(&AgentOutcome::Finished(AgentState::Completed))
        );
        assert_eq!(
            agents.outcomes.get("data-parser"),
            Some(&AgentOutcome::Finished(AgentState::Idle))
        );
    }

    #[tokio::test]
    async fn test_stepwise_run() {
        let pipeline = ContentPipeline::new(fast_config()).await.unwrap();
        let report = pipeline.run_stepwise(default_dataset()).await.unwrap();
        assert_glowboost_pages(&report);
        assert!(report.agents.is_none());

        let state = &report.system_state;
        assert_eq!(state.agents.len(), 4);
        assert_eq!(state.agents["page-assembler"].state, AgentState::Completed);
        assert_eq!(state.agents["data-parser"].active_tasks, 0);
        assert!(state.recent_messages.len() <= pipeline.config().state_log_tail);
    }

    #[tokio::test]
    async fn test_bad_dataset_never_completes() {
        let config = WorkflowConfig {
            workflow_timeout_secs: 1,
            settle_timeout_ms: 50,
            ..fast_config()
        };
        let pipeline = ContentPipeline::new(config).await.unwrap();
        let report = pipeline.run_autonomous(json!({"Price": "₹1"})).await.unwrap();

        assert!(!report.is_completed());
        assert!(report.pages.is_empty());
        assert_eq!(report.status, WorkflowStatus::Running);

        // the parse fault went back to the coordinator as a status update
        let log = pipeline.coordinator().hub().message_log();
        assert!(log
            .iter()
            .any(|m| m.message_type() == crate::message::MessageType::StatusUpdate
                && m.receiver() == "orchestrator"));
        let errors = &report.system_state.workflow.errors;
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("data-parser: "));
        assert!(errors[0].contains("Product Name"));
    }
}
