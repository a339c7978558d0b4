//! Workflow configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Timing and naming settings for a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Mailbox name of the coordinator
    #[serde(default = "default_coordinator_name")]
    pub coordinator_name: String,

    /// Delay between agent loop ticks (milliseconds)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How often run_workflow checks the coordinator mailbox (milliseconds)
    #[serde(default = "default_completion_poll_ms")]
    pub completion_poll_ms: u64,

    /// Deadline for the completion signal (seconds)
    #[serde(default = "default_workflow_timeout_secs")]
    pub workflow_timeout_secs: u64,

    /// Grace period for agent loops to wind down after completion (milliseconds)
    #[serde(default = "default_settle_timeout_ms")]
    pub settle_timeout_ms: u64,

    /// Number of log entries included in system state snapshots
    #[serde(default = "default_state_log_tail")]
    pub state_log_tail: usize,

    /// Directory the generated pages are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Seed for competitor synthesis; random when unset
    #[serde(default)]
    pub rival_seed: Option<u64>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            coordinator_name: default_coordinator_name(),
            tick_interval_ms: default_tick_interval_ms(),
            completion_poll_ms: default_completion_poll_ms(),
            workflow_timeout_secs: default_workflow_timeout_secs(),
            settle_timeout_ms: default_settle_timeout_ms(),
            state_log_tail: default_state_log_tail(),
            output_dir: default_output_dir(),
            rival_seed: None,
        }
    }
}

impl WorkflowConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn completion_poll(&self) -> Duration {
        Duration::from_millis(self.completion_poll_ms)
    }

    pub fn workflow_timeout(&self) -> Duration {
        Duration::from_secs(self.workflow_timeout_secs)
    }

    pub fn settle_timeout(&self) -> Duration {
        Duration::from_millis(self.settle_timeout_ms)
    }
}

fn default_coordinator_name() -> String {
    "orchestrator".to_string()
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_completion_poll_ms() -> u64 {
    500
}

fn default_workflow_timeout_secs() -> u64 {
    30
}

fn default_settle_timeout_ms() -> u64 {
    2000
}

fn default_state_log_tail() -> usize {
    10
}

fn default_output_dir() -> String {
    "outputs".to_string()
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> anyhow::Result<WorkflowConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: WorkflowConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to TOML file
pub fn save_config(config: &WorkflowConfig, path: &str) -> anyhow::Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Create a default configuration file template
pub fn create_config_template(path: &str) -> anyhow::Result<()> {
    let template = "# Content pipeline configuration

# Mailbox name the page assembler reports completion to
coordinator_name = \"orchestrator\"

# Agent loop cadence (ms)
tick_interval_ms = 100

# Completion poll cadence (ms)
completion_poll_ms = 500

# Give up waiting for completion after this many seconds
workflow_timeout_secs = 30

# Directory for generated JSON pages
output_dir = \"outputs\"

# Uncomment for a reproducible competitor product
# rival_seed = 42
";

    std::fs::write(path, template)?;
    Ok(())
}
