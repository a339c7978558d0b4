//! Content Agents - message-passing coordination for content generation
//!
//! This crate wires a small set of autonomous agents around a shared mailbox
//! hub to turn one product dataset into FAQ, product and comparison pages.
//! It includes:
//! - Mailbox hub with per-agent queues, topic subscriptions and a message log
//! - Base Agent trait and the runtime that drives its state machine
//! - Coordinator for registering agents, starting goals and detecting completion
//! - The data parser, question generator, rival generator and page assembler
//! - Content blocks and page templates used by the workers

pub mod agent;
pub mod bus;
pub mod config;
pub mod content;
pub mod error;
pub mod intents;
pub mod lifecycle;
pub mod message;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod workers;

// Re-export commonly used types
pub use agent::{Agent, AgentCapability, AgentContext, AgentState, KnowledgeBase};
pub use bus::{MailboxHub, ALL_TOPICS};
pub use config::{create_config_template, load_config, save_config, WorkflowConfig};
pub use error::{CoordinationError, Result};
pub use intents::{Goal, Status, WorkflowOutcome};
pub use lifecycle::{AgentRuntime, AgentSnapshot};
pub use message::{Message, MessageRecord, MessageType, Payload, BROADCAST};
pub use orchestrator::{
    AgentOutcome, AgentRegistry, Coordinator, RunReport, RunningAgents, SystemState, WorkflowResult,
    WorkflowStatus,
};
pub use output::{export_message_log, save_pages};
pub use pipeline::{default_dataset, ContentPipeline, PipelineReport};
pub use workers::{DataParser, PageAssembler, QuestionGenerator, RivalGenerator, WorkerNames};

// Re-export common types for convenience
pub use common::{Page, PageType, ProductRecord, QuestionEntry};
