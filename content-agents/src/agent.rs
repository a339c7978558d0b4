//! Base Agent trait and core agent types
//!
//! Every worker implements the `Agent` trait. Per-agent mutable state (life
//! cycle state, knowledge base, task ledger) lives in an `AgentContext` owned
//! by the runtime, so the concrete workers only carry immutable settings and
//! all four share the same driving loop.

use crate::bus::MailboxHub;
use crate::message::Message;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Declarative description of what an agent accepts and produces
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCapability {
    pub name: String,
    pub description: String,
    pub input_types: Vec<String>,
    pub output_types: Vec<String>,
    pub can_initiate: bool,
    pub can_coordinate: bool,
}

impl AgentCapability {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_types: Vec::new(),
            output_types: Vec::new(),
            can_initiate: false,
            can_coordinate: false,
        }
    }

    pub fn inputs(mut self, types: &[&str]) -> Self {
        self.input_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn outputs(mut self, types: &[&str]) -> Self {
        self.output_types = types.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn initiates(mut self, can_initiate: bool) -> Self {
        self.can_initiate = can_initiate;
        self
    }

    pub fn coordinates(mut self, can_coordinate: bool) -> Self {
        self.can_coordinate = can_coordinate;
        self
    }

    /// True when this capability may start work for a goal of `goal_type`
    pub fn can_start(&self, goal_type: &str) -> bool {
        self.can_initiate && self.input_types.iter().any(|t| t == goal_type)
    }
}

/// Life cycle state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentState {
    Idle,
    Processing,
    Waiting,
    Completed,
    Failed,
}

impl AgentState {
    /// Processing and Waiting keep the driving loop alive
    pub fn is_running(&self) -> bool {
        matches!(self, AgentState::Processing | AgentState::Waiting)
    }

    /// Completed and Failed are final; the runtime never leaves them
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentState::Completed | AgentState::Failed)
    }
}

impl fmt::Display for AgentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AgentState::Idle => "idle",
            AgentState::Processing => "processing",
            AgentState::Waiting => "waiting",
            AgentState::Completed => "completed",
            AgentState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Last-writer-wins key/value store private to one agent
#[derive(Debug, Default)]
pub struct KnowledgeBase {
    entries: DashMap<String, Value>,
}

impl KnowledgeBase {
    pub fn update(&self, key: &str, value: Value) {
        self.entries.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }
}

#[derive(Debug, Default)]
struct TaskLedger {
    active: Vec<String>,
    completed: Vec<String>,
}

/// Per-agent state handed to every `Agent` callback
pub struct AgentContext {
    name: String,
    hub: Arc<MailboxHub>,
    knowledge: KnowledgeBase,
    state: RwLock<AgentState>,
    tasks: RwLock<TaskLedger>,
}

impl AgentContext {
    pub fn new(name: impl Into<String>, hub: Arc<MailboxHub>) -> Self {
        Self {
            name: name.into(),
            hub,
            knowledge: KnowledgeBase::default(),
            state: RwLock::new(AgentState::Idle),
            tasks: RwLock::new(TaskLedger::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hub(&self) -> &Arc<MailboxHub> {
        &self.hub
    }

    /// Send directly through the hub, outside the response/next-action path
    pub fn send(&self, message: Message) -> Option<Uuid> {
        self.hub.send(message)
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn update_knowledge(&self, key: &str, value: Value) {
        self.knowledge.update(key, value);
    }

    pub fn get_knowledge(&self, key: &str) -> Option<Value> {
        self.knowledge.get(key)
    }

    /// Store a serializable value under `key`
    pub fn remember<T: Serialize>(&self, key: &str, value: &T) -> anyhow::Result<()> {
        self.knowledge.update(key, serde_json::to_value(value)?);
        Ok(())
    }

    /// Read a typed value back out of the knowledge base
    pub fn recall<T: DeserializeOwned>(&self, key: &str) -> anyhow::Result<Option<T>> {
        match self.knowledge.get(key) {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    pub fn flag(&self, key: &str) -> bool {
        matches!(self.knowledge.get(key), Some(Value::Bool(true)))
    }

    /// Raise a monotonic flag. Returns false if it was already set.
    pub fn raise_flag(&self, key: &str) -> bool {
        if self.flag(key) {
            return false;
        }
        self.knowledge.update(key, Value::Bool(true));
        true
    }

    pub async fn state(&self) -> AgentState {
        *self.state.read().await
    }

    pub async fn set_state(&self, next: AgentState) {
        let mut state = self.state.write().await;
        if *state != next {
            debug!("{}: {} -> {}", self.name, *state, next);
            *state = next;
        }
    }

    /// Mark a unit of work in flight. Duplicate ids are ignored.
    pub async fn begin_task(&self, task_id: &str) {
        let mut tasks = self.tasks.write().await;
        if !tasks.active.iter().any(|t| t == task_id) {
            tasks.active.push(task_id.to_string());
        }
    }

    /// Move a task from active to completed. Returns false if it was not active.
    pub async fn complete_task(&self, task_id: &str) -> bool {
        let mut tasks = self.tasks.write().await;
        match tasks.active.iter().position(|t| t == task_id) {
            Some(index) => {
                let task = tasks.active.remove(index);
                tasks.completed.push(task);
                true
            }
            None => false,
        }
    }

    pub async fn has_active_task(&self, task_id: &str) -> bool {
        self.tasks.read().await.active.iter().any(|t| t == task_id)
    }

    pub async fn active_tasks(&self) -> Vec<String> {
        self.tasks.read().await.active.clone()
    }

    pub async fn completed_tasks(&self) -> Vec<String> {
        self.tasks.read().await.completed.clone()
    }
}

/// Base trait that all workers implement
///
/// Handlers return `anyhow::Result`; the driving loop turns an `Err` from
/// `process_message` into a STATUS_UPDATE for the original sender.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Unique registration name
    fn name(&self) -> &str;

    /// Capabilities consulted when matching goals
    fn capabilities(&self) -> Vec<AgentCapability>;

    /// Called once at registration, before any message is processed
    async fn on_start(&self, _ctx: &AgentContext) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle one incoming message, optionally producing a response
    async fn process_message(
        &self,
        ctx: &AgentContext,
        message: &Message,
    ) -> anyhow::Result<Option<Message>>;

    /// Decide what to do next from local knowledge alone
    async fn decide_next_action(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_capability_matching() {
        let cap = AgentCapability::new("parse", "Parse things")
            .inputs(&["raw_product_data", "product_dataset"])
            .initiates(true);
        assert!(cap.can_start("product_dataset"));
        assert!(!cap.can_start("weather"));

        let passive = cap.clone().initiates(false);
        assert!(!passive.can_start("product_dataset"));
    }

    #[test]
    fn test_knowledge_is_last_writer_wins() {
        let kb = KnowledgeBase::default();
        assert!(kb.get("k").is_none());
        kb.update("k", json!(1));
        kb.update("k", json!(2));
        assert_eq!(kb.get("k"), Some(json!(2)));
        assert_eq!(kb.keys(), vec!["k".to_string()]);
    }

    #[tokio::test]
    async fn test_flags_are_monotonic() {
        let ctx = AgentContext::new("a", Arc::new(MailboxHub::new()));
        assert!(!ctx.flag("ready"));
        assert!(ctx.raise_flag("ready"));
        assert!(!ctx.raise_flag("ready"));
        assert!(ctx.flag("ready"));
    }

    #[tokio::test]
    async fn test_task_ledger() {
        let ctx = AgentContext::new("a", Arc::new(MailboxHub::new()));
        ctx.begin_task("t1").await;
        ctx.begin_task("t1").await;
        ctx.begin_task("t2").await;
        assert_eq!(ctx.active_tasks().await.len(), 2);

        assert!(ctx.complete_task("t1").await);
        assert!(!ctx.complete_task("t1").await);
        assert_eq!(ctx.active_tasks().await, vec!["t2".to_string()]);
        assert_eq!(ctx.completed_tasks().await, vec!["t1".to_string()]);
    }

    #[tokio::test]
    async fn test_typed_recall() {
        let ctx = AgentContext::new("a", Arc::new(MailboxHub::new()));
        ctx.remember("list", &vec!["x", "y"]).unwrap();
        let list: Option<Vec<String>> = ctx.recall("list").unwrap();
        assert_eq!(list.unwrap(), vec!["x".to_string(), "y".to_string()]);
        let missing: Option<String> = ctx.recall("missing").unwrap();
        assert!(missing.is_none());
    }
}
