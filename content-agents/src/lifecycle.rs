//! Agent runtime - the message-driven state machine shared by every worker
//!
//! One tick drains the mailbox, hands each message to `process_message`,
//! reports handler faults back to the sender, then asks the agent for its
//! next action while it is Processing. `run` repeats ticks with a cooperative
//! sleep until the agent reaches Idle, Completed or Failed. `step` is the
//! driven variant: one drain-and-process pass with no decision phase.
//!
//! At most one `run` loop drives an agent at a time, and an agent in a final
//! state is never restarted.

use crate::agent::{Agent, AgentCapability, AgentContext, AgentState};
use crate::bus::MailboxHub;
use crate::intents::StatusReport;
use crate::message::Message;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Read-only view of an agent for system state reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub state: AgentState,
    pub capabilities: Vec<String>,
    pub active_tasks: usize,
    pub completed_tasks: usize,
    pub knowledge_keys: Vec<String>,
}

pub struct AgentRuntime {
    agent: Box<dyn Agent>,
    ctx: AgentContext,
    tick_interval: Duration,
    looping: AtomicBool,
}

/// Clears the loop marker when `run` returns or its task is aborted
struct LoopGuard<'a>(&'a AtomicBool);

impl Drop for LoopGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AgentRuntime {
    pub fn new(agent: Box<dyn Agent>, hub: Arc<MailboxHub>, tick_interval: Duration) -> Self {
        let ctx = AgentContext::new(agent.name(), hub);
        Self {
            agent,
            ctx,
            tick_interval,
            looping: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        self.ctx.name()
    }

    pub fn context(&self) -> &AgentContext {
        &self.ctx
    }

    pub fn capabilities(&self) -> Vec<AgentCapability> {
        self.agent.capabilities()
    }

    pub async fn state(&self) -> AgentState {
        self.ctx.state().await
    }

    /// Run the agent's start hook
    pub async fn start(&self) -> anyhow::Result<()> {
        self.agent.on_start(&self.ctx).await
    }

    /// Drive ticks until the agent leaves Processing/Waiting. Fails if
    /// another loop is already driving this agent.
    pub async fn run(&self) -> anyhow::Result<AgentState> {
        let current = self.ctx.state().await;
        if current.is_terminal() {
            debug!("{} already {}, not restarting", self.name(), current);
            return Ok(current);
        }
        if self.looping.swap(true, Ordering::AcqRel) {
            anyhow::bail!("{} is already being driven by another loop", self.name());
        }
        let _guard = LoopGuard(&self.looping);

        info!("{} running", self.name());
        self.ctx.set_state(AgentState::Processing).await;

        loop {
            let state = self.tick().await?;
            if !state.is_running() {
                info!("{} stopped in state {}", self.name(), state);
                return Ok(state);
            }
            tokio::time::sleep(self.tick_interval).await;
        }
    }

    /// One pass of the loop. Returns the state after the pass.
    pub async fn tick(&self) -> anyhow::Result<AgentState> {
        let messages = self.ctx.hub().receive(self.name());
        if !messages.is_empty() && self.ctx.state().await == AgentState::Waiting {
            self.ctx.set_state(AgentState::Processing).await;
        }

        for message in &messages {
            self.handle_message(message).await;
        }

        if self.ctx.state().await == AgentState::Processing {
            match self.agent.decide_next_action(&self.ctx).await {
                Ok(Some(next)) => {
                    self.ctx.send(next);
                }
                Ok(None) => {
                    let active = self.ctx.active_tasks().await;
                    if active.is_empty() {
                        self.ctx.set_state(AgentState::Idle).await;
                    } else {
                        debug!("{} waiting on {:?}", self.name(), active);
                        self.ctx.set_state(AgentState::Waiting).await;
                    }
                }
                Err(e) => {
                    error!("{} failed deciding next action: {:#}", self.name(), e);
                    self.ctx.set_state(AgentState::Failed).await;
                    return Err(e);
                }
            }
        }

        Ok(self.ctx.state().await)
    }

    /// Drain the mailbox and process each message once, without deciding a
    /// next action. Returns how many messages were handled.
    pub async fn step(&self) -> usize {
        let messages = self.ctx.hub().receive(self.name());
        for message in &messages {
            self.handle_message(message).await;
        }
        messages.len()
    }

    async fn handle_message(&self, message: &Message) {
        match self.agent.process_message(&self.ctx, message).await {
            Ok(Some(response)) => {
                self.ctx.send(response);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    "{} failed handling {} from {}: {:#}",
                    self.name(),
                    message.message_type(),
                    message.sender(),
                    e
                );
                let report = StatusReport::error(format!("{:#}", e), message.correlation_id());
                match message.reply(self.name(), &report) {
                    Ok(notice) => {
                        self.ctx.send(notice);
                    }
                    Err(err) => error!("{} could not build error report: {}", self.name(), err),
                }
            }
        }
    }

    pub async fn snapshot(&self) -> AgentSnapshot {
        AgentSnapshot {
            state: self.ctx.state().await,
            capabilities: self.capabilities().into_iter().map(|c| c.name).collect(),
            active_tasks: self.ctx.active_tasks().await.len(),
            completed_tasks: self.ctx.completed_tasks().await.len(),
            knowledge_keys: self.ctx.knowledge().keys(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::{DataQuery, Status};
    use crate::message::{MessageType, Payload};
    use async_trait::async_trait;
    use serde_json::json;
    use uuid::Uuid;

    /// Fails on DATA_REQUEST, echoes TASK_REQUEST, and waits on a task until
    /// it sees a TASK_RESPONSE.
    struct ScriptedAgent;

    #[async_trait]
    impl Agent for ScriptedAgent {
        fn name(&self) -> &str {
            "scripted"
        }

        fn capabilities(&self) -> Vec<AgentCapability> {
            vec![AgentCapability::new("script", "Test agent").inputs(&["test"]).initiates(true)]
        }

        async fn on_start(&self, ctx: &AgentContext) -> anyhow::Result<()> {
            ctx.begin_task("await_response").await;
            Ok(())
        }

        async fn process_message(
            &self,
            ctx: &AgentContext,
            message: &Message,
        ) -> anyhow::Result<Option<Message>> {
            match message.message_type() {
                MessageType::DataRequest => anyhow::bail!("cannot serve data"),
                MessageType::TaskRequest => Ok(Some(Message::new(
                    ctx.name(),
                    message.sender(),
                    MessageType::TaskResponse,
                    Payload::new(),
                ))),
                MessageType::TaskResponse => {
                    ctx.complete_task("await_response").await;
                    Ok(None)
                }
                _ => Ok(None),
            }
        }

        async fn decide_next_action(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
            if ctx.raise_flag("announced") {
                return Ok(Some(Message::new(
                    ctx.name(),
                    "observer",
                    MessageType::StatusUpdate,
                    Payload::new(),
                )));
            }
            Ok(None)
        }
    }

    struct BrokenDecider;

    #[async_trait]
    impl Agent for BrokenDecider {
        fn name(&self) -> &str {
            "broken"
        }

        fn capabilities(&self) -> Vec<AgentCapability> {
            Vec::new()
        }

        async fn process_message(
            &self,
            _ctx: &AgentContext,
            _message: &Message,
        ) -> anyhow::Result<Option<Message>> {
            Ok(None)
        }

        async fn decide_next_action(&self, _ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
            anyhow::bail!("no plan")
        }
    }

    fn runtime(hub: &Arc<MailboxHub>) -> AgentRuntime {
        AgentRuntime::new(Box::new(ScriptedAgent), Arc::clone(hub), Duration::from_millis(5))
    }

    #[tokio::test]
    async fn test_handler_fault_reports_status_update() {
        let hub = Arc::new(MailboxHub::new());
        let rt = runtime(&hub);
        let correlation = Some(Uuid::new_v4());
        hub.send(
            Message::from_intent("requester", "scripted", &DataQuery::LatestProduct)
                .unwrap()
                .with_correlation(correlation),
        );

        assert_eq!(rt.step().await, 1);

        let replies = hub.receive("requester");
        assert_eq!(replies.len(), 1);
        let report: StatusReport = replies[0].decode().unwrap();
        assert_eq!(report.status, Status::Error);
        assert_eq!(report.correlation_id, correlation);
        assert!(report.error.unwrap().contains("cannot serve data"));
        assert_eq!(replies[0].correlation_id(), correlation);
    }

    #[tokio::test]
    async fn test_fault_does_not_stop_batch() {
        let hub = Arc::new(MailboxHub::new());
        let rt = runtime(&hub);
        hub.send(Message::new("x", "scripted", MessageType::DataRequest, Payload::new()));
        hub.send(Message::new("x", "scripted", MessageType::TaskRequest, Payload::new()));

        assert_eq!(rt.step().await, 2);
        let replies = hub.receive("x");
        let types: Vec<MessageType> = replies.iter().map(|m| m.message_type()).collect();
        assert_eq!(types, vec![MessageType::StatusUpdate, MessageType::TaskResponse]);
    }

    #[tokio::test]
    async fn test_tick_transitions() {
        let hub = Arc::new(MailboxHub::new());
        let rt = runtime(&hub);
        rt.start().await.unwrap();
        rt.context().set_state(AgentState::Processing).await;

        // first decision sends the announcement
        assert_eq!(rt.tick().await.unwrap(), AgentState::Processing);
        assert_eq!(hub.receive("observer").len(), 1);

        // nothing left to decide but a task is active
        assert_eq!(rt.tick().await.unwrap(), AgentState::Waiting);

        // waiting with an empty mailbox stays waiting
        assert_eq!(rt.tick().await.unwrap(), AgentState::Waiting);

        // a message wakes it up; the task completes and it goes idle
        hub.send(Message::new("x", "scripted", MessageType::TaskResponse, Payload::new()));
        assert_eq!(rt.tick().await.unwrap(), AgentState::Idle);
        assert_eq!(rt.context().completed_tasks().await, vec!["await_response".to_string()]);
    }

    #[tokio::test]
    async fn test_run_stops_when_work_is_done() {
        let hub = Arc::new(MailboxHub::new());
        let rt = Arc::new(runtime(&hub));
        rt.start().await.unwrap();

        let handle = {
            let rt = Arc::clone(&rt);
            tokio::spawn(async move { rt.run().await })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(rt.state().await, AgentState::Waiting);

        hub.send(Message::new("x", "scripted", MessageType::TaskResponse, Payload::new()));
        let final_state = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(final_state, AgentState::Idle);
    }

    #[tokio::test]
    async fn test_run_leaves_final_states_alone() {
        let hub = Arc::new(MailboxHub::new());
        let rt = runtime(&hub);
        hub.send(Message::new("x", "scripted", MessageType::TaskRequest, Payload::new()));

        for state in [AgentState::Completed, AgentState::Failed] {
            rt.context().set_state(state).await;
            assert_eq!(rt.run().await.unwrap(), state);
        }
        // nothing was drained or answered
        assert_eq!(hub.pending("scripted"), 1);
        assert!(hub.receive("x").is_empty());
    }

    #[tokio::test]
    async fn test_second_loop_is_rejected() {
        let hub = Arc::new(MailboxHub::new());
        let rt = Arc::new(runtime(&hub));
        rt.start().await.unwrap();

        let handle = {
            let rt = Arc::clone(&rt);
            tokio::spawn(async move { rt.run().await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert!(rt.run().await.is_err());
        assert_eq!(rt.state().await, AgentState::Waiting);

        hub.send(Message::new("x", "scripted", MessageType::TaskResponse, Payload::new()));
        let final_state = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        assert_eq!(final_state, AgentState::Idle);

        // once the first loop has ended the agent can be driven again
        assert_eq!(rt.run().await.unwrap(), AgentState::Idle);
    }

    #[tokio::test]
    async fn test_decide_error_fails_agent() {
        let hub = Arc::new(MailboxHub::new());
        let rt = AgentRuntime::new(Box::new(BrokenDecider), hub, Duration::from_millis(5));
        assert!(rt.run().await.is_err());
        assert_eq!(rt.state().await, AgentState::Failed);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let hub = Arc::new(MailboxHub::new());
        let rt = runtime(&hub);
        rt.start().await.unwrap();
        rt.context().update_knowledge("seen", json!(true));

        let snapshot = rt.snapshot().await;
        assert_eq!(snapshot.state, AgentState::Idle);
        assert_eq!(snapshot.capabilities, vec!["script".to_string()]);
        assert_eq!(snapshot.active_tasks, 1);
        assert_eq!(snapshot.knowledge_keys, vec!["seen".to_string()]);
    }
}
