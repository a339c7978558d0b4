//! Coordinator - registers agents, starts goals and detects completion
//!
//! The coordinator owns the agent registry (there is no global one), its own
//! mailbox on the shared hub, and the workflow state. It supports both
//! execution shapes:
//! - autonomous: `spawn_agents` / `run_all_agents` run every agent loop as a
//!   tokio task while `run_workflow` waits for WORKFLOW_COMPLETE
//! - driven: `step_agent` / `drive_until_quiet` pull queues explicitly
//!
//! Completion is only ever the explicit WORKFLOW_COMPLETE message; agent
//! states are not consulted.

use crate::agent::{Agent, AgentCapability, AgentState};
use crate::bus::{MailboxHub, ALL_TOPICS};
use crate::config::WorkflowConfig;
use crate::error::{CoordinationError, Result};
use crate::intents::{Goal, StatusReport, WorkflowOutcome};
use crate::lifecycle::{AgentRuntime, AgentSnapshot};
use crate::message::{Message, MessageRecord, MessageType, Payload, BROADCAST};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Registered agents, keyed by name, remembering registration order
#[derive(Default)]
pub struct AgentRegistry {
    agents: DashMap<String, (usize, Arc<AgentRuntime>)>,
    next_seq: AtomicUsize,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a runtime. Names are never reused.
    pub fn insert(&self, runtime: AgentRuntime) -> Result<Arc<AgentRuntime>> {
        match self.agents.entry(runtime.name().to_string()) {
            Entry::Occupied(entry) => Err(CoordinationError::DuplicateAgent(entry.key().clone())),
            Entry::Vacant(entry) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                let runtime = Arc::new(runtime);
                entry.insert((seq, Arc::clone(&runtime)));
                Ok(runtime)
            }
        }
    }

    pub fn get(&self, name: &str) -> Result<Arc<AgentRuntime>> {
        self.agents
            .get(name)
            .map(|entry| Arc::clone(&entry.value().1))
            .ok_or_else(|| CoordinationError::AgentNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Runtimes in registration order
    pub fn runtimes(&self) -> Vec<Arc<AgentRuntime>> {
        let mut entries: Vec<(usize, Arc<AgentRuntime>)> = self
            .agents
            .iter()
            .map(|entry| (entry.value().0, Arc::clone(&entry.value().1)))
            .collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, runtime)| runtime).collect()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<String> {
        self.runtimes().iter().map(|rt| rt.name().to_string()).collect()
    }

    pub fn capabilities(&self) -> BTreeMap<String, Vec<AgentCapability>> {
        self.runtimes()
            .iter()
            .map(|rt| (rt.name().to_string(), rt.capabilities()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    NotStarted,
    Running,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub status: WorkflowStatus,
    pub current_goal: Option<Goal>,
    pub goals: Vec<Goal>,
    /// Agents sent a TASK_REQUEST for the current goal
    pub notified: Vec<String>,
    /// Error reports agents sent back to the coordinator
    #[serde(default)]
    pub errors: Vec<String>,
}

impl Default for WorkflowState {
    fn default() -> Self {
        Self {
            status: WorkflowStatus::NotStarted,
            current_goal: None,
            goals: Vec::new(),
            notified: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Result of waiting for a workflow
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowResult {
    Completed(Payload),
    TimedOut { waited: Duration },
}

impl WorkflowResult {
    pub fn is_completed(&self) -> bool {
        matches!(self, WorkflowResult::Completed(_))
    }

    pub fn payload(&self) -> Option<&Payload> {
        match self {
            WorkflowResult::Completed(payload) => Some(payload),
            WorkflowResult::TimedOut { .. } => None,
        }
    }

    /// Decode the completion payload into the page assembler's outcome
    pub fn outcome(&self) -> Result<Option<WorkflowOutcome>> {
        match self {
            WorkflowResult::Completed(payload) => Ok(Some(serde_json::from_value(Value::Object(
                payload.clone(),
            ))?)),
            WorkflowResult::TimedOut { .. } => Ok(None),
        }
    }
}

/// How one agent loop ended
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AgentOutcome {
    Finished(AgentState),
    Failed(String),
    Stopped,
    Panicked(String),
}

/// Aggregated results of a concurrent agent run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub outcomes: BTreeMap<String, AgentOutcome>,
}

impl RunReport {
    pub fn failures(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| !matches!(outcome, AgentOutcome::Finished(_)))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn all_finished(&self) -> bool {
        self.failures().is_empty()
    }
}

/// Handles of spawned agent loops
pub struct RunningAgents {
    handles: Vec<(String, JoinHandle<anyhow::Result<AgentState>>)>,
}

impl RunningAgents {
    /// Stop driving every loop that is still running
    pub fn abort(&self) {
        for (_, handle) in &self.handles {
            handle.abort();
        }
    }

    /// Wait for every loop; one failure never cancels the others
    pub async fn join(self) -> RunReport {
        let (names, handles): (Vec<String>, Vec<_>) = self.handles.into_iter().unzip();
        let results = futures::future::join_all(handles).await;

        let mut report = RunReport::default();
        for (name, result) in names.into_iter().zip(results) {
            let outcome = match result {
                Ok(Ok(state)) => AgentOutcome::Finished(state),
                Ok(Err(e)) => AgentOutcome::Failed(format!("{:#}", e)),
                Err(e) if e.is_cancelled() => AgentOutcome::Stopped,
                Err(e) => AgentOutcome::Panicked(e.to_string()),
            };
            report.outcomes.insert(name, outcome);
        }
        report
    }

    /// Wait up to `limit`, then abort whatever is still running
    pub async fn join_within(self, limit: Duration) -> RunReport {
        let abort_handles: Vec<_> = self.handles.iter().map(|(_, h)| h.abort_handle()).collect();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(limit).await;
            for handle in abort_handles {
                handle.abort();
            }
        });
        let report = self.join().await;
        timer.abort();
        report
    }
}

/// Snapshot returned by `Coordinator::system_state`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemState {
    pub agents: BTreeMap<String, AgentSnapshot>,
    pub workflow: WorkflowState,
    pub recent_messages: Vec<MessageRecord>,
}

pub struct Coordinator {
    name: String,
    config: WorkflowConfig,
    hub: Arc<MailboxHub>,
    registry: AgentRegistry,
    workflow: RwLock<WorkflowState>,
}

impl Coordinator {
    pub fn new(config: WorkflowConfig, hub: Arc<MailboxHub>) -> Self {
        Self {
            name: config.coordinator_name.clone(),
            config,
            hub,
            registry: AgentRegistry::new(),
            workflow: RwLock::new(WorkflowState::default()),
        }
    }

    /// Mailbox name of the coordinator
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hub(&self) -> &Arc<MailboxHub> {
        &self.hub
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn agent(&self, name: &str) -> Result<Arc<AgentRuntime>> {
        self.registry.get(name)
    }

    /// Register an agent and subscribe it to every broadcast
    pub async fn register(&self, agent: Box<dyn Agent>) -> Result<()> {
        let name = agent.name().to_string();
        if name == BROADCAST || name == self.name {
            return Err(CoordinationError::ReservedName(name));
        }

        let runtime = AgentRuntime::new(agent, Arc::clone(&self.hub), self.config.tick_interval());
        let runtime = self.registry.insert(runtime)?;
        self.hub.subscribe(&name, ALL_TOPICS);

        if let Err(e) = runtime.start().await {
            error!("Failed to start agent {}: {:#}", name, e);
        }

        let capabilities: Vec<String> = runtime.capabilities().into_iter().map(|c| c.name).collect();
        info!("Registered agent: {} with capabilities: {:?}", name, capabilities);
        Ok(())
    }

    /// Record the goal and send a TASK_REQUEST to every agent able to start it.
    /// Returns the names of the notified agents.
    pub async fn start_workflow(&self, goal: Goal) -> Result<Vec<String>> {
        // an agent is included on its first matching capability only
        let capable: Vec<String> = self
            .registry
            .runtimes()
            .iter()
            .filter(|rt| rt.capabilities().iter().any(|cap| cap.can_start(&goal.goal_type)))
            .map(|rt| rt.name().to_string())
            .collect();

        {
            let mut workflow = self.workflow.write().await;
            workflow.goals.push(goal.clone());
            workflow.current_goal = Some(goal.clone());
            workflow.status = WorkflowStatus::Running;
            workflow.notified = capable.clone();
        }

        for agent_name in &capable {
            let message = Message::from_intent(self.name.as_str(), agent_name.as_str(), &goal)?
                .with_correlation(Some(Uuid::new_v4()));
            self.hub.send(message);
        }

        if capable.is_empty() {
            warn!("No agent can initiate goal type {}", goal.goal_type);
        } else {
            info!("Workflow started for {}: notified {:?}", goal.goal_type, capable);
        }
        Ok(capable)
    }

    /// Start the goal and poll the coordinator mailbox until WORKFLOW_COMPLETE
    /// arrives or `timeout` elapses
    pub async fn run_workflow(&self, goal: Goal, timeout: Duration) -> Result<WorkflowResult> {
        self.start_workflow(goal).await?;

        let started = Instant::now();
        // too far out to represent means no deadline
        let deadline = started.checked_add(timeout);
        let poll = self.config.completion_poll();

        loop {
            if let Some(payload) = self.check_completion().await {
                info!("Workflow finished after {:?}", started.elapsed());
                return Ok(WorkflowResult::Completed(payload));
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    poll.min(deadline - now)
                }
                None => poll,
            };
            tokio::time::sleep(wait).await;
        }

        warn!("Workflow did not complete within {:?}", timeout);
        Ok(WorkflowResult::TimedOut {
            waited: started.elapsed(),
        })
    }

    /// Drain the coordinator mailbox once. Returns the completion payload if
    /// WORKFLOW_COMPLETE was among the messages. Error status reports are
    /// recorded in the workflow state.
    pub async fn check_completion(&self) -> Option<Payload> {
        let mut completion = None;
        for message in self.hub.receive(&self.name) {
            if message.message_type() == MessageType::WorkflowComplete && completion.is_none() {
                self.workflow.write().await.status = WorkflowStatus::Completed;
                info!("Workflow complete, signalled by {}", message.sender());
                completion = Some(message.payload().clone());
            } else if message.message_type() == MessageType::StatusUpdate {
                self.record_status(&message).await;
            } else {
                debug!(
                    "Coordinator received {} from {}",
                    message.message_type(),
                    message.sender()
                );
            }
        }
        completion
    }

    async fn record_status(&self, message: &Message) {
        match message.decode::<StatusReport>() {
            Ok(report) if report.is_error() => {
                let error = report.error.as_deref().unwrap_or("unknown");
                warn!("Coordinator received error from {}: {}", message.sender(), error);
                self.workflow
                    .write()
                    .await
                    .errors
                    .push(format!("{}: {}", message.sender(), error));
            }
            Ok(report) => debug!("Status {:?} from {}", report.status, message.sender()),
            Err(e) => warn!("Unreadable status update from {}: {}", message.sender(), e),
        }
    }

    /// Spawn every registered agent loop as its own task
    pub fn spawn_agents(&self) -> RunningAgents {
        let handles = self
            .registry
            .runtimes()
            .into_iter()
            .map(|rt| {
                let name = rt.name().to_string();
                let handle = tokio::spawn(async move { rt.run().await });
                (name, handle)
            })
            .collect();
        RunningAgents { handles }
    }

    /// Run all agents concurrently to quiescence
    pub async fn run_all_agents(&self) -> RunReport {
        let report = self.spawn_agents().join().await;
        let failures = report.failures();
        if !failures.is_empty() {
            warn!("Agents did not finish cleanly: {:?}", failures);
        }
        report
    }

    /// Process one agent's pending messages once
    pub async fn step_agent(&self, name: &str) -> Result<usize> {
        let runtime = self.registry.get(name)?;
        Ok(runtime.step().await)
    }

    /// Step every agent in registration order until a full round handles no
    /// message or `max_rounds` is reached. Returns the messages handled.
    pub async fn drive_until_quiet(&self, max_rounds: usize) -> usize {
        let mut handled = 0;
        for round in 0..max_rounds {
            let mut in_round = 0;
            for runtime in self.registry.runtimes() {
                in_round += runtime.step().await;
            }
            debug!("Round {} handled {} messages", round, in_round);
            if in_round == 0 {
                break;
            }
            handled += in_round;
        }
        handled
    }

    pub async fn workflow_state(&self) -> WorkflowState {
        self.workflow.read().await.clone()
    }

    /// Read-only snapshot of agents, workflow and the latest log entries
    pub async fn system_state(&self) -> SystemState {
        let mut agents = BTreeMap::new();
        for runtime in self.registry.runtimes() {
            agents.insert(runtime.name().to_string(), runtime.snapshot().await);
        }

        SystemState {
            agents,
            workflow: self.workflow_state().await,
            recent_messages: self
                .hub
                .recent(self.config.state_log_tail)
                .iter()
                .map(|m| MessageRecord::from(m.as_ref()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentContext;
    use crate::intents::Status;
    use async_trait::async_trait;
    use serde_json::json;

    /// Sends WORKFLOW_COMPLETE when it receives its task
    struct Finisher {
        name: String,
        accepts: Vec<&'static str>,
        initiates: bool,
    }

    impl Finisher {
        fn boxed(name: &str, accepts: &[&'static str], initiates: bool) -> Box<dyn Agent> {
            Box::new(Self {
                name: name.to_string(),
                accepts: accepts.to_vec(),
                initiates,
            })
        }
    }

    #[async_trait]
    impl Agent for Finisher {
        fn name(&self) -> &str {
            &self.name
        }

        fn capabilities(&self) -> Vec<AgentCapability> {
            vec![
                AgentCapability::new("finish", "Finish work")
                    .inputs(&self.accepts)
                    .initiates(self.initiates),
                // second capability matching the same goal
                AgentCapability::new("finish_again", "Also finishes")
                    .inputs(&self.accepts)
                    .initiates(self.initiates),
            ]
        }

        async fn on_start(&self, ctx: &AgentContext) -> anyhow::Result<()> {
            ctx.begin_task("finish").await;
            Ok(())
        }

        async fn process_message(
            &self,
            ctx: &AgentContext,
            message: &Message,
        ) -> anyhow::Result<Option<Message>> {
            if message.message_type() == MessageType::TaskRequest {
                ctx.complete_task("finish").await;
                ctx.set_state(AgentState::Completed).await;
                let outcome = WorkflowOutcome::completed(Vec::new());
                return Ok(Some(message.reply(ctx.name(), &outcome)?));
            }
            Ok(None)
        }

        async fn decide_next_action(&self, _ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
            Ok(None)
        }
    }

    fn fast_config() -> WorkflowConfig {
        WorkflowConfig {
            tick_interval_ms: 5,
            completion_poll_ms: 10,
            ..Default::default()
        }
    }

    fn coordinator() -> Coordinator {
        Coordinator::new(fast_config(), Arc::new(MailboxHub::new()))
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_reserved_names() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("a", &["x"], true)).await.unwrap();

        let err = coordinator.register(Finisher::boxed("a", &["y"], true)).await.unwrap_err();
        assert!(matches!(err, CoordinationError::DuplicateAgent(name) if name == "a"));

        let err = coordinator.register(Finisher::boxed(BROADCAST, &["x"], true)).await.unwrap_err();
        assert!(matches!(err, CoordinationError::ReservedName(_)));

        let err = coordinator.register(Finisher::boxed("orchestrator", &["x"], true)).await.unwrap_err();
        assert!(matches!(err, CoordinationError::ReservedName(_)));

        assert_eq!(coordinator.registry().names(), vec!["a".to_string()]);
        assert_eq!(coordinator.hub().subscribers_of(ALL_TOPICS), vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_agent_lookup() {
        let coordinator = coordinator();
        assert!(matches!(
            coordinator.step_agent("ghost").await,
            Err(CoordinationError::AgentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_start_workflow_matches_capabilities_once_per_agent() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();
        coordinator.register(Finisher::boxed("passive", &["job"], false)).await.unwrap();
        coordinator.register(Finisher::boxed("other", &["other_job"], true)).await.unwrap();

        let notified = coordinator.start_workflow(Goal::new("job", json!({}))).await.unwrap();
        assert_eq!(notified, vec!["starter".to_string()]);

        // two matching capabilities still mean one task message
        let inbox = coordinator.hub().receive("starter");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message_type(), MessageType::TaskRequest);
        assert!(inbox[0].correlation_id().is_some());
        assert!(coordinator.hub().receive("passive").is_empty());
        assert!(coordinator.hub().receive("other").is_empty());
    }

    #[tokio::test]
    async fn test_unmatched_goal_sends_nothing_and_stays_running() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();

        let notified = coordinator.start_workflow(Goal::new("unknown", json!({}))).await.unwrap();
        assert!(notified.is_empty());
        assert_eq!(coordinator.hub().log_len(), 0);

        let state = coordinator.workflow_state().await;
        assert_eq!(state.status, WorkflowStatus::Running);
        assert!(state.notified.is_empty());
        assert_eq!(state.current_goal.unwrap().goal_type, "unknown");
    }

    #[tokio::test]
    async fn test_run_workflow_times_out() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();

        // nobody runs the agent, so completion never arrives
        let started = Instant::now();
        let result = coordinator
            .run_workflow(Goal::new("job", json!({})), Duration::from_millis(200))
            .await
            .unwrap();

        assert!(matches!(result, WorkflowResult::TimedOut { .. }));
        assert!(result.outcome().unwrap().is_none());
        assert!(started.elapsed() < Duration::from_secs(2));
        assert_eq!(coordinator.workflow_state().await.status, WorkflowStatus::Running);
    }

    #[tokio::test]
    async fn test_autonomous_completion() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();

        let agents = coordinator.spawn_agents();
        let result = coordinator
            .run_workflow(Goal::new("job", json!({})), Duration::from_secs(5))
            .await
            .unwrap();
        let report = agents.join_within(Duration::from_secs(2)).await;

        assert!(result.is_completed());
        let outcome = result.outcome().unwrap().unwrap();
        assert_eq!(outcome.status, Status::Completed);
        assert_eq!(outcome.total_pages, 0);
        assert_eq!(coordinator.workflow_state().await.status, WorkflowStatus::Completed);
        assert_eq!(
            report.outcomes.get("starter"),
            Some(&AgentOutcome::Finished(AgentState::Completed))
        );

        // a second spawn leaves the completed agent alone
        let again = coordinator.spawn_agents().join_within(Duration::from_secs(2)).await;
        assert_eq!(
            again.outcomes.get("starter"),
            Some(&AgentOutcome::Finished(AgentState::Completed))
        );
    }

    #[tokio::test]
    async fn test_run_workflow_without_representable_deadline() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();

        // keeps polling instead of overflowing the deadline
        let waited = tokio::time::timeout(
            Duration::from_millis(100),
            coordinator.run_workflow(Goal::new("job", json!({})), Duration::MAX),
        )
        .await;
        assert!(waited.is_err());
        assert_eq!(coordinator.workflow_state().await.status, WorkflowStatus::Running);
    }

    #[tokio::test]
    async fn test_error_reports_are_recorded() {
        let coordinator = coordinator();
        let report = StatusReport::error("Missing required field: Product Name", None);
        coordinator
            .hub()
            .send(Message::from_intent("parser", coordinator.name(), &report).unwrap());
        let fine = StatusReport {
            status: Status::Completed,
            error: None,
            correlation_id: None,
        };
        coordinator
            .hub()
            .send(Message::from_intent("helper", coordinator.name(), &fine).unwrap());

        assert!(coordinator.check_completion().await.is_none());
        let errors = coordinator.workflow_state().await.errors;
        assert_eq!(errors, vec!["parser: Missing required field: Product Name".to_string()]);
        assert_eq!(coordinator.hub().pending(coordinator.name()), 0);
    }

    #[tokio::test]
    async fn test_goal_recorded_before_task_requests() {
        let coordinator = Arc::new(coordinator());
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();

        // hold the workflow state so start_workflow blocks on recording the goal
        let guard = coordinator.workflow.read().await;
        let task = {
            let coordinator = Arc::clone(&coordinator);
            tokio::spawn(async move { coordinator.start_workflow(Goal::new("job", json!({}))).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(guard.status, WorkflowStatus::NotStarted);
        assert_eq!(coordinator.hub().pending("starter"), 0);
        drop(guard);

        let notified = task.await.unwrap().unwrap();
        assert_eq!(notified, vec!["starter".to_string()]);
        assert_eq!(coordinator.hub().pending("starter"), 1);
        assert_eq!(coordinator.workflow_state().await.status, WorkflowStatus::Running);
    }

    #[tokio::test]
    async fn test_join_within_stops_stuck_agents() {
        struct Forever;

        #[async_trait]
        impl Agent for Forever {
            fn name(&self) -> &str {
                "forever"
            }
            fn capabilities(&self) -> Vec<AgentCapability> {
                Vec::new()
            }
            async fn on_start(&self, ctx: &AgentContext) -> anyhow::Result<()> {
                ctx.begin_task("never_done").await;
                Ok(())
            }
            async fn process_message(
                &self,
                _ctx: &AgentContext,
                _message: &Message,
            ) -> anyhow::Result<Option<Message>> {
                Ok(None)
            }
            async fn decide_next_action(&self, _ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
                Ok(None)
            }
        }

        let coordinator = coordinator();
        coordinator.register(Box::new(Forever)).await.unwrap();
        let report = coordinator
            .spawn_agents()
            .join_within(Duration::from_millis(50))
            .await;
        assert_eq!(report.outcomes.get("forever"), Some(&AgentOutcome::Stopped));
        assert_eq!(report.failures(), vec!["forever"]);
    }

    #[tokio::test]
    async fn test_system_state_snapshot() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();
        coordinator.start_workflow(Goal::new("job", json!({}))).await.unwrap();

        let state = coordinator.system_state().await;
        let starter = state.agents.get("starter").unwrap();
        assert_eq!(starter.state, AgentState::Idle);
        assert_eq!(starter.capabilities, vec!["finish".to_string(), "finish_again".to_string()]);
        assert_eq!(state.workflow.status, WorkflowStatus::Running);
        assert_eq!(state.recent_messages.len(), 1);

        // serializable for observability
        assert!(serde_json::to_value(&state).is_ok());
    }

    #[tokio::test]
    async fn test_drive_until_quiet() {
        let coordinator = coordinator();
        coordinator.register(Finisher::boxed("starter", &["job"], true)).await.unwrap();
        coordinator.start_workflow(Goal::new("job", json!({}))).await.unwrap();

        let handled = coordinator.drive_until_quiet(10).await;
        assert_eq!(handled, 1);
        let inbox = coordinator.hub().receive("orchestrator");
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].message_type(), MessageType::WorkflowComplete);
    }
}
