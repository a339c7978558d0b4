//! Mailbox hub - per-agent queues, topic subscriptions and the message log
//!
//! The hub is the only transport between agents. Queues are unbounded and
//! sends never block or drop; every message is appended to the log exactly
//! once whether or not its receiver ever polls. An envelope whose id is
//! already logged is refused.

use crate::message::{Message, MessageType, Payload};
use dashmap::DashMap;
use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Topic that receives every broadcast
pub const ALL_TOPICS: &str = "*";

#[derive(Debug, Default)]
pub struct MailboxHub {
    queues: DashMap<String, VecDeque<Arc<Message>>>,
    subscribers: DashMap<String, HashSet<String>>,
    log: Mutex<MessageLog>,
}

#[derive(Debug, Default)]
struct MessageLog {
    entries: Vec<Arc<Message>>,
    ids: HashSet<Uuid>,
}

impl MailboxHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe an agent to a topic. Idempotent.
    pub fn subscribe(&self, agent_name: &str, topic: &str) {
        let added = self
            .subscribers
            .entry(topic.to_string())
            .or_default()
            .insert(agent_name.to_string());
        if added {
            debug!("{} subscribed to {}", agent_name, topic);
        }
    }

    /// Remove a subscription. Absent subscriptions are ignored.
    pub fn unsubscribe(&self, agent_name: &str, topic: &str) {
        if let Some(mut set) = self.subscribers.get_mut(topic) {
            set.remove(agent_name);
        }
    }

    /// Agents subscribed to exactly this topic, sorted
    pub fn subscribers_of(&self, topic: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .subscribers
            .get(topic)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Enqueue a message for its receiver and append it to the log.
    /// Returns `None` without delivering if the id was already sent.
    pub fn send(&self, message: Message) -> Option<Uuid> {
        let id = message.id();
        let mut log = self.log();
        if !log.ids.insert(id) {
            warn!(
                "Dropping duplicate message {} from {} to {}",
                id,
                message.sender(),
                message.receiver()
            );
            return None;
        }
        debug!(
            "{} -> {}: {} ({})",
            message.sender(),
            message.receiver(),
            message.message_type(),
            id
        );

        // enqueue under the log lock so queue order matches log order
        let message = Arc::new(message);
        log.entries.push(Arc::clone(&message));
        self.queues
            .entry(message.receiver().to_string())
            .or_default()
            .push_back(message);
        Some(id)
    }

    /// Fan a message out to every subscriber of the type's topic or of `*`,
    /// never to the sender. Returns the ids of the synthesized messages.
    pub fn broadcast(&self, sender: &str, message_type: MessageType, payload: Payload) -> Vec<Uuid> {
        let mut recipients = BTreeSet::new();
        for topic in [message_type.topic(), ALL_TOPICS] {
            if let Some(set) = self.subscribers.get(topic) {
                recipients.extend(set.iter().cloned());
            }
        }
        recipients.remove(sender);

        recipients
            .into_iter()
            .filter_map(|recipient| {
                self.send(Message::new(sender, recipient, message_type, payload.clone()))
            })
            .collect()
    }

    /// Drain the agent's queue, oldest first. Unknown or empty queues yield nothing.
    pub fn receive(&self, agent_name: &str) -> Vec<Arc<Message>> {
        match self.queues.get_mut(agent_name) {
            Some(mut queue) => queue.drain(..).collect(),
            None => Vec::new(),
        }
    }

    /// Number of messages waiting for an agent
    pub fn pending(&self, agent_name: &str) -> usize {
        self.queues.get(agent_name).map(|q| q.len()).unwrap_or(0)
    }

    /// Full message log in send order
    pub fn message_log(&self) -> Vec<Arc<Message>> {
        self.log().entries.clone()
    }

    /// The last `n` logged messages, oldest first
    pub fn recent(&self, n: usize) -> Vec<Arc<Message>> {
        let log = self.log();
        let start = log.entries.len().saturating_sub(n);
        log.entries[start..].to_vec()
    }

    pub fn log_len(&self) -> usize {
        self.log().entries.len()
    }

    fn log(&self) -> MutexGuard<'_, MessageLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
