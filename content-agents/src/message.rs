//! Message envelope exchanged through the mailbox hub
//!
//! A `Message` is immutable once built: fields are private and there are no
//! setters. The hub takes ownership on send and shares the envelope behind an
//! `Arc`, so neither the sender nor the receiver can mutate a queued payload.

use crate::error::{CoordinationError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Reserved receiver name for fan-out messages
pub const BROADCAST: &str = "broadcast";

/// Message payload: string keys to arbitrary structured values
pub type Payload = Map<String, Value>;

/// Closed set of message types. The snake_case name doubles as the
/// subscription topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    TaskRequest,
    TaskResponse,
    DataRequest,
    DataResponse,
    CoordinationRequest,
    CoordinationResponse,
    StatusUpdate,
    WorkflowComplete,
}

impl MessageType {
    pub const ALL: [MessageType; 8] = [
        MessageType::TaskRequest,
        MessageType::TaskResponse,
        MessageType::DataRequest,
        MessageType::DataResponse,
        MessageType::CoordinationRequest,
        MessageType::CoordinationResponse,
        MessageType::StatusUpdate,
        MessageType::WorkflowComplete,
    ];

    /// Subscription topic for this type
    pub fn topic(&self) -> &'static str {
        match self {
            MessageType::TaskRequest => "task_request",
            MessageType::TaskResponse => "task_response",
            MessageType::DataRequest => "data_request",
            MessageType::DataResponse => "data_response",
            MessageType::CoordinationRequest => "coordination_request",
            MessageType::CoordinationResponse => "coordination_response",
            MessageType::StatusUpdate => "status_update",
            MessageType::WorkflowComplete => "workflow_complete",
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.topic().to_uppercase())
    }
}

/// A typed payload bound to exactly one message type
pub trait Intent: Serialize + DeserializeOwned {
    const MESSAGE_TYPE: MessageType;
}

/// Envelope passed between agents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    id: Uuid,
    sender: String,
    receiver: String,
    message_type: MessageType,
    payload: Payload,
    timestamp: DateTime<Utc>,
    correlation_id: Option<Uuid>,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        message_type: MessageType,
        payload: Payload,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender: sender.into(),
            receiver: receiver.into(),
            message_type,
            payload,
            timestamp: Utc::now(),
            correlation_id: None,
        }
    }

    /// Build a message whose payload is a serialized intent
    pub fn from_intent<I: Intent>(
        sender: impl Into<String>,
        receiver: impl Into<String>,
        intent: &I,
    ) -> Result<Self> {
        let payload = match serde_json::to_value(intent)? {
            Value::Object(map) => map,
            other => {
                return Err(CoordinationError::MalformedPayload {
                    message_type: I::MESSAGE_TYPE,
                    reason: format!("intent serialized to non-object value {}", other),
                })
            }
        };
        Ok(Self::new(sender, receiver, I::MESSAGE_TYPE, payload))
    }

    /// Attach a correlation id while the message is still being built
    pub fn with_correlation(mut self, correlation_id: Option<Uuid>) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// Build a reply addressed to this message's sender, carrying its correlation id
    pub fn reply<I: Intent>(&self, sender: impl Into<String>, intent: &I) -> Result<Self> {
        Ok(Self::from_intent(sender, self.sender.clone(), intent)?
            .with_correlation(self.correlation_id))
    }

    /// Decode the payload into the intent type registered for this message type
    pub fn decode<I: Intent>(&self) -> Result<I> {
        if self.message_type != I::MESSAGE_TYPE {
            return Err(CoordinationError::IntentMismatch {
                expected: I::MESSAGE_TYPE,
                actual: self.message_type,
            });
        }
        serde_json::from_value(Value::Object(self.payload.clone())).map_err(|e| {
            CoordinationError::MalformedPayload {
                message_type: self.message_type,
                reason: e.to_string(),
            }
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn correlation_id(&self) -> Option<Uuid> {
        self.correlation_id
    }
}

/// Serializable copy of a logged message, used for exports and state snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: Uuid,
    pub sender: String,
    pub receiver: String,
    pub message_type: MessageType,
    pub payload: Payload,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
}

impl From<&Message> for MessageRecord {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            sender: message.sender.clone(),
            receiver: message.receiver.clone(),
            message_type: message.message_type,
            payload: message.payload.clone(),
            timestamp: message.timestamp,
            correlation_id: message.correlation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::{DataQuery, StatusReport};

    #[test]
    fn test_message_identity_is_unique() {
        let a = Message::new("a", "b", MessageType::TaskRequest, Payload::new());
        let b = Message::new("a", "b", MessageType::TaskRequest, Payload::new());
        assert_ne!(a.id(), b.id());
        assert!(a.correlation_id().is_none());
    }

    #[test]
    fn test_topics_are_snake_case() {
        assert_eq!(MessageType::CoordinationRequest.topic(), "coordination_request");
        assert_eq!(MessageType::WorkflowComplete.to_string(), "WORKFLOW_COMPLETE");
        let json = serde_json::to_string(&MessageType::DataResponse).unwrap();
        assert_eq!(json, "\"data_response\"");
    }

    #[test]
    fn test_reply_carries_correlation() {
        let correlation = Some(Uuid::new_v4());
        let request = Message::from_intent("page", "parser", &DataQuery::LatestProduct)
            .unwrap()
            .with_correlation(correlation);

        let reply = request.reply("parser", &StatusReport::error("nope", correlation)).unwrap();
        assert_eq!(reply.receiver(), "page");
        assert_eq!(reply.sender(), "parser");
        assert_eq!(reply.correlation_id(), correlation);
        assert_eq!(reply.message_type(), MessageType::StatusUpdate);
    }

    #[test]
    fn test_decode_rejects_wrong_type() {
        let message = Message::new("a", "b", MessageType::TaskResponse, Payload::new());
        let err = message.decode::<DataQuery>().unwrap_err();
        assert!(matches!(err, CoordinationError::IntentMismatch { .. }));
    }

    #[test]
    fn test_decode_rejects_unknown_tag() {
        let mut payload = Payload::new();
        payload.insert("request".to_string(), Value::String("latest_weather".to_string()));
        let message = Message::new("a", "b", MessageType::DataRequest, payload);
        let err = message.decode::<DataQuery>().unwrap_err();
        assert!(matches!(err, CoordinationError::MalformedPayload { .. }));
    }
}
