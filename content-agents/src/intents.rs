//! Typed payloads, one closed set per message type
//!
//! Agents never look at raw `action` / `request` strings. Each message type
//! decodes into one of these types and handlers match on it exhaustively; an
//! unknown tag fails decoding and is reported back as a handler fault.

use crate::message::{Intent, MessageType};
use common::{Page, ProductRecord, QuestionEntry};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Outcome tag shared by responses and status updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Completed,
    Error,
}

/// Work to be initiated; the `type` is matched against capability input types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    #[serde(rename = "type")]
    pub goal_type: String,
    #[serde(default)]
    pub data: Value,
}

impl Goal {
    pub fn new(goal_type: impl Into<String>, data: Value) -> Self {
        Self {
            goal_type: goal_type.into(),
            data,
        }
    }
}

impl Intent for Goal {
    const MESSAGE_TYPE: MessageType = MessageType::TaskRequest;
}

/// Reply to a task request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskReport {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed_product: Option<ProductRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
}

impl Intent for TaskReport {
    const MESSAGE_TYPE: MessageType = MessageType::TaskResponse;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum DataQuery {
    LatestProduct,
    LatestQuestions,
    LatestCompetitor,
}

impl Intent for DataQuery {
    const MESSAGE_TYPE: MessageType = MessageType::DataRequest;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data", rename_all = "snake_case")]
pub enum DataReply {
    ParsedProduct { parsed_product: ProductRecord },
    Questions { questions: Vec<QuestionEntry> },
    Competitor { competitor: ProductRecord },
}

impl Intent for DataReply {
    const MESSAGE_TYPE: MessageType = MessageType::DataResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Coordination {
    GenerateQuestions { product_data: ProductRecord },
    GenerateCompetitor { product_data: ProductRecord },
    QuestionsReady { questions: Vec<QuestionEntry> },
    CompetitorReady { competitor: ProductRecord },
}

impl Coordination {
    pub fn action(&self) -> &'static str {
        match self {
            Coordination::GenerateQuestions { .. } => "generate_questions",
            Coordination::GenerateCompetitor { .. } => "generate_competitor",
            Coordination::QuestionsReady { .. } => "questions_ready",
            Coordination::CompetitorReady { .. } => "competitor_ready",
        }
    }
}

impl Intent for Coordination {
    const MESSAGE_TYPE: MessageType = MessageType::CoordinationRequest;
}

/// Acknowledges a coordination request once the requested work is done
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationAck {
    pub status: Status,
    pub action: String,
    pub total_items: usize,
}

impl Intent for CoordinationAck {
    const MESSAGE_TYPE: MessageType = MessageType::CoordinationResponse;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub correlation_id: Option<Uuid>,
}

impl StatusReport {
    pub fn error(description: impl Into<String>, correlation_id: Option<Uuid>) -> Self {
        Self {
            status: Status::Error,
            error: Some(description.into()),
            correlation_id,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

impl Intent for StatusReport {
    const MESSAGE_TYPE: MessageType = MessageType::StatusUpdate;
}

/// Completion signal sent by the page assembler to the coordinator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub status: Status,
    pub pages: Vec<Page>,
    pub total_pages: usize,
}

impl WorkflowOutcome {
    pub fn completed(pages: Vec<Page>) -> Self {
        Self {
            status: Status::Completed,
            total_pages: pages.len(),
            pages,
        }
    }
}

impl Intent for WorkflowOutcome {
    const MESSAGE_TYPE: MessageType = MessageType::WorkflowComplete;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;
    use serde_json::json;

    #[test]
    fn test_goal_uses_type_key() {
        let goal = Goal::new("product_dataset", json!({"Product Name": "X"}));
        let message = Message::from_intent("orchestrator", "parser", &goal).unwrap();
        assert_eq!(message.payload()["type"], json!("product_dataset"));
        assert_eq!(message.decode::<Goal>().unwrap(), goal);
    }

    #[test]
    fn test_query_tags() {
        let message = Message::from_intent("a", "b", &DataQuery::LatestCompetitor).unwrap();
        assert_eq!(message.payload()["request"], json!("latest_competitor"));
    }

    #[test]
    fn test_status_report_error() {
        let correlation = Some(Uuid::new_v4());
        let report = StatusReport::error("boom", correlation);
        assert!(report.is_error());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["status"], json!("error"));
        assert_eq!(value["error"], json!("boom"));
    }
}
