//! The four content workers
//!
//! - `DataParser` turns the raw dataset into a `ProductRecord` and asks the
//!   generators for their output
//! - `QuestionGenerator` builds the FAQ question set
//! - `RivalGenerator` synthesizes the comparison product
//! - `PageAssembler` renders the pages once product, questions and competitor
//!   are all known, then signals WORKFLOW_COMPLETE
//!
//! Every worker opens a standing task in `on_start`, so an autonomous loop
//! waits for its input instead of going idle before the first message lands.

pub mod data_parser;
pub mod page_assembler;
pub mod question_generator;
pub mod rival_generator;

pub use data_parser::{parse_product, DataParser, RawProductData};
pub use page_assembler::PageAssembler;
pub use question_generator::QuestionGenerator;
pub use rival_generator::RivalGenerator;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mailbox names the workers address each other by
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerNames {
    pub data_parser: String,
    pub question_generator: String,
    pub rival_generator: String,
    pub page_assembler: String,
    pub coordinator: String,
}

impl Default for WorkerNames {
    fn default() -> Self {
        Self::with_coordinator("orchestrator")
    }
}

impl WorkerNames {
    pub fn with_coordinator(coordinator: impl Into<String>) -> Self {
        Self {
            data_parser: "data-parser".to_string(),
            question_generator: "question-generator".to_string(),
            rival_generator: "rival-generator".to_string(),
            page_assembler: "page-assembler".to_string(),
            coordinator: coordinator.into(),
        }
    }
}

/// Task id for an outstanding coordination request
pub(crate) fn coordination_task(correlation_id: Uuid) -> String {
    format!("coordination:{}", correlation_id)
}
