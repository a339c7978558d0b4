//! Question generator - builds the FAQ question set on request

use super::WorkerNames;
use crate::agent::{Agent, AgentCapability, AgentContext};
use crate::content::generate_questions;
use crate::intents::{Coordination, CoordinationAck, DataQuery, DataReply, Status};
use crate::message::{Message, MessageType};
use async_trait::async_trait;
use common::QuestionEntry;
use tracing::{debug, info};

const GENERATE_TASK: &str = "generate_questions";
const LATEST_QUESTIONS: &str = "latest_questions";
const NOTIFIED: &str = "notified_page_assembler";

pub struct QuestionGenerator {
    names: WorkerNames,
}

impl QuestionGenerator {
    pub fn new(names: WorkerNames) -> Self {
        Self { names }
    }

    /// QuestionsReady for the page assembler, once per generated set
    fn readiness_notice(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
        let Some(questions) = ctx.recall::<Vec<QuestionEntry>>(LATEST_QUESTIONS)? else {
            return Ok(None);
        };
        if !ctx.raise_flag(NOTIFIED) {
            return Ok(None);
        }
        let notice = Coordination::QuestionsReady { questions };
        Ok(Some(Message::from_intent(
            ctx.name(),
            self.names.page_assembler.as_str(),
            &notice,
        )?))
    }
}

#[async_trait]
impl Agent for QuestionGenerator {
    fn name(&self) -> &str {
        &self.names.question_generator
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        vec![AgentCapability::new("generate_questions", "Generate categorized user questions about products")
            .inputs(&["parsed_product", "coordination_request"])
            .outputs(&["questions_list", "categorized_questions"])
            .coordinates(true)]
    }

    async fn on_start(&self, ctx: &AgentContext) -> anyhow::Result<()> {
        ctx.begin_task(GENERATE_TASK).await;
        Ok(())
    }

    async fn process_message(
        &self,
        ctx: &AgentContext,
        message: &Message,
    ) -> anyhow::Result<Option<Message>> {
        match message.message_type() {
            MessageType::CoordinationRequest => match message.decode::<Coordination>()? {
                Coordination::GenerateQuestions { product_data } => {
                    let questions = generate_questions(&product_data);
                    info!(
                        "{} generated {} questions for {}",
                        ctx.name(),
                        questions.len(),
                        product_data.name
                    );
                    ctx.remember(LATEST_QUESTIONS, &questions)?;
                    ctx.raise_flag("questions_generated");

                    if let Some(notice) = self.readiness_notice(ctx)? {
                        ctx.send(notice);
                    }
                    ctx.complete_task(GENERATE_TASK).await;

                    let ack = CoordinationAck {
                        status: Status::Completed,
                        action: GENERATE_TASK.to_string(),
                        total_items: questions.len(),
                    };
                    Ok(Some(message.reply(ctx.name(), &ack)?))
                }
                other => anyhow::bail!("{} cannot handle {}", ctx.name(), other.action()),
            },
            MessageType::DataRequest => match message.decode::<DataQuery>()? {
                DataQuery::LatestQuestions => {
                    let Some(questions) = ctx.recall::<Vec<QuestionEntry>>(LATEST_QUESTIONS)? else {
                        anyhow::bail!("no questions generated yet");
                    };
                    Ok(Some(message.reply(ctx.name(), &DataReply::Questions { questions })?))
                }
                other => anyhow::bail!("{} cannot serve {:?}", ctx.name(), other),
            },
            other => {
                debug!("{} ignoring {} from {}", ctx.name(), other, message.sender());
                Ok(None)
            }
        }
    }

    async fn decide_next_action(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
        self.readiness_notice(ctx)
    }
}
