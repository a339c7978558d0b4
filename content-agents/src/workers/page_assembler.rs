//! Page assembler - renders the pages once all inputs are known
//!
//! Three monotonic flags gate generation: product data, questions and the
//! competitor. When all three are raised the pages are rendered exactly once
//! and WORKFLOW_COMPLETE goes to the coordinator.

use super::WorkerNames;
use crate::agent::{Agent, AgentCapability, AgentContext, AgentState};
use crate::content::{PageInput, TemplateProcessor};
use crate::intents::{Coordination, DataQuery, DataReply, StatusReport, WorkflowOutcome};
use crate::message::{Message, MessageType};
use async_trait::async_trait;
use common::{ProductRecord, QuestionEntry};
use tracing::{debug, info, warn};
use uuid::Uuid;

const ASSEMBLE_TASK: &str = "assemble_pages";

const PRODUCT_READY: &str = "product_data_ready";
const QUESTIONS_READY: &str = "questions_ready";
const COMPETITOR_READY: &str = "competitor_ready";
const PRODUCT_REQUESTED: &str = "product_data_requested";
const PAGES_GENERATED: &str = "pages_generated";

const PRODUCT: &str = "product_data";
const QUESTIONS: &str = "questions";
const COMPETITOR: &str = "competitor";
const PAGES: &str = "generated_pages";

pub struct PageAssembler {
    names: WorkerNames,
    templates: TemplateProcessor,
}

impl PageAssembler {
    pub fn new(names: WorkerNames) -> Self {
        Self {
            names,
            templates: TemplateProcessor::default(),
        }
    }

    /// One DATA_REQUEST for the product per run
    fn product_request(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
        if ctx.flag(PRODUCT_READY) || !ctx.raise_flag(PRODUCT_REQUESTED) {
            return Ok(None);
        }
        debug!("{} asking {} for the product", ctx.name(), self.names.data_parser);
        Ok(Some(
            Message::from_intent(
                ctx.name(),
                self.names.data_parser.as_str(),
                &DataQuery::LatestProduct,
            )?
            .with_correlation(Some(Uuid::new_v4())),
        ))
    }

    fn store_product(&self, ctx: &AgentContext, product: &ProductRecord) -> anyhow::Result<()> {
        ctx.remember(PRODUCT, product)?;
        ctx.raise_flag(PRODUCT_READY);
        Ok(())
    }

    fn store_questions(&self, ctx: &AgentContext, questions: &[QuestionEntry]) -> anyhow::Result<()> {
        ctx.remember(QUESTIONS, &questions)?;
        ctx.raise_flag(QUESTIONS_READY);
        Ok(())
    }

    fn store_competitor(&self, ctx: &AgentContext, competitor: &ProductRecord) -> anyhow::Result<()> {
        ctx.remember(COMPETITOR, competitor)?;
        ctx.raise_flag(COMPETITOR_READY);
        Ok(())
    }

    /// Render and announce the pages if every input is in and nothing has
    /// been generated yet
    async fn try_assemble(&self, ctx: &AgentContext) -> anyhow::Result<()> {
        let ready = [PRODUCT_READY, QUESTIONS_READY, COMPETITOR_READY]
            .iter()
            .all(|flag| ctx.flag(flag));
        if !ready || ctx.flag(PAGES_GENERATED) {
            return Ok(());
        }

        let (Some(product), Some(questions), Some(competitor)) = (
            ctx.recall::<ProductRecord>(PRODUCT)?,
            ctx.recall::<Vec<QuestionEntry>>(QUESTIONS)?,
            ctx.recall::<ProductRecord>(COMPETITOR)?,
        ) else {
            anyhow::bail!("readiness flags raised without stored inputs");
        };

        let input = PageInput {
            product: &product,
            competitor: Some(&competitor),
            questions: &questions,
        };
        let pages = self.templates.render_all(&input)?;
        ctx.remember(PAGES, &pages)?;
        ctx.raise_flag(PAGES_GENERATED);

        let outcome = WorkflowOutcome::completed(pages);
        info!(
            "{} assembled {} pages for {}",
            ctx.name(),
            outcome.total_pages,
            product.name
        );
        ctx.send(Message::from_intent(
            ctx.name(),
            self.names.coordinator.as_str(),
            &outcome,
        )?);

        ctx.complete_task(ASSEMBLE_TASK).await;
        ctx.set_state(AgentState::Completed).await;
        Ok(())
    }
}

#[async_trait]
impl Agent for PageAssembler {
    fn name(&self) -> &str {
        &self.names.page_assembler
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        vec![AgentCapability::new("generate_content", "Generate structured pages from product data")
            .inputs(&["coordination_request", "data_response"])
            .outputs(&["faq_page", "product_page", "comparison_page"])
            .coordinates(true)]
    }

    async fn on_start(&self, ctx: &AgentContext) -> anyhow::Result<()> {
        ctx.begin_task(ASSEMBLE_TASK).await;
        Ok(())
    }

    async fn process_message(
        &self,
        ctx: &AgentContext,
        message: &Message,
    ) -> anyhow::Result<Option<Message>> {
        match message.message_type() {
            MessageType::CoordinationRequest => match message.decode::<Coordination>()? {
                Coordination::QuestionsReady { questions } => self.store_questions(ctx, &questions)?,
                Coordination::CompetitorReady { competitor } => self.store_competitor(ctx, &competitor)?,
                other => anyhow::bail!("{} cannot handle {}", ctx.name(), other.action()),
            },
            MessageType::DataResponse => match message.decode::<DataReply>()? {
                DataReply::ParsedProduct { parsed_product } => self.store_product(ctx, &parsed_product)?,
                DataReply::Questions { questions } => self.store_questions(ctx, &questions)?,
                DataReply::Competitor { competitor } => self.store_competitor(ctx, &competitor)?,
            },
            MessageType::StatusUpdate => {
                let report: StatusReport = message.decode()?;
                if report.is_error() {
                    warn!(
                        "{} received error from {}: {}",
                        ctx.name(),
                        message.sender(),
                        report.error.as_deref().unwrap_or("unknown")
                    );
                }
            }
            other => debug!("{} ignoring {} from {}", ctx.name(), other, message.sender()),
        }

        self.try_assemble(ctx).await?;

        // questions and competitor are in but the product never arrived
        if ctx.flag(QUESTIONS_READY) && ctx.flag(COMPETITOR_READY) {
            return self.product_request(ctx);
        }
        Ok(None)
    }

    async fn decide_next_action(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
        self.product_request(ctx)
    }
}
