//! Data parser - turns the raw product dataset into a `ProductRecord`

use super::{coordination_task, WorkerNames};
use crate::agent::{Agent, AgentCapability, AgentContext};
use crate::error::{CoordinationError, Result};
use crate::intents::{
    Coordination, CoordinationAck, DataQuery, DataReply, Goal, Status, StatusReport, TaskReport,
};
use crate::message::{Message, MessageType};
use async_trait::async_trait;
use common::{ProductCategory, ProductRecord};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

const GOAL_TYPES: [&str; 2] = ["raw_product_data", "product_dataset"];
const PARSE_TASK: &str = "parse_product";
const LATEST_PRODUCT: &str = "latest_parsed_product";
const PARSED_COUNT: &str = "parsed_count";
const PENDING_REQUESTS: &str = "pending_product_requests";
const COORDINATED_QUESTIONS: &str = "coordinated_questions";
const COORDINATED_COMPETITOR: &str = "coordinated_competitor";

lazy_static! {
    static ref LIST_SEPARATOR: Regex = Regex::new(r"[,，|]\s*|\s+and\s+|\s*[-–—]\s*").unwrap();
}

/// A list given either as items or as one delimited string
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<String>),
    Text(String),
}

impl ListField {
    fn into_items(self) -> Vec<String> {
        let items: Vec<String> = match self {
            ListField::Items(items) => items,
            ListField::Text(text) => LIST_SEPARATOR.split(&text).map(str::to_string).collect(),
        };
        items
            .into_iter()
            .map(|item| item.trim().to_string())
            .filter(|item| item.chars().count() > 1)
            .collect()
    }
}

/// Incoming dataset; accepts the spreadsheet-style keys or the record's own
/// field names
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawProductData {
    #[serde(rename = "Product Name", alias = "name", default)]
    pub name: Option<String>,
    #[serde(rename = "Concentration", alias = "concentration", default)]
    pub concentration: Option<String>,
    #[serde(rename = "Skin Type", alias = "skin_types", default)]
    pub skin_types: Option<ListField>,
    #[serde(rename = "Key Ingredients", alias = "key_ingredients", default)]
    pub key_ingredients: Option<ListField>,
    #[serde(rename = "Benefits", alias = "benefits", default)]
    pub benefits: Option<ListField>,
    #[serde(rename = "How to Use", alias = "usage_instructions", alias = "usage", default)]
    pub usage_instructions: Option<String>,
    #[serde(rename = "Side Effects", alias = "side_effects", default)]
    pub side_effects: Option<String>,
    #[serde(rename = "Price", alias = "price", default)]
    pub price: Option<String>,
}

fn clean(field: Option<String>) -> String {
    field.map(|s| s.trim().to_string()).unwrap_or_default()
}

fn clean_list(field: Option<ListField>) -> Vec<String> {
    field.map(ListField::into_items).unwrap_or_default()
}

/// Parse a dataset object into a product record with the given id
pub fn parse_product(data: &Value, id: impl Into<String>) -> Result<ProductRecord> {
    let raw: RawProductData = serde_json::from_value(data.clone())?;

    let name = clean(raw.name);
    if name.is_empty() {
        return Err(CoordinationError::MissingField("Product Name".to_string()));
    }

    Ok(ProductRecord {
        id: id.into(),
        category: ProductCategory::infer(&name),
        name,
        concentration: clean(raw.concentration),
        skin_types: clean_list(raw.skin_types),
        key_ingredients: clean_list(raw.key_ingredients),
        benefits: clean_list(raw.benefits),
        usage_instructions: clean(raw.usage_instructions),
        side_effects: clean(raw.side_effects),
        price: clean(raw.price),
    })
}

/// Fields a parsed record is missing. Empty means the record is complete.
pub fn validate_product(product: &ProductRecord) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if product.concentration.is_empty() {
        missing.push("concentration");
    }
    if product.skin_types.is_empty() {
        missing.push("skin_types");
    }
    if product.key_ingredients.is_empty() {
        missing.push("key_ingredients");
    }
    if product.benefits.is_empty() {
        missing.push("benefits");
    }
    if product.usage_instructions.is_empty() {
        missing.push("usage_instructions");
    }
    if product.price.is_empty() {
        missing.push("price");
    }
    missing
}

/// A product request that arrived before anything was parsed
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PendingRequest {
    requester: String,
    correlation_id: Option<Uuid>,
    task_id: String,
}

pub struct DataParser {
    names: WorkerNames,
}

impl DataParser {
    pub fn new(names: WorkerNames) -> Self {
        Self { names }
    }

    /// Build a coordination request unless `flag` shows it was already sent
    async fn request_generation(
        &self,
        ctx: &AgentContext,
        flag: &str,
        receiver: &str,
        request: Coordination,
    ) -> anyhow::Result<Option<Message>> {
        if !ctx.raise_flag(flag) {
            return Ok(None);
        }
        let correlation = Uuid::new_v4();
        ctx.begin_task(&coordination_task(correlation)).await;
        debug!("{} requesting {} from {}", ctx.name(), request.action(), receiver);
        Ok(Some(
            Message::from_intent(ctx.name(), receiver, &request)?.with_correlation(Some(correlation)),
        ))
    }

    /// The next coordination request still to be sent, if any
    async fn next_coordination(
        &self,
        ctx: &AgentContext,
        product: &ProductRecord,
    ) -> anyhow::Result<Option<Message>> {
        let questions = self
            .request_generation(
                ctx,
                COORDINATED_QUESTIONS,
                &self.names.question_generator,
                Coordination::GenerateQuestions {
                    product_data: product.clone(),
                },
            )
            .await?;
        if questions.is_some() {
            return Ok(questions);
        }

        self.request_generation(
            ctx,
            COORDINATED_COMPETITOR,
            &self.names.rival_generator,
            Coordination::GenerateCompetitor {
                product_data: product.clone(),
            },
        )
        .await
    }

    async fn serve_pending(&self, ctx: &AgentContext, product: &ProductRecord) -> anyhow::Result<()> {
        let pending: Vec<PendingRequest> = ctx.recall(PENDING_REQUESTS)?.unwrap_or_default();
        for request in &pending {
            let reply = DataReply::ParsedProduct {
                parsed_product: product.clone(),
            };
            ctx.send(
                Message::from_intent(ctx.name(), request.requester.as_str(), &reply)?
                    .with_correlation(request.correlation_id),
            );
            ctx.complete_task(&request.task_id).await;
        }
        if !pending.is_empty() {
            ctx.update_knowledge(PENDING_REQUESTS, json!([]));
        }
        Ok(())
    }

    async fn handle_task(&self, ctx: &AgentContext, message: &Message) -> anyhow::Result<Option<Message>> {
        let goal: Goal = message.decode()?;
        if !GOAL_TYPES.contains(&goal.goal_type.as_str()) {
            anyhow::bail!("unsupported goal type {}", goal.goal_type);
        }

        let count = ctx.recall::<usize>(PARSED_COUNT)?.unwrap_or(0) + 1;
        let product = parse_product(&goal.data, format!("product_{}", count))?;
        let missing = validate_product(&product);
        if !missing.is_empty() {
            warn!("{} parsed {} with empty fields: {:?}", ctx.name(), product.name, missing);
        }

        ctx.remember(LATEST_PRODUCT, &product)?;
        ctx.update_knowledge(PARSED_COUNT, json!(count));
        info!("{} parsed {} as {}", ctx.name(), product.name, product.id);

        while let Some(request) = self.next_coordination(ctx, &product).await? {
            ctx.send(request);
        }

        let push = DataReply::ParsedProduct {
            parsed_product: product.clone(),
        };
        ctx.send(Message::from_intent(ctx.name(), self.names.page_assembler.as_str(), &push)?);
        self.serve_pending(ctx, &product).await?;
        ctx.complete_task(PARSE_TASK).await;

        let report = TaskReport {
            status: Status::Completed,
            product_id: Some(product.id.clone()),
            parsed_product: Some(product),
        };
        Ok(Some(message.reply(ctx.name(), &report)?))
    }

    async fn handle_data_request(
        &self,
        ctx: &AgentContext,
        message: &Message,
    ) -> anyhow::Result<Option<Message>> {
        match message.decode::<DataQuery>()? {
            DataQuery::LatestProduct => match ctx.recall::<ProductRecord>(LATEST_PRODUCT)? {
                Some(product) => {
                    let reply = DataReply::ParsedProduct {
                        parsed_product: product,
                    };
                    Ok(Some(message.reply(ctx.name(), &reply)?))
                }
                None => {
                    let task_id = format!("serve:{}", message.id());
                    ctx.begin_task(&task_id).await;
                    let mut pending: Vec<PendingRequest> =
                        ctx.recall(PENDING_REQUESTS)?.unwrap_or_default();
                    pending.push(PendingRequest {
                        requester: message.sender().to_string(),
                        correlation_id: message.correlation_id(),
                        task_id,
                    });
                    ctx.remember(PENDING_REQUESTS, &pending)?;
                    debug!("{} deferred product request from {}", ctx.name(), message.sender());
                    Ok(None)
                }
            },
            other => anyhow::bail!("{} cannot serve {:?}", ctx.name(), other),
        }
    }
}

#[async_trait]
impl Agent for DataParser {
    fn name(&self) -> &str {
        &self.names.data_parser
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        vec![
            AgentCapability::new("parse_product_data", "Parse raw product data into structured format")
                .inputs(&GOAL_TYPES)
                .outputs(&["parsed_product", "structured_product"])
                .initiates(true),
            AgentCapability::new("validate_data", "Validate parsed product data")
                .inputs(&["parsed_product"])
                .outputs(&["validation_result"]),
        ]
    }

    async fn on_start(&self, ctx: &AgentContext) -> anyhow::Result<()> {
        ctx.begin_task(PARSE_TASK).await;
        Ok(())
    }

    async fn process_message(
        &self,
        ctx: &AgentContext,
        message: &Message,
    ) -> anyhow::Result<Option<Message>> {
        match message.message_type() {
            MessageType::TaskRequest => self.handle_task(ctx, message).await,
            MessageType::DataRequest => self.handle_data_request(ctx, message).await,
            MessageType::CoordinationResponse => {
                let ack: CoordinationAck = message.decode()?;
                if let Some(correlation) = message.correlation_id() {
                    ctx.complete_task(&coordination_task(correlation)).await;
                }
                debug!(
                    "{} got {} ack from {}: {} items",
                    ctx.name(),
                    ack.action,
                    message.sender(),
                    ack.total_items
                );
                Ok(None)
            }
            MessageType::StatusUpdate => {
                let report: StatusReport = message.decode()?;
                if report.is_error() {
                    warn!(
                        "{} received error from {}: {}",
                        ctx.name(),
                        message.sender(),
                        report.error.as_deref().unwrap_or("unknown")
                    );
                    // a failed coordination request will never be acknowledged
                    if let Some(correlation) = report.correlation_id {
                        ctx.complete_task(&coordination_task(correlation)).await;
                    }
                }
                Ok(None)
            }
            other => {
                debug!("{} ignoring {} from {}", ctx.name(), other, message.sender());
                Ok(None)
            }
        }
    }

    async fn decide_next_action(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
        match ctx.recall::<ProductRecord>(LATEST_PRODUCT)? {
            Some(product) => self.next_coordination(ctx, &product).await,
            None => Ok(None),
        }
    }
}
