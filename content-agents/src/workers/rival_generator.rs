//! Rival generator - synthesizes the competitor product on request

use super::WorkerNames;
use crate::agent::{Agent, AgentCapability, AgentContext};
use crate::content::RivalFactory;
use crate::intents::{Coordination, CoordinationAck, DataQuery, DataReply, Status};
use crate::message::{Message, MessageType};
use async_trait::async_trait;
use common::ProductRecord;
use tracing::{debug, info};

const GENERATE_TASK: &str = "generate_competitor";
const LATEST_COMPETITOR: &str = "latest_competitor";
const NOTIFIED: &str = "notified_page_assembler";

pub struct RivalGenerator {
    names: WorkerNames,
    factory: RivalFactory,
}

impl RivalGenerator {
    pub fn new(names: WorkerNames, seed: Option<u64>) -> Self {
        Self {
            names,
            factory: RivalFactory::new(seed),
        }
    }

    fn readiness_notice(&self, ctx: &AgentContext) -> anyhow::Result<Option<Message>> {
        let Some(competitor) = ctx.recall::<ProductRecord>(LATEST_COMPETITOR)? else {
            return Ok(None);
        };
        if !ctx.raise_flag(NOTIFIED) {
            return Ok(None);
        }
        Ok(Some(Message::from_intent(
            ctx.name(),
            self.names.page_assembler.as_str(),
            &Coordination::CompetitorReady { competitor },
        )?))
    }
}

#[async_trait]
impl Agent for RivalGenerator {
    fn name(&self) -> &str {
        &self.names.rival_generator
    }

    fn capabilities(&self) -> Vec<AgentCapability> {
        vec![AgentCapability::new("generate_competitor", "Generate fictional competitor product data")
            .inputs(&["parsed_product", "coordination_request"])
            .outputs(&["competitor_product", "product_b"])
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
                Coordination::GenerateCompetitor { product_data } => {
                    let competitor = self.factory.synthesize(&product_data);
                    info!("{} created competitor {}", ctx.name(), competitor.name);
                    ctx.remember(LATEST_COMPETITOR, &competitor)?;
                    ctx.raise_flag("competitor_generated");

                    if let Some(notice) = self.readiness_notice(ctx)? {
                        ctx.send(notice);
                    }
                    ctx.complete_task(GENERATE_TASK).await;

                    let ack = CoordinationAck {
                        status: Status::Completed,
                        action: GENERATE_TASK.to_string(),
                        total_items: 1,
                    };
                    Ok(Some(message.reply(ctx.name(), &ack)?))
                }
                other => anyhow::bail!("{} cannot handle {}", ctx.name(), other.action()),
            },
            MessageType::DataRequest => match message.decode::<DataQuery>()? {
                DataQuery::LatestCompetitor => {
                    let Some(competitor) = ctx.recall::<ProductRecord>(LATEST_COMPETITOR)? else {
                        anyhow::bail!("no competitor generated yet");
                    };
                    Ok(Some(message.reply(ctx.name(), &DataReply::Competitor { competitor })?))
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
