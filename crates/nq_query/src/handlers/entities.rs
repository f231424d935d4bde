use async_trait::async_trait;
use nq_core::{AggregateField, ChatResponse, Plan, ResponseType, Result};

use super::{decode_args, CommandHandler, HandlerContext};
use crate::args::{effective_limit, EntityArgs};

pub struct TopEntitiesHandler {
    ctx: HandlerContext,
}

impl TopEntitiesHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for TopEntitiesHandler {
    async fn handle(&self, plan: &Plan, _query: &str) -> Result<ChatResponse> {
        let args: EntityArgs = match decode_args(plan) {
            Ok(args) => args,
            Err(soft) => return Ok(soft),
        };
        let limit = effective_limit(args.limit, self.ctx.config.top_n);

        let rows = self
            .ctx
            .store
            .aggregate(AggregateField::Entities, args.scope(), limit)
            .await?;

        if rows.is_empty() {
            return Ok(ChatResponse::text(&plan.command, "No entities found."));
        }

        let lines: Vec<String> = rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                format!(
                    "{}. {} (mentioned in {} article{}, average confidence {:.2})",
                    i + 1,
                    row.name,
                    row.count,
                    if row.count == 1 { "" } else { "s" },
                    row.avg_score
                )
            })
            .collect();

        Ok(ChatResponse::text(&plan.command, format!("Top entities:\n{}", lines.join("\n")))
            .with_type(ResponseType::Data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::{article, context, entity};
    use crate::testing::MockModel;
    use serde_json::json;

    #[tokio::test]
    async fn test_most_frequent_entity_first() {
        let mut first = article("http://a.com/", "A", 0.5);
        first.entities = vec![entity("A", 0.9), entity("B", 0.8)];
        let mut second = article("http://b.com/", "B", 0.5);
        second.entities = vec![entity("A", 0.8), entity("C", 0.7)];
        let (ctx, _) = context(vec![first, second], MockModel::new()).await;

        let response = TopEntitiesHandler::new(ctx)
            .handle(&Plan::new("get_top_entities", json!({"limit": 2})), "who?")
            .await
            .unwrap();

        assert_eq!(response.response_type, ResponseType::Data);
        let lines: Vec<&str> = response.answer.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "1. A (mentioned in 2 articles, average confidence 0.85)");
        assert!(lines[2].starts_with("2. B (mentioned in 1 article,"));
    }

    #[tokio::test]
    async fn test_scoped_to_urls() {
        let mut first = article("http://a.com/", "A", 0.5);
        first.entities = vec![entity("Senate", 0.9)];
        let mut second = article("http://b.com/", "B", 0.5);
        second.entities = vec![entity("Court", 0.8)];
        let (ctx, _) = context(vec![first, second], MockModel::new()).await;

        let response = TopEntitiesHandler::new(ctx)
            .handle(&Plan::new("get_top_entities", json!({"urls": ["http://b.com/"]})), "who?")
            .await
            .unwrap();
        assert!(response.answer.contains("Court"));
        assert!(!response.answer.contains("Senate"));
    }

    #[tokio::test]
    async fn test_empty_store() {
        let (ctx, _) = context(vec![], MockModel::new()).await;
        let response = TopEntitiesHandler::new(ctx)
            .handle(&Plan::new("get_top_entities", json!({})), "who?")
            .await
            .unwrap();
        assert_eq!(response.answer, "No entities found.");
    }
}
