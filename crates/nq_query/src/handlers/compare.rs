use async_trait::async_trait;
use nq_core::{Article, ChatResponse, Plan, Result};
use tracing::debug;

use super::{decode_args, missing_urls, resolve_articles, CommandHandler, HandlerContext};
use crate::args::UrlArgs;
use crate::prompts;

pub const NOT_ENOUGH_ARTICLES: &str = "Could not find at least 2 articles to compare.";

/// The first two stored articles among the requested URLs, or the soft answer.
async fn resolve_pair(ctx: &HandlerContext, plan: &Plan) -> Result<std::result::Result<(Article, Article), ChatResponse>> {
    let args: UrlArgs = match decode_args(plan) {
        Ok(args) => args,
        Err(soft) => return Ok(Err(soft)),
    };
    if args.urls.len() < 2 {
        return Ok(Err(missing_urls(&plan.command, 2)));
    }

    let mut articles = resolve_articles(ctx.store.as_ref(), &args.urls).await?.into_iter();
    match (articles.next(), articles.next()) {
        (Some(first), Some(second)) => Ok(Ok((first, second))),
        _ => {
            debug!("Only some of {:?} are stored", args.urls);
            Ok(Err(ChatResponse::text(&plan.command, NOT_ENOUGH_ARTICLES)))
        }
    }
}

pub struct CompareArticlesHandler {
    ctx: HandlerContext,
}

impl CompareArticlesHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for CompareArticlesHandler {
    async fn handle(&self, plan: &Plan, query: &str) -> Result<ChatResponse> {
        let (first, second) = match resolve_pair(&self.ctx, plan).await? {
            Ok(pair) => pair,
            Err(soft) => return Ok(soft),
        };

        let prompt = prompts::comparison_prompt(query, &first, &second);
        let answer = self
            .ctx
            .model
            .generate_text(&prompt, self.ctx.config.synthesis_temperature)
            .await?;

        Ok(ChatResponse::text(&plan.command, answer.trim()).with_sources(vec![first.source(), second.source()]))
    }
}

pub struct ToneDifferencesHandler {
    ctx: HandlerContext,
}

impl ToneDifferencesHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for ToneDifferencesHandler {
    async fn handle(&self, plan: &Plan, query: &str) -> Result<ChatResponse> {
        let (first, second) = match resolve_pair(&self.ctx, plan).await? {
            Ok(pair) => pair,
            Err(soft) => return Ok(soft),
        };

        let prompt = prompts::tone_prompt(query, &first, &second);
        let answer = self
            .ctx
            .model
            .generate_text(&prompt, self.ctx.config.synthesis_temperature)
            .await?;

        Ok(ChatResponse::text(&plan.command, answer.trim()).with_sources(vec![first.source(), second.source()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::{article, context};
    use crate::testing::MockModel;
    use nq_core::Error;
    use serde_json::json;

    fn stored() -> Vec<Article> {
        vec![
            article("http://a.com/", "Budget passes", 0.7),
            article("http://b.com/", "Budget fails", 0.2),
        ]
    }

    #[tokio::test]
    async fn test_compare_uses_one_generation_call() {
        let (ctx, model) = context(stored(), MockModel::new().on("Compare the following", "  They disagree.  ")).await;
        let plan = Plan::new("compare_articles", json!({"urls": ["http://b.com/", "http://a.com/"]}));

        let response = CompareArticlesHandler::new(ctx).handle(&plan, "compare").await.unwrap();
        assert_eq!(response.answer, "They disagree.");
        assert_eq!(response.sources[0].url, "http://b.com/");
        assert_eq!(response.sources[1].url, "http://a.com/");
        assert_eq!(model.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_one_resolved_article_is_soft() {
        let (ctx, model) = context(stored(), MockModel::new().otherwise("unused")).await;
        let plan = Plan::new("compare_articles", json!({"urls": ["http://a.com/", "http://missing.com/"]}));

        let response = CompareArticlesHandler::new(ctx.clone()).handle(&plan, "compare").await.unwrap();
        assert_eq!(response.answer, NOT_ENOUGH_ARTICLES);

        let plan = Plan::new("tone_key_differences", json!({"urls": ["http://a.com/", "http://missing.com/"]}));
        let response = ToneDifferencesHandler::new(ctx).handle(&plan, "tone").await.unwrap();
        assert!(response.answer.contains("Could not find at least 2 articles"));
        assert_eq!(response.task, "tone_key_differences");
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_single_url_requested_is_soft() {
        let (ctx, _) = context(stored(), MockModel::new()).await;
        let plan = Plan::new("compare_articles", json!({"urls": ["http://a.com/"]}));

        let response = CompareArticlesHandler::new(ctx).handle(&plan, "compare").await.unwrap();
        assert!(response.answer.contains("at least 2 article URLs"));
    }

    #[tokio::test]
    async fn test_tone_prompt_and_generation_failure() {
        let (ctx, model) = context(stored(), MockModel::new().fail_on("Contrast the tone")).await;
        let plan = Plan::new("tone_key_differences", json!({"urls": ["http://a.com/", "http://b.com/"]}));

        let err = ToneDifferencesHandler::new(ctx).handle(&plan, "tone").await.unwrap_err();
        assert!(matches!(err, Error::Inference(_)));
        assert_eq!(model.calls_containing("Budget fails"), 1);
    }
}
