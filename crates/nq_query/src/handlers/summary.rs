use async_trait::async_trait;
use nq_core::{ChatResponse, Plan, Result};

use super::{decode_args, missing_urls, resolve_articles, CommandHandler, HandlerContext};
use crate::args::UrlArgs;

pub struct SummaryHandler {
    ctx: HandlerContext,
}

impl SummaryHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for SummaryHandler {
    async fn handle(&self, plan: &Plan, _query: &str) -> Result<ChatResponse> {
        let args: UrlArgs = match decode_args(plan) {
            Ok(args) => args,
            Err(soft) => return Ok(soft),
        };
        let Some(url) = args.urls.first() else {
            return Ok(missing_urls(&plan.command, 1));
        };

        let articles = resolve_articles(self.ctx.store.as_ref(), std::slice::from_ref(url)).await?;
        let Some(article) = articles.into_iter().next() else {
            return Ok(ChatResponse::text(&plan.command, format!("Article not found: {}", url)));
        };

        let answer = if article.summary.trim().is_empty() {
            format!("No summary is stored for \"{}\".", article.title)
        } else {
            article.summary.clone()
        };
        Ok(ChatResponse::text(&plan.command, answer).with_sources(vec![article.source()]))
    }
}
