use async_trait::async_trait;
use nq_core::{Article, ChatResponse, Plan, ResponseType, Result};
use tracing::debug;

use super::{decode_args, CommandHandler, HandlerContext};
use crate::args::{effective_limit, FilterArgs};
use crate::validation::validate_candidates;

const MISSING_FILTER: &str = "Please tell me which topic to look for.";

fn no_matches(command: &str, filter: &str) -> ChatResponse {
    ChatResponse::text(command, format!("No articles found matching '{}'.", filter))
}

/// Similarity-search candidates for `filter` that survive validation, best match first.
async fn relevant_articles(ctx: &HandlerContext, filter: &str) -> Result<Vec<Article>> {
    let embedding = ctx.model.generate_embeddings(filter).await?;
    let candidates: Vec<Article> = ctx
        .store
        .search_similar(&embedding, ctx.config.candidate_limit, None)
        .await?
        .into_iter()
        .map(|scored| scored.article)
        .collect();
    debug!("{} candidate(s) for '{}'", candidates.len(), filter);

    let outcome = validate_candidates(ctx.model.as_ref(), filter, candidates).await;
    Ok(outcome.validated)
}

pub struct MostPositiveHandler {
    ctx: HandlerContext,
}

impl MostPositiveHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for MostPositiveHandler {
    async fn handle(&self, plan: &Plan, _query: &str) -> Result<ChatResponse> {
        let args: FilterArgs = match decode_args(plan) {
            Ok(args) => args,
            Err(soft) => return Ok(soft),
        };
        let Some(filter) = args.filter() else {
            return Ok(ChatResponse::text(&plan.command, MISSING_FILTER));
        };

        let articles = relevant_articles(&self.ctx, filter).await?;

        // strict comparison, the earlier (more similar) article wins ties
        let mut best: Option<&Article> = None;
        for article in &articles {
            if best.map_or(true, |b| article.sentiment_score > b.sentiment_score) {
                best = Some(article);
            }
        }

        let Some(best) = best else {
            return Ok(no_matches(&plan.command, filter));
        };

        let answer = format!(
            "The most positive article about '{}' is \"{}\" ({}) with a sentiment score of {:.2} ({}).\n\n{}",
            filter, best.title, best.url, best.sentiment_score, best.sentiment, best.summary
        );
        Ok(ChatResponse::text(&plan.command, answer).with_sources(vec![best.source()]))
    }
}

pub struct FilterByTopicHandler {
    ctx: HandlerContext,
}

impl FilterByTopicHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for FilterByTopicHandler {
    async fn handle(&self, plan: &Plan, _query: &str) -> Result<ChatResponse> {
        let args: FilterArgs = match decode_args(plan) {
            Ok(args) => args,
            Err(soft) => return Ok(soft),
        };
        let Some(filter) = args.filter() else {
            return Ok(ChatResponse::text(&plan.command, MISSING_FILTER));
        };

        let mut articles = relevant_articles(&self.ctx, filter).await?;
        if articles.is_empty() {
            return Ok(no_matches(&plan.command, filter));
        }
        articles.truncate(effective_limit(args.limit, self.ctx.config.top_n));

        let mut answer = format!(
            "Found {} article{} about '{}':\n",
            articles.len(),
            if articles.len() == 1 { "" } else { "s" },
            filter
        );
        for (i, article) in articles.iter().enumerate() {
            answer.push_str(&format!("\n{}. {} ({})", i + 1, article.title, article.url));
        }

        let sources = articles.iter().map(|a| a.source()).collect();
        Ok(ChatResponse::text(&plan.command, answer)
            .with_sources(sources)
            .with_type(ResponseType::ArticleList))
    }
}
