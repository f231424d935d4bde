use async_trait::async_trait;
use nq_core::{Article, ArticleStorage, ChatResponse, InferenceModel, Plan, Result};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::command::CommandKind;
use crate::QueryConfig;

pub mod compare;
pub mod entities;
pub mod filter;
pub mod keywords;
pub mod sentiment;
pub mod summary;

pub use compare::{CompareArticlesHandler, ToneDifferencesHandler};
pub use entities::TopEntitiesHandler;
pub use filter::{FilterByTopicHandler, MostPositiveHandler};
pub use keywords::KeywordsOrTopicsHandler;
pub use sentiment::SentimentHandler;
pub use summary::SummaryHandler;

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Missing or malformed arguments yield an explanatory answer; store and model failures yield `Err`.
    async fn handle(&self, plan: &Plan, query: &str) -> Result<ChatResponse>;
}

/// What every handler may touch.
#[derive(Clone)]
pub struct HandlerContext {
    pub store: Arc<dyn ArticleStorage>,
    pub model: Arc<dyn InferenceModel>,
    pub config: QueryConfig,
}

impl HandlerContext {
    pub fn new(store: Arc<dyn ArticleStorage>, model: Arc<dyn InferenceModel>, config: QueryConfig) -> Self {
        Self { store, model, config }
    }
}

pub fn default_handler(kind: CommandKind, ctx: HandlerContext) -> Arc<dyn CommandHandler> {
    match kind {
        CommandKind::Summary => Arc::new(SummaryHandler::new(ctx)),
        CommandKind::KeywordsOrTopics => Arc::new(KeywordsOrTopicsHandler::new(ctx)),
        CommandKind::GetSentiment => Arc::new(SentimentHandler::new(ctx)),
        CommandKind::CompareArticles => Arc::new(CompareArticlesHandler::new(ctx)),
        CommandKind::ToneKeyDifferences => Arc::new(ToneDifferencesHandler::new(ctx)),
        CommandKind::MostPositiveArticleForFilter => Arc::new(MostPositiveHandler::new(ctx)),
        CommandKind::GetTopEntities => Arc::new(TopEntitiesHandler::new(ctx)),
        CommandKind::FilterBySpecificTopic => Arc::new(FilterByTopicHandler::new(ctx)),
    }
}

/// Decode a plan's arguments, or the soft answer explaining why they are unusable.
pub(crate) fn decode_args<T: DeserializeOwned>(plan: &Plan) -> std::result::Result<T, ChatResponse> {
    plan.decode_args().map_err(|e| {
        debug!("Invalid arguments for {}: {}", plan.command, e);
        ChatResponse::text(
            plan.command.clone(),
            format!("I could not understand the arguments for {}: {}", plan.command, e),
        )
    })
}

/// Stored articles for `urls`, in the order requested. Unknown URLs are skipped.
pub(crate) async fn resolve_articles(store: &dyn ArticleStorage, urls: &[String]) -> Result<Vec<Article>> {
    let mut by_url: HashMap<String, Article> = store
        .find_by_urls(urls)
        .await?
        .into_iter()
        .map(|article| (article.url.clone(), article))
        .collect();

    Ok(urls.iter().filter_map(|url| by_url.remove(url)).collect())
}

pub(crate) fn missing_urls(command: &str, needed: usize) -> ChatResponse {
    let answer = if needed == 1 {
        "Please provide at least one article URL.".to_string()
    } else {
        format!("Please provide at least {} article URLs.", needed)
    };
    ChatResponse::text(command, answer)
}

pub(crate) fn no_articles_for_urls(command: &str, urls: &[String]) -> ChatResponse {
    ChatResponse::text(command, format!("No articles found for: {}", urls.join(", ")))
}
