use async_trait::async_trait;
use futures::future::join_all;
use nq_core::{normalize_url, Article, ArticleStorage, Error, InferenceModel, Ingestor, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::extractor::{LlmExtractor, SemanticExtractor};
use crate::fetcher::{validate_url, ContentFetcher, HttpFetcher};

pub const DEFAULT_CONCURRENCY: usize = 5;

/// fetch → extract → embed → upsert, one URL at a time.
pub struct IngestPipeline {
    fetcher: Arc<dyn ContentFetcher>,
    extractor: Arc<dyn SemanticExtractor>,
    model: Arc<dyn InferenceModel>,
    store: Arc<dyn ArticleStorage>,
}

impl IngestPipeline {
    pub fn new(
        fetcher: Arc<dyn ContentFetcher>,
        extractor: Arc<dyn SemanticExtractor>,
        model: Arc<dyn InferenceModel>,
        store: Arc<dyn ArticleStorage>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            model,
            store,
        }
    }

    /// Pipeline over the web with the model doing both extraction and embeddings.
    pub fn over_http(store: Arc<dyn ArticleStorage>, model: Arc<dyn InferenceModel>, timeout: Duration) -> Result<Self> {
        let fetcher = Arc::new(HttpFetcher::new(timeout)?);
        let extractor = Arc::new(LlmExtractor::new(model.clone()));
        Ok(Self::new(fetcher, extractor, model, store))
    }
}

/// Text whose embedding represents the article in similarity search.
pub fn embedding_text(article: &Article) -> String {
    format!("{}\n\n{}", article.title, article.summary)
}

#[async_trait]
impl Ingestor for IngestPipeline {
    async fn ingest(&self, url: &str) -> Result<Article> {
        validate_url(url)?;
        let url = normalize_url(url);
        info!("📰 Ingesting {}", url);

        let page = self.fetcher.fetch(&url).await?;
        let extraction = self.extractor.extract(&page).await?;

        let mut article = Article::new(url, page.title, extraction.summary);
        article.sentiment = extraction.sentiment;
        article.sentiment_score = extraction.sentiment_score;
        article.tone = extraction.tone;
        article.entities = extraction.entities;
        article.keywords = extraction.keywords;
        article.topics = extraction.topics;

        info!("🔢 Embedding {}", article.title);
        article.embedding = self.model.generate_embeddings(&embedding_text(&article)).await?;

        let stored = self.store.upsert_article(&article).await?;
        info!("✅ Stored {} ({})", stored.title, stored.sentiment);
        Ok(stored)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IngestFailure {
    pub url: String,
    pub error: String,
}

#[derive(Debug, Default)]
pub struct IngestReport {
    pub succeeded: Vec<Article>,
    pub failed: Vec<IngestFailure>,
}

/// Ingest every URL with at most `concurrency` pipelines in flight.
/// A failing URL is reported, never fatal to the batch.
pub async fn ingest_all(ingestor: Arc<dyn Ingestor>, urls: &[String], concurrency: usize) -> IngestReport {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

    let tasks = urls.iter().map(|url| {
        let ingestor = ingestor.clone();
        let semaphore = semaphore.clone();
        async move {
            let result = match semaphore.acquire().await {
                Ok(_permit) => ingestor.ingest(url).await,
                Err(e) => Err(Error::Ingestion(format!("Ingestion queue closed: {}", e))),
            };
            (url.clone(), result)
        }
    });

    let mut report = IngestReport::default();
    for (url, result) in join_all(tasks).await {
        match result {
            Ok(article) => report.succeeded.push(article),
            Err(e) => {
                error!("❌ Failed to ingest {}: {}", url, e);
                report.failed.push(IngestFailure {
                    url,
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "📚 Ingested {} of {} URL(s)",
        report.succeeded.len(),
        report.succeeded.len() + report.failed.len()
    );
    report
}
