use async_trait::async_trait;
use crate::types::Article;
use crate::Result;

/// Fetches, analyzes and stores a single URL.
#[async_trait]
pub trait Ingestor: Send + Sync {
    async fn ingest(&self, url: &str) -> Result<Article>;
}
