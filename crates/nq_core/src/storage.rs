use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crate::types::{AggregateField, AggregateRow, Article, CacheEntry, ScoredArticle};
use crate::Result;

#[async_trait]
pub trait ArticleStorage: Send + Sync {
    /// Insert or replace an article by URL, keeping the stored id and creation time
    async fn upsert_article(&self, article: &Article) -> Result<Article>;

    /// Exact lookup by URL. Order of the result is unspecified
    async fn find_by_urls(&self, urls: &[String]) -> Result<Vec<Article>>;

    /// Nearest articles by cosine similarity, most similar first
    async fn search_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        urls: Option<&[String]>,
    ) -> Result<Vec<ScoredArticle>>;

    /// Group a per-article array by name, counting occurrences and averaging its score
    async fn aggregate(
        &self,
        field: AggregateField,
        urls: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<AggregateRow>>;

    async fn delete_article(&self, url: &str) -> Result<bool>;

    async fn count_articles(&self) -> Result<u64>;
}

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// The entry for `request_hash` if it expires after `now`
    async fn get_live(&self, request_hash: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>>;

    /// Store an entry, replacing any previous row with the same hash
    async fn put(&self, entry: CacheEntry) -> Result<()>;

    /// Delete every entry with `expires_at <= now`
    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
