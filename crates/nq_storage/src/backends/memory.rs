use async_trait::async_trait;
use chrono::{DateTime, Utc};
use nq_core::{
    cosine_similarity, AggregateField, AggregateRow, Article, ArticleStorage, CacheEntry,
    CacheStorage, Result, ScoredArticle,
};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    articles: Vec<Article>,
    index: HashMap<String, usize>,
}

impl MemoryStore {
    pub fn upsert(&mut self, article: &Article) -> Article {
        let now = Utc::now();
        match self.index.get(&article.url) {
            Some(&pos) => {
                let existing = &mut self.articles[pos];
                let mut replacement = article.clone();
                replacement.id = existing.id;
                replacement.created_at = existing.created_at;
                replacement.updated_at = now;
                *existing = replacement;
                existing.clone()
            }
            None => {
                let mut stored = article.clone();
                stored.updated_at = now;
                self.index.insert(stored.url.clone(), self.articles.len());
                self.articles.push(stored.clone());
                stored
            }
        }
    }

    pub fn find_by_urls(&self, urls: &[String]) -> Vec<Article> {
        urls.iter()
            .filter_map(|url| self.index.get(url))
            .map(|&pos| self.articles[pos].clone())
            .collect()
    }

    fn scoped<'a>(&'a self, urls: Option<&'a [String]>) -> impl Iterator<Item = &'a Article> + 'a {
        self.articles
            .iter()
            .filter(move |a| urls.map_or(true, |allowed| allowed.contains(&a.url)))
    }

    pub fn search_similar(&self, embedding: &[f32], limit: usize, urls: Option<&[String]>) -> Vec<ScoredArticle> {
        let mut scored: Vec<ScoredArticle> = self
            .scoped(urls)
            .filter(|a| !a.embedding.is_empty())
            .map(|a| ScoredArticle {
                article: a.clone(),
                similarity: cosine_similarity(embedding, &a.embedding),
            })
            .collect();
        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }

    pub fn aggregate(&self, field: AggregateField, urls: Option<&[String]>, limit: usize) -> Vec<AggregateRow> {
        let mut order: Vec<String> = Vec::new();
        let mut totals: HashMap<String, (u64, f64)> = HashMap::new();

        for article in self.scoped(urls) {
            for (name, score) in field.values(article) {
                let entry = totals.entry(name.clone()).or_insert_with(|| {
                    order.push(name);
                    (0, 0.0)
                });
                entry.0 += 1;
                entry.1 += score;
            }
        }

        let mut rows: Vec<AggregateRow> = order
            .into_iter()
            .filter_map(|name| {
                let (count, sum) = totals.remove(&name)?;
                Some(AggregateRow {
                    name,
                    count,
                    avg_score: sum / count as f64,
                })
            })
            .collect();
        rows.sort_by(|a, b| {
            b.count.cmp(&a.count).then(
                b.avg_score
                    .partial_cmp(&a.avg_score)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
        });
        rows.truncate(limit);
        rows
    }

    pub fn delete(&mut self, url: &str) -> bool {
        let Some(pos) = self.index.remove(url) else {
            return false;
        };
        self.articles.remove(pos);
        self.index = self
            .articles
            .iter()
            .enumerate()
            .map(|(i, a)| (a.url.clone(), i))
            .collect();
        true
    }
}

/// Article store kept in process memory. Each write swaps a whole article under the
/// write lock, so readers see either the old or the new version.
#[derive(Default)]
pub struct InMemoryStorage {
    store: RwLock<MemoryStore>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArticleStorage for InMemoryStorage {
    async fn upsert_article(&self, article: &Article) -> Result<Article> {
        let mut store = self.store.write().await;
        Ok(store.upsert(article))
    }

    async fn find_by_urls(&self, urls: &[String]) -> Result<Vec<Article>> {
        let store = self.store.read().await;
        Ok(store.find_by_urls(urls))
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        urls: Option<&[String]>,
    ) -> Result<Vec<ScoredArticle>> {
        let store = self.store.read().await;
        Ok(store.search_similar(embedding, limit, urls))
    }

    async fn aggregate(
        &self,
        field: AggregateField,
        urls: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<AggregateRow>> {
        let store = self.store.read().await;
        Ok(store.aggregate(field, urls, limit))
    }

    async fn delete_article(&self, url: &str) -> Result<bool> {
        let mut store = self.store.write().await;
        Ok(store.delete(url))
    }

    async fn count_articles(&self) -> Result<u64> {
        let store = self.store.read().await;
        Ok(store.articles.len() as u64)
    }
}

#[derive(Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheStorage for InMemoryCache {
    async fn get_live(&self, request_hash: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(request_hash)
            .filter(|entry| entry.is_live_at(now))
            .cloned())
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(entry.request_hash.clone(), entry);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live_at(now));
        Ok((before - entries.len()) as u64)
    }
}
