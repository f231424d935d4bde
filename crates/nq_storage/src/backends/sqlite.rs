use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use nq_core::{
    cosine_similarity, AggregateField, AggregateRow, Article, ArticleStorage, CacheEntry,
    CacheStorage, Error, Result, ScoredArticle,
};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS articles (
        url TEXT PRIMARY KEY,
        id TEXT NOT NULL UNIQUE,
        title TEXT NOT NULL,
        summary TEXT NOT NULL,
        embedding BLOB,
        sentiment TEXT NOT NULL,
        sentiment_score REAL NOT NULL,
        tone TEXT NOT NULL DEFAULT '',
        entities TEXT NOT NULL DEFAULT '[]',
        keywords TEXT NOT NULL DEFAULT '[]',
        topics TEXT NOT NULL DEFAULT '[]',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_cache (
        request_hash TEXT PRIMARY KEY,
        request_payload TEXT NOT NULL,
        response_payload TEXT NOT NULL,
        created_at INTEGER NOT NULL,
        expires_at INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_cache_expires_at ON chat_cache (expires_at)",
];

pub struct SQLiteStorage {
    pool: SqlitePool,
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::connect(&format!("sqlite:{}", db_path.display())).await
    }

    /// Open (creating if needed) the database at `url` and run migrations.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| Error::Database(format!("Invalid database url {}: {}", url, e)))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await
            .map_err(|e| Error::Database(format!("Failed to connect to database: {}", e)))?;

        for (i, migration) in MIGRATIONS.iter().enumerate() {
            sqlx::query(migration)
                .execute(&pool)
                .await
                .map_err(|e| Error::Database(format!("Failed to run migration {}: {}", i, e)))?;
        }

        debug!("Opened {} with {} migration(s)", url, MIGRATIONS.len());
        Ok(Self { pool })
    }
}

pub fn default_db_path() -> PathBuf {
    PathBuf::from("articles.db")
}

fn embedding_to_blob(embedding: &[f32]) -> Option<Vec<u8>> {
    if embedding.is_empty() {
        return None;
    }
    Some(embedding.iter().flat_map(|f| f.to_le_bytes()).collect())
}

fn blob_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn db_err(action: &str) -> impl Fn(sqlx::Error) -> Error + '_ {
    move |e| Error::Database(format!("Failed to {}: {}", action, e))
}

fn article_from_row(row: &SqliteRow) -> Result<Article> {
    let get = |e: sqlx::Error| Error::Database(format!("Failed to decode article row: {}", e));

    let id: String = row.try_get("id").map_err(get)?;
    let sentiment: String = row.try_get("sentiment").map_err(get)?;
    let embedding: Option<Vec<u8>> = row.try_get("embedding").map_err(get)?;
    let entities: String = row.try_get("entities").map_err(get)?;
    let keywords: String = row.try_get("keywords").map_err(get)?;
    let topics: String = row.try_get("topics").map_err(get)?;

    Ok(Article {
        id: Uuid::parse_str(&id).map_err(|e| Error::Database(format!("Invalid article id {}: {}", id, e)))?,
        url: row.try_get("url").map_err(get)?,
        title: row.try_get("title").map_err(get)?,
        summary: row.try_get("summary").map_err(get)?,
        embedding: embedding.as_deref().map(blob_to_embedding).unwrap_or_default(),
        sentiment: sentiment.parse()?,
        sentiment_score: row.try_get("sentiment_score").map_err(get)?,
        tone: row.try_get("tone").map_err(get)?,
        entities: serde_json::from_str(&entities)?,
        keywords: serde_json::from_str(&keywords)?,
        topics: serde_json::from_str(&topics)?,
        created_at: row.try_get("created_at").map_err(get)?,
        updated_at: row.try_get("updated_at").map_err(get)?,
    })
}

fn push_url_filter(builder: &mut QueryBuilder<'_, Sqlite>, urls: &[String]) {
    builder.push("articles.url IN (");
    let mut separated = builder.separated(", ");
    for url in urls {
        separated.push_bind(url.clone());
    }
    separated.push_unseparated(")");
}

fn millis_to_datetime(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::Database(format!("Invalid timestamp: {}", millis)))
}

#[async_trait]
impl ArticleStorage for SQLiteStorage {
    async fn upsert_article(&self, article: &Article) -> Result<Article> {
        let mut tx = self.pool.begin().await.map_err(db_err("begin article write"))?;
        let rows = sqlx::query(
            r#"
            INSERT INTO articles
            (url, id, title, summary, embedding, sentiment, sentiment_score, tone,
             entities, keywords, topics, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                title = excluded.title,
                summary = excluded.summary,
                embedding = excluded.embedding,
                sentiment = excluded.sentiment,
                sentiment_score = excluded.sentiment_score,
                tone = excluded.tone,
                entities = excluded.entities,
                keywords = excluded.keywords,
                topics = excluded.topics,
                updated_at = excluded.updated_at
            RETURNING *
            "#,
        )
        .bind(&article.url)
        .bind(article.id.to_string())
        .bind(&article.title)
        .bind(&article.summary)
        .bind(embedding_to_blob(&article.embedding))
        .bind(article.sentiment.as_str())
        .bind(article.sentiment_score)
        .bind(&article.tone)
        .bind(serde_json::to_string(&article.entities)?)
        .bind(serde_json::to_string(&article.keywords)?)
        .bind(serde_json::to_string(&article.topics)?)
        .bind(article.created_at)
        .bind(Utc::now())
        .fetch_all(&mut *tx)
        .await
        .map_err(db_err("store article"))?;
        tx.commit().await.map_err(db_err("commit article write"))?;

        let row = rows
            .first()
            .ok_or_else(|| Error::Database(format!("No row returned storing {}", article.url)))?;
        article_from_row(row)
    }

    async fn find_by_urls(&self, urls: &[String]) -> Result<Vec<Article>> {
        if urls.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM articles WHERE ");
        push_url_filter(&mut builder, urls);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("find articles by url"))?;

        rows.iter().map(article_from_row).collect()
    }

    async fn search_similar(
        &self,
        embedding: &[f32],
        limit: usize,
        urls: Option<&[String]>,
    ) -> Result<Vec<ScoredArticle>> {
        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM articles WHERE embedding IS NOT NULL");
        if let Some(urls) = urls {
            if urls.is_empty() {
                return Ok(Vec::new());
            }
            builder.push(" AND ");
            push_url_filter(&mut builder, urls);
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("search similar articles"))?;

        let mut scored = rows
            .iter()
            .map(|row| {
                let article = article_from_row(row)?;
                let similarity = cosine_similarity(embedding, &article.embedding);
                Ok(ScoredArticle { article, similarity })
            })
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        Ok(scored)
    }

    async fn aggregate(
        &self,
        field: AggregateField,
        urls: Option<&[String]>,
        limit: usize,
    ) -> Result<Vec<AggregateRow>> {
        let (column, name_key, score_key) = field.keys();

        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT json_extract(item.value, '$.{name_key}') AS name, \
             COUNT(*) AS occurrences, \
             AVG(json_extract(item.value, '$.{score_key}')) AS avg_score \
             FROM articles, json_each(articles.{column}) AS item \
             WHERE json_extract(item.value, '$.{name_key}') IS NOT NULL"
        ));
        if let Some(urls) = urls {
            if urls.is_empty() {
                return Ok(Vec::new());
            }
            builder.push(" AND ");
            push_url_filter(&mut builder, urls);
        }
        builder.push(" GROUP BY name ORDER BY occurrences DESC, avg_score DESC LIMIT ");
        builder.push_bind(limit as i64);

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(db_err("aggregate articles"))?;

        rows.iter()
            .map(|row| {
                let get = |e: sqlx::Error| Error::Database(format!("Failed to decode aggregate row: {}", e));
                Ok(AggregateRow {
                    name: row.try_get("name").map_err(get)?,
                    count: row.try_get::<i64, _>("occurrences").map_err(get)? as u64,
                    avg_score: row.try_get::<Option<f64>, _>("avg_score").map_err(get)?.unwrap_or(0.0),
                })
            })
            .collect()
    }

    async fn delete_article(&self, url: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM articles WHERE url = ?")
            .bind(url)
            .execute(&self.pool)
            .await
            .map_err(db_err("delete article"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_articles(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await
            .map_err(db_err("count articles"))?;
        Ok(count as u64)
    }
}

#[async_trait]
impl CacheStorage for SQLiteStorage {
    async fn get_live(&self, request_hash: &str, now: DateTime<Utc>) -> Result<Option<CacheEntry>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM chat_cache
            WHERE request_hash = ? AND expires_at > ?
            "#,
        )
        .bind(request_hash)
        .bind(now.timestamp_millis())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err("read chat cache"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let get = |e: sqlx::Error| Error::Database(format!("Failed to decode cache row: {}", e));
        Ok(Some(CacheEntry {
            request_hash: row.try_get("request_hash").map_err(get)?,
            request_payload: row.try_get("request_payload").map_err(get)?,
            response_payload: row.try_get("response_payload").map_err(get)?,
            created_at: millis_to_datetime(row.try_get("created_at").map_err(get)?)?,
            expires_at: millis_to_datetime(row.try_get("expires_at").map_err(get)?)?,
        }))
    }

    async fn put(&self, entry: CacheEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO chat_cache
            (request_hash, request_payload, response_payload, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.request_hash)
        .bind(&entry.request_payload)
        .bind(&entry.response_payload)
        .bind(entry.created_at.timestamp_millis())
        .bind(entry.expires_at.timestamp_millis())
        .execute(&self.pool)
        .await
        .map_err(db_err("write chat cache"))?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM chat_cache WHERE expires_at <= ?")
            .bind(now.timestamp_millis())
            .execute(&self.pool)
            .await
            .map_err(db_err("purge chat cache"))?;
        Ok(result.rows_affected())
    }
}
