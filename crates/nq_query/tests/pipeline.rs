use async_trait::async_trait;
use chrono::Utc;
use nq_core::{Article, ArticleStorage, ChatRequest, ChatResponse, Entity, Ingestor, Plan, Result, Sentiment};
use nq_ingest::{ContentFetcher, Extraction, FetchedPage, IngestPipeline, SemanticExtractor};
use nq_query::testing::MockModel;
use nq_query::{ChatService, CommandKind, CommandRegistry, HandlerContext, QueryConfig, ResponseCache};
use nq_storage::{InMemoryCache, InMemoryStorage, SQLiteStorage};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

fn article(url: &str, title: &str, score: f64, entities: &[(&str, f64)]) -> Article {
    let mut article = Article::new(url, title, format!("{} in brief", title));
    article.sentiment_score = score;
    article.sentiment = Sentiment::classify(score);
    article.embedding = vec![1.0, 0.0, 0.0];
    article.entities = entities
        .iter()
        .map(|(name, confidence)| Entity {
            name: name.to_string(),
            category: "ORG".to_string(),
            confidence: *confidence,
        })
        .collect();
    article
}

async fn registry(store: Arc<dyn ArticleStorage>, articles: &[Article], model: MockModel) -> (CommandRegistry, Arc<MockModel>) {
    for article in articles {
        store.upsert_article(article).await.unwrap();
    }
    let model = Arc::new(model);
    let ctx = HandlerContext::new(store, model.clone(), QueryConfig::default());
    (CommandRegistry::with_default_handlers(ctx), model)
}

fn corpus() -> Vec<Article> {
    vec![
        article("http://a.com/", "Senate passes budget", 0.6, &[("A", 0.9), ("B", 0.8)]),
        article("http://b.com/", "Budget criticised", 0.4, &[("A", 0.8), ("C", 0.7)]),
    ]
}

#[tokio::test]
async fn test_task_matches_command_for_every_command() {
    let (registry, _) = registry(Arc::new(InMemoryStorage::new()), &corpus(), MockModel::new().otherwise("YES")).await;

    let args = [
        json!({"urls": ["http://a.com/"]}),
        json!({"urls": ["http://a.com/", "http://b.com/"]}),
        json!({"filter": "budget"}),
        json!({}),
        json!({"urls": 7}),
    ];
    for kind in CommandKind::ALL {
        for arg in &args {
            let plan = Plan::new(kind.as_str(), arg.clone());
            let response = registry.execute(&plan, "question").await.unwrap();
            assert_eq!(response.task, kind.as_str(), "args {}", arg);
        }
    }
}

#[tokio::test]
async fn test_unknown_command_is_an_answer() {
    let (registry, model) = registry(Arc::new(InMemoryStorage::new()), &corpus(), MockModel::new()).await;

    for command in ["translate", "", "SUMMARY"] {
        let response = registry.execute(&Plan::new(command, json!({})), "q").await.unwrap();
        assert!(response.answer.contains("Command not supported"));
        assert_eq!(response.task, command);
    }
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn test_cache_is_idempotent_across_key_order() {
    let cache = ResponseCache::new(Arc::new(InMemoryCache::new()), Duration::from_secs(60));
    let response = ChatResponse::text("get_sentiment", "neutral");

    cache
        .set(&json!({"query": "q", "options": {"lang": "en", "limit": 3}}), &response)
        .await
        .unwrap();
    let hit = cache
        .get(&json!({"options": {"limit": 3, "lang": "en"}, "query": "q"}))
        .await
        .unwrap();
    assert_eq!(hit, Some(response));
}

#[tokio::test]
async fn test_cache_miss_after_expiry_and_sweep() {
    let dir = tempdir().unwrap();
    let sqlite = Arc::new(SQLiteStorage::new_with_path(&dir.path().join("cache.db")).await.unwrap());
    let cache = ResponseCache::new(sqlite, Duration::from_secs(60));
    let request = ChatRequest {
        query: "what happened?".to_string(),
    };

    cache
        .set_until(&request, &ChatResponse::text("summary", "old"), Utc::now() - chrono::Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(cache.sweep().await.unwrap(), 1);
    assert!(cache.get(&request).await.unwrap().is_none());
}

#[tokio::test]
async fn test_top_entities_in_memory_and_sqlite() {
    let dir = tempdir().unwrap();
    let sqlite: Arc<dyn ArticleStorage> =
        Arc::new(SQLiteStorage::new_with_path(&dir.path().join("articles.db")).await.unwrap());

    for store in [Arc::new(InMemoryStorage::new()) as Arc<dyn ArticleStorage>, sqlite] {
        let (registry, _) = registry(store, &corpus(), MockModel::new()).await;
        let response = registry
            .execute(&Plan::new("get_top_entities", json!({"limit": 2})), "who?")
            .await
            .unwrap();

        let lines: Vec<&str> = response.answer.lines().skip(1).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. A (mentioned in 2 articles"));
        assert!(lines[1].starts_with("2. B (mentioned in 1 article,"));
    }
}

#[tokio::test]
async fn test_sentiment_boundaries_are_neutral() {
    let articles = vec![
        article("http://six.com/", "Six", 0.6, &[]),
        article("http://four.com/", "Four", 0.4, &[]),
    ];
    let (registry, _) = registry(Arc::new(InMemoryStorage::new()), &articles, MockModel::new()).await;

    for url in ["http://six.com/", "http://four.com/"] {
        let response = registry
            .execute(&Plan::new("get_sentiment", json!({"urls": [url]})), "tone?")
            .await
            .unwrap();
        assert!(response.answer.starts_with("Overall sentiment: neutral"), "{}", response.answer);
    }
}

#[tokio::test]
async fn test_most_positive_with_every_candidate_rejected() {
    let (registry, model) = registry(Arc::new(InMemoryStorage::new()), &corpus(), MockModel::new().otherwise("NO")).await;

    let response = registry
        .execute(
            &Plan::new("most_positive_article_for_filter", json!({"filter": "budget"})),
            "most positive budget story?",
        )
        .await
        .unwrap();
    assert_eq!(response.answer, "No articles found matching 'budget'.");
    assert_eq!(model.calls_containing("explicitly discuss"), 2);
}

#[tokio::test]
async fn test_compare_with_one_resolvable_article() {
    let (registry, model) = registry(Arc::new(InMemoryStorage::new()), &corpus(), MockModel::new()).await;

    for command in ["compare_articles", "tone_key_differences"] {
        let plan = Plan::new(command, json!({"urls": ["http://a.com/", "http://gone.com/"]}));
        let response = registry.execute(&plan, "compare").await.unwrap();
        assert_eq!(response.answer, "Could not find at least 2 articles to compare.");
    }
    assert!(model.prompts().is_empty());
}

#[tokio::test]
async fn test_chat_end_to_end() {
    let store = Arc::new(InMemoryStorage::new());
    for article in corpus() {
        store.upsert_article(&article).await.unwrap();
    }
    let model = Arc::new(
        MockModel::new()
            .on(
                "query planner",
                "Sure! ```json\n{\"command\": \"filter_by_specific_topic\", \"args\": {\"filter\": \"budget\"}}\n```",
            )
            .on("Senate passes budget", "YES")
            .on("Budget criticised", "no"),
    );
    let service = ChatService::with_defaults(store, Arc::new(InMemoryCache::new()), model.clone(), QueryConfig::default());

    let response = service.chat("Which articles talk about the budget?").await.unwrap();
    assert_eq!(response.task, "filter_by_specific_topic");
    assert_eq!(response.sources.len(), 1);
    assert_eq!(response.sources[0].url, "http://a.com/");

    let again = service.chat("Which articles talk about the budget?").await.unwrap();
    assert_eq!(again, response);
    assert_eq!(model.calls_containing("query planner"), 1);
}

struct OnePageFetcher;

#[async_trait]
impl ContentFetcher for OnePageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage> {
        Ok(FetchedPage {
            url: url.to_string(),
            title: "Markets rally".to_string(),
            text: "Stocks rose sharply.".to_string(),
        })
    }
}

struct FixedExtractor;

#[async_trait]
impl SemanticExtractor for FixedExtractor {
    async fn extract(&self, _page: &FetchedPage) -> Result<Extraction> {
        Ok(Extraction {
            summary: "Stocks rose on rate hopes.".to_string(),
            sentiment: Sentiment::Positive,
            sentiment_score: 0.8,
            tone: "upbeat".to_string(),
            entities: Vec::new(),
            keywords: Vec::new(),
            topics: Vec::new(),
        })
    }
}

#[tokio::test]
async fn test_ingested_url_is_found_by_its_raw_form() {
    let dir = tempdir().unwrap();
    let sqlite: Arc<dyn ArticleStorage> =
        Arc::new(SQLiteStorage::new_with_path(&dir.path().join("articles.db")).await.unwrap());

    for store in [Arc::new(InMemoryStorage::new()) as Arc<dyn ArticleStorage>, sqlite] {
        let pipeline = IngestPipeline::new(
            Arc::new(OnePageFetcher),
            Arc::new(FixedExtractor),
            Arc::new(MockModel::new()),
            store.clone(),
        );
        pipeline.ingest("https://News.Example.com").await.unwrap();

        let (registry, _) = registry(store, &[], MockModel::new()).await;
        for raw in ["https://News.Example.com", "https://news.example.com/"] {
            let response = registry
                .execute(&Plan::new("summary", json!({"url": raw})), "summarize")
                .await
                .unwrap();
            assert_eq!(response.answer, "Stocks rose on rate hopes.", "{}", raw);
            assert_eq!(response.sources[0].url, "https://news.example.com/");
        }
    }
}
