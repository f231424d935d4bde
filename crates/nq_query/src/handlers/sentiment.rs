use async_trait::async_trait;
use nq_core::{ChatResponse, Plan, Result, Sentiment};

use super::{decode_args, missing_urls, no_articles_for_urls, resolve_articles, CommandHandler, HandlerContext};
use crate::args::UrlArgs;

pub struct SentimentHandler {
    ctx: HandlerContext,
}

impl SentimentHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for SentimentHandler {
    async fn handle(&self, plan: &Plan, _query: &str) -> Result<ChatResponse> {
        let args: UrlArgs = match decode_args(plan) {
            Ok(args) => args,
            Err(soft) => return Ok(soft),
        };
        if args.urls.is_empty() {
            return Ok(missing_urls(&plan.command, 1));
        }

        let articles = resolve_articles(self.ctx.store.as_ref(), &args.urls).await?;
        if articles.is_empty() {
            return Ok(no_articles_for_urls(&plan.command, &args.urls));
        }

        let mean = articles.iter().map(|a| a.sentiment_score).sum::<f64>() / articles.len() as f64;
        let overall = Sentiment::classify(mean);

        let mut answer = format!(
            "Overall sentiment: {} (average score {:.2} across {} article{})\n",
            overall,
            mean,
            articles.len(),
            if articles.len() == 1 { "" } else { "s" }
        );
        for article in &articles {
            answer.push_str(&format!(
                "\n- {} ({}): {} ({:.2})",
                article.title, article.url, article.sentiment, article.sentiment_score
            ));
        }

        let sources = articles.iter().map(|a| a.source()).collect();
        Ok(ChatResponse::text(&plan.command, answer).with_sources(sources))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::{article, context};
    use crate::testing::MockModel;
    use serde_json::json;

    async fn run(scores: &[f64]) -> ChatResponse {
        let articles = scores
            .iter()
            .enumerate()
            .map(|(i, score)| article(&format!("http://{}.com/", i), &format!("Article {}", i), *score))
            .collect::<Vec<_>>();
        let urls: Vec<String> = articles.iter().map(|a| a.url.clone()).collect();
        let (ctx, _) = context(articles, MockModel::new()).await;

        SentimentHandler::new(ctx)
            .handle(&Plan::new("get_sentiment", json!({ "urls": urls })), "how positive?")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_mean_classification() {
        let response = run(&[0.9, 0.7]).await;
        assert!(response.answer.starts_with("Overall sentiment: positive (average score 0.80 across 2 articles)"));
        assert!(response.answer.contains("Article 0 (http://0.com/): positive (0.90)"));
        assert_eq!(response.sources.len(), 2);

        let response = run(&[0.1, 0.3]).await;
        assert!(response.answer.starts_with("Overall sentiment: negative"));
    }

    #[tokio::test]
    async fn test_boundaries_are_neutral() {
        assert!(run(&[0.6]).await.answer.starts_with("Overall sentiment: neutral"));
        assert!(run(&[0.4]).await.answer.starts_with("Overall sentiment: neutral"));
    }

    #[tokio::test]
    async fn test_unresolved_urls_are_soft() {
        let (ctx, _) = context(vec![], MockModel::new()).await;
        let response = SentimentHandler::new(ctx)
            .handle(&Plan::new("get_sentiment", json!({"urls": ["http://gone.com/"]})), "q")
            .await
            .unwrap();
        assert_eq!(response.answer, "No articles found for: http://gone.com/");
    }
}
