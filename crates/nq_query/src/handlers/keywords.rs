use async_trait::async_trait;
use nq_core::{ChatResponse, Plan, ResponseType, Result};

use super::{decode_args, missing_urls, no_articles_for_urls, resolve_articles, CommandHandler, HandlerContext};
use crate::args::{effective_limit, UrlArgs};

#[derive(Debug, Clone, PartialEq)]
pub struct TermCount {
    pub term: String,
    pub count: usize,
}

/// Count terms case-insensitively; highest count first, ties keep first-seen order.
pub fn top_terms<'a>(terms: impl IntoIterator<Item = &'a str>, limit: usize) -> Vec<TermCount> {
    let mut counts: Vec<(String, TermCount)> = Vec::new();
    for term in terms {
        let term = term.trim();
        if term.is_empty() {
            continue;
        }
        let key = term.to_lowercase();
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, entry)) => entry.count += 1,
            None => counts.push((
                key,
                TermCount {
                    term: term.to_string(),
                    count: 1,
                },
            )),
        }
    }

    let mut ranked: Vec<TermCount> = counts.into_iter().map(|(_, count)| count).collect();
    // stable sort keeps first occurrence order on ties
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(limit);
    ranked
}

fn render(title: &str, terms: &[TermCount]) -> String {
    if terms.is_empty() {
        return format!("{}: none found", title);
    }
    let lines: Vec<String> = terms
        .iter()
        .enumerate()
        .map(|(i, t)| format!("{}. {} ({})", i + 1, t.term, t.count))
        .collect();
    format!("{}:\n{}", title, lines.join("\n"))
}

pub struct KeywordsOrTopicsHandler {
    ctx: HandlerContext,
}

impl KeywordsOrTopicsHandler {
    pub fn new(ctx: HandlerContext) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl CommandHandler for KeywordsOrTopicsHandler {
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

        let limit = effective_limit(args.limit, self.ctx.config.top_n);
        let keywords = top_terms(
            articles.iter().flat_map(|a| a.keywords.iter().map(|k| k.term.as_str())),
            limit,
        );
        let topics = top_terms(
            articles.iter().flat_map(|a| a.topics.iter().map(|t| t.name.as_str())),
            limit,
        );

        let answer = format!("{}\n\n{}", render("Top keywords", &keywords), render("Top topics", &topics));
        let sources = articles.iter().map(|a| a.source()).collect();
        Ok(ChatResponse::text(&plan.command, answer)
            .with_sources(sources)
            .with_type(ResponseType::Data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::fixtures::{article, context, keyword, topic};
    use crate::testing::MockModel;
    use serde_json::json;

    #[test]
    fn test_top_terms_ties_keep_first_occurrence() {
        let terms = ["inflation", "Budget", "jobs", "budget", "inflation", "tariffs"];
        let ranked = top_terms(terms, 3);
        assert_eq!(
            ranked,
            vec![
                TermCount { term: "inflation".to_string(), count: 2 },
                TermCount { term: "Budget".to_string(), count: 2 },
                TermCount { term: "jobs".to_string(), count: 1 },
            ]
        );
    }

    #[tokio::test]
    async fn test_aggregates_across_articles() {
        let mut first = article("http://a.com/", "A", 0.5);
        first.keywords = vec![keyword("rates"), keyword("inflation")];
        first.topics = vec![topic("economy")];
        let mut second = article("http://b.com/", "B", 0.5);
        second.keywords = vec![keyword("inflation"), keyword("housing")];
        second.topics = vec![topic("economy"), topic("real estate")];

        let (ctx, _) = context(vec![first, second], MockModel::new()).await;
        let response = KeywordsOrTopicsHandler::new(ctx)
            .handle(
                &Plan::new("keywords_or_topics", json!({"urls": ["http://a.com/", "http://b.com/"]})),
                "keywords?",
            )
            .await
            .unwrap();

        assert_eq!(response.response_type, ResponseType::Data);
        assert!(response.answer.contains("Top keywords:\n1. inflation (2)\n2. rates (1)\n3. housing (1)"));
        assert!(response.answer.contains("Top topics:\n1. economy (2)\n2. real estate (1)"));
    }

    #[tokio::test]
    async fn test_missing_urls_soft() {
        let (ctx, _) = context(vec![], MockModel::new()).await;
        let response = KeywordsOrTopicsHandler::new(ctx)
            .handle(&Plan::new("keywords_or_topics", json!({"urls": []})), "q")
            .await
            .unwrap();
        assert!(response.answer.contains("at least one article URL"));
    }
}
