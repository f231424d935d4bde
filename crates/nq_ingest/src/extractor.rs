use async_trait::async_trait;
use nq_core::json::parse_model_json;
use nq_core::{Entity, Error, InferenceModel, Keyword, Result, Sentiment, Topic};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::fetcher::FetchedPage;

/// Article text beyond this many characters is not sent to the model.
pub const MAX_PROMPT_CHARS: usize = 12_000;
pub const EXTRACTION_TEMPERATURE: f32 = 0.0;

/// Everything the store keeps about an article besides its page and embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub summary: String,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub tone: String,
    pub entities: Vec<Entity>,
    pub keywords: Vec<Keyword>,
    pub topics: Vec<Topic>,
}

#[async_trait]
pub trait SemanticExtractor: Send + Sync {
    async fn extract(&self, page: &FetchedPage) -> Result<Extraction>;
}

#[derive(Deserialize)]
struct RawEntity {
    name: String,
    #[serde(default, alias = "type")]
    category: String,
    #[serde(default = "half")]
    confidence: f64,
}

#[derive(Deserialize)]
struct RawKeyword {
    #[serde(alias = "keyword")]
    term: String,
    #[serde(default = "half")]
    relevance: f64,
    #[serde(default)]
    context: String,
}

#[derive(Deserialize)]
struct RawTopic {
    #[serde(alias = "topic")]
    name: String,
    #[serde(default = "half")]
    score: f64,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct RawExtraction {
    summary: String,
    #[serde(default, alias = "sentimentScore")]
    sentiment_score: Option<f64>,
    #[serde(default)]
    sentiment: Option<String>,
    #[serde(default)]
    tone: String,
    #[serde(default)]
    entities: Vec<RawEntity>,
    #[serde(default)]
    keywords: Vec<RawKeyword>,
    #[serde(default)]
    topics: Vec<RawTopic>,
}

fn half() -> f64 {
    0.5
}

fn unit(score: f64) -> f64 {
    if score.is_nan() {
        0.5
    } else {
        score.clamp(0.0, 1.0)
    }
}

impl RawExtraction {
    fn into_extraction(self) -> Extraction {
        // the score decides; a bare label only stands in for a missing score
        let sentiment_score = match (self.sentiment_score, self.sentiment.as_deref()) {
            (Some(score), _) => unit(score),
            (None, Some(label)) => match label.parse::<Sentiment>() {
                Ok(Sentiment::Positive) => 0.75,
                Ok(Sentiment::Negative) => 0.25,
                _ => 0.5,
            },
            (None, None) => 0.5,
        };

        Extraction {
            summary: self.summary.trim().to_string(),
            sentiment: Sentiment::classify(sentiment_score),
            sentiment_score,
            tone: self.tone.trim().to_string(),
            entities: self
                .entities
                .into_iter()
                .filter(|e| !e.name.trim().is_empty())
                .map(|e| Entity {
                    name: e.name.trim().to_string(),
                    category: e.category,
                    confidence: unit(e.confidence),
                })
                .collect(),
            keywords: self
                .keywords
                .into_iter()
                .filter(|k| !k.term.trim().is_empty())
                .map(|k| Keyword {
                    term: k.term.trim().to_string(),
                    relevance: unit(k.relevance),
                    context: k.context,
                })
                .collect(),
            topics: self
                .topics
                .into_iter()
                .filter(|t| !t.name.trim().is_empty())
                .map(|t| Topic {
                    name: t.name.trim().to_string(),
                    score: unit(t.score),
                    description: t.description,
                })
                .collect(),
        }
    }
}

fn extraction_prompt(page: &FetchedPage) -> String {
    let text: String = page.text.chars().take(MAX_PROMPT_CHARS).collect();
    format!(
        "Analyze the following news article and respond with JSON only, using exactly this shape:\n\
         {{\"summary\": string, \"sentiment_score\": number between 0 (very negative) and 1 (very positive), \
         \"tone\": string, \
         \"entities\": [{{\"name\": string, \"category\": \"PERSON\"|\"ORG\"|\"LOCATION\"|\"OTHER\", \"confidence\": number}}], \
         \"keywords\": [{{\"term\": string, \"relevance\": number, \"context\": string}}], \
         \"topics\": [{{\"name\": string, \"score\": number, \"description\": string}}]}}\n\n\
         Title: {}\n\n\
         Article:\n{}",
        page.title, text
    )
}

/// Asks an inference model for the semantic fields as JSON.
pub struct LlmExtractor {
    model: Arc<dyn InferenceModel>,
}

impl LlmExtractor {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl SemanticExtractor for LlmExtractor {
    async fn extract(&self, page: &FetchedPage) -> Result<Extraction> {
        let raw = self
            .model
            .generate_text(&extraction_prompt(page), EXTRACTION_TEMPERATURE)
            .await?;

        let parsed: RawExtraction = parse_model_json(&raw).map_err(|e| {
            warn!("🤖 Unparsable extraction for {}: {}", page.url, e);
            Error::Ingestion(format!("Could not parse analysis of {}: {}", page.url, e))
        })?;

        let extraction = parsed.into_extraction();
        debug!(
            "🤖 Extracted {} entities, {} keywords, {} topics from {}",
            extraction.entities.len(),
            extraction.keywords.len(),
            extraction.topics.len(),
            page.url
        );
        Ok(extraction)
    }
}
