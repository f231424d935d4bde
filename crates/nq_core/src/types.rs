use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub summary: String,
    #[serde(default)]
    pub embedding: Vec<f32>,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub keywords: Vec<Keyword>,
    #[serde(default)]
    pub topics: Vec<Topic>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Article {
    /// A fresh article with a new id and neutral sentiment.
    pub fn new(url: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            url: url.into(),
            title: title.into(),
            summary: summary.into(),
            embedding: Vec::new(),
            sentiment: Sentiment::Neutral,
            sentiment_score: 0.5,
            tone: String::new(),
            entities: Vec::new(),
            keywords: Vec::new(),
            topics: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn source(&self) -> Source {
        Source {
            id: self.id,
            url: self.url.clone(),
            title: self.title.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub const POSITIVE_THRESHOLD: f64 = 0.6;
    pub const NEGATIVE_THRESHOLD: f64 = 0.4;

    /// Classify a score in [0,1]. Both thresholds are exclusive.
    pub fn classify(score: f64) -> Self {
        if score > Self::POSITIVE_THRESHOLD {
            Sentiment::Positive
        } else if score < Self::NEGATIVE_THRESHOLD {
            Sentiment::Negative
        } else {
            Sentiment::Neutral
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Sentiment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "positive" => Ok(Sentiment::Positive),
            "negative" => Ok(Sentiment::Negative),
            "neutral" => Ok(Sentiment::Neutral),
            other => Err(Error::InvalidInput(format!("Unknown sentiment: {}", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub term: String,
    pub relevance: f64,
    #[serde(default)]
    pub context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub score: f64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredArticle {
    pub article: Article,
    pub similarity: f64,
}

/// Per-article JSON array a store can flatten and group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateField {
    Entities,
    Keywords,
    Topics,
}

impl AggregateField {
    /// Column holding the array, and the JSON keys for the group name and the averaged score.
    pub fn keys(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            AggregateField::Entities => ("entities", "name", "confidence"),
            AggregateField::Keywords => ("keywords", "term", "relevance"),
            AggregateField::Topics => ("topics", "name", "score"),
        }
    }

    /// Group name and score of every element of `article`'s array.
    pub fn values(&self, article: &Article) -> Vec<(String, f64)> {
        match self {
            AggregateField::Entities => article
                .entities
                .iter()
                .map(|e| (e.name.clone(), e.confidence))
                .collect(),
            AggregateField::Keywords => article
                .keywords
                .iter()
                .map(|k| (k.term.clone(), k.relevance))
                .collect(),
            AggregateField::Topics => article
                .topics
                .iter()
                .map(|t| (t.name.clone(), t.score))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub name: String,
    pub count: u64,
    pub avg_score: f64,
}

/// Structured command produced by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub command: String,
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl Plan {
    pub fn new(command: impl Into<String>, args: Value) -> Self {
        let args = match args {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            command: command.into(),
            args,
        }
    }

    /// Decode the untyped arguments into the shape a command expects.
    pub fn decode_args<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(Value::Object(self.args.clone()))?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub url: String,
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseType {
    Text,
    ArticleList,
    Data,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Source>,
    pub response_type: ResponseType,
    pub task: String,
}

impl ChatResponse {
    pub fn text(task: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            sources: Vec::new(),
            response_type: ResponseType::Text,
            task: task.into(),
        }
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }
}

/// A cached chat response row.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub request_hash: String,
    pub request_payload: String,
    pub response_payload: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sentiment_boundaries_are_neutral() {
        assert_eq!(Sentiment::classify(0.6), Sentiment::Neutral);
        assert_eq!(Sentiment::classify(0.4), Sentiment::Neutral);
        assert_eq!(Sentiment::classify(0.61), Sentiment::Positive);
        assert_eq!(Sentiment::classify(0.39), Sentiment::Negative);
    }

    #[test]
    fn test_chat_response_wire_shape() {
        let response = ChatResponse::text("summary", "hello").with_type(ResponseType::ArticleList);
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["responseType"], "articleList");
        assert_eq!(value["task"], "summary");
        assert!(value["sources"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_plan_decode_args() {
        #[derive(Deserialize)]
        struct Args {
            filter: String,
        }

        let plan = Plan::new("filter_by_specific_topic", json!({"filter": "elections"}));
        let args: Args = plan.decode_args().unwrap();
        assert_eq!(args.filter, "elections");

        let plan = Plan::new("filter_by_specific_topic", json!({}));
        assert!(plan.decode_args::<Args>().is_err());
    }

    #[test]
    fn test_plan_accepts_missing_args() {
        let plan: Plan = serde_json::from_str(r#"{"command": "get_top_entities"}"#).unwrap();
        assert!(plan.args.is_empty());
    }
}
