//! Scripted `InferenceModel` for exercising the pipeline without a network.

use async_trait::async_trait;
use nq_core::{Error, InferenceModel, Result};
use std::sync::Mutex;

#[derive(Debug, Clone)]
enum Reply {
    Text(String),
    Fail,
}

/// Replies are picked by the first rule whose needle occurs in the prompt.
pub struct MockModel {
    rules: Vec<(String, Reply)>,
    fallback: Reply,
    embeddings: Vec<(String, Vec<f32>)>,
    default_embedding: Option<Vec<f32>>,
    prompts: Mutex<Vec<String>>,
}

impl Default for MockModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockModel {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            fallback: Reply::Fail,
            embeddings: Vec::new(),
            default_embedding: Some(vec![1.0, 0.0, 0.0]),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn on(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Text(reply.into())));
        self
    }

    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Reply::Fail));
        self
    }

    /// Reply used when no rule matches. Without one, unmatched prompts fail.
    pub fn otherwise(mut self, reply: impl Into<String>) -> Self {
        self.fallback = Reply::Text(reply.into());
        self
    }

    pub fn embedding(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings.push((text.into(), embedding));
        self
    }

    pub fn fail_embeddings(mut self) -> Self {
        self.default_embedding = None;
        self
    }

    /// Every text prompt received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls_containing(&self, needle: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(needle)).count()
    }
}

#[async_trait]
impl InferenceModel for MockModel {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn generate_text(&self, prompt: &str, _temperature: f32) -> Result<String> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply)
            .unwrap_or(&self.fallback);

        match reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail => Err(Error::Inference("mock generation failure".to_string())),
        }
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        if let Some((_, embedding)) = self.embeddings.iter().find(|(t, _)| t == text) {
            return Ok(embedding.clone());
        }
        self.default_embedding
            .clone()
            .ok_or_else(|| Error::Inference("mock embedding failure".to_string()))
    }
}
