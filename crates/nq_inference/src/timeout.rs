use async_trait::async_trait;
use nq_core::{Error, InferenceModel, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Bounds every call of the inner model; an expired call fails with `Error::Timeout`.
pub struct TimeoutModel {
    inner: Arc<dyn InferenceModel>,
    timeout: Duration,
}

impl TimeoutModel {
    pub fn new(inner: Arc<dyn InferenceModel>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

#[async_trait]
impl InferenceModel for TimeoutModel {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        match tokio::time::timeout(self.timeout, self.inner.generate_text(prompt, temperature)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ {} text generation timed out after {:?}", self.inner.name(), self.timeout);
                Err(Error::Timeout(self.timeout))
            }
        }
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        match tokio::time::timeout(self.timeout, self.inner.generate_embeddings(text)).await {
            Ok(result) => result,
            Err(_) => {
                warn!("⏱️ {} embedding timed out after {:?}", self.inner.name(), self.timeout);
                Err(Error::Timeout(self.timeout))
            }
        }
    }
}
