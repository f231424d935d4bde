use nq_core::{InferenceModel, Result};
use std::fmt;

pub const DUMMY_VECTOR_SIZE: usize = 384;

/// Offline model: deterministic hashed bag-of-words embeddings and
/// either a fixed reply or the first words of the prompt.
pub struct DummyModel {
    reply: Option<String>,
}

impl fmt::Debug for DummyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DummyModel").field("reply", &self.reply).finish()
    }
}

impl Default for DummyModel {
    fn default() -> Self {
        Self::new()
    }
}

impl DummyModel {
    pub fn new() -> Self {
        Self { reply: None }
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
        }
    }
}

// FNV-1a, stable across runs and platforms
fn bucket(word: &str) -> usize {
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in word.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    (hash % DUMMY_VECTOR_SIZE as u64) as usize
}

#[async_trait::async_trait]
impl InferenceModel for DummyModel {
    fn name(&self) -> &str {
        "Dummy"
    }

    async fn generate_text(&self, prompt: &str, _temperature: f32) -> Result<String> {
        if let Some(reply) = &self.reply {
            return Ok(reply.clone());
        }
        let words: Vec<&str> = prompt.split_whitespace().take(20).collect();
        Ok(words.join(" "))
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; DUMMY_VECTOR_SIZE];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            embedding[bucket(&word.to_lowercase())] += 1.0;
        }

        let norm = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nq_core::cosine_similarity;

    #[tokio::test]
    async fn test_dummy_model() {
        let model = DummyModel::new();

        let text = model
            .generate_text("This is a test article. It has multiple sentences.", 0.0)
            .await
            .unwrap();
        assert!(text.starts_with("This is a test article"));

        let embedding = model.generate_embeddings("Test text").await.unwrap();
        assert_eq!(embedding.len(), DUMMY_VECTOR_SIZE);
        assert!(embedding.iter().any(|x| *x > 0.0));
    }

    #[tokio::test]
    async fn test_dummy_embeddings_are_deterministic() {
        let model = DummyModel::new();
        let a = model.generate_embeddings("Central bank raises rates").await.unwrap();
        let b = model.generate_embeddings("central bank RAISES rates").await.unwrap();
        let c = model.generate_embeddings("football final tonight").await.unwrap();

        assert_eq!(a, b);
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }

    #[tokio::test]
    async fn test_fixed_reply() {
        let model = DummyModel::with_reply("YES");
        assert_eq!(model.generate_text("anything", 0.7).await.unwrap(), "YES");
    }
}
