use async_trait::async_trait;
use nq_core::{Error, InferenceModel, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::Duration;
use url::Url;

const DEFAULT_MODEL_URL: &str = "http://localhost:11434/gemma3:12b";
const DEFAULT_MODEL: &str = "gemma3:12b";
const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

#[derive(Debug, Clone, PartialEq)]
pub struct OllamaConfig {
    base_url: String,
    model_name: String,
    embedding_model: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model_name: DEFAULT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
        }
    }
}

impl OllamaConfig {
    /// Parse `http://host:port/model`; the path names the generation model.
    pub fn from_url(model_url: Option<&str>, embedding_model: Option<String>) -> Result<Self> {
        let raw = model_url.unwrap_or(DEFAULT_MODEL_URL);
        let parsed = Url::parse(raw).map_err(|e| Error::Inference(format!("Invalid Ollama url {}: {}", raw, e)))?;

        let model_name = parsed.path().trim_matches('/').to_string();
        let host = parsed.host_str().unwrap_or("localhost");
        let port = parsed.port().unwrap_or(11434);

        Ok(Self {
            base_url: format!("{}://{}:{}", parsed.scheme(), host, port),
            model_name: if model_name.is_empty() { DEFAULT_MODEL.to_string() } else { model_name },
            embedding_model: embedding_model.unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
        })
    }

    pub fn with_model_name(mut self, model_name: &str) -> Self {
        self.model_name = model_name.to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: serde_json::Value,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

pub struct OllamaModel {
    client: Client,
    config: OllamaConfig,
}

impl fmt::Debug for OllamaModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OllamaModel")
            .field("client", &"<reqwest::Client>")
            .field("config", &self.config)
            .finish()
    }
}

impl OllamaModel {
    pub fn new(config: OllamaConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl InferenceModel for OllamaModel {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn generate_text(&self, prompt: &str, temperature: f32) -> Result<String> {
        let request = GenerateRequest {
            model: &self.config.model_name,
            prompt,
            stream: false,
            options: json!({ "temperature": temperature }),
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.config.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(response.response)
    }

    async fn generate_embeddings(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(format!("{}/api/embeddings", self.config.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<EmbeddingResponse>()
            .await?;

        if response.embedding.is_empty() {
            return Err(Error::Inference(format!(
                "Ollama returned an empty embedding for model {}",
                self.config.embedding_model
            )));
        }
        Ok(response.embedding)
    }
}
