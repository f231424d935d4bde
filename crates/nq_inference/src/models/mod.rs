use nq_core::{Error, InferenceModel, Result};
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;

use crate::timeout::TimeoutModel;
use crate::Config;

pub mod dummy;
pub mod ollama;
pub mod openai;

pub use dummy::DummyModel;
pub use ollama::{OllamaConfig, OllamaModel};
pub use openai::OpenAiModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Dummy,
    OpenAi,
    Ollama,
}

impl FromStr for ModelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "dummy" => Ok(ModelKind::Dummy),
            "openai" | "deepseek" => Ok(ModelKind::OpenAi),
            "ollama" => Ok(ModelKind::Ollama),
            other => Err(Error::Inference(format!(
                "Unknown model: {}. Available models: ollama, openai, dummy",
                other
            ))),
        }
    }
}

/// Build the configured model, wrapped so every call is bounded by `config.timeout`.
pub fn create_model(config: &Config) -> Result<Arc<dyn InferenceModel>> {
    let kind = ModelKind::from_str(&config.model)?;
    let model: Arc<dyn InferenceModel> = match kind {
        ModelKind::Dummy => Arc::new(DummyModel::new()),
        ModelKind::OpenAi => Arc::new(OpenAiModel::new(
            config.api_key.clone(),
            config.model_url.clone(),
            config.model_name.clone(),
            config.embedding_model.clone(),
            config.timeout,
        )?),
        ModelKind::Ollama => {
            let mut ollama = OllamaConfig::from_url(config.model_url.as_deref(), config.embedding_model.clone())?;
            if let Some(name) = &config.model_name {
                ollama = ollama.with_model_name(name);
            }
            Arc::new(OllamaModel::new(ollama, config.timeout)?)
        }
    };

    info!("🧠 Using {} model ({}s timeout)", model.name(), config.timeout.as_secs());
    Ok(Arc::new(TimeoutModel::new(model, config.timeout)))
}
