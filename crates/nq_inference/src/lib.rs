use std::time::Duration;

pub mod models;
pub mod timeout;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct Config {
    /// One of `ollama`, `openai` (alias `deepseek`) or `dummy`
    pub model: String,
    pub model_url: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub embedding_model: Option<String>,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: "ollama".to_string(),
            model_url: None,
            api_key: None,
            model_name: None,
            embedding_model: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

pub mod prelude {
    pub use super::models::{create_model, DummyModel, ModelKind};
    pub use super::timeout::TimeoutModel;
    pub use super::Config;
    pub use nq_core::{Error, InferenceModel, Result};
}

pub use models::create_model;
pub use timeout::TimeoutModel;
