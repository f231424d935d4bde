pub mod args;
pub mod cache;
pub mod command;
pub mod handlers;
pub mod planner;
pub mod prompts;
pub mod registry;
pub mod service;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod validation;

use std::time::Duration;

pub use cache::{request_hash, spawn_sweeper, ResponseCache};
pub use command::CommandKind;
pub use handlers::{CommandHandler, HandlerContext};
pub use planner::Planner;
pub use registry::CommandRegistry;
pub use service::ChatService;
pub use validation::{validate_candidates, ValidationOutcome, Verdict};

/// Tuning knobs of the question-answering pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryConfig {
    /// How many similarity-search candidates go through validation
    pub candidate_limit: usize,
    /// Default size of ranked answers (entities, keywords, topic lists)
    pub top_n: usize,
    pub cache_ttl: Duration,
    pub sweep_interval: Duration,
    /// Temperature of the comparison prompts
    pub synthesis_temperature: f32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            candidate_limit: 10,
            top_n: 10,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(60 * 60),
            synthesis_temperature: 0.3,
        }
    }
}

pub mod prelude {
    pub use super::{ChatService, CommandKind, CommandRegistry, Planner, QueryConfig, ResponseCache};
}
