use nq_core::json::parse_model_json;
use nq_core::{Error, InferenceModel, Plan, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::prompts;

/// Command selection must be reproducible, so planning never samples.
pub const PLANNING_TEMPERATURE: f32 = 0.0;

pub struct Planner {
    model: Arc<dyn InferenceModel>,
}

impl Planner {
    pub fn new(model: Arc<dyn InferenceModel>) -> Self {
        Self { model }
    }

    /// Turn a question into a plan with exactly one generation call.
    pub async fn plan(&self, query: &str) -> Result<Plan> {
        let prompt = prompts::planner_prompt(query);
        let raw = self
            .model
            .generate_text(&prompt, PLANNING_TEMPERATURE)
            .await
            .map_err(|e| match e {
                Error::Timeout(_) => e,
                other => Error::Planning(format!("Generation failed: {}", other)),
            })?;

        let plan: Plan = parse_model_json(&raw).map_err(|e| {
            warn!("🧭 Planner returned unparsable output: {}", raw);
            Error::Planning(format!("Could not parse plan: {}", e))
        })?;

        if plan.command.trim().is_empty() {
            return Err(Error::Planning("Plan has no command".to_string()));
        }

        let plan = Plan {
            command: plan.command.trim().to_string(),
            args: plan.args,
        };
        debug!("🧭 Planned {} with args {:?}", plan.command, plan.args);
        Ok(plan)
    }
}
