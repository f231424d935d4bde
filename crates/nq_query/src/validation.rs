//! Relevance check of similarity-search candidates.
//!
//! Every candidate gets one YES/NO generation call. A call that fails keeps
//! its candidate: retrieval prefers availability, so a flaky model widens the
//! result set instead of emptying it.

use futures::future::join_all;
use nq_core::{Article, Error, InferenceModel};
use tracing::{debug, warn};

use crate::prompts;

/// Yes/no prompts are answered deterministically.
pub const VALIDATION_TEMPERATURE: f32 = 0.0;

#[derive(Debug)]
pub enum Verdict {
    Relevant,
    Irrelevant,
    /// The model could not be asked; the candidate is kept.
    Unavailable(Error),
}

impl Verdict {
    pub fn from_reply(reply: &str) -> Self {
        if reply.trim().to_uppercase().starts_with("YES") {
            Verdict::Relevant
        } else {
            Verdict::Irrelevant
        }
    }
}

#[derive(Debug, Default)]
pub struct ValidationOutcome {
    pub validated: Vec<Article>,
    pub soft_failures: usize,
    pub rejected: usize,
}

impl ValidationOutcome {
    fn fold(mut self, (article, verdict): (Article, Verdict)) -> Self {
        match verdict {
            Verdict::Relevant => self.validated.push(article),
            Verdict::Irrelevant => self.rejected += 1,
            Verdict::Unavailable(e) => {
                warn!("⚠️ Could not validate {}, keeping it: {}", article.url, e);
                self.soft_failures += 1;
                self.validated.push(article);
            }
        }
        self
    }
}

async fn judge(model: &dyn InferenceModel, filter: &str, article: &Article) -> Verdict {
    let prompt = prompts::validation_prompt(filter, article);
    match model.generate_text(&prompt, VALIDATION_TEMPERATURE).await {
        Ok(reply) => Verdict::from_reply(&reply),
        Err(e) => Verdict::Unavailable(e),
    }
}

/// Ask about every candidate concurrently and fold the verdicts in candidate order.
pub async fn validate_candidates(model: &dyn InferenceModel, filter: &str, candidates: Vec<Article>) -> ValidationOutcome {
    let verdicts = join_all(candidates.iter().map(|article| judge(model, filter, article))).await;

    let outcome = candidates
        .into_iter()
        .zip(verdicts)
        .fold(ValidationOutcome::default(), ValidationOutcome::fold);

    debug!(
        "Validated {} candidate(s) for '{}': {} kept, {} rejected, {} unvalidated",
        outcome.validated.len() + outcome.rejected,
        filter,
        outcome.validated.len(),
        outcome.rejected,
        outcome.soft_failures
    );
    outcome
}
