//! Behavioral age classification.
//!
//! The gate consumes classifiers through [`AgeClassifier`] only. Two adapters
//! ship with the engine: a local pattern scorer and an LLM verdict adapter
//! that falls back to it.

mod heuristic;
mod http;
mod llm;

use agegate_types::AgeEstimate;
use async_trait::async_trait;

use crate::error::ClassifierError;

pub use heuristic::HeuristicAgeClassifier;
pub use http::{HttpCompletionTransport, DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT};
pub use llm::{
    CompletionRequest, CompletionTransport, LlmAgeClassifier, DEFAULT_MIN_CHARS, DEFAULT_MODEL,
};

/// Estimates an author's age group from free text.
///
/// May be slow or fail independently of the user store. The gate bounds every
/// call with a timeout and fails open.
#[async_trait]
pub trait AgeClassifier: Send + Sync {
    async fn estimate_age_group(&self, text: &str) -> Result<AgeEstimate, ClassifierError>;
}
