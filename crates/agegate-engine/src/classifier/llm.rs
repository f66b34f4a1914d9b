use std::sync::Arc;

use agegate_types::{AgeEstimate, AgeGroup};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{AgeClassifier, HeuristicAgeClassifier};
use crate::error::ClassifierError;

pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Texts this short are scored locally without a model call.
pub const DEFAULT_MIN_CHARS: usize = 20;

/// Score bonus when the model itself reports a minor.
const MODEL_MINOR_BONUS: u32 = 10;

/// Minimal completion request sent to a text model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
}

/// Transport abstraction over a hosted text model.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// Returns the raw completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ClassifierError>;
}

/// Asks a text model for a one-word MINOR/ADULT verdict.
///
/// Short texts and unrecognised verdicts are scored by the local heuristic
/// instead. Transport failures are returned as errors so the gate can fail
/// open.
#[derive(Clone)]
pub struct LlmAgeClassifier {
    transport: Arc<dyn CompletionTransport>,
    model: String,
    min_chars: usize,
    heuristic: HeuristicAgeClassifier,
}

impl std::fmt::Debug for LlmAgeClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmAgeClassifier")
            .field("model", &self.model)
            .field("min_chars", &self.min_chars)
            .finish()
    }
}

impl LlmAgeClassifier {
    pub fn new(transport: Arc<dyn CompletionTransport>) -> Self {
        Self {
            transport,
            model: DEFAULT_MODEL.to_string(),
            min_chars: DEFAULT_MIN_CHARS,
            heuristic: HeuristicAgeClassifier::new(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    fn prompt(text: &str) -> String {
        format!(
            "Analyze the following social media content. The author claims to be an adult, \
             but may be a minor misrepresenting their age.\n\n\
             Content: \"{}\"\n\n\
             Rules:\n\
             1. Decide whether the vocabulary, interests or topics are typical of a minor \
             (school, children's games, parents' rules, elementary topics).\n\
             2. If the author is highly likely a minor, reply ONLY with 'MINOR'.\n\
             3. If the author is likely an adult or the content is neutral, reply ONLY with 'ADULT'.\n\n\
             The response must be exactly one word: 'MINOR' or 'ADULT'.",
            text
        )
    }
}

/// Parse a model verdict, tolerating case, whitespace and quoting.
fn parse_verdict(raw: &str) -> Option<AgeGroup> {
    let word = raw
        .trim()
        .trim_matches(|c: char| !c.is_ascii_alphanumeric())
        .to_ascii_uppercase();
    match word.as_str() {
        "MINOR" => Some(AgeGroup::Minor),
        "ADULT" => Some(AgeGroup::Adult),
        _ => None,
    }
}

#[async_trait]
impl AgeClassifier for LlmAgeClassifier {
    async fn estimate_age_group(&self, text: &str) -> Result<AgeEstimate, ClassifierError> {
        if text.chars().count() > self.min_chars {
            let request = CompletionRequest {
                model: self.model.clone(),
                prompt: Self::prompt(text),
                max_tokens: 4,
            };
            let raw = self.transport.complete(&request).await?;
            debug!(verdict = %raw.trim(), "Behavior analysis verdict");

            match parse_verdict(&raw) {
                Some(AgeGroup::Minor) => {
                    let score = MODEL_MINOR_BONUS + self.heuristic.child_score(text);
                    return Ok(AgeEstimate::new(AgeGroup::Minor, score));
                }
                Some(AgeGroup::Adult) => {
                    return Ok(AgeEstimate::new(
                        AgeGroup::Adult,
                        self.heuristic.adult_score(text),
                    ));
                }
                _ => {}
            }
        }

        Ok(self.heuristic.estimate(text))
    }
}
