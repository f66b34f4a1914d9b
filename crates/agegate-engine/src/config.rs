//! Engine configuration

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classifier::{
    AgeClassifier, HeuristicAgeClassifier, HttpCompletionTransport, LlmAgeClassifier,
    DEFAULT_API_KEY_ENV, DEFAULT_ENDPOINT, DEFAULT_MIN_CHARS, DEFAULT_MODEL,
};
use crate::enforcement::{
    EnforcementPolicy, DEFAULT_ADULT_AGE, DEFAULT_BLOCK_DURATION_SECS, DEFAULT_STRIKE_THRESHOLD,
};
use crate::error::{ClassifierError, ConfigError};
use crate::scanner::{KeywordScanner, DEFAULT_RESTRICTED_TERMS, DEFAULT_SCANNED_FIELDS};

/// Longest block duration accepted, in seconds (ten years).
const MAX_BLOCK_DURATION_SECS: u64 = 10 * 365 * 24 * 60 * 60;

/// Moderation policy and collaborator settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Terms flagged as adult content, matched case-insensitively
    #[serde(default = "default_restricted_terms")]
    pub restricted_terms: Vec<String>,

    /// Submission fields scanned, in scan order
    #[serde(default = "default_scanned_fields")]
    pub scanned_fields: Vec<String>,

    /// Warning count that triggers a block (default: 3)
    #[serde(default = "default_strike_threshold")]
    pub strike_threshold: u32,

    /// Block duration in seconds (default: 24h)
    #[serde(default = "default_block_duration_secs")]
    pub block_duration_secs: u64,

    /// Age of majority (default: 18)
    #[serde(default = "default_adult_age")]
    pub adult_age: u32,

    /// Upper bound on a single classifier call in milliseconds
    #[serde(default = "default_classifier_timeout_ms")]
    pub classifier_timeout_ms: u64,

    /// Behavioral classifier selection
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            restricted_terms: default_restricted_terms(),
            scanned_fields: default_scanned_fields(),
            strike_threshold: DEFAULT_STRIKE_THRESHOLD,
            block_duration_secs: DEFAULT_BLOCK_DURATION_SECS,
            adult_age: DEFAULT_ADULT_AGE,
            classifier_timeout_ms: default_classifier_timeout_ms(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ModerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.strike_threshold == 0 {
            return Err(ConfigError::Invalid(
                "strike_threshold must be at least 1".into(),
            ));
        }
        if self.block_duration_secs == 0 || self.block_duration_secs > MAX_BLOCK_DURATION_SECS {
            return Err(ConfigError::Invalid(format!(
                "block_duration_secs must be between 1 and {}",
                MAX_BLOCK_DURATION_SECS
            )));
        }
        if self.classifier_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "classifier_timeout_ms must be positive".into(),
            ));
        }
        if self.scanned_fields.is_empty() {
            return Err(ConfigError::Invalid("scanned_fields is empty".into()));
        }
        Ok(())
    }

    pub fn policy(&self) -> EnforcementPolicy {
        let secs = self.block_duration_secs.min(MAX_BLOCK_DURATION_SECS) as i64;
        EnforcementPolicy {
            strike_threshold: self.strike_threshold,
            block_duration: chrono::Duration::seconds(secs),
            adult_age: self.adult_age,
        }
    }

    pub fn scanner(&self) -> KeywordScanner {
        KeywordScanner::new(&self.restricted_terms, self.scanned_fields.clone())
    }

    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms)
    }
}

/// Which behavioral classifier backs the discrepancy check.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierKind {
    /// Local topic-pattern scoring
    #[default]
    Heuristic,
    /// Hosted text model with heuristic fallback
    Llm,
    /// No classifier; the discrepancy check never fires
    Disabled,
}

/// Classifier configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub kind: ClassifierKind,

    /// OpenAI-compatible API base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Texts up to this many characters skip the model call
    #[serde(default = "default_min_llm_chars")]
    pub min_llm_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            kind: ClassifierKind::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            min_llm_chars: DEFAULT_MIN_CHARS,
        }
    }
}

impl ClassifierConfig {
    /// Build the configured classifier. `None` when disabled.
    pub fn build(
        &self,
        timeout: Duration,
    ) -> Result<Option<Arc<dyn AgeClassifier>>, ClassifierError> {
        match self.kind {
            ClassifierKind::Disabled => Ok(None),
            ClassifierKind::Heuristic => Ok(Some(Arc::new(HeuristicAgeClassifier::new()))),
            ClassifierKind::Llm => {
                let transport =
                    HttpCompletionTransport::from_env(&self.endpoint, &self.api_key_env, timeout)?;
                let classifier = LlmAgeClassifier::new(Arc::new(transport))
                    .with_model(&self.model)
                    .with_min_chars(self.min_llm_chars);
                Ok(Some(Arc::new(classifier)))
            }
        }
    }
}

// Default value helpers
fn default_restricted_terms() -> Vec<String> {
    DEFAULT_RESTRICTED_TERMS.iter().map(|t| t.to_string()).collect()
}

fn default_scanned_fields() -> Vec<String> {
    DEFAULT_SCANNED_FIELDS.iter().map(|f| f.to_string()).collect()
}

fn default_strike_threshold() -> u32 {
    DEFAULT_STRIKE_THRESHOLD
}

fn default_block_duration_secs() -> u64 {
    DEFAULT_BLOCK_DURATION_SECS
}

fn default_adult_age() -> u32 {
    DEFAULT_ADULT_AGE
}

fn default_classifier_timeout_ms() -> u64 {
    3_000
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_min_llm_chars() -> usize {
    DEFAULT_MIN_CHARS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_constants() {
        let config = ModerationConfig::default();
        let policy = config.policy();
        assert_eq!(policy.strike_threshold, 3);
        assert_eq!(policy.block_duration, chrono::Duration::hours(24));
        assert_eq!(policy.adult_age, 18);
        assert_eq!(config.classifier.kind, ClassifierKind::Heuristic);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_document_fills_defaults() {
        let config: ModerationConfig = serde_json::from_str(
            r#"{"strike_threshold": 5, "classifier": {"kind": "disabled"}}"#,
        )
        .unwrap();
        assert_eq!(config.strike_threshold, 5);
        assert_eq!(config.restricted_terms.len(), 7);
        assert_eq!(config.scanned_fields[0], "content");
        assert_eq!(config.classifier.kind, ClassifierKind::Disabled);
        assert_eq!(config.classifier.model, DEFAULT_MODEL);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let config = ModerationConfig {
            strike_threshold: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn oversized_block_duration_is_rejected() {
        let config = ModerationConfig {
            block_duration_secs: u64::MAX,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn scanner_uses_configured_terms() {
        let config = ModerationConfig {
            restricted_terms: vec!["Spoiler".into()],
            scanned_fields: vec!["title".into()],
            ..Default::default()
        };
        let scanner = config.scanner();
        assert_eq!(scanner.terms(), ["spoiler".to_string()]);
        assert_eq!(scanner.fields(), ["title".to_string()]);
    }

    #[test]
    fn disabled_classifier_builds_nothing() {
        let config = ClassifierConfig {
            kind: ClassifierKind::Disabled,
            ..Default::default()
        };
        assert!(config.build(Duration::from_secs(1)).unwrap().is_none());
    }

    #[test]
    fn llm_classifier_requires_api_key() {
        let config = ClassifierConfig {
            kind: ClassifierKind::Llm,
            api_key_env: "AGEGATE_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..Default::default()
        };
        assert!(matches!(
            config.build(Duration::from_secs(1)),
            Err(ClassifierError::InvalidConfig(_))
        ));
    }
}
