//! Subcommand handlers. Each returns a serializable report for `main` to print.

use std::path::Path;
use std::sync::Arc;

use agegate_engine::{
    age_on, is_adult, Decision, InMemoryModerationStore, KeywordMatch, ModerationConfig,
    ModerationGate, Submission, UserId, UserModerationState,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

/// Outcome of `agegate check`.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub decision: Decision,
    pub reason: String,
    /// Moderation state after the evaluation
    pub state: Option<UserModerationState>,
}

/// Outcome of `agegate age`.
#[derive(Debug, Serialize)]
pub struct AgeReport {
    pub date_of_birth: NaiveDate,
    pub as_of: NaiveDate,
    pub age: i32,
    pub adult: bool,
}

pub struct CheckArgs<'a> {
    pub state: UserModerationState,
    pub submission: Submission,
    pub user_id: Option<UserId>,
    pub anonymous: bool,
    pub now: Option<DateTime<Utc>>,
    pub config: &'a ModerationConfig,
}

/// Evaluate one submission against a single seeded user.
pub async fn check(args: CheckArgs<'_>) -> Result<CheckReport> {
    let config = args.config;
    config.validate()?;

    let store = InMemoryModerationStore::new();
    let seeded = args.state.user_id.clone();
    store.insert(args.state).await;

    let mut gate = ModerationGate::new(Arc::new(store.clone()), config);
    if let Some(classifier) = config
        .classifier
        .build(config.classifier_timeout())
        .context("failed to build age classifier")?
    {
        gate = gate.with_classifier(classifier);
    }

    let user_id = if args.anonymous {
        None
    } else {
        Some(args.user_id.unwrap_or_else(|| seeded.clone()))
    };
    let now = args.now.unwrap_or_else(Utc::now);
    debug!(user = ?user_id, %now, "Evaluating submission");

    let decision = gate.evaluate_at(user_id.as_ref(), &args.submission, now).await?;
    let state = store.snapshot(&seeded).await;

    Ok(CheckReport {
        reason: decision.reason(),
        decision,
        state,
    })
}

/// First restricted term in the submission, if any.
pub fn scan(submission: &Submission, config: &ModerationConfig) -> Option<KeywordMatch> {
    config.scanner().scan(submission)
}

pub fn age(
    date_of_birth: NaiveDate,
    as_of: Option<NaiveDate>,
    config: &ModerationConfig,
) -> AgeReport {
    let as_of = as_of.unwrap_or_else(|| Utc::now().date_naive());
    AgeReport {
        date_of_birth,
        as_of,
        age: age_on(date_of_birth, as_of),
        adult: is_adult(date_of_birth, as_of, config.adult_age),
    }
}

/// Read and deserialize a JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", path.display()))
}
