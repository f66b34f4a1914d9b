use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use agegate_types::{AgeEstimate, UserId, UserModerationState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::audit::{AuditSink, ModerationEvent};
use crate::classifier::AgeClassifier;
use crate::error::{ClassifierError, StoreError};
use crate::store::{BlockApplication, InMemoryModerationStore, StoreResult, UserModerationStore};

/// Classifier returning a canned estimate.
///
/// Remembers how often it was called and the last text it saw.
#[derive(Debug)]
pub struct FixedAgeClassifier {
    estimate: AgeEstimate,
    calls: AtomicUsize,
    last_text: Mutex<Option<String>>,
}

impl FixedAgeClassifier {
    pub fn new(estimate: AgeEstimate) -> Self {
        Self {
            estimate,
            calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl AgeClassifier for FixedAgeClassifier {
    async fn estimate_age_group(&self, text: &str) -> Result<AgeEstimate, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_text
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(text.to_string());
        Ok(self.estimate)
    }
}

/// Classifier that always fails.
#[derive(Debug, Default)]
pub struct FailingAgeClassifier;

#[async_trait]
impl AgeClassifier for FailingAgeClassifier {
    async fn estimate_age_group(&self, _text: &str) -> Result<AgeEstimate, ClassifierError> {
        Err(ClassifierError::Unavailable("mock classifier: down".into()))
    }
}

/// Classifier that answers only after `delay`.
#[derive(Debug)]
pub struct StalledAgeClassifier {
    delay: Duration,
    estimate: AgeEstimate,
}

impl StalledAgeClassifier {
    pub fn new(delay: Duration, estimate: AgeEstimate) -> Self {
        Self { delay, estimate }
    }
}

#[async_trait]
impl AgeClassifier for StalledAgeClassifier {
    async fn estimate_age_group(&self, _text: &str) -> Result<AgeEstimate, ClassifierError> {
        tokio::time::sleep(self.delay).await;
        Ok(self.estimate)
    }
}

/// Audit sink that keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<ModerationEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ModerationEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: ModerationEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}

/// Store whose reads succeed but whose writes all fail.
#[derive(Debug, Clone)]
pub struct ReadOnlyStore {
    inner: Arc<InMemoryModerationStore>,
}

impl ReadOnlyStore {
    pub fn new(inner: Arc<InMemoryModerationStore>) -> Self {
        Self { inner }
    }

    fn refuse(user_id: &UserId) -> StoreError {
        StoreError::WriteFailed {
            user_id: user_id.clone(),
            reason: "mock store is read-only".into(),
        }
    }
}

#[async_trait]
impl UserModerationStore for ReadOnlyStore {
    async fn get_moderation_state(
        &self,
        user_id: &UserId,
    ) -> StoreResult<Option<UserModerationState>> {
        self.inner.get_moderation_state(user_id).await
    }

    async fn reset_block(&self, user_id: &UserId) -> StoreResult<()> {
        Err(Self::refuse(user_id))
    }

    async fn reset_block_if_expired(
        &self,
        user_id: &UserId,
        _now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Err(Self::refuse(user_id))
    }

    async fn increment_warning(&self, user_id: &UserId) -> StoreResult<u32> {
        Err(Self::refuse(user_id))
    }

    async fn apply_block(
        &self,
        user_id: &UserId,
        _until: DateTime<Utc>,
        _now: DateTime<Utc>,
    ) -> StoreResult<BlockApplication> {
        Err(Self::refuse(user_id))
    }

    async fn set_suspicious_behavior(&self, user_id: &UserId) -> StoreResult<()> {
        Err(Self::refuse(user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agegate_types::AgeGroup;

    #[tokio::test]
    async fn fixed_classifier_counts_calls() {
        let classifier = FixedAgeClassifier::new(AgeEstimate::new(AgeGroup::Minor, 3));
        let estimate = classifier.estimate_age_group("hello").await.unwrap();
        assert_eq!(estimate.group, AgeGroup::Minor);
        assert_eq!(classifier.calls(), 1);
        assert_eq!(classifier.last_text().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn read_only_store_refuses_writes() {
        let inner = Arc::new(InMemoryModerationStore::new());
        inner.insert(UserModerationState::new("u1")).await;
        let store = ReadOnlyStore::new(inner);

        let uid = UserId::new("u1");
        assert!(store.get_moderation_state(&uid).await.unwrap().is_some());
        assert!(matches!(
            store.increment_warning(&uid).await,
            Err(StoreError::WriteFailed { .. })
        ));
    }
}
