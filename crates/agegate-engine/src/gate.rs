use std::sync::Arc;
use std::time::Duration;

use agegate_types::{AgeGroup, Decision, Submission, UserId};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::audit::{AuditSink, ModerationEvent, ModerationEventKind, TracingAuditSink};
use crate::classifier::AgeClassifier;
use crate::config::ModerationConfig;
use crate::enforcement::{
    BlockCheck, EnforcementPolicy, EnforcementStateMachine, StrikeOutcome, Violation,
    ViolationSignal,
};
use crate::error::{ClassifierError, GateError};
use crate::scanner::KeywordScanner;
use crate::store::UserModerationStore;

/// The moderation gate: decides whether a submission may proceed.
///
/// Step order is fixed:
///
/// 1. Load the user's moderation state
/// 2. Lift an expired block (warnings reset with it), conditionally on the
///    stored record
/// 3. Deny outright while a block is active, without scanning
/// 4. Keyword scan
/// 5. Classifier estimate, only for flagged content
/// 6. Discrepancy / birth date / strike transitions
/// 7. Persist through the store's atomic operations
///
/// Strikes branch on the count returned by the store's atomic increment, never
/// on the count read in step 1, so concurrent submissions cross the block
/// threshold exactly once.
pub struct ModerationGate {
    store: Arc<dyn UserModerationStore>,
    classifier: Option<Arc<dyn AgeClassifier>>,
    audit: Arc<dyn AuditSink>,
    scanner: KeywordScanner,
    machine: EnforcementStateMachine,
    classifier_timeout: Duration,
}

impl ModerationGate {
    /// Create a gate with no classifier and a tracing audit sink.
    pub fn new(store: Arc<dyn UserModerationStore>, config: &ModerationConfig) -> Self {
        Self {
            store,
            classifier: None,
            audit: Arc::new(TracingAuditSink),
            scanner: config.scanner(),
            machine: EnforcementStateMachine::new(config.policy()),
            classifier_timeout: config.classifier_timeout(),
        }
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn AgeClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn scanner(&self) -> &KeywordScanner {
        &self.scanner
    }

    pub fn policy(&self) -> &EnforcementPolicy {
        self.machine.policy()
    }

    /// Evaluate a submission now.
    ///
    /// Anonymous submissions (`user_id` of `None`) are always allowed.
    pub async fn evaluate(
        &self,
        user_id: Option<&UserId>,
        submission: &Submission,
    ) -> Result<Decision, GateError> {
        self.evaluate_at(user_id, submission, Utc::now()).await
    }

    /// Evaluate a submission as of `now`.
    pub async fn evaluate_at(
        &self,
        user_id: Option<&UserId>,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Result<Decision, GateError> {
        let Some(user_id) = user_id else {
            debug!("Anonymous submission, age gate skipped");
            return Ok(Decision::Allow);
        };

        let mut state = self
            .store
            .get_moderation_state(user_id)
            .await?
            .ok_or_else(|| GateError::UserNotFound(user_id.clone()))?;

        match self.machine.check_block(&state, now) {
            BlockCheck::Active => {}
            BlockCheck::Expired => {
                // Only the evaluation that performs the reset reports it.
                if self.store.reset_block_if_expired(user_id, now).await? {
                    info!(user = %user_id, "Block expired, account reinstated");
                    self.emit(user_id, now, ModerationEventKind::BlockExpired);
                } else {
                    debug!(user = %user_id, "Expired block already lifted");
                }
                state.is_blocked = false;
                state.blocked_until = None;
                state.content_warning_count = 0;
            }
            BlockCheck::Blocked(until) => {
                debug!(user = %user_id, %until, "Submission from blocked account");
                return Ok(Decision::Blocked { until });
            }
        }

        let Some(found) = self.scanner.scan(submission) else {
            return Ok(Decision::Allow);
        };

        debug!(
            user = %user_id,
            term = %found.term,
            field = %found.field,
            "Restricted term found"
        );

        let estimated_group = self.estimate(user_id, submission, now).await;
        let signal = ViolationSignal::flagged(estimated_group);

        let decision = match self.machine.classify(&state, &signal, now.date_naive()) {
            Violation::None => Decision::Allow,
            Violation::MissingBirthDate => Decision::MissingBirthDate,
            Violation::Discrepancy => {
                // The flag write is idempotent, so it goes first.
                self.store.set_suspicious_behavior(user_id).await?;
                let warnings = self.store.increment_warning(user_id).await?;

                warn!(
                    user = %user_id,
                    term = %found.term,
                    warnings,
                    "Behavior inconsistent with declared adult age"
                );
                self.emit(
                    user_id,
                    now,
                    ModerationEventKind::DiscrepancyFlagged {
                        term: found.term.clone(),
                        warnings,
                    },
                );
                Decision::DiscrepancyBlocked
            }
            Violation::UnderageStrike => {
                let warnings = self.store.increment_warning(user_id).await?;

                match self.machine.strike_outcome(warnings, now) {
                    StrikeOutcome::Warn { warnings, limit } => {
                        info!(user = %user_id, term = %found.term, warnings, limit, "Underage strike");
                        self.emit(
                            user_id,
                            now,
                            ModerationEventKind::Warned {
                                term: found.term.clone(),
                                warnings,
                            },
                        );
                        Decision::Warn { warnings, limit }
                    }
                    StrikeOutcome::Block { until } => {
                        let applied = self.store.apply_block(user_id, until, now).await?;
                        if applied.was_applied() {
                            info!(user = %user_id, warnings, %until, "Strike limit reached, account blocked");
                            self.emit(
                                user_id,
                                now,
                                ModerationEventKind::BlockApplied {
                                    term: found.term.clone(),
                                    warnings,
                                    until,
                                },
                            );
                        } else {
                            debug!(user = %user_id, warnings, "Block already in place");
                        }
                        Decision::Blocked {
                            until: applied.until(),
                        }
                    }
                }
            }
        };

        Ok(decision)
    }

    /// Administrative override: lift any block and clear the warnings.
    ///
    /// The suspicious-behavior flag is left in place.
    pub async fn pardon(&self, user_id: &UserId) -> Result<(), GateError> {
        if self.store.get_moderation_state(user_id).await?.is_none() {
            return Err(GateError::UserNotFound(user_id.clone()));
        }
        self.store.reset_block(user_id).await?;

        info!(user = %user_id, "Moderation state pardoned");
        self.emit(user_id, Utc::now(), ModerationEventKind::Pardoned);
        Ok(())
    }

    /// Classifier estimate for the scanned text, failing open.
    async fn estimate(
        &self,
        user_id: &UserId,
        submission: &Submission,
        now: DateTime<Utc>,
    ) -> Option<AgeGroup> {
        let classifier = self.classifier.as_ref()?;
        let text = self.scanner.scanned_text(submission);

        let result = tokio::time::timeout(
            self.classifier_timeout,
            classifier.estimate_age_group(&text),
        )
        .await
        .unwrap_or_else(|_| {
            Err(ClassifierError::Timeout(
                u64::try_from(self.classifier_timeout.as_millis()).unwrap_or(u64::MAX),
            ))
        });

        match result {
            Ok(estimate) => {
                debug!(user = %user_id, group = %estimate.group, score = estimate.score, "Age estimate");
                Some(estimate.group)
            }
            Err(e) => {
                warn!(user = %user_id, error = %e, "Age classifier unavailable, skipping discrepancy check");
                self.emit(
                    user_id,
                    now,
                    ModerationEventKind::ClassifierUnavailable {
                        reason: e.to_string(),
                    },
                );
                None
            }
        }
    }

    fn emit(&self, user_id: &UserId, at: DateTime<Utc>, kind: ModerationEventKind) {
        self.audit
            .record(ModerationEvent::new(user_id.clone(), at, kind));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{FixedAgeClassifier, RecordingAuditSink};
    use crate::store::InMemoryModerationStore;
    use agegate_types::{AgeEstimate, UserModerationState};

    fn uid() -> UserId {
        UserId::new("u1")
    }

    fn flagged() -> Submission {
        Submission::new().with_text("caption", "so nsfw")
    }

    async fn setup(
        state: UserModerationState,
    ) -> (ModerationGate, InMemoryModerationStore, Arc<RecordingAuditSink>) {
        let store = InMemoryModerationStore::new();
        store.insert(state).await;
        let audit = Arc::new(RecordingAuditSink::new());
        let gate = ModerationGate::new(Arc::new(store.clone()), &ModerationConfig::default())
            .with_audit(audit.clone());
        (gate, store, audit)
    }

    fn teen() -> UserModerationState {
        let dob = Utc::now().date_naive() - chrono::Duration::days(14 * 365);
        UserModerationState::new(uid()).with_date_of_birth(dob)
    }

    #[tokio::test]
    async fn anonymous_submission_is_allowed() {
        let (gate, _, audit) = setup(teen()).await;
        let decision = gate.evaluate(None, &flagged()).await.unwrap();
        assert_eq!(decision, Decision::Allow);
        assert!(audit.events().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_an_error() {
        let (gate, _, _) = setup(teen()).await;
        let err = gate
            .evaluate(Some(&UserId::new("ghost")), &flagged())
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn warn_is_audited() {
        let (gate, store, audit) = setup(teen()).await;
        let decision = gate.evaluate(Some(&uid()), &flagged()).await.unwrap();

        assert_eq!(decision, Decision::Warn { warnings: 1, limit: 3 });
        assert_eq!(store.snapshot(&uid()).await.unwrap().content_warning_count, 1);
        assert!(matches!(
            audit.events()[0].kind,
            ModerationEventKind::Warned { warnings: 1, .. }
        ));
    }

    #[tokio::test]
    async fn classifier_not_consulted_for_clean_content() {
        let (gate, _, _) = setup(teen()).await;
        let classifier = Arc::new(FixedAgeClassifier::new(AgeEstimate::new(AgeGroup::Minor, 10)));
        let gate = gate.with_classifier(classifier.clone());

        let clean = Submission::new().with_text("caption", "sunset");
        assert!(gate.evaluate(Some(&uid()), &clean).await.unwrap().is_allowed());
        assert_eq!(classifier.calls(), 0);
    }

    #[tokio::test]
    async fn classifier_sees_scanned_text() {
        let (gate, _, _) = setup(teen()).await;
        let classifier = Arc::new(FixedAgeClassifier::new(AgeEstimate::unknown()));
        let gate = gate.with_classifier(classifier.clone());

        let submission = Submission::new()
            .with_text("title", "weekend")
            .with_text("content", "so nsfw")
            .with_text("unrelated", "ignored");
        gate.evaluate(Some(&uid()), &submission).await.unwrap();

        assert_eq!(classifier.calls(), 1);
        assert_eq!(classifier.last_text().as_deref(), Some("so nsfw weekend"));
    }

    #[tokio::test]
    async fn pardon_clears_block_but_keeps_suspicion() {
        let until = Utc::now() + chrono::Duration::hours(5);
        let mut state = teen().with_warnings(3).blocked_until(until);
        state.suspicious_behavior = true;
        let (gate, store, audit) = setup(state).await;

        gate.pardon(&uid()).await.unwrap();

        let state = store.snapshot(&uid()).await.unwrap();
        assert!(!state.is_blocked);
        assert_eq!(state.content_warning_count, 0);
        assert!(state.suspicious_behavior);
        assert_eq!(audit.events()[0].kind, ModerationEventKind::Pardoned);
    }

    #[tokio::test]
    async fn pardon_unknown_user() {
        let (gate, _, _) = setup(teen()).await;
        let err = gate.pardon(&UserId::new("ghost")).await.unwrap_err();
        assert!(matches!(err, GateError::UserNotFound(_)));
    }
}
