//! Strike enforcement state machine.
//!
//! An account is either ACTIVE (with a warning count) or BLOCKED until a lift
//! time. Transitions for one submission, in order:
//!
//! 1. An expired block returns the account to ACTIVE with zero warnings.
//! 2. An unexpired block denies the submission outright. The block flag
//!    without a lift time is not a block.
//! 3. Flagged content from a declared adult whom the classifier reads as a
//!    minor is denied, counted as a warning and marked suspicious. This never
//!    blocks by itself.
//! 4. Flagged content without a declared birth date is denied, no mutation.
//! 5. Flagged content from an underage account adds a strike. Reaching the
//!    threshold blocks the account for the block duration.
//! 6. Anything else is allowed.
//!
//! Discrepancy denials and strikes share the warning counter, so a mix of
//! both can reach the block threshold.

use agegate_types::{AgeGroup, Decision, UserModerationState};
use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::age::is_adult;

pub const DEFAULT_STRIKE_THRESHOLD: u32 = 3;
pub const DEFAULT_BLOCK_DURATION_SECS: u64 = 24 * 60 * 60;
pub const DEFAULT_ADULT_AGE: u32 = 18;

/// Policy constants of the state machine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnforcementPolicy {
    /// Warning count at which an account is blocked.
    pub strike_threshold: u32,
    pub block_duration: Duration,
    pub adult_age: u32,
}

impl Default for EnforcementPolicy {
    fn default() -> Self {
        Self {
            strike_threshold: DEFAULT_STRIKE_THRESHOLD,
            block_duration: Duration::hours(24),
            adult_age: DEFAULT_ADULT_AGE,
        }
    }
}

/// Result of the block-expiry check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockCheck {
    /// Not blocked.
    Active,
    /// Blocked, but the lift time has passed.
    Expired,
    /// Blocked until the given time.
    Blocked(DateTime<Utc>),
}

/// What one submission contributes to the decision.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViolationSignal {
    /// The keyword scan found a restricted term.
    pub flagged: bool,
    /// Classifier estimate. `None` when the classifier was not consulted or
    /// failed.
    pub estimated_group: Option<AgeGroup>,
}

impl ViolationSignal {
    pub fn clean() -> Self {
        Self::default()
    }

    pub fn flagged(estimated_group: Option<AgeGroup>) -> Self {
        Self {
            flagged: true,
            estimated_group,
        }
    }
}

/// Violation found for an ACTIVE account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Violation {
    None,
    Discrepancy,
    MissingBirthDate,
    UnderageStrike,
}

/// Outcome of a strike, decided on the post-increment warning count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StrikeOutcome {
    Warn { warnings: u32, limit: u32 },
    Block { until: DateTime<Utc> },
}

/// Next state plus the decision, from [`EnforcementStateMachine::apply`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub next: UserModerationState,
    pub decision: Decision,
    /// An expired block was lifted on the way.
    pub reinstated: bool,
}

/// Declared adult whose behavior reads as a minor.
///
/// An `Unknown` estimate is never inconsistent.
pub fn detect_inconsistency(
    date_of_birth: NaiveDate,
    estimated_group: AgeGroup,
    as_of: NaiveDate,
    adult_age: u32,
) -> bool {
    estimated_group == AgeGroup::Minor && is_adult(date_of_birth, as_of, adult_age)
}

/// Pure decision logic over a user's enforcement state.
#[derive(Clone, Debug, Default)]
pub struct EnforcementStateMachine {
    policy: EnforcementPolicy,
}

impl EnforcementStateMachine {
    pub fn new(policy: EnforcementPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &EnforcementPolicy {
        &self.policy
    }

    pub fn check_block(&self, state: &UserModerationState, now: DateTime<Utc>) -> BlockCheck {
        if let Some(until) = state.active_block(now) {
            BlockCheck::Blocked(until)
        } else if state.block_expired(now) {
            BlockCheck::Expired
        } else {
            BlockCheck::Active
        }
    }

    /// Violation for an account already known to be ACTIVE.
    pub fn classify(
        &self,
        state: &UserModerationState,
        signal: &ViolationSignal,
        today: NaiveDate,
    ) -> Violation {
        if !signal.flagged {
            return Violation::None;
        }

        let Some(dob) = state.date_of_birth else {
            return Violation::MissingBirthDate;
        };

        if let Some(group) = signal.estimated_group {
            if detect_inconsistency(dob, group, today, self.policy.adult_age) {
                return Violation::Discrepancy;
            }
        }

        if is_adult(dob, today, self.policy.adult_age) {
            Violation::None
        } else {
            Violation::UnderageStrike
        }
    }

    /// Decide a strike on the count returned by the atomic increment.
    pub fn strike_outcome(&self, new_count: u32, now: DateTime<Utc>) -> StrikeOutcome {
        if new_count >= self.policy.strike_threshold {
            StrikeOutcome::Block {
                until: now + self.policy.block_duration,
            }
        } else {
            StrikeOutcome::Warn {
                warnings: new_count,
                limit: self.policy.strike_threshold,
            }
        }
    }

    /// Run every transition against an owned copy of the state.
    ///
    /// The gate performs the same steps against the store's atomic operations;
    /// this form is for dry runs and reasoning about the policy.
    pub fn apply(
        &self,
        state: &UserModerationState,
        signal: &ViolationSignal,
        now: DateTime<Utc>,
    ) -> Transition {
        let mut next = state.clone();
        let mut reinstated = false;

        match self.check_block(&next, now) {
            BlockCheck::Active => {}
            BlockCheck::Expired => {
                next.is_blocked = false;
                next.blocked_until = None;
                next.content_warning_count = 0;
                reinstated = true;
            }
            BlockCheck::Blocked(until) => {
                return Transition {
                    next,
                    decision: Decision::Blocked { until },
                    reinstated,
                };
            }
        }

        let decision = match self.classify(&next, signal, now.date_naive()) {
            Violation::None => Decision::Allow,
            Violation::MissingBirthDate => Decision::MissingBirthDate,
            Violation::Discrepancy => {
                next.content_warning_count = next.content_warning_count.saturating_add(1);
                next.suspicious_behavior = true;
                Decision::DiscrepancyBlocked
            }
            Violation::UnderageStrike => {
                next.content_warning_count = next.content_warning_count.saturating_add(1);
                match self.strike_outcome(next.content_warning_count, now) {
                    StrikeOutcome::Warn { warnings, limit } => Decision::Warn { warnings, limit },
                    StrikeOutcome::Block { until } => {
                        next.is_blocked = true;
                        next.blocked_until = Some(until);
                        Decision::Blocked { until }
                    }
                }
            }
        };

        Transition {
            next,
            decision,
            reinstated,
        }
    }
}
