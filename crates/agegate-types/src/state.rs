use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The moderation subset of a user record.
///
/// Owned by the user store, but only ever read and written through the
/// moderation engine's store contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModerationState {
    pub user_id: UserId,
    /// Declared date of birth. Flagged content cannot be approved without it.
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub content_warning_count: u32,
    #[serde(default)]
    pub is_blocked: bool,
    /// Only meaningful while `is_blocked` is set; a block needs both.
    #[serde(default)]
    pub blocked_until: Option<DateTime<Utc>>,
    /// Set by the age discrepancy check. Never cleared by the engine.
    #[serde(default)]
    pub suspicious_behavior: bool,
}

impl UserModerationState {
    /// A freshly created account: not blocked, no warnings.
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            date_of_birth: None,
            content_warning_count: 0,
            is_blocked: false,
            blocked_until: None,
            suspicious_behavior: false,
        }
    }

    pub fn with_date_of_birth(mut self, date_of_birth: NaiveDate) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    pub fn with_warnings(mut self, count: u32) -> Self {
        self.content_warning_count = count;
        self
    }

    pub fn blocked_until(mut self, until: DateTime<Utc>) -> Self {
        self.is_blocked = true;
        self.blocked_until = Some(until);
        self
    }

    /// Blocked with a lift time that has been reached.
    pub fn block_expired(&self, now: DateTime<Utc>) -> bool {
        match (self.is_blocked, self.blocked_until) {
            (true, Some(until)) => now >= until,
            _ => false,
        }
    }

    /// Lift time of a block still in force at `now`.
    ///
    /// A block is the flag plus a lift time. The flag alone does not block.
    pub fn active_block(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match (self.is_blocked, self.blocked_until) {
            (true, Some(until)) if now < until => Some(until),
            _ => None,
        }
    }

    pub fn is_blocked_at(&self, now: DateTime<Utc>) -> bool {
        self.active_block(now).is_some()
    }
}
