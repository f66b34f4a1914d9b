//! User moderation store contract.
//!
//! The durable user record lives outside the engine. The gate reads and writes
//! its moderation fields only through [`UserModerationStore`].

mod memory;

use agegate_types::{UserId, UserModerationState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

pub use memory::InMemoryModerationStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Outcome of a conditional block write.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockApplication {
    /// This call set the block, lifting at the given time.
    Applied(DateTime<Utc>),
    /// An unexpired block was already in place. Carries its lift time.
    AlreadyBlocked(DateTime<Utc>),
}

impl BlockApplication {
    /// Lift time of the block now in force.
    pub fn until(&self) -> DateTime<Utc> {
        match self {
            BlockApplication::Applied(until) | BlockApplication::AlreadyBlocked(until) => *until,
        }
    }

    pub fn was_applied(&self) -> bool {
        matches!(self, BlockApplication::Applied(_))
    }
}

/// Read/write contract over a user's moderation fields.
///
/// Every write must be atomic per user. Implementations over a document or
/// relational database map `increment_warning` onto a native atomic increment
/// that returns the updated row, never onto read-then-replace.
#[async_trait]
pub trait UserModerationStore: Send + Sync {
    /// Current moderation state, or `None` for an unknown user.
    async fn get_moderation_state(
        &self,
        user_id: &UserId,
    ) -> StoreResult<Option<UserModerationState>>;

    /// Clear the block, its lift time and the warning count.
    async fn reset_block(&self, user_id: &UserId) -> StoreResult<()>;

    /// Clear the block, its lift time and the warning count, but only while the
    /// stored record still holds a block whose lift time `now` has reached.
    ///
    /// Returns `true` when this call performed the reset. A record that was
    /// already reinstated, or re-blocked, by a concurrent evaluation is left
    /// untouched.
    async fn reset_block_if_expired(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;

    /// Atomically add one warning and return the post-increment count.
    async fn increment_warning(&self, user_id: &UserId) -> StoreResult<u32>;

    /// Block until `until` unless an unexpired block is already in place.
    ///
    /// The block flag without a lift time does not count as a block here.
    ///
    /// `now` decides whether an existing block has expired.
    async fn apply_block(
        &self,
        user_id: &UserId,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<BlockApplication>;

    /// Mark the account for suspicious age behavior. Sticky and idempotent.
    async fn set_suspicious_behavior(&self, user_id: &UserId) -> StoreResult<()>;
}
