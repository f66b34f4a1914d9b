//! In-memory store implementation

use std::collections::HashMap;
use std::sync::Arc;

use agegate_types::{UserId, UserModerationState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{BlockApplication, StoreResult, UserModerationStore};
use crate::error::StoreError;

/// In-memory store for development and testing.
///
/// Each write holds the map's write lock for the whole read-modify-write, which
/// makes every operation atomic per user.
#[derive(Debug, Clone, Default)]
pub struct InMemoryModerationStore {
    users: Arc<RwLock<HashMap<UserId, UserModerationState>>>,
}

impl InMemoryModerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user's moderation state.
    pub async fn insert(&self, state: UserModerationState) {
        let mut users = self.users.write().await;
        users.insert(state.user_id.clone(), state);
    }

    /// Copy of a user's current state, for inspection.
    pub async fn snapshot(&self, user_id: &UserId) -> Option<UserModerationState> {
        let users = self.users.read().await;
        users.get(user_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserModerationStore for InMemoryModerationStore {
    async fn get_moderation_state(
        &self,
        user_id: &UserId,
    ) -> StoreResult<Option<UserModerationState>> {
        let users = self.users.read().await;
        Ok(users.get(user_id).cloned())
    }

    async fn reset_block(&self, user_id: &UserId) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let state = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;
        state.is_blocked = false;
        state.blocked_until = None;
        state.content_warning_count = 0;
        Ok(())
    }

    async fn reset_block_if_expired(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut users = self.users.write().await;
        let state = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;
        if !state.block_expired(now) {
            return Ok(false);
        }
        state.is_blocked = false;
        state.blocked_until = None;
        state.content_warning_count = 0;
        Ok(true)
    }

    async fn increment_warning(&self, user_id: &UserId) -> StoreResult<u32> {
        let mut users = self.users.write().await;
        let state = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;
        state.content_warning_count = state.content_warning_count.saturating_add(1);
        Ok(state.content_warning_count)
    }

    async fn apply_block(
        &self,
        user_id: &UserId,
        until: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> StoreResult<BlockApplication> {
        let mut users = self.users.write().await;
        let state = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;

        if let Some(existing) = state.active_block(now) {
            return Ok(BlockApplication::AlreadyBlocked(existing));
        }

        state.is_blocked = true;
        state.blocked_until = Some(until);
        Ok(BlockApplication::Applied(until))
    }

    async fn set_suspicious_behavior(&self, user_id: &UserId) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let state = users
            .get_mut(user_id)
            .ok_or_else(|| StoreError::NotFound(user_id.clone()))?;
        state.suspicious_behavior = true;
        Ok(())
    }
}
