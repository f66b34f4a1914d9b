//! Best-effort moderation audit trail.
//!
//! The gate reports every enforcement action to an [`AuditSink`]. Sinks must
//! not fail the evaluation: delivery problems are theirs to log and drop.

use agegate_types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// An enforcement action taken by the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModerationEvent {
    pub id: Uuid,
    pub user_id: UserId,
    pub at: DateTime<Utc>,
    pub kind: ModerationEventKind,
}

impl ModerationEvent {
    pub fn new(user_id: UserId, at: DateTime<Utc>, kind: ModerationEventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            at,
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModerationEventKind {
    /// A block reached its lift time and the account was reinstated.
    BlockExpired,
    /// Underage strike below the threshold.
    Warned { term: String, warnings: u32 },
    /// This evaluation put the block in place.
    BlockApplied {
        term: String,
        warnings: u32,
        until: DateTime<Utc>,
    },
    /// Declared adult read as a minor on adult content.
    DiscrepancyFlagged { term: String, warnings: u32 },
    /// The classifier failed or timed out; the discrepancy check was skipped.
    ClassifierUnavailable { reason: String },
    /// Block and warnings cleared by an administrator.
    Pardoned,
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: ModerationEvent);
}

/// Writes audit events to the `agegate::audit` tracing target.
#[derive(Clone, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: ModerationEvent) {
        let kind = serde_json::to_string(&event.kind).unwrap_or_default();
        info!(
            target: "agegate::audit",
            event_id = %event.id,
            user = %event.user_id,
            at = %event.at,
            kind = %kind,
            "Moderation event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_get_unique_ids() {
        let a = ModerationEvent::new(UserId::new("u"), Utc::now(), ModerationEventKind::Pardoned);
        let b = ModerationEvent::new(UserId::new("u"), Utc::now(), ModerationEventKind::Pardoned);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn kind_serializes_with_type_tag() {
        let kind = ModerationEventKind::Warned {
            term: "nsfw".into(),
            warnings: 1,
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "warned");
        assert_eq!(json["term"], "nsfw");
    }

    #[test]
    fn tracing_sink_accepts_events() {
        TracingAuditSink.record(ModerationEvent::new(
            UserId::new("u"),
            Utc::now(),
            ModerationEventKind::BlockExpired,
        ));
    }
}
