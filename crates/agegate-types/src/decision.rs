use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a moderation evaluation.
///
/// The engine never renders transport responses. The boundary layer maps each
/// variant to its own status and message, typically:
///
/// | Decision             | Boundary rendering                  |
/// |----------------------|-------------------------------------|
/// | `Allow`              | pipeline continues                  |
/// | `Warn`               | forbidden, with the warning count   |
/// | `Blocked`            | forbidden, with `until`             |
/// | `DiscrepancyBlocked` | forbidden, flagged for verification |
/// | `MissingBirthDate`   | bad request                         |
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    /// Under-age strike recorded; `warnings` of `limit` used.
    Warn { warnings: u32, limit: u32 },
    /// Account blocked until the lift time.
    Blocked { until: DateTime<Utc> },
    /// Behavior contradicts the declared age on adult content.
    DiscrepancyBlocked,
    /// Adult content needs a declared date of birth.
    MissingBirthDate,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_denied(&self) -> bool {
        !self.is_allowed()
    }

    /// When the restriction lifts, if it is time-bounded.
    pub fn blocked_until(&self) -> Option<DateTime<Utc>> {
        match self {
            Decision::Blocked { until } => Some(*until),
            _ => None,
        }
    }

    /// Human-readable reason, suitable for showing to the submitter.
    pub fn reason(&self) -> String {
        match self {
            Decision::Allow => "Content allowed".into(),
            Decision::Warn { warnings, limit } => format!(
                "Content not allowed for underage users. Warning {}/{}.",
                warnings, limit
            ),
            Decision::Blocked { until } => format!(
                "Your account is temporarily blocked due to content violations until {}",
                until.to_rfc3339()
            ),
            Decision::DiscrepancyBlocked => "Behavior inconsistent with your declared age was \
                detected. Content blocked for safety verification."
                .into(),
            Decision::MissingBirthDate => {
                "Date of birth is required for content verification".into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates() {
        assert!(Decision::Allow.is_allowed());
        assert!(Decision::MissingBirthDate.is_denied());
        assert!(Decision::Warn { warnings: 1, limit: 3 }.is_denied());
    }

    #[test]
    fn blocked_carries_lift_time() {
        let until = Utc::now();
        let decision = Decision::Blocked { until };
        assert_eq!(decision.blocked_until(), Some(until));
        assert!(decision.reason().contains(&until.to_rfc3339()));
        assert_eq!(Decision::DiscrepancyBlocked.blocked_until(), None);
    }

    #[test]
    fn warn_reason_mentions_count() {
        let reason = Decision::Warn { warnings: 2, limit: 3 }.reason();
        assert!(reason.contains("2/3"));
    }

    #[test]
    fn serializes_with_status_tag() {
        let json = serde_json::to_value(Decision::Warn { warnings: 1, limit: 3 }).unwrap();
        assert_eq!(json["status"], "warn");
        assert_eq!(json["warnings"], 1);

        let json = serde_json::to_value(Decision::MissingBirthDate).unwrap();
        assert_eq!(json["status"], "missing_birth_date");
    }
}
