use agegate_types::UserId;
use thiserror::Error;

/// Errors from the moderation gate.
///
/// Denials are not errors: they are returned as a `Decision`. These variants
/// cover the cases where no decision could be reached.
#[derive(Error, Debug)]
pub enum GateError {
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Errors from the user moderation store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("user not found in store: {0}")]
    NotFound(UserId),

    #[error("write failed for {user_id}: {reason}")]
    WriteFailed { user_id: UserId, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from a behavioral age classifier.
///
/// The gate treats every variant the same way: the discrepancy check is
/// skipped for that submission.
#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier timed out after {0} ms")]
    Timeout(u64),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid classifier configuration: {0}")]
    InvalidConfig(String),
}

/// Invalid engine configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_converts_into_gate_error() {
        let err: GateError = StoreError::Unavailable("connection reset".into()).into();
        assert!(matches!(err, GateError::Store(_)));
        assert!(err.to_string().contains("connection reset"));
    }

    #[test]
    fn error_display() {
        let err = GateError::UserNotFound(UserId::new("ghost"));
        assert_eq!(err.to_string(), "user not found: usr:ghost");

        let err = ClassifierError::Timeout(250);
        assert!(err.to_string().contains("250 ms"));
    }
}
