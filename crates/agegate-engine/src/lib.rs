//! # agegate-engine
//!
//! Progressive content moderation and age gating.
//!
//! The [`ModerationGate`] inspects a content submission, consults a behavioral
//! age classifier and updates the submitter's enforcement state: warnings, a
//! time-bounded block and automatic reinstatement once the block lifts.
//!
//! ## Components
//!
//! - **age**: whole years of age with month/day cutoff
//! - **KeywordScanner**: first restricted term across configured fields,
//!   short-circuiting
//! - **AgeClassifier**: behavioral age estimate; heuristic and LLM adapters
//! - **EnforcementStateMachine**: pure strike and block transitions
//! - **ModerationGate**: orchestration against a [`UserModerationStore`]
//!
//! Classifier failures never block a submission on their own: the gate logs
//! them and skips the discrepancy check.

pub mod age;
pub mod audit;
pub mod classifier;
pub mod config;
pub mod enforcement;
pub mod error;
pub mod gate;
pub mod mocks;
pub mod scanner;
pub mod store;

pub use age::{age_on, is_adult};
pub use audit::{AuditSink, ModerationEvent, ModerationEventKind, TracingAuditSink};
pub use classifier::{
    AgeClassifier, CompletionRequest, CompletionTransport, HeuristicAgeClassifier,
    HttpCompletionTransport, LlmAgeClassifier,
};
pub use config::{ClassifierConfig, ClassifierKind, ModerationConfig};
pub use enforcement::{
    detect_inconsistency, BlockCheck, EnforcementPolicy, EnforcementStateMachine, StrikeOutcome,
    Transition, Violation, ViolationSignal,
};
pub use error::{ClassifierError, ConfigError, GateError, StoreError};
pub use gate::ModerationGate;
pub use scanner::KeywordScanner;
pub use store::{BlockApplication, InMemoryModerationStore, StoreResult, UserModerationStore};

pub use agegate_types::{
    AgeEstimate, AgeGroup, Decision, FieldValue, KeywordMatch, ListItem, Submission, UserId,
    UserModerationState,
};
