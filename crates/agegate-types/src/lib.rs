//! Core type definitions for agegate moderation.
//!
//! This crate provides the shared data model. No business logic, just types.
//! The engine and every boundary layer depend on this crate.

pub mod age;
pub mod decision;
pub mod ids;
pub mod state;
pub mod submission;

// Re-export primary types at crate root for ergonomic use.
pub use age::{AgeEstimate, AgeGroup};
pub use decision::Decision;
pub use ids::UserId;
pub use state::UserModerationState;
pub use submission::{FieldValue, KeywordMatch, ListItem, Submission};
