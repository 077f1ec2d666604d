//! Error types for the execution-routing core.
//!
//! Only caller misuse is surfaced as an error. Degraded conditions the core
//! recovers from on its own (unparseable LLM replies, missing collaborators,
//! persistence I/O failures) are logged and reported through return values
//! instead, so no routine query path can fail.

use thiserror::Error;

/// Errors surfaced to callers of the routing core
#[derive(Debug, Error)]
pub enum Error {
    /// Feedback score outside the 1..=5 rating scale
    #[error("feedback score must be between 1 and 5, got {0}")]
    InvalidFeedbackScore(u8),
}

pub type Result<T> = std::result::Result<T, Error>;
