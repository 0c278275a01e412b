//! Engine error taxonomy.
//!
//! Attempt-level failures (apply, validation, unconfirmed submission) are
//! folded into the attempt's recorded outcome and never bubble out of
//! `run_attempt` as errors. The variants here that do escape are the
//! session-fatal ones: `PacingThrottled` (stop starting attempts) and
//! `PacingBlocked` (end the session entirely).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A required element could not be bound to any answer.
    #[error("unresolved required field: {0}")]
    MappingIncomplete(String),

    /// Applying a binding to its element failed after one retry.
    #[error("field apply failed: {0}")]
    ElementApply(String),

    /// Client-side validation rejected a filled field after one re-fill.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A navigation or settle wait exceeded its timeout.
    #[error("navigation timed out")]
    NavigationTimeout,

    /// No success signal arrived within the bounded wait after submit.
    #[error("submission unconfirmed")]
    SubmissionUnconfirmed,

    /// The session action or application budget is exhausted.
    #[error("session budget exhausted")]
    PacingThrottled,

    /// An externally observed restriction signal — fatal for the session.
    #[error("session blocked by restriction signal")]
    PacingBlocked,

    /// The upstream content-generation collaborator failed.
    #[error("content generation failed: {0}")]
    ContentGeneration(String),

    /// The browser driver failed outside any retryable element apply.
    #[error("driver failure: {0}")]
    Driver(String),
}
