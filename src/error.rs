//! Error handling for the entity-resolution core
//!
//! This module provides idiomatic Rust error types using thiserror for
//! better error messages and proper error chain handling. The taxonomy
//! mirrors how failures propagate through a domain's pipeline:
//!
//! - `Input`: caller bugs (malformed Level 1 result, missing domain);
//!   never retried.
//! - `TransientLookup`: network/timeout/rate-limit failures from the
//!   registry; retried with backoff.
//! - `PermanentLookup`: bad request / not found; recorded as failed,
//!   not retried.
//! - `StateConflict`: a manual selection attempted against an outcome
//!   that is no longer awaiting review; surfaced to the caller.
//! - `StorageUnavailable`: knowledge base or outcome store unreachable;
//!   fatal to the current domain, batch-level retry expected.

use thiserror::Error;

/// Main error type for the resolution core
#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Transient lookup error: {0}")]
    TransientLookup(#[from] TransientLookupError),

    #[error("Permanent lookup error: {0}")]
    PermanentLookup(#[from] PermanentLookupError),

    #[error("State conflict: {0}")]
    StateConflict(#[from] StateConflictError),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageUnavailableError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Caller-side input problems; never retried
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Missing domain")]
    MissingDomain,

    #[error("Level 1 result for '{domain}' is malformed: {reason}")]
    MalformedLevel1 { domain: String, reason: String },

    #[error("Unknown outcome id '{0}'")]
    UnknownOutcome(uuid::Uuid),

    #[error("Candidate with LEI '{lei}' is not part of outcome '{outcome_id}'")]
    UnknownCandidate { outcome_id: uuid::Uuid, lei: String },
}

/// Retryable registry failures: timeouts, connection resets, 429s, 5xx
#[derive(Error, Debug)]
pub enum TransientLookupError {
    #[error("Registry request timed out")]
    Timeout,

    #[error("Registry connection failed: {0}")]
    Connect(String),

    #[error("Registry rate limit hit (status 429)")]
    RateLimited,

    #[error("Registry server error (status {status})")]
    ServerError { status: u16 },

    #[error("Lookup exhausted {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Non-retryable registry failures for this attempt
#[derive(Error, Debug)]
pub enum PermanentLookupError {
    #[error("Registry rejected request (status {status}): {body}")]
    BadRequest { status: u16, body: String },

    #[error("Registry response could not be decoded: {0}")]
    Decode(String),
}

/// Manual-review state machine guard violations
#[derive(Error, Debug)]
pub enum StateConflictError {
    #[error("Outcome '{outcome_id}' has status '{status}', manual selection requires 'candidates_found'")]
    NotAwaitingReview {
        outcome_id: uuid::Uuid,
        status: String,
    },
}

/// Knowledge base / outcome store infrastructure failures
#[derive(Error, Debug)]
pub enum StorageUnavailableError {
    #[error("Store operation '{operation}' failed: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl StorageUnavailableError {
    pub fn backend(operation: &'static str, source: impl Into<anyhow::Error>) -> Self {
        Self::Backend {
            operation,
            source: source.into(),
        }
    }
}

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, ResolutionError>;

impl ResolutionError {
    /// True if the error should be retried at the lookup level
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientLookup(_))
    }
}
