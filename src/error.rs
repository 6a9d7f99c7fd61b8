//! Error type shared by every fallible scheduler operation.
//!
//! All of these are local programmer errors: they surface at the call that
//! violated the contract and are never retried. Expiration and dead-reference
//! cleanup are not error paths and never produce a [`SchedulerError`].

use thiserror::Error;

/// Errors raised by the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// An argument violated its documented range (e.g. a non-positive span).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A key already present in the effective view of a buffered map was added again.
    #[error("key already exists: {0}")]
    DuplicateKey(String),
    /// A default service was required but none has been registered.
    #[error("no default {0} registered")]
    MissingService(&'static str),
}

/// Convenience alias used across the crate.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

impl SchedulerError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        SchedulerError::InvalidArgument(msg.into())
    }
}
