//! Errors raised by the stack lifecycle manager.

use std::time::Duration;

use thiserror::Error;

use crate::provider::ProviderError;

/// Failures surfaced by [`super::StackManager`].
#[derive(Debug, Error, Eq, PartialEq)]
pub enum StackError {
    /// Raised when an upsert targets a stack that is mid-transition or
    /// stuck in a rollback or failed state.
    #[error("refusing to update stack {stack}, status {status}")]
    Conflict {
        /// Stack name.
        stack: String,
        /// Status observed before the mutation was attempted.
        status: String,
    },
    /// Raised when polling observes a status outside the healthy set.
    #[error("stack {stack} has unhealthy status {status}")]
    Unhealthy {
        /// Stack name.
        stack: String,
        /// Offending status.
        status: String,
    },
    /// Raised when the stack does not settle before the deadline.
    #[error("timed out waiting for stack change to complete (max {timeout:?}, {status})")]
    Timeout {
        /// Stack name.
        stack: String,
        /// Polling budget that was exhausted.
        timeout: Duration,
        /// Last status observed.
        status: String,
    },
    /// Provider failure passed through unchanged.
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
