//! Error types for the triage core
//!
//! Classifies the failure modes the engine distinguishes:
//! - Remote boundary failures (configuration, timeout, transport, payload)
//! - Step execution failures (fatal to the current run only)

use crate::catalog::StepId;

/// Failure classification for the remote workflow boundary
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// No webhook endpoint configured; queryable, never fatal
    #[error("remote webhook not configured")]
    NotConfigured,

    /// The call exceeded the hard wall-clock bound
    #[error("remote call timed out after {limit_secs}s")]
    Timeout { limit_secs: u64 },

    /// The endpoint answered with a non-success status
    #[error("remote endpoint returned status {status}")]
    Http { status: u16 },

    /// Transport-level failure (DNS, connect, TLS, ...)
    #[error("remote call failed: {0}")]
    Network(String),

    /// The endpoint answered with a body we could not interpret
    #[error("remote reply malformed: {0}")]
    Malformed(String),
}

impl RemoteError {
    /// Whether this failure was the hard timeout
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, RemoteError::Timeout { .. })
    }
}

/// A step raised an error while being processed
///
/// Fatal to the current execution only: the step is marked failed, the
/// traversal halts, and recovery is an explicit reset.
#[derive(Debug, thiserror::Error)]
#[error("step {step} failed: {message}")]
pub struct StepError {
    /// The step that failed
    pub step: StepId,
    /// What went wrong
    pub message: String,
}

impl StepError {
    /// New step failure
    #[inline]
    #[must_use]
    pub fn new(step: StepId, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_distinguishable_from_network_failure() {
        assert!(RemoteError::Timeout { limit_secs: 60 }.is_timeout());
        assert!(!RemoteError::Network("connection refused".to_string()).is_timeout());
        assert!(!RemoteError::NotConfigured.is_timeout());
    }

    #[test]
    fn step_error_names_the_step() {
        let err = StepError::new(StepId::Decision, "boom");
        assert_eq!(err.to_string(), "step decision failed: boom");
    }
}
