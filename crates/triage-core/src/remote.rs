//! Remote workflow boundary
//!
//! The engine only sees this trait; the HTTP implementation lives in the
//! `triage-remote` crate so the core stays transport-free. Contract:
//! - [`RemoteWorkflow::generate_incident`] never fails out of the boundary:
//!   any failure falls back to the base incident.
//! - [`RemoteWorkflow::trigger_workflow`] reports failures (including a
//!   distinguishable timeout and the unconfigured case) in the returned
//!   response rather than panicking or hanging.

use crate::error::RemoteError;
use crate::types::{Incident, ResolutionPath};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Normalized payload extracted from a remote workflow reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteOutcome {
    /// Ticket the remote workflow created
    pub jira_ticket: Option<String>,
    /// Knowledge-base page URL the remote workflow created
    pub confluence_page: Option<String>,
    /// Confidence score the remote decision produced (0-100)
    pub confidence_score: Option<u8>,
    /// Resolution path the remote decision chose
    pub resolution_path: Option<ResolutionPath>,
    /// Free-form status message
    pub message: Option<String>,
}

/// Result of a remote trigger call
#[derive(Debug)]
pub struct TriggerResponse {
    /// Whether the call produced usable data
    pub success: bool,
    /// Normalized payload, on success
    pub data: Option<RemoteOutcome>,
    /// Failure classification, on failure
    pub error: Option<RemoteError>,
}

impl TriggerResponse {
    /// Successful response carrying a normalized outcome
    #[inline]
    #[must_use]
    pub fn ok(data: RemoteOutcome) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed response carrying a classified error
    #[inline]
    #[must_use]
    pub fn failure(error: RemoteError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Boundary to the external automation stack
#[async_trait]
pub trait RemoteWorkflow: Send + Sync {
    /// Generate a fresh incident for the given path
    ///
    /// Falls back to `base` unchanged on any failure; errors are logged at
    /// the boundary, never surfaced.
    async fn generate_incident(&self, path_hint: ResolutionPath, base: &Incident) -> Incident;

    /// Post the incident to the remote workflow webhook
    ///
    /// Enforces a hard timeout; when no webhook is configured, returns an
    /// immediate failure without touching the network.
    async fn trigger_workflow(&self, incident: &Incident) -> TriggerResponse;

    /// Whether live mode can be offered at all
    ///
    /// Pure configuration check; the front-end disables live mode when this
    /// is false instead of attempting a call.
    fn live_available(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_response_constructors() {
        let ok = TriggerResponse::ok(RemoteOutcome {
            jira_ticket: Some("SAP-1".to_string()),
            ..RemoteOutcome::default()
        });
        assert!(ok.success);
        assert!(ok.error.is_none());

        let failed = TriggerResponse::failure(RemoteError::NotConfigured);
        assert!(!failed.success);
        assert!(failed.data.is_none());
        assert!(matches!(failed.error, Some(RemoteError::NotConfigured)));
    }

    #[test]
    fn remote_outcome_deserializes_from_normalized_json() {
        let outcome: RemoteOutcome = serde_json::from_value(serde_json::json!({
            "jira_ticket": "SAP-42",
            "confluence_page": null,
            "confidence_score": 85,
            "resolution_path": "assisted",
            "message": "ok",
        }))
        .unwrap();
        assert_eq!(outcome.jira_ticket.as_deref(), Some("SAP-42"));
        assert_eq!(outcome.resolution_path, Some(ResolutionPath::Assisted));
    }
}
