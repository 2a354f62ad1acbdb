//! HTTP implementation of the remote workflow boundary
//!
//! - Webhook trigger with a hard timeout, distinguishing timeout from
//!   transport failure in the returned error
//! - Reply normalization: the upstream may use either of two key sets for
//!   the four meaningful fields; both coalesce to one internal shape
//! - Incident generation via the configured endpoint, via OpenAI directly,
//!   or falling back to the base incident; generation never fails out of
//!   the boundary

use crate::config::RemoteConfig;
use crate::generator;
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};
use triage_core::error::RemoteError;
use triage_core::remote::{RemoteOutcome, RemoteWorkflow, TriggerResponse};
use triage_core::types::{Incident, ResolutionPath};

/// Remote workflow client backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpRemoteClient {
    http: reqwest::Client,
    config: RemoteConfig,
}

impl HttpRemoteClient {
    /// New client over a fresh connection pool
    #[must_use]
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// The configuration this client was built with
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    async fn post_trigger(
        &self,
        url: &str,
        incident: &Incident,
    ) -> Result<RemoteOutcome, RemoteError> {
        let timestamp = incident
            .timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339();
        let payload = json!({
            "incident_id": incident.id,
            "title": incident.title,
            "description": incident.description,
            "component": incident.component,
            "severity": incident.severity,
            "user_email": incident.user_email,
            "error_code": incident.error_code,
            "user_impact": incident.user_impact,
            "timestamp": timestamp,
        });

        debug!(%url, incident = %incident.id, "triggering remote workflow");
        let response = self
            .http
            .post(url)
            .json(&payload)
            .timeout(self.config.trigger_timeout)
            .send()
            .await
            .map_err(|err| classify_transport_error(err, self.config.trigger_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Http {
                status: status.as_u16(),
            });
        }

        let reply: WebhookReply = response
            .json()
            .await
            .map_err(|err| RemoteError::Malformed(err.to_string()))?;
        Ok(reply.into_outcome())
    }

    async fn request_generated(
        &self,
        path_hint: ResolutionPath,
        base: &Incident,
    ) -> Result<Incident, RemoteError> {
        if let Some(url) = self.config.generate_url.as_deref() {
            let response = self
                .http
                .post(url)
                .json(&json!({ "scenarioType": path_hint, "baseIncident": base }))
                .timeout(self.config.trigger_timeout)
                .send()
                .await
                .map_err(|err| classify_transport_error(err, self.config.trigger_timeout))?;

            let status = response.status();
            if !status.is_success() {
                return Err(RemoteError::Http {
                    status: status.as_u16(),
                });
            }

            #[derive(Deserialize)]
            struct GenerateReply {
                incident: Incident,
            }
            let reply: GenerateReply = response
                .json()
                .await
                .map_err(|err| RemoteError::Malformed(err.to_string()))?;
            return Ok(merge_generated(reply.incident, base));
        }

        if let Some(api_key) = self.config.openai_api_key.as_deref() {
            return generator::generate_via_openai(&self.http, api_key, path_hint, base).await;
        }

        Err(RemoteError::NotConfigured)
    }
}

#[async_trait]
impl RemoteWorkflow for HttpRemoteClient {
    async fn generate_incident(&self, path_hint: ResolutionPath, base: &Incident) -> Incident {
        match self.request_generated(path_hint, base).await {
            Ok(incident) => {
                info!(incident = %incident.id, "generated incident");
                incident
            }
            Err(err) => {
                warn!(error = %err, "incident generation failed, using base incident");
                base.clone()
            }
        }
    }

    async fn trigger_workflow(&self, incident: &Incident) -> TriggerResponse {
        let Some(url) = self.config.webhook_url.clone() else {
            warn!("webhook URL not configured, remote trigger skipped");
            return TriggerResponse::failure(RemoteError::NotConfigured);
        };

        match self.post_trigger(&url, incident).await {
            Ok(outcome) => {
                info!(incident = %incident.id, "remote workflow replied");
                TriggerResponse::ok(outcome)
            }
            Err(err) => {
                warn!(error = %err, incident = %incident.id, "remote workflow trigger failed");
                TriggerResponse::failure(err)
            }
        }
    }

    fn live_available(&self) -> bool {
        self.config.live_available()
    }
}

fn classify_transport_error(err: reqwest::Error, limit: Duration) -> RemoteError {
    if err.is_timeout() {
        RemoteError::Timeout {
            limit_secs: limit.as_secs(),
        }
    } else {
        RemoteError::Network(err.to_string())
    }
}

/// Fill gaps in a generated incident from the base incident
///
/// Severity is always pinned to the base incident's.
fn merge_generated(generated: Incident, base: &Incident) -> Incident {
    fn or_base(value: String, base: &str) -> String {
        if value.trim().is_empty() {
            base.to_string()
        } else {
            value
        }
    }

    Incident {
        id: or_base(generated.id, &base.id),
        title: or_base(generated.title, &base.title),
        description: or_base(generated.description, &base.description),
        error_code: or_base(generated.error_code, &base.error_code),
        component: or_base(generated.component, &base.component),
        severity: base.severity,
        user_email: generated.user_email.or_else(|| base.user_email.clone()),
        user_impact: generated.user_impact.or_else(|| base.user_impact.clone()),
        timestamp: generated.timestamp.or(base.timestamp),
    }
}

/// Raw webhook reply, tolerating either upstream key dialect
#[derive(Debug, Default, Deserialize)]
struct WebhookReply {
    #[serde(rename = "jiraTicket", alias = "ticketId", default)]
    jira_ticket: Option<String>,
    #[serde(rename = "confluencePage", alias = "pageUrl", default)]
    confluence_page: Option<String>,
    #[serde(rename = "confidenceScore", alias = "confidence", default)]
    confidence_score: Option<f64>,
    #[serde(rename = "resolutionPath", alias = "action", default)]
    resolution_path: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl WebhookReply {
    fn into_outcome(self) -> RemoteOutcome {
        let resolution_path = self.resolution_path.as_deref().and_then(|raw| {
            raw.parse::<ResolutionPath>()
                .map_err(|err| warn!(%err, "ignoring unrecognized resolution path"))
                .ok()
        });
        let confidence_score = self
            .confidence_score
            .map(|score| score.clamp(0.0, 100.0).round() as u8);
        RemoteOutcome {
            jira_ticket: self.jira_ticket,
            confluence_page: self.confluence_page,
            confidence_score,
            resolution_path,
            message: self.message,
        }
    }
}
