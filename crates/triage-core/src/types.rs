//! Core types for the triage workflow
//!
//! Defines the fundamental types shared across the engine:
//! - Incidents and demo scenarios
//! - Workflow steps and their results
//! - Execution metrics and SLA status
//! - Terminal integration results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Incident severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Production down or data at risk
    Critical,
    /// Major function impaired for many users
    High,
    /// Degraded but workable
    Medium,
    /// Cosmetic or single-user annoyance
    Low,
}

impl Severity {
    /// Wire/display name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolution paths the decision step can recommend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPath {
    /// Known routine issue, resolved without a human
    AutoResolve,
    /// Needs an analyst with AI-prepared context
    Assisted,
    /// Needs immediate expert attention
    Escalate,
}

impl ResolutionPath {
    /// Wire name (`auto_resolve` / `assisted` / `escalate`)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPath::AutoResolve => "auto_resolve",
            ResolutionPath::Assisted => "assisted",
            ResolutionPath::Escalate => "escalate",
        }
    }

    /// Human-readable label ("AUTO RESOLVE" etc.)
    #[must_use]
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ").to_uppercase()
    }
}

impl std::fmt::Display for ResolutionPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResolutionPath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto_resolve" => Ok(ResolutionPath::AutoResolve),
            "assisted" => Ok(ResolutionPath::Assisted),
            "escalate" => Ok(ResolutionPath::Escalate),
            other => Err(format!("unknown resolution path: {other}")),
        }
    }
}

/// Execution modes supported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Every step is synthesized locally
    Simulated,
    /// The remote workflow is triggered for real
    Live,
}

/// A reported problem
///
/// Immutable once created; either taken from a scenario or produced by the
/// incident generator in live mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Stable unique identifier (e.g. `INC001042`)
    pub id: String,
    /// Short title
    pub title: String,
    /// Detailed description
    pub description: String,
    /// System error code (e.g. `DYNP 138`)
    pub error_code: String,
    /// Affected component/module
    pub component: String,
    /// Severity classification
    pub severity: Severity,
    /// Reporting user, if known
    pub user_email: Option<String>,
    /// Who/how many are affected
    pub user_impact: Option<String>,
    /// Report time, if known
    pub timestamp: Option<DateTime<Utc>>,
}

/// Accent color for scenario cards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioColor {
    Green,
    Yellow,
    Red,
}

/// A fixed demo case
///
/// Loaded once at process start and selected (never mutated) by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Registry identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Icon tag for the front-end
    pub icon: String,
    /// Accent color
    pub color: ScenarioColor,
    /// Embedded base incident
    pub incident: Incident,
    /// Confidence score the decision step will report (0-100)
    pub expected_confidence: u8,
    /// Resolution path the decision step will recommend
    pub expected_path: ResolutionPath,
    /// Scripted resolution steps, if the path has them
    pub resolution: Vec<String>,
    /// Diagnostic hints for assisted/escalated paths
    pub diagnostic_hints: Vec<String>,
    /// SLA budget in minutes
    pub sla_minutes: u32,
    /// Human-readable time saved vs. manual triage
    pub time_saved: String,
    /// Human-readable cost saved vs. manual triage
    pub cost_saved: String,
}

impl Scenario {
    /// SLA budget in seconds
    #[inline]
    #[must_use]
    pub fn sla_budget_secs(&self) -> f64 {
        f64::from(self.sla_minutes) * 60.0
    }
}

/// Step execution status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl StepStatus {
    /// Statuses a step may legally move to within a single execution
    ///
    /// Statuses are monotonic: pending -> running -> {completed | failed},
    /// never regressing. A fresh catalog instantiation (not a transition)
    /// is the only way back to pending.
    #[must_use]
    pub fn allowed_transitions(&self) -> &'static [StepStatus] {
        use StepStatus::*;
        match self {
            Pending => &[Running],
            Running => &[Completed, Failed],
            Completed => &[],
            Failed => &[],
        }
    }

    /// Whether `self -> to` is a legal transition
    #[inline]
    #[must_use]
    pub fn can_transition(&self, to: StepStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Terminal statuses never transition again
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

/// Result attached to a completed step
///
/// Produced once per step and never revised after attachment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Whether the step succeeded
    pub success: bool,
    /// Free-form payload for the front-end
    pub data: Option<serde_json::Value>,
    /// Human-readable summary
    pub message: String,
    /// Optional deep link
    pub link: Option<String>,
}

impl StepResult {
    /// Successful result with a message only
    #[inline]
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: message.into(),
            link: None,
        }
    }

    /// With payload
    #[inline]
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// With deep link
    #[inline]
    #[must_use]
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }
}

/// One stage of the visualized pipeline
///
/// The ordered sequence is reconstructed fresh from the catalog at the
/// start of every execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Order-significant identifier
    pub id: crate::catalog::StepId,
    /// Display name
    pub name: String,
    /// Display description
    pub description: String,
    /// Icon tag for the front-end
    pub icon: String,
    /// Current status
    pub status: StepStatus,
    /// Milliseconds the step took, set on completion
    pub duration_ms: Option<u64>,
    /// Result attached on completion
    pub result: Option<StepResult>,
}

/// SLA status classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaStatus {
    OnTrack,
    AtRisk,
    Breached,
}

/// Where a metrics value originated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricOrigin {
    /// Locally synthesized estimate (provisional)
    Synthetic,
    /// Reported by the remote workflow (authoritative)
    Remote,
}

/// Aggregate metrics for one execution
///
/// Owned by the engine and recomputed wholesale on every transition; reset
/// to [`ExecutionMetrics::baseline`] between runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// When the run started
    pub start_time: Option<DateTime<Utc>>,
    /// When the run finished
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed seconds (live during the run, final on completion)
    pub total_duration_secs: f64,
    /// Decision confidence (0-100)
    pub confidence_score: u8,
    /// Origin of the confidence/path values, once set
    pub confidence_origin: Option<MetricOrigin>,
    /// Recommended resolution path, once decided
    pub resolution_path: Option<ResolutionPath>,
    /// Human-readable cost saved
    pub cost_saved: String,
    /// Human-readable time saved
    pub time_saved: String,
    /// Current SLA classification
    pub sla_status: SlaStatus,
    /// Seconds remaining in the SLA budget (always >= 0)
    pub sla_remaining_secs: f64,
}

impl ExecutionMetrics {
    /// Zero-value baseline used between runs
    #[must_use]
    pub fn baseline() -> Self {
        Self {
            start_time: None,
            end_time: None,
            total_duration_secs: 0.0,
            confidence_score: 0,
            confidence_origin: None,
            resolution_path: None,
            cost_saved: "$0".to_string(),
            time_saved: "0 min".to_string(),
            sla_status: SlaStatus::OnTrack,
            sla_remaining_secs: 0.0,
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Ticket-system record in the terminal results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraResult {
    pub ticket_id: String,
    pub ticket_url: String,
    pub status: String,
    pub priority: Severity,
    pub assignee: Option<String>,
}

/// Knowledge-base record in the terminal results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfluenceResult {
    pub page_id: String,
    pub page_url: String,
    pub title: String,
    pub space: String,
}

/// Tone of the chat notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageTone {
    Success,
    Warning,
    Error,
}

/// Chat-notification record in the terminal results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlackResult {
    pub channel: String,
    pub message_type: MessageTone,
    pub timestamp: DateTime<Utc>,
}

/// Email record in the terminal results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailResult {
    pub to: String,
    pub subject: String,
    pub sent: bool,
}

/// Terminal artifact of a completed execution
///
/// Computed exactly once when the full step sequence completes; recomputed
/// only if a remote response arrives afterwards (live mode).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrationResults {
    pub jira: Option<JiraResult>,
    pub confluence: Option<ConfluenceResult>,
    pub slack: Option<SlackResult>,
    pub email: Option<EmailResult>,
}

/// A similar historical incident returned by the search step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarIncident {
    pub id: String,
    pub title: String,
    /// Cosine similarity in [0, 1]
    pub similarity: f64,
    pub resolution: String,
    pub component: String,
}

/// Classification produced by the assessment step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub category: String,
    pub urgency: String,
    pub complexity: String,
    pub probable_cause: String,
    pub keywords: Vec<String>,
}

/// Output of the decision step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub confidence_score: u8,
    pub recommended_action: ResolutionPath,
    pub reasoning: String,
    pub resolution_steps: Vec<String>,
    pub diagnostic_hints: Vec<String>,
    pub estimated_resolution_time: String,
}
