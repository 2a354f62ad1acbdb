//! Step catalog
//!
//! The static, ordered list of pipeline stages and the duration model used
//! to synthesize realistic per-step latency in simulated mode. Pure and
//! deterministic apart from the injected random source; the same catalog
//! shape drives both execution modes.

use crate::types::{StepStatus, WorkflowStep};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Identifier of one pipeline stage, in traversal order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    /// AI-generate a unique incident (live) or adopt the scenario's (simulated)
    Generate,
    /// Hand the incident to the automation workflow
    Trigger,
    /// Create the ticket
    JiraCreate,
    /// Classify the incident
    AiAssessment,
    /// Search the vector index for similar incidents
    PineconeSearch,
    /// Score confidence and pick a resolution path
    Decision,
    /// Update the ticket with resolution or assignment
    JiraUpdate,
    /// Document the resolution in the knowledge base
    Confluence,
    /// Notify chat and email
    Notifications,
    /// Terminal marker
    Complete,
}

impl StepId {
    /// All steps in traversal order
    pub const ALL: [StepId; 10] = [
        StepId::Generate,
        StepId::Trigger,
        StepId::JiraCreate,
        StepId::AiAssessment,
        StepId::PineconeSearch,
        StepId::Decision,
        StepId::JiraUpdate,
        StepId::Confluence,
        StepId::Notifications,
        StepId::Complete,
    ];

    /// Wire id (`generate`, `jira-create`, `ai-assessment`, ...)
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StepId::Generate => "generate",
            StepId::Trigger => "trigger",
            StepId::JiraCreate => "jira-create",
            StepId::AiAssessment => "ai-assessment",
            StepId::PineconeSearch => "pinecone-search",
            StepId::Decision => "decision",
            StepId::JiraUpdate => "jira-update",
            StepId::Confluence => "confluence",
            StepId::Notifications => "notifications",
            StepId::Complete => "complete",
        }
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static definition of one step, without execution state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTemplate {
    pub id: StepId,
    pub name: &'static str,
    pub description: &'static str,
    /// Icon tag consumed by the front-end
    pub icon: &'static str,
}

const TEMPLATES: [StepTemplate; 10] = [
    StepTemplate {
        id: StepId::Generate,
        name: "Generate Incident",
        description: "AI generating unique incident details",
        icon: "Sparkles",
    },
    StepTemplate {
        id: StepId::Trigger,
        name: "Incident Trigger",
        description: "Sending incident to the automation workflow",
        icon: "Webhook",
    },
    StepTemplate {
        id: StepId::JiraCreate,
        name: "Create Jira Task",
        description: "Creating incident ticket in Jira",
        icon: "TicketPlus",
    },
    StepTemplate {
        id: StepId::AiAssessment,
        name: "AI Assessment",
        description: "Analyzing incident with the language model",
        icon: "Brain",
    },
    StepTemplate {
        id: StepId::PineconeSearch,
        name: "Similar Incident Search",
        description: "Searching the vector index for similar historical incidents",
        icon: "SearchCode",
    },
    StepTemplate {
        id: StepId::Decision,
        name: "Resolution Decision",
        description: "Calculating confidence and determining resolution path",
        icon: "GitBranch",
    },
    StepTemplate {
        id: StepId::JiraUpdate,
        name: "Update Jira",
        description: "Updating ticket with resolution or assignment",
        icon: "FileCheck",
    },
    StepTemplate {
        id: StepId::Confluence,
        name: "Create Confluence KB",
        description: "Documenting resolution in the knowledge base",
        icon: "BookOpen",
    },
    StepTemplate {
        id: StepId::Notifications,
        name: "Send Notifications",
        description: "Notifying via Slack and email",
        icon: "Bell",
    },
    StepTemplate {
        id: StepId::Complete,
        name: "Workflow Complete",
        description: "All steps executed successfully",
        icon: "PartyPopper",
    },
];

/// Ordered step templates
#[inline]
#[must_use]
pub fn templates() -> &'static [StepTemplate] {
    &TEMPLATES
}

/// Fresh step sequence for a new execution
///
/// Every step starts pending with no duration and no result. A new sequence
/// is built at the start of every run so stale statuses cannot leak across
/// executions.
#[must_use]
pub fn instantiate() -> Vec<WorkflowStep> {
    TEMPLATES
        .iter()
        .map(|template| WorkflowStep {
            id: template.id,
            name: template.name.to_string(),
            description: template.description.to_string(),
            icon: template.icon.to_string(),
            status: StepStatus::Pending,
            duration_ms: None,
            result: None,
        })
        .collect()
}

/// Duration range for steps without a tuned entry
pub const DEFAULT_DURATION_MS: (u64, u64) = (500, 1000);

/// Simulated duration range for a step, in milliseconds
///
/// Steps without a tuned entry use [`DEFAULT_DURATION_MS`].
#[must_use]
pub fn duration_range(step: StepId) -> (u64, u64) {
    match step {
        StepId::Generate => (1500, 3000),
        StepId::Trigger => DEFAULT_DURATION_MS,
        StepId::JiraCreate => (1000, 2000),
        StepId::AiAssessment => (2000, 4000),
        StepId::PineconeSearch => (800, 1500),
        StepId::Decision => (1500, 3000),
        StepId::JiraUpdate => (800, 1500),
        StepId::Confluence => (1000, 2000),
        StepId::Notifications => (1500, 2500),
        StepId::Complete => (300, 500),
    }
}

/// Draw a uniform duration from the step's range
///
/// Only feeds the simulated-mode pacing; status transitions never depend on
/// the sampled value.
#[must_use]
pub fn sample_duration(step: StepId, rng: &mut impl Rng) -> u64 {
    let (min, max) = duration_range(step);
    rng.random_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn catalog_order_is_stable() {
        let ids: Vec<StepId> = templates().iter().map(|t| t.id).collect();
        assert_eq!(ids, StepId::ALL.to_vec());
        assert_eq!(ids[0], StepId::Generate);
        assert_eq!(ids[5], StepId::Decision);
        assert_eq!(ids[9], StepId::Complete);
    }

    #[test]
    fn wire_ids_match_serde_encoding() {
        for step in StepId::ALL {
            let encoded = serde_json::to_value(step).unwrap();
            assert_eq!(encoded, serde_json::json!(step.as_str()));
        }
        assert_eq!(StepId::JiraCreate.as_str(), "jira-create");
        assert_eq!(StepId::AiAssessment.as_str(), "ai-assessment");
        assert_eq!(StepId::PineconeSearch.as_str(), "pinecone-search");
    }

    #[test]
    fn untuned_steps_fall_back_to_the_default_range() {
        assert_eq!(duration_range(StepId::Trigger), DEFAULT_DURATION_MS);
    }

    #[test]
    fn instantiate_resets_all_execution_state() {
        let steps = instantiate();
        assert_eq!(steps.len(), StepId::ALL.len());
        for step in &steps {
            assert_eq!(step.status, StepStatus::Pending);
            assert!(step.duration_ms.is_none());
            assert!(step.result.is_none());
        }
    }

    #[test]
    fn instantiate_returns_independent_sequences() {
        let mut first = instantiate();
        first[0].status = StepStatus::Running;
        let second = instantiate();
        assert_eq!(second[0].status, StepStatus::Pending);
    }

    proptest! {
        #[test]
        fn sampled_duration_stays_in_range(step_index in 0usize..StepId::ALL.len(), seed: u64) {
            let step = StepId::ALL[step_index];
            let (min, max) = duration_range(step);
            let mut rng = StdRng::seed_from_u64(seed);
            let duration = sample_duration(step, &mut rng);
            prop_assert!(duration >= min && duration <= max);
        }
    }
}
