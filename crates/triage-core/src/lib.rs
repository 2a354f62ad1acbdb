//! Triage Core - incident-triage workflow engine
//!
//! The executable core of the triage demo:
//! - Static step catalog with a simulated-latency duration model
//! - Scenario registry of canned demo cases
//! - Step result synthesizer (deterministic shape, randomized cosmetics)
//! - SLA countdown timer
//! - The dual-mode, cancellable workflow execution engine
//!
//! Front-ends subscribe to [`engine::EngineSnapshot`] updates. Nothing in
//! this crate touches a network: the remote boundary is the
//! [`remote::RemoteWorkflow`] trait, implemented elsewhere.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use triage_core::prelude::*;
//!
//! # async fn example(remote: Arc<dyn RemoteWorkflow>) {
//! let engine = WorkflowEngine::new(remote);
//! let scenario = triage_core::scenario::find("auto-resolve").unwrap();
//! engine.start(scenario, ExecutionMode::Simulated).await;
//! engine.wait().await;
//! let snapshot = engine.snapshot();
//! println!("confidence: {}%", snapshot.metrics.confidence_score);
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod catalog;
pub mod engine;
pub mod error;
pub mod remote;
pub mod scenario;
pub mod sla;
pub mod synth;
pub mod types;

// Re-exports for convenience
pub use catalog::{StepId, StepTemplate};
pub use engine::{
    EngineConfig, EnginePhase, EngineSnapshot, StepContext, StepOutcome, StepStrategy,
    WorkflowEngine,
};
pub use error::{RemoteError, StepError};
pub use remote::{RemoteOutcome, RemoteWorkflow, TriggerResponse};
pub use sla::{SlaReading, SlaTimer};
pub use types::{
    ExecutionMetrics, ExecutionMode, Incident, IntegrationResults, MetricOrigin, ResolutionPath,
    Scenario, Severity, SlaStatus, StepResult, StepStatus, WorkflowStep,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the triage core
    pub use crate::{
        EngineConfig, EnginePhase, EngineSnapshot, ExecutionMetrics, ExecutionMode, Incident,
        IntegrationResults, RemoteWorkflow, ResolutionPath, Scenario, SlaStatus, StepId,
        StepStatus, WorkflowEngine,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
