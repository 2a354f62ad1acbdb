//! End-to-end engine behavior: full traversals in both modes, cancellation,
//! reset idempotence, failure halting, and late remote reconciliation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use triage_core::engine::{EnginePhase, StepContext, StepOutcome, StepStrategy, WorkflowEngine};
use triage_core::error::{RemoteError, StepError};
use triage_core::remote::{RemoteOutcome, RemoteWorkflow, TriggerResponse};
use triage_core::types::{
    ExecutionMode, Incident, MetricOrigin, ResolutionPath, Scenario, StepStatus,
};
use triage_core::{scenario, StepId};

/// Scriptable remote boundary double
struct StubRemote {
    configured: bool,
    outcome: Option<RemoteOutcome>,
    trigger_delay: Duration,
    generated: Option<Incident>,
}

impl StubRemote {
    fn unconfigured() -> Self {
        Self {
            configured: false,
            outcome: None,
            trigger_delay: Duration::ZERO,
            generated: None,
        }
    }

    fn with_outcome(outcome: RemoteOutcome, trigger_delay: Duration) -> Self {
        Self {
            configured: true,
            outcome: Some(outcome),
            trigger_delay,
            generated: None,
        }
    }
}

#[async_trait]
impl RemoteWorkflow for StubRemote {
    async fn generate_incident(&self, _path_hint: ResolutionPath, base: &Incident) -> Incident {
        self.generated.clone().unwrap_or_else(|| base.clone())
    }

    async fn trigger_workflow(&self, _incident: &Incident) -> TriggerResponse {
        sleep(self.trigger_delay).await;
        match &self.outcome {
            Some(outcome) if self.configured => TriggerResponse::ok(outcome.clone()),
            _ => TriggerResponse::failure(RemoteError::NotConfigured),
        }
    }

    fn live_available(&self) -> bool {
        self.configured
    }
}

fn auto_resolve() -> &'static Scenario {
    scenario::find("auto-resolve").expect("registered scenario")
}

fn escalate() -> &'static Scenario {
    scenario::find("escalate").expect("registered scenario")
}

#[tokio::test(start_paused = true)]
async fn simulated_run_completes_every_step() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    let mut rx = engine.subscribe();

    assert!(engine.start(auto_resolve(), ExecutionMode::Simulated).await);

    // Track SLA countdown monotonicity while the run is active.
    let mut last_remaining: Option<f64> = None;
    loop {
        rx.changed().await.expect("engine alive");
        let snap = rx.borrow_and_update().clone();
        if snap.is_running {
            if let Some(prev) = last_remaining {
                assert!(snap.metrics.sla_remaining_secs <= prev);
            }
            assert!(snap.metrics.sla_remaining_secs >= 0.0);
            last_remaining = Some(snap.metrics.sla_remaining_secs);
        }
        if snap.phase == EnginePhase::Completed {
            break;
        }
    }

    let snap = engine.snapshot();
    assert!(!snap.is_running);
    assert_eq!(snap.current_step_index, StepId::ALL.len() as isize);
    for step in &snap.steps {
        assert_eq!(step.status, StepStatus::Completed, "step {}", step.id);
        assert!(step.duration_ms.is_some());
        assert!(step.result.is_some());
    }

    // Auto-resolve contract: KB page written, ticket resolved, confidence 90.
    let results = snap.results.expect("published results");
    assert!(results.confluence.is_some());
    assert_eq!(results.jira.as_ref().unwrap().status, "Resolved");
    assert_eq!(snap.metrics.confidence_score, 90);
    assert_eq!(snap.metrics.resolution_path, Some(ResolutionPath::AutoResolve));
    assert_eq!(snap.metrics.confidence_origin, Some(MetricOrigin::Synthetic));
    assert!(snap.metrics.end_time.is_some());
    assert_eq!(snap.metrics.cost_saved, auto_resolve().cost_saved);
}

#[tokio::test(start_paused = true)]
async fn escalate_run_skips_knowledge_base_and_assigns_basis_team() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    assert!(engine.start(escalate(), ExecutionMode::Simulated).await);
    engine.wait().await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Completed);
    let results = snap.results.expect("published results");
    assert!(results.confluence.is_none());
    assert_eq!(
        results.jira.as_ref().unwrap().assignee.as_deref(),
        Some("Basis Team")
    );
    assert_eq!(snap.metrics.confidence_score, escalate().expected_confidence);
}

#[tokio::test(start_paused = true)]
async fn second_start_while_running_is_a_no_op() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    assert!(engine.start(auto_resolve(), ExecutionMode::Simulated).await);
    assert!(!engine.start(escalate(), ExecutionMode::Simulated).await);

    // The original run keeps its scenario.
    assert_eq!(engine.snapshot().scenario_id.as_deref(), Some("auto-resolve"));
    engine.wait().await;
    assert_eq!(engine.snapshot().phase, EnginePhase::Completed);
}

#[tokio::test(start_paused = true)]
async fn cancel_leaves_later_steps_pending_and_no_results() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    let mut rx = engine.subscribe();
    assert!(engine.start(auto_resolve(), ExecutionMode::Simulated).await);

    let cancel_at = 3;
    loop {
        rx.changed().await.expect("engine alive");
        let snap = rx.borrow_and_update().clone();
        if snap.current_step_index >= cancel_at {
            break;
        }
    }
    engine.cancel().await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Cancelled);
    assert!(!snap.is_running);
    assert!(snap.results.is_none());
    let index = snap.current_step_index;
    assert!(index >= cancel_at && index < StepId::ALL.len() as isize);
    for step in snap.steps.iter().skip(index as usize + 1) {
        assert_eq!(step.status, StepStatus::Pending, "step {}", step.id);
        assert!(step.result.is_none());
    }

    // Cancelled runs stay cancelled; no background task revives them.
    sleep(Duration::from_secs(60)).await;
    assert_eq!(engine.snapshot().phase, EnginePhase::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn reset_is_idempotent_and_restores_baseline() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    assert!(engine.start(auto_resolve(), ExecutionMode::Simulated).await);
    sleep(Duration::from_secs(2)).await;

    engine.reset().await;
    let once = engine.snapshot();
    engine.reset().await;
    let twice = engine.snapshot();
    assert_eq!(once, twice);

    let fresh = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    assert_eq!(once, fresh.snapshot());
}

#[tokio::test(start_paused = true)]
async fn failed_step_halts_traversal_without_partial_results() {
    struct FailingStrategy {
        fail_at: StepId,
    }

    #[async_trait]
    impl StepStrategy for FailingStrategy {
        async fn execute_step(
            &self,
            step: StepId,
            _ctx: &StepContext,
        ) -> Result<StepOutcome, StepError> {
            sleep(Duration::from_millis(50)).await;
            if step == self.fail_at {
                return Err(StepError::new(step, "injected failure"));
            }
            Ok(StepOutcome {
                duration_ms: 50,
                result: None,
                generated_incident: None,
            })
        }
    }

    let engine = WorkflowEngine::with_strategy(
        Arc::new(StubRemote::unconfigured()),
        Arc::new(FailingStrategy {
            fail_at: StepId::PineconeSearch,
        }),
    );
    assert!(engine.start(auto_resolve(), ExecutionMode::Simulated).await);
    engine.wait().await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Failed);
    assert!(!snap.is_running);
    assert!(snap.results.is_none());
    let failed_index = StepId::ALL
        .iter()
        .position(|s| *s == StepId::PineconeSearch)
        .unwrap();
    assert_eq!(snap.steps[failed_index].status, StepStatus::Failed);
    for step in snap.steps.iter().take(failed_index) {
        assert_eq!(step.status, StepStatus::Completed);
    }
    for step in snap.steps.iter().skip(failed_index + 1) {
        assert_eq!(step.status, StepStatus::Pending);
    }
}

#[tokio::test(start_paused = true)]
async fn simulated_generate_step_adopts_the_scenario_incident() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    assert!(engine.start(auto_resolve(), ExecutionMode::Simulated).await);
    engine.wait().await;

    let snap = engine.snapshot();
    assert_eq!(snap.generated_incident, Some(auto_resolve().incident.clone()));
}

#[tokio::test(start_paused = true)]
async fn live_generate_step_stores_the_remote_incident() {
    let mut generated = auto_resolve().incident.clone();
    generated.id = "INC777000".to_string();
    let remote = StubRemote {
        configured: false,
        outcome: None,
        trigger_delay: Duration::ZERO,
        generated: Some(generated.clone()),
    };

    let engine = WorkflowEngine::new(Arc::new(remote));
    assert!(engine.start(auto_resolve(), ExecutionMode::Live).await);
    engine.wait().await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Completed);
    assert_eq!(snap.generated_incident, Some(generated));
}

#[tokio::test(start_paused = true)]
async fn live_run_with_unconfigured_webhook_degrades_to_scenario_defaults() {
    let engine = WorkflowEngine::new(Arc::new(StubRemote::unconfigured()));
    assert!(!engine.live_available());
    assert!(engine.start(auto_resolve(), ExecutionMode::Live).await);
    engine.wait().await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Completed);
    assert_eq!(snap.metrics.confidence_score, 90);
    assert_eq!(snap.metrics.confidence_origin, Some(MetricOrigin::Synthetic));
    assert!(snap.results.is_some());
    // Live mode attaches no synthesized step results.
    assert!(snap.steps.iter().all(|s| s.result.is_none()));
}

#[tokio::test(start_paused = true)]
async fn remote_outcome_arriving_mid_run_supersedes_the_decision_estimate() {
    let outcome = RemoteOutcome {
        jira_ticket: Some("SAP-555".to_string()),
        confluence_page: None,
        confidence_score: Some(71),
        resolution_path: Some(ResolutionPath::Assisted),
        message: None,
    };
    // Replies well before the visual decision step finishes.
    let remote = StubRemote::with_outcome(outcome, Duration::from_millis(100));

    let engine = WorkflowEngine::new(Arc::new(remote));
    assert!(engine.start(auto_resolve(), ExecutionMode::Live).await);
    engine.wait().await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Completed);
    assert_eq!(snap.metrics.confidence_score, 71);
    assert_eq!(snap.metrics.confidence_origin, Some(MetricOrigin::Remote));
    assert_eq!(snap.metrics.resolution_path, Some(ResolutionPath::Assisted));
    let results = snap.results.expect("published results");
    assert_eq!(results.jira.as_ref().unwrap().ticket_id, "SAP-555");
}

#[tokio::test(start_paused = true)]
async fn late_remote_outcome_recomputes_published_results() {
    let outcome = RemoteOutcome {
        jira_ticket: Some("SAP-99901".to_string()),
        confluence_page: Some("https://confluence.example.com/live".to_string()),
        confidence_score: Some(77),
        resolution_path: Some(ResolutionPath::AutoResolve),
        message: Some("done".to_string()),
    };
    // Replies long after the visual pipeline has finished.
    let remote = StubRemote::with_outcome(outcome, Duration::from_secs(30));

    let engine = WorkflowEngine::new(Arc::new(remote));
    assert!(engine.start(auto_resolve(), ExecutionMode::Live).await);
    engine.wait().await;

    let before = engine.snapshot();
    assert_eq!(before.phase, EnginePhase::Completed);
    assert_eq!(before.metrics.confidence_score, 90);
    assert_eq!(before.metrics.confidence_origin, Some(MetricOrigin::Synthetic));
    assert_ne!(
        before.results.as_ref().unwrap().jira.as_ref().unwrap().ticket_id,
        "SAP-99901"
    );

    // Let the background reply land.
    sleep(Duration::from_secs(60)).await;

    let after = engine.snapshot();
    assert_eq!(after.phase, EnginePhase::Completed);
    assert_eq!(after.metrics.confidence_score, 77);
    assert_eq!(after.metrics.confidence_origin, Some(MetricOrigin::Remote));
    let results = after.results.expect("republished results");
    assert_eq!(results.jira.as_ref().unwrap().ticket_id, "SAP-99901");
    assert_eq!(
        results.confluence.as_ref().unwrap().page_url,
        "https://confluence.example.com/live"
    );
    assert_eq!(results.confluence.as_ref().unwrap().page_id, "live");
}

#[tokio::test(start_paused = true)]
async fn stale_remote_outcome_after_reset_is_discarded() {
    let outcome = RemoteOutcome {
        jira_ticket: Some("SAP-321".to_string()),
        confluence_page: None,
        confidence_score: Some(50),
        resolution_path: Some(ResolutionPath::Escalate),
        message: None,
    };
    let remote = StubRemote::with_outcome(outcome, Duration::from_secs(30));

    let engine = WorkflowEngine::new(Arc::new(remote));
    assert!(engine.start(auto_resolve(), ExecutionMode::Live).await);
    sleep(Duration::from_secs(2)).await;
    engine.reset().await;

    // The cancelled run's reply lands against a bumped epoch.
    sleep(Duration::from_secs(60)).await;

    let snap = engine.snapshot();
    assert_eq!(snap.phase, EnginePhase::Idle);
    assert_eq!(snap.metrics.confidence_score, 0);
    assert_eq!(snap.metrics.confidence_origin, None);
    assert!(snap.results.is_none());
}
