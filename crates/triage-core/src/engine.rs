//! Workflow execution engine
//!
//! Orchestrates the ordered traversal of the step catalog:
//! - Two execution strategies (simulated, live) behind one seam
//! - Epoch-guarded cancellation: every suspension-point resumption and every
//!   background completion checks that its run is still current
//! - Snapshot publishing over a watch channel so any front-end can render
//! - Independent SLA countdown feeding the metrics record
//! - Non-blocking live trigger with late reconciliation of remote results
//!
//! # Engine state machine
//!
//! idle -> running -> {completed | cancelled | failed}, back to idle only
//! via [`WorkflowEngine::reset`]. A `start` while running is a no-op.

use crate::catalog::{self, StepId};
use crate::error::StepError;
use crate::remote::{RemoteOutcome, RemoteWorkflow};
use crate::sla::{SlaReading, SlaTimer, DEFAULT_TICK};
use crate::synth;
use crate::types::{
    ExecutionMetrics, ExecutionMode, Incident, IntegrationResults, MetricOrigin, Scenario,
    SlaStatus, StepResult, StepStatus, WorkflowStep,
};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

/// Engine tuning knobs
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// SLA recompute interval
    pub sla_tick: Duration,
    /// Live-mode visual delay for ordinary steps
    pub live_step_delay: Duration,
    /// Live-mode visual delay for the AI-heavy steps (assessment, decision)
    pub live_ai_step_delay: Duration,
}

impl EngineConfig {
    /// Default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With SLA tick interval
    #[inline]
    #[must_use]
    pub fn with_sla_tick(mut self, tick: Duration) -> Self {
        self.sla_tick = tick;
        self
    }

    /// With live-mode step delays
    #[inline]
    #[must_use]
    pub fn with_live_delays(mut self, ordinary: Duration, ai: Duration) -> Self {
        self.live_step_delay = ordinary;
        self.live_ai_step_delay = ai;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sla_tick: DEFAULT_TICK,
            live_step_delay: Duration::from_millis(800),
            live_ai_step_delay: Duration::from_millis(1500),
        }
    }
}

/// Lifecycle phase of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePhase {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

/// Immutable view of the engine published after every transition
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSnapshot {
    /// Lifecycle phase
    pub phase: EnginePhase,
    /// Mode of the current/last run
    pub mode: Option<ExecutionMode>,
    /// Scenario of the current/last run
    pub scenario_id: Option<String>,
    /// Step sequence with statuses, durations and results
    pub steps: Vec<WorkflowStep>,
    /// Index of the step being processed; -1 before the first step,
    /// `steps.len()` after a completed traversal
    pub current_step_index: isize,
    /// Whether a traversal is active
    pub is_running: bool,
    /// Terminal artifact, present only after a completed traversal
    pub results: Option<IntegrationResults>,
    /// Aggregate metrics
    pub metrics: ExecutionMetrics,
    /// Incident assigned on the generate step, at most once per run
    pub generated_incident: Option<Incident>,
}

/// Outcome of processing one step
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// How long the step took, in milliseconds
    pub duration_ms: u64,
    /// Result to attach (simulated mode synthesizes one; live mode does not)
    pub result: Option<StepResult>,
    /// Incident to assign as the run's generated incident
    pub generated_incident: Option<Incident>,
}

/// Per-step context handed to the strategy
#[derive(Debug, Clone)]
pub struct StepContext {
    /// Scenario of the current run
    pub scenario: Arc<Scenario>,
    /// Generated incident, if the generate step already assigned one
    pub generated_incident: Option<Incident>,
}

impl StepContext {
    /// The incident this run operates on
    #[inline]
    #[must_use]
    pub fn incident(&self) -> &Incident {
        self.generated_incident
            .as_ref()
            .unwrap_or(&self.scenario.incident)
    }
}

/// How a run processes one step
///
/// Selected once per run from the execution mode; inject a custom
/// implementation through [`WorkflowEngine::with_strategy`].
#[async_trait]
pub trait StepStrategy: Send + Sync {
    /// Process one step and report its outcome
    async fn execute_step(&self, step: StepId, ctx: &StepContext)
        -> Result<StepOutcome, StepError>;
}

struct SimulatedStrategy;

#[async_trait]
impl StepStrategy for SimulatedStrategy {
    async fn execute_step(
        &self,
        step: StepId,
        ctx: &StepContext,
    ) -> Result<StepOutcome, StepError> {
        let duration_ms = catalog::sample_duration(step, &mut rand::rng());
        sleep(Duration::from_millis(duration_ms)).await;

        let result = synth::synthesize(
            step,
            &ctx.scenario,
            ctx.generated_incident.as_ref(),
            &mut rand::rng(),
        );
        // Simulation never calls the remote generator; the generate step
        // adopts the scenario's base incident.
        let generated_incident =
            (step == StepId::Generate).then(|| ctx.scenario.incident.clone());

        Ok(StepOutcome {
            duration_ms,
            result: Some(result),
            generated_incident,
        })
    }
}

struct LiveStrategy {
    remote: Arc<dyn RemoteWorkflow>,
    inner: Arc<EngineInner>,
    epoch: u64,
    config: EngineConfig,
}

impl LiveStrategy {
    fn delay_for(&self, step: StepId) -> Duration {
        match step {
            StepId::AiAssessment | StepId::Decision => self.config.live_ai_step_delay,
            _ => self.config.live_step_delay,
        }
    }

    /// Fire the remote workflow without blocking step progression
    ///
    /// The background completion is epoch-guarded: a reply landing after a
    /// cancel/reset of this run is discarded instead of corrupting a newer
    /// run's state.
    fn dispatch_trigger(&self, ctx: &StepContext) {
        let remote = Arc::clone(&self.remote);
        let inner = Arc::clone(&self.inner);
        let epoch = self.epoch;
        let incident = ctx.incident().clone();
        tokio::spawn(async move {
            let response = remote.trigger_workflow(&incident).await;
            if response.success {
                if let Some(outcome) = response.data {
                    apply_remote_outcome(&inner, epoch, outcome).await;
                    return;
                }
            }
            if let Some(err) = response.error {
                warn!(error = %err, "remote workflow failed; keeping scenario defaults");
            }
        });
    }
}

#[async_trait]
impl StepStrategy for LiveStrategy {
    async fn execute_step(
        &self,
        step: StepId,
        ctx: &StepContext,
    ) -> Result<StepOutcome, StepError> {
        if step == StepId::Generate {
            let started = Instant::now();
            let incident = self
                .remote
                .generate_incident(ctx.scenario.expected_path, &ctx.scenario.incident)
                .await;
            return Ok(StepOutcome {
                duration_ms: started.elapsed().as_millis() as u64,
                result: None,
                generated_incident: Some(incident),
            });
        }

        if step == StepId::Trigger {
            self.dispatch_trigger(ctx);
        }

        // The visual sequence advances on a fixed synthetic delay while the
        // real call races in the background.
        let delay = self.delay_for(step);
        sleep(delay).await;
        Ok(StepOutcome {
            duration_ms: delay.as_millis() as u64,
            result: None,
            generated_incident: None,
        })
    }
}

struct EngineState {
    /// Generation counter; bumped by every start/cancel/reset
    epoch: u64,
    phase: EnginePhase,
    mode: Option<ExecutionMode>,
    scenario: Option<Arc<Scenario>>,
    steps: Vec<WorkflowStep>,
    current_step_index: isize,
    is_running: bool,
    results: Option<IntegrationResults>,
    metrics: ExecutionMetrics,
    generated_incident: Option<Incident>,
    remote_outcome: Option<RemoteOutcome>,
    sla: Option<SlaTimer>,
    sla_forward: Option<JoinHandle<()>>,
    run: Option<JoinHandle<()>>,
}

impl EngineState {
    fn baseline() -> Self {
        Self {
            epoch: 0,
            phase: EnginePhase::Idle,
            mode: None,
            scenario: None,
            steps: catalog::instantiate(),
            current_step_index: -1,
            is_running: false,
            results: None,
            metrics: ExecutionMetrics::baseline(),
            generated_incident: None,
            remote_outcome: None,
            sla: None,
            sla_forward: None,
            run: None,
        }
    }

    fn reinit(&mut self) {
        self.phase = EnginePhase::Idle;
        self.mode = None;
        self.scenario = None;
        self.steps = catalog::instantiate();
        self.current_step_index = -1;
        self.is_running = false;
        self.results = None;
        self.metrics = ExecutionMetrics::baseline();
        self.generated_incident = None;
        self.remote_outcome = None;
    }

    fn stop_sla(&mut self) {
        if let Some(handle) = self.sla_forward.take() {
            handle.abort();
        }
        if let Some(timer) = self.sla.take() {
            timer.stop();
        }
    }

    fn abort_tasks(&mut self) {
        if let Some(handle) = self.run.take() {
            handle.abort();
        }
        self.stop_sla();
    }

    fn to_snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            phase: self.phase,
            mode: self.mode,
            scenario_id: self.scenario.as_ref().map(|s| s.id.clone()),
            steps: self.steps.clone(),
            current_step_index: self.current_step_index,
            is_running: self.is_running,
            results: self.results.clone(),
            metrics: self.metrics.clone(),
            generated_incident: self.generated_incident.clone(),
        }
    }
}

struct EngineInner {
    state: Mutex<EngineState>,
    snapshot_tx: watch::Sender<EngineSnapshot>,
    remote: Arc<dyn RemoteWorkflow>,
}

impl EngineInner {
    fn publish(&self, state: &EngineState) {
        self.snapshot_tx.send_replace(state.to_snapshot());
    }
}

/// The workflow execution engine
///
/// Owns all execution state and publishes immutable snapshots; clones share
/// the same underlying engine.
#[derive(Clone)]
pub struct WorkflowEngine {
    inner: Arc<EngineInner>,
    config: EngineConfig,
    strategy_override: Option<Arc<dyn StepStrategy>>,
}

impl WorkflowEngine {
    /// New engine with default configuration
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteWorkflow>) -> Self {
        Self::with_config(remote, EngineConfig::default())
    }

    /// New engine with explicit configuration
    #[must_use]
    pub fn with_config(remote: Arc<dyn RemoteWorkflow>, config: EngineConfig) -> Self {
        let state = EngineState::baseline();
        let (snapshot_tx, _rx) = watch::channel(state.to_snapshot());
        Self {
            inner: Arc::new(EngineInner {
                state: Mutex::new(state),
                snapshot_tx,
                remote,
            }),
            config,
            strategy_override: None,
        }
    }

    /// New engine with a custom step strategy used for every mode
    #[must_use]
    pub fn with_strategy(
        remote: Arc<dyn RemoteWorkflow>,
        strategy: Arc<dyn StepStrategy>,
    ) -> Self {
        let mut engine = Self::new(remote);
        engine.strategy_override = Some(strategy);
        engine
    }

    /// Subscribe to snapshot updates
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<EngineSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    /// Latest snapshot
    #[must_use]
    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    /// Whether the remote boundary is configured for live mode
    #[must_use]
    pub fn live_available(&self) -> bool {
        self.inner.remote.live_available()
    }

    /// Start an execution
    ///
    /// Returns false (and changes nothing) while a run is already active.
    /// Otherwise rebuilds the step sequence from the catalog, seeds metrics,
    /// starts the SLA countdown and spawns the sequential traversal.
    pub async fn start(&self, scenario: &Scenario, mode: ExecutionMode) -> bool {
        let mut st = self.inner.state.lock().await;
        if st.is_running {
            debug!("execution already running, ignoring start");
            return false;
        }

        st.epoch += 1;
        let epoch = st.epoch;
        let scenario = Arc::new(scenario.clone());

        st.phase = EnginePhase::Running;
        st.mode = Some(mode);
        st.scenario = Some(Arc::clone(&scenario));
        st.steps = catalog::instantiate();
        st.current_step_index = -1;
        st.is_running = true;
        st.results = None;
        st.generated_incident = None;
        st.remote_outcome = None;
        st.metrics = ExecutionMetrics::baseline();
        st.metrics.start_time = Some(Utc::now());
        st.metrics.sla_remaining_secs = scenario.sla_budget_secs();
        st.metrics.sla_status = SlaStatus::OnTrack;

        let timer = SlaTimer::new(scenario.sla_budget_secs()).with_tick(self.config.sla_tick);
        let readings = timer.subscribe();
        timer.start();
        st.sla = Some(timer);
        st.sla_forward = Some(tokio::spawn(forward_sla(
            Arc::clone(&self.inner),
            epoch,
            readings,
        )));

        let strategy = self.strategy_override.clone().unwrap_or_else(|| match mode {
            ExecutionMode::Simulated => Arc::new(SimulatedStrategy) as Arc<dyn StepStrategy>,
            ExecutionMode::Live => Arc::new(LiveStrategy {
                remote: Arc::clone(&self.inner.remote),
                inner: Arc::clone(&self.inner),
                epoch,
                config: self.config,
            }),
        });
        st.run = Some(tokio::spawn(run_steps(
            Arc::clone(&self.inner),
            epoch,
            Arc::clone(&scenario),
            strategy,
        )));

        info!(scenario = %scenario.id, ?mode, "execution started");
        self.inner.publish(&st);
        true
    }

    /// Stop the active run without touching its visible step states
    ///
    /// Idempotent and safe at any time, including before `start`. Later
    /// steps stay pending, results stay absent; a subsequent [`reset`]
    /// returns the engine to baseline.
    ///
    /// [`reset`]: WorkflowEngine::reset
    pub async fn cancel(&self) {
        let mut st = self.inner.state.lock().await;
        st.epoch += 1;
        st.abort_tasks();
        if st.is_running {
            st.is_running = false;
            st.phase = EnginePhase::Cancelled;
            info!("execution cancelled");
            self.inner.publish(&st);
        }
    }

    /// Cancel and reinitialize everything to baseline
    ///
    /// Idempotent: resetting twice leaves the same state as resetting once.
    pub async fn reset(&self) {
        let mut st = self.inner.state.lock().await;
        st.epoch += 1;
        st.abort_tasks();
        st.reinit();
        self.inner.publish(&st);
    }

    /// Wait for the active run (if any) to finish
    pub async fn wait(&self) {
        let handle = { self.inner.state.lock().await.run.take() };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Sequential traversal of the step catalog
///
/// Single logical thread: each step's completion is a suspension point, and
/// the epoch is re-checked after every one before state is touched.
async fn run_steps(
    inner: Arc<EngineInner>,
    epoch: u64,
    scenario: Arc<Scenario>,
    strategy: Arc<dyn StepStrategy>,
) {
    let step_count = StepId::ALL.len();

    for (index, step) in StepId::ALL.iter().copied().enumerate() {
        let ctx = {
            let mut st = inner.state.lock().await;
            if st.epoch != epoch {
                return;
            }
            st.current_step_index = index as isize;
            debug_assert!(st.steps[index].status.can_transition(StepStatus::Running));
            st.steps[index].status = StepStatus::Running;
            debug!(step = %step, "step running");
            inner.publish(&st);
            StepContext {
                scenario: Arc::clone(&scenario),
                generated_incident: st.generated_incident.clone(),
            }
        };

        let outcome = strategy.execute_step(step, &ctx).await;

        let mut st = inner.state.lock().await;
        if st.epoch != epoch {
            return;
        }
        match outcome {
            Ok(outcome) => {
                st.steps[index].duration_ms = Some(outcome.duration_ms);
                st.steps[index].result = outcome.result;
                debug_assert!(st.steps[index].status.can_transition(StepStatus::Completed));
                st.steps[index].status = StepStatus::Completed;
                if let Some(incident) = outcome.generated_incident {
                    // Assigned at most once per execution.
                    if st.generated_incident.is_none() {
                        st.generated_incident = Some(incident);
                    }
                }
                if step == StepId::Decision {
                    apply_decision_estimate(&mut st, &scenario);
                }
                debug!(step = %step, "step completed");
                inner.publish(&st);
            }
            Err(err) => {
                error!(step = %step, error = %err, "step failed, halting traversal");
                st.steps[index].status = StepStatus::Failed;
                st.is_running = false;
                st.phase = EnginePhase::Failed;
                st.stop_sla();
                inner.publish(&st);
                return;
            }
        }
    }

    let mut st = inner.state.lock().await;
    if st.epoch != epoch {
        return;
    }
    st.stop_sla();

    let end_time = Utc::now();
    st.metrics.end_time = Some(end_time);
    if let Some(start_time) = st.metrics.start_time {
        st.metrics.total_duration_secs =
            (end_time - start_time).num_milliseconds() as f64 / 1000.0;
    }
    st.metrics.cost_saved = scenario.cost_saved.clone();
    st.metrics.time_saved = scenario.time_saved.clone();

    let results = {
        let mut rng = rand::rng();
        synth::integration_results(&scenario, st.remote_outcome.as_ref(), &mut rng)
    };
    st.results = Some(results);
    st.current_step_index = step_count as isize;
    st.is_running = false;
    st.phase = EnginePhase::Completed;
    info!(scenario = %scenario.id, "execution completed");
    inner.publish(&st);
}

/// Fold the decision step's local estimate into the metrics
///
/// Precedence rule: a remote-origin value always supersedes the local
/// synthetic estimate, regardless of arrival order. The estimate therefore
/// never overwrites a remote value that already landed.
fn apply_decision_estimate(st: &mut EngineState, scenario: &Scenario) {
    if st.metrics.confidence_origin == Some(MetricOrigin::Remote) {
        return;
    }
    st.metrics.confidence_score = scenario.expected_confidence;
    st.metrics.resolution_path = Some(scenario.expected_path);
    st.metrics.confidence_origin = Some(MetricOrigin::Synthetic);
}

/// Fold a background remote reply into the engine state
///
/// Runs whenever the reply lands, before or after local completion. Replies
/// from a superseded epoch are discarded. If integration results were
/// already published, they are recomputed from the remote data.
async fn apply_remote_outcome(inner: &Arc<EngineInner>, epoch: u64, outcome: RemoteOutcome) {
    let mut st = inner.state.lock().await;
    if st.epoch != epoch {
        debug!("discarding remote outcome from a superseded run");
        return;
    }

    if let Some(score) = outcome.confidence_score {
        st.metrics.confidence_score = score;
        st.metrics.confidence_origin = Some(MetricOrigin::Remote);
    }
    if let Some(path) = outcome.resolution_path {
        st.metrics.resolution_path = Some(path);
    }

    let already_published = st.results.is_some();
    st.remote_outcome = Some(outcome);

    if already_published {
        if let Some(scenario) = st.scenario.clone() {
            info!("remote outcome arrived after completion, republishing results");
            let results = {
                let mut rng = rand::rng();
                synth::integration_results(&scenario, st.remote_outcome.as_ref(), &mut rng)
            };
            st.results = Some(results);
        }
    }
    inner.publish(&st);
}

/// Copy SLA readings into the metrics record while the run is active
async fn forward_sla(
    inner: Arc<EngineInner>,
    epoch: u64,
    mut readings: watch::Receiver<SlaReading>,
) {
    while readings.changed().await.is_ok() {
        let reading = *readings.borrow_and_update();
        let mut st = inner.state.lock().await;
        if st.epoch != epoch || !st.is_running {
            return;
        }
        st.metrics.sla_remaining_secs = reading.remaining_secs;
        st.metrics.sla_status = reading.status;
        st.metrics.total_duration_secs = reading.elapsed_secs;
        inner.publish(&st);
    }
}
