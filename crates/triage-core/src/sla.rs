//! SLA timer
//!
//! Derived polling clock: while running, a fixed sub-second interval
//! recomputes elapsed/remaining time and a three-level status. Purely
//! observational; it holds no authority over step progression and tolerates
//! start/stop/reset independently of the traversal. Every start has a
//! matching stop/reset that aborts the ticking task, and dropping the timer
//! aborts it too, so no tick can outlive its owner.

use crate::types::SlaStatus;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};

/// Default recompute interval
pub const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// Classify remaining budget
///
/// on_track while more than 30% of the budget remains, at_risk while any
/// time remains, breached at zero.
#[must_use]
pub fn classify(remaining_secs: f64, budget_secs: f64) -> SlaStatus {
    if remaining_secs > budget_secs * 0.3 {
        SlaStatus::OnTrack
    } else if remaining_secs > 0.0 {
        SlaStatus::AtRisk
    } else {
        SlaStatus::Breached
    }
}

/// Render seconds as an `mm:ss` clock
#[must_use]
pub fn format_clock(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// One observation of the countdown
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlaReading {
    /// Seconds since the timer started
    pub elapsed_secs: f64,
    /// Seconds left in the budget, clamped to zero
    pub remaining_secs: f64,
    /// Classification of `remaining_secs`
    pub status: SlaStatus,
}

impl SlaReading {
    fn fresh(budget_secs: f64) -> Self {
        Self {
            elapsed_secs: 0.0,
            remaining_secs: budget_secs,
            status: classify(budget_secs, budget_secs),
        }
    }
}

/// Countdown clock for one SLA budget
///
/// State machine: idle -> running (on [`SlaTimer::start`]) -> idle (on
/// [`SlaTimer::stop`] / [`SlaTimer::reset`]). Readings stream over a watch
/// channel; subscribers always see the latest observation.
#[derive(Debug)]
pub struct SlaTimer {
    budget_secs: f64,
    tick: Duration,
    tx: watch::Sender<SlaReading>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SlaTimer {
    /// New idle timer for a budget, using the default tick
    #[must_use]
    pub fn new(budget_secs: f64) -> Self {
        let (tx, _rx) = watch::channel(SlaReading::fresh(budget_secs));
        Self {
            budget_secs,
            tick: DEFAULT_TICK,
            tx,
            task: Mutex::new(None),
        }
    }

    /// Override the recompute interval
    #[must_use]
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Budget this timer counts down from
    #[inline]
    #[must_use]
    pub fn budget_secs(&self) -> f64 {
        self.budget_secs
    }

    /// Subscribe to countdown readings
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SlaReading> {
        self.tx.subscribe()
    }

    /// Latest reading
    #[must_use]
    pub fn reading(&self) -> SlaReading {
        *self.tx.borrow()
    }

    /// Whether the ticking task is alive
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock_task()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Start (or restart) the countdown from now
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&self) {
        let started_at = Instant::now();
        let budget = self.budget_secs;
        let tick = self.tick;
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            let mut ticks = interval(tick);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticks.tick().await;
                let elapsed = started_at.elapsed().as_secs_f64();
                let remaining = (budget - elapsed).max(0.0);
                let reading = SlaReading {
                    elapsed_secs: elapsed,
                    remaining_secs: remaining,
                    status: classify(remaining, budget),
                };
                tx.send_replace(reading);
            }
        });
        if let Some(previous) = self.lock_task().replace(handle) {
            previous.abort();
        }
    }

    /// Stop ticking, keeping the last reading
    pub fn stop(&self) {
        if let Some(handle) = self.lock_task().take() {
            handle.abort();
        }
    }

    /// Stop ticking and restore the fresh reading
    pub fn reset(&self) {
        self.stop();
        self.tx.send_replace(SlaReading::fresh(self.budget_secs));
    }

    fn lock_task(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl Drop for SlaTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
