use crate::compress::{BatchReport, run_batch};
use crate::notify::Severity;
use crate::state::AppState;
use crate::utils::{format_file_size, plural};
use serde::{Deserialize, Serialize};
use std::{
    sync::{
        Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Trigger {
    Interval,
    StorageChange,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SkipReason {
    AlreadyRunning,
    CoolingDown { remaining_secs: u64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum RunOutcome {
    Completed { report: BatchReport },
    Skipped { reason: SkipReason },
}

/// Guarantees at most one optimization batch at a time, with a cooldown
/// between the starts of consecutive batches.
#[derive(Debug)]
pub struct OptimizeScheduler {
    running: AtomicBool,
    last_start: Mutex<Option<Instant>>,
    cooldown: Duration,
}

impl OptimizeScheduler {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            running: AtomicBool::new(false),
            last_start: Mutex::new(None),
            cooldown,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn try_begin(&self, now: Instant) -> Result<RunGuard<'_>, SkipReason> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SkipReason::AlreadyRunning);
        }

        let mut last_start = self
            .last_start
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = *last_start {
            let elapsed = now.saturating_duration_since(previous);
            if elapsed < self.cooldown {
                self.running.store(false, Ordering::Release);
                let remaining = self.cooldown - elapsed;
                return Err(SkipReason::CoolingDown {
                    remaining_secs: remaining.as_secs_f64().ceil() as u64,
                });
            }
        }
        *last_start = Some(now);

        Ok(RunGuard { scheduler: self })
    }
}

/// Clears the running flag when dropped.
#[derive(Debug)]
pub struct RunGuard<'a> {
    scheduler: &'a OptimizeScheduler,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.scheduler.running.store(false, Ordering::Release);
    }
}

/// Entry point shared by the timer, storage-change and manual triggers.
pub async fn run_optimization(state: &AppState, trigger: Trigger) -> RunOutcome {
    let _guard = match state.scheduler.try_begin(Instant::now()) {
        Ok(guard) => guard,
        Err(reason) => {
            debug!(?trigger, ?reason, "optimization skipped");
            return RunOutcome::Skipped { reason };
        }
    };

    info!(?trigger, "optimization started");
    let report = run_batch(&state.store, state.encoder.clone(), &state.batch_options).await;

    if report.processed > 0 {
        state.notifications.notify(
            format!(
                "Optimized {}, saved {}",
                plural(report.processed, "image"),
                format_file_size(report.bytes_saved())
            ),
            Severity::Success,
        );
    }
    if report.dropped > 0 {
        state.notifications.notify(
            format!(
                "Skipped {} that could not be compressed",
                plural(report.dropped, "image")
            ),
            Severity::Warning,
        );
    }

    RunOutcome::Completed { report }
}

pub fn spawn_interval(state: AppState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period.max(Duration::from_secs(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            run_optimization(&state, Trigger::Interval).await;
        }
    })
}
