use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use monitor_core::{DailySchedule, RunStatus, TriggerPhrase};
use monitor_logging::{monitor_debug, monitor_info, monitor_warn};
use tokio::sync::Mutex;

use crate::monitor::{ContentMonitor, MonitorError, RunReport};

#[derive(Debug)]
pub enum TriggerOutcome {
    Completed(RunReport),
    Failed(MonitorError),
    /// Another run was still in flight.
    Skipped,
}

impl TriggerOutcome {
    pub fn status(&self) -> Option<RunStatus> {
        match self {
            TriggerOutcome::Completed(report) => Some(report.status),
            TriggerOutcome::Failed(_) => Some(RunStatus::Failed),
            TriggerOutcome::Skipped => None,
        }
    }
}

/// Fires the monitor at fixed daily times and on matching events; runs never overlap.
pub struct Scheduler {
    monitor: Arc<Mutex<ContentMonitor>>,
    schedule: DailySchedule,
    trigger: TriggerPhrase,
}

impl Scheduler {
    pub fn new(monitor: ContentMonitor, schedule: DailySchedule, trigger: TriggerPhrase) -> Self {
        Self {
            monitor: Arc::new(Mutex::new(monitor)),
            schedule,
            trigger,
        }
    }

    pub fn monitor(&self) -> Arc<Mutex<ContentMonitor>> {
        self.monitor.clone()
    }

    /// Run now unless a run is already in progress.
    pub async fn trigger_now(&self) -> TriggerOutcome {
        let Ok(mut monitor) = self.monitor.try_lock() else {
            monitor_warn!("Trigger skipped: a run is already in progress");
            return TriggerOutcome::Skipped;
        };
        match monitor.run().await {
            Ok(report) => TriggerOutcome::Completed(report),
            Err(err) => TriggerOutcome::Failed(err),
        }
    }

    /// Returns whether the event was meant for this monitor. A matching event
    /// triggers a run.
    pub async fn handle_event(&self, text: &str) -> bool {
        if !self.trigger.matches(text) {
            monitor_debug!("Event ignored: no trigger phrase");
            return false;
        }
        let outcome = self.trigger_now().await;
        match outcome.status() {
            Some(status) => monitor_info!("Event-triggered run finished: {}", status),
            None => monitor_info!("Event-triggered run skipped"),
        }
        true
    }

    /// Fire at every scheduled time until `shutdown` resolves.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            let now = Local::now().naive_local();
            let Some(next) = self.schedule.next_after(now) else {
                monitor_warn!("No next firing time after {}; scheduler stopping", now);
                return;
            };
            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            monitor_info!("Next check at {} (in {:?})", next, wait);

            tokio::select! {
                _ = &mut shutdown => {
                    monitor_info!("Scheduler shutting down");
                    return;
                }
                _ = tokio::time::sleep(wait) => {
                    let outcome = self.trigger_now().await;
                    if let Some(status) = outcome.status() {
                        monitor_info!("Scheduled run finished: {}", status);
                    }
                }
            }
        }
    }
}
