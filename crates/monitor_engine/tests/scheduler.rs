mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{mount_listing, mount_login, setup, RecordingNotifier, LISTING_PAGE};
use monitor_core::{ChannelTarget, DailySchedule, RunStatus, TriggerPhrase};
use monitor_engine::{ContentMonitor, DedupStore, Scheduler, TriggerOutcome};
use tempfile::TempDir;
use wiremock::MockServer;

async fn scheduler_for(server: &MockServer, temp: &TempDir) -> (Scheduler, Arc<RecordingNotifier>) {
    mount_login(server).await;
    mount_listing(server, LISTING_PAGE).await;
    let notifier = Arc::new(RecordingNotifier::default());
    let monitor = ContentMonitor::new(setup(
        server,
        DedupStore::load(temp.path().join("known.json")).unwrap(),
        notifier.clone(),
        vec![ChannelTarget::new("telegram", "42")],
    ));
    let scheduler = Scheduler::new(
        monitor,
        DailySchedule::parse(&["08:00", "14:00", "20:00"]).unwrap(),
        TriggerPhrase::new("check new movies"),
    );
    (scheduler, notifier)
}

#[tokio::test]
async fn trigger_runs_the_monitor() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (scheduler, notifier) = scheduler_for(&server, &temp).await;

    let outcome = scheduler.trigger_now().await;
    assert!(matches!(outcome, TriggerOutcome::Completed(_)), "{outcome:?}");
    assert_eq!(outcome.status(), Some(RunStatus::Success));
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn trigger_while_running_is_skipped() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (scheduler, notifier) = scheduler_for(&server, &temp).await;

    let monitor = scheduler.monitor();
    let _in_flight = monitor.lock().await;

    let outcome = scheduler.trigger_now().await;
    assert!(matches!(outcome, TriggerOutcome::Skipped));
    assert_eq!(outcome.status(), None);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn only_matching_events_are_handled() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (scheduler, notifier) = scheduler_for(&server, &temp).await;

    assert!(!scheduler.handle_event("what's the weather").await);
    assert!(notifier.sent().is_empty());

    assert!(scheduler.handle_event("Please CHECK NEW MOVIES now").await);
    assert_eq!(notifier.sent().len(), 1);
}

#[tokio::test]
async fn run_until_returns_on_shutdown() {
    let server = MockServer::start().await;
    let temp = TempDir::new().unwrap();
    let (scheduler, notifier) = scheduler_for(&server, &temp).await;

    let finished = tokio::time::timeout(Duration::from_secs(2), scheduler.run_until(async {})).await;
    assert!(finished.is_ok());
    assert!(notifier.sent().is_empty());
}
