mod common;

use std::time::Duration;

use common::{create_test_db, night, utc_formatter, ManualClock};
use sleeptracker_lib::{
    adapter::{DiffCallback, SleepNightDiffCallback},
    tracker::{SleepTracker, TrackerCommand, TrackerShell, TrackerStatus},
};
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(5);

fn cmd(line: &str) -> TrackerCommand {
    line.parse().unwrap()
}

#[tokio::test]
async fn stopping_an_existing_night_closes_it_at_now() {
    let (db, _temp_dir) = create_test_db();
    let stored = db.insert_night(&night(1_000, 1_000, 3)).await.unwrap();

    let clock = ManualClock::at(5_000);
    let tracker = SleepTracker::new(db.clone(), clock, utc_formatter())
        .await
        .unwrap();
    assert_eq!(tracker.status(), TrackerStatus::Tracking);
    assert_eq!(tracker.tonight(), Some(stored.clone()));

    let stopped = tracker.stop_tracking().await.unwrap().unwrap();

    assert_eq!(stopped.night_id, stored.night_id);
    assert_eq!(stopped.start_time_milli, 1_000);
    assert_eq!(stopped.end_time_milli, 5_000);
    assert_eq!(stopped.sleep_quality, 3);
    assert_eq!(db.get_night(stored.night_id).await.unwrap(), Some(stopped));
    assert_eq!(tracker.status(), TrackerStatus::Idle);
    assert!(tracker.tonight().is_none());
}

#[tokio::test]
async fn start_stop_clear_cycle() {
    let (db, _temp_dir) = create_test_db();
    let clock = ManualClock::at(1_000);
    let tracker = SleepTracker::new(db.clone(), clock.clone(), utc_formatter())
        .await
        .unwrap();

    let started = tracker.start_tracking().await.unwrap();
    assert_eq!(started.start_time_milli, 1_000);
    assert_eq!(started.end_time_milli, started.start_time_milli);
    assert_eq!(tracker.tonight(), Some(started.clone()));
    assert!(tracker.controls().stop_enabled);
    assert!(!tracker.controls().start_enabled);

    clock.set(4_000);
    let stopped = tracker.stop_tracking().await.unwrap().unwrap();
    assert!(stopped.end_time_milli > started.end_time_milli);
    assert_ne!(stopped, started);
    assert!(SleepNightDiffCallback.are_items_the_same(&started, &stopped));
    assert!(!SleepNightDiffCallback.are_contents_the_same(&started, &stopped));

    assert_eq!(tracker.clear().await.unwrap(), 1);
    assert_eq!(tracker.refresh_current().await.unwrap(), None);
    assert_eq!(tracker.status(), TrackerStatus::Idle);
    assert!(db.get_all_nights().await.unwrap().is_empty());
}

#[tokio::test]
async fn current_night_is_rederived_from_storage() {
    let (db, _temp_dir) = create_test_db();
    let clock = ManualClock::at(1_000);
    let first = SleepTracker::new(db.clone(), clock.clone(), utc_formatter())
        .await
        .unwrap();
    let started = first.start_tracking().await.unwrap();

    let second = SleepTracker::new(db.clone(), clock.clone(), utc_formatter())
        .await
        .unwrap();
    assert_eq!(second.tonight(), Some(started));

    clock.set(2_000);
    second.stop_tracking().await.unwrap();

    assert_eq!(first.status(), TrackerStatus::Tracking);
    assert_eq!(first.refresh_current().await.unwrap(), None);
    assert_eq!(first.status(), TrackerStatus::Idle);
}

#[tokio::test]
async fn observers_follow_writes() {
    let (db, _temp_dir) = create_test_db();
    let clock = ManualClock::at(0);
    let tracker = SleepTracker::new(db.clone(), clock.clone(), utc_formatter())
        .await
        .unwrap();
    let mut nights_rx = tracker.subscribe_nights();
    let mut summary_rx = tracker.subscribe_nights_summary();

    let started = tracker.start_tracking().await.unwrap();
    timeout(WAIT, nights_rx.wait_for(|nights| nights.len() == 1))
        .await
        .unwrap()
        .unwrap();

    clock.set(60_000);
    tracker.stop_tracking().await.unwrap();
    timeout(WAIT, summary_rx.wait_for(|summary| summary.contains("Quality: --")))
        .await
        .unwrap()
        .unwrap();

    // Writes made straight to the database reach the list as well.
    let mut rated = started.clone();
    rated.end_time_milli = 60_000;
    rated.sleep_quality = 4;
    db.update_night(&rated).await.unwrap();
    timeout(
        WAIT,
        nights_rx.wait_for(|nights| nights.first().map(|n| n.sleep_quality) == Some(4)),
    )
    .await
    .unwrap()
    .unwrap();

    tracker.clear().await.unwrap();
    timeout(WAIT, nights_rx.wait_for(|nights| nights.is_empty()))
        .await
        .unwrap()
        .unwrap();

    tracker.shutdown().await;
}

#[tokio::test]
async fn shell_runs_a_full_night() {
    let (db, _temp_dir) = create_test_db();
    let clock = ManualClock::at(0);
    let formatter = utc_formatter();
    let tracker = SleepTracker::new(db, clock.clone(), formatter.clone())
        .await
        .unwrap();
    let mut shell = TrackerShell::new(tracker, formatter);

    assert_eq!(shell.handle(cmd("status")).await.unwrap(), "Idle");
    assert_eq!(shell.handle(cmd("start")).await.unwrap(), "Tracking night #1");
    assert_eq!(shell.handle(cmd("status")).await.unwrap(), "Tracking night #1");

    clock.set(2 * 60 * 60 * 1000);
    assert_eq!(
        shell.handle(cmd("stop")).await.unwrap(),
        "Stopped night #1: 2 hours on Thursday"
    );
    assert_eq!(shell.handle(cmd("stop")).await.unwrap(), "No night in progress");

    assert_eq!(
        shell.handle(cmd("rate 1 4")).await.unwrap(),
        "Rated night #1: Pretty good"
    );
    assert!(shell.handle(cmd("rate 1 9")).await.is_err());

    let list = shell.handle(cmd("list")).await.unwrap();
    assert!(list.contains("ic_sleep_4"));
    assert!(list.contains("black"));
    assert!(list.contains("Pretty good"));

    let summary = shell.handle(cmd("summary")).await.unwrap();
    assert!(summary.starts_with("Here is your sleep data"));
    assert!(summary.contains("Hours:Minutes:Seconds: 2:00:00"));

    assert_eq!(shell.handle(cmd("clear")).await.unwrap(), "Cleared 1 night(s)");
    assert_eq!(shell.handle(cmd("list")).await.unwrap(), "No nights recorded");

    shell.shutdown().await;
    assert!(shell.tracker().is_shut_down());
}
