//! Shared fixtures for integration tests.
#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicI64, Ordering},
    Arc,
};

use sleeptracker_lib::{
    db::{Database, SleepNight},
    format::{NightFormatter, TextFormatter},
    settings::DisplaySettings,
    tracker::Clock,
};
use tempfile::TempDir;

pub struct ManualClock(AtomicI64);

impl ManualClock {
    pub fn at(millis: i64) -> Arc<Self> {
        Arc::new(Self(AtomicI64::new(millis)))
    }

    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

pub fn create_test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(temp_dir.path().join("test.sqlite3")).unwrap();
    (db, temp_dir)
}

pub fn utc_formatter() -> Arc<dyn NightFormatter> {
    Arc::new(TextFormatter::new(DisplaySettings {
        use_local_time: false,
        ..DisplaySettings::default()
    }))
}

pub fn night(start: i64, end: i64, quality: i32) -> SleepNight {
    SleepNight {
        night_id: 0,
        start_time_milli: start,
        end_time_milli: end,
        sleep_quality: quality,
    }
}
