//! Sleep night data model.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Quality stored for a night nobody has rated yet.
pub const UNRATED_QUALITY: i32 = -1;
pub const MIN_QUALITY: i32 = 0;
pub const MAX_QUALITY: i32 = 5;

/// One sleep-tracking entry.
///
/// A night is in progress while `end_time_milli == start_time_milli`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepNight {
    /// Assigned by storage; `0` until the night has been inserted.
    pub night_id: i64,
    pub start_time_milli: i64,
    pub end_time_milli: i64,
    pub sleep_quality: i32,
}

impl SleepNight {
    /// A fresh, unsaved night starting (and ending) at `now_milli`.
    pub fn starting_at(now_milli: i64) -> Self {
        Self {
            night_id: 0,
            start_time_milli: now_milli,
            end_time_milli: now_milli,
            sleep_quality: UNRATED_QUALITY,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.end_time_milli == self.start_time_milli
    }

    pub fn duration_milli(&self) -> i64 {
        self.end_time_milli - self.start_time_milli
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.start_time_milli).single()
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.end_time_milli).single()
    }
}

pub fn is_valid_quality(quality: i32) -> bool {
    (MIN_QUALITY..=MAX_QUALITY).contains(&quality)
}
