use serde::{Deserialize, Serialize};

use crate::db::SleepNight;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TrackerStatus {
    #[default]
    Idle,
    Tracking,
}

impl TrackerStatus {
    pub fn from_tonight(tonight: Option<&SleepNight>) -> Self {
        match tonight {
            Some(_) => TrackerStatus::Tracking,
            None => TrackerStatus::Idle,
        }
    }
}

/// Which of the start / stop / clear controls currently make sense.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ControlState {
    pub start_enabled: bool,
    pub stop_enabled: bool,
    pub clear_enabled: bool,
}

impl ControlState {
    pub fn derive(tonight: Option<&SleepNight>, nights: &[SleepNight]) -> Self {
        Self {
            start_enabled: tonight.is_none(),
            stop_enabled: tonight.is_some(),
            clear_enabled: !nights.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerSnapshot {
    pub status: TrackerStatus,
    pub tonight: Option<SleepNight>,
    pub controls: ControlState,
}

/// The current night is the most recent one, but only while it is still in
/// progress.
pub fn current_from_latest(latest: Option<SleepNight>) -> Option<SleepNight> {
    latest.filter(SleepNight::is_in_progress)
}
