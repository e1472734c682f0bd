//! Human-readable rendering of sleep nights.
//!
//! The adapter and tracker only see [`NightFormatter`]; swap the
//! implementation to change wording or locale.

use std::fmt::{Display, Write};

use chrono::{DateTime, Local, TimeZone, Utc};

use crate::db::SleepNight;
use crate::settings::DisplaySettings;

const ONE_MINUTE_MILLIS: i64 = 60 * 1000;
const ONE_HOUR_MILLIS: i64 = 60 * ONE_MINUTE_MILLIS;

pub const SUMMARY_HEADER: &str = "Here is your sleep data";

pub trait NightFormatter: Send + Sync {
    /// Length of the night plus the weekday it started on.
    fn format_duration(&self, night: &SleepNight) -> String;

    fn format_quality(&self, quality: i32) -> String;

    /// Multi-line summary of every night, in the order given.
    fn format_nights(&self, nights: &[SleepNight]) -> String;
}

/// Plain-text English formatter.
#[derive(Debug, Clone, Default)]
pub struct TextFormatter {
    settings: DisplaySettings,
}

impl TextFormatter {
    pub fn new(settings: DisplaySettings) -> Self {
        Self { settings }
    }

    fn format_millis(&self, millis: i64, pattern: &str) -> String {
        let Some(utc) = Utc.timestamp_millis_opt(millis).single() else {
            return millis.to_string();
        };

        if self.settings.use_local_time {
            render(utc.with_timezone(&Local), pattern)
        } else {
            render(utc, pattern)
        }
    }
}

/// Formats `at` with `pattern`, falling back to RFC 3339 when the pattern is
/// not a valid chrono format string.
fn render<Tz>(at: DateTime<Tz>, pattern: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    if write!(out, "{}", at.format(pattern)).is_err() {
        return at.to_rfc3339();
    }
    out
}

impl NightFormatter for TextFormatter {
    fn format_duration(&self, night: &SleepNight) -> String {
        let duration = night.duration_milli();
        let weekday = self.format_millis(night.start_time_milli, "%A");

        if duration < ONE_MINUTE_MILLIS {
            format!("{} seconds on {weekday}", duration / 1000)
        } else if duration < ONE_HOUR_MILLIS {
            format!("{} minutes on {weekday}", duration / ONE_MINUTE_MILLIS)
        } else {
            format!("{} hours on {weekday}", duration / ONE_HOUR_MILLIS)
        }
    }

    fn format_quality(&self, quality: i32) -> String {
        match quality {
            0 => "Very bad",
            1 => "Poor",
            2 => "So-so",
            3 => "OK",
            4 => "Pretty good",
            5 => "Excellent",
            _ => "--",
        }
        .to_string()
    }

    fn format_nights(&self, nights: &[SleepNight]) -> String {
        let pattern = self.settings.date_format.as_str();
        let mut out = String::from(SUMMARY_HEADER);
        out.push('\n');

        for night in nights {
            out.push('\n');
            let _ = writeln!(
                out,
                "Start: {}",
                self.format_millis(night.start_time_milli, pattern)
            );

            if !night.is_in_progress() {
                let total_seconds = night.duration_milli().max(0) / 1000;
                let _ = writeln!(
                    out,
                    "End: {}",
                    self.format_millis(night.end_time_milli, pattern)
                );
                let _ = writeln!(out, "Quality: {}", self.format_quality(night.sleep_quality));
                let _ = writeln!(
                    out,
                    "Hours:Minutes:Seconds: {}:{:02}:{:02}",
                    total_seconds / 3600,
                    (total_seconds / 60) % 60,
                    total_seconds % 60
                );
            }
        }

        out
    }
}
