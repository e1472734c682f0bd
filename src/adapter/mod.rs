//! Binds sleep nights to list rows.

pub mod diff;

use std::sync::Arc;

use serde::Serialize;

use crate::db::SleepNight;
use crate::format::NightFormatter;

pub use diff::{calculate_diff, DiffCallback, ListUpdate, SleepNightDiffCallback};

/// Icon shown next to a night, chosen by its quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QualityIcon {
    Sleep0,
    Sleep1,
    Sleep2,
    Sleep3,
    Sleep4,
    Sleep5,
    /// Unrated or out-of-range quality.
    Active,
}

impl QualityIcon {
    pub fn for_quality(quality: i32) -> Self {
        match quality {
            0 => QualityIcon::Sleep0,
            1 => QualityIcon::Sleep1,
            2 => QualityIcon::Sleep2,
            3 => QualityIcon::Sleep3,
            4 => QualityIcon::Sleep4,
            5 => QualityIcon::Sleep5,
            _ => QualityIcon::Active,
        }
    }

    pub fn asset_name(&self) -> &'static str {
        match self {
            QualityIcon::Sleep0 => "ic_sleep_0",
            QualityIcon::Sleep1 => "ic_sleep_1",
            QualityIcon::Sleep2 => "ic_sleep_2",
            QualityIcon::Sleep3 => "ic_sleep_3",
            QualityIcon::Sleep4 => "ic_sleep_4",
            QualityIcon::Sleep5 => "ic_sleep_5",
            QualityIcon::Active => "ic_sleep_active",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum IconBackground {
    Red,
    Black,
}

impl IconBackground {
    /// Poor nights (quality 1 or lower, unrated included) are flagged red.
    pub fn for_quality(quality: i32) -> Self {
        if quality <= 1 {
            IconBackground::Red
        } else {
            IconBackground::Black
        }
    }
}

/// Everything a list row displays for one night.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NightRow {
    pub night_id: i64,
    pub quality_icon: QualityIcon,
    pub icon_background: IconBackground,
    pub sleep_length: String,
    pub quality_label: String,
}

pub struct SleepNightAdapter {
    data: Vec<SleepNight>,
    formatter: Arc<dyn NightFormatter>,
}

impl SleepNightAdapter {
    pub fn new(formatter: Arc<dyn NightFormatter>) -> Self {
        Self {
            data: Vec::new(),
            formatter,
        }
    }

    /// Replaces the displayed list and returns the row updates to apply.
    pub fn submit_list(&mut self, nights: Vec<SleepNight>) -> Vec<ListUpdate> {
        let updates = calculate_diff(&self.data, &nights, &SleepNightDiffCallback);
        self.data = nights;
        updates
    }

    pub fn item_count(&self) -> usize {
        self.data.len()
    }

    pub fn item(&self, position: usize) -> Option<&SleepNight> {
        self.data.get(position)
    }

    pub fn bind(&self, position: usize) -> Option<NightRow> {
        self.data.get(position).map(|night| self.bind_night(night))
    }

    pub fn rows(&self) -> Vec<NightRow> {
        self.data.iter().map(|night| self.bind_night(night)).collect()
    }

    fn bind_night(&self, night: &SleepNight) -> NightRow {
        NightRow {
            night_id: night.night_id,
            quality_icon: QualityIcon::for_quality(night.sleep_quality),
            icon_background: IconBackground::for_quality(night.sleep_quality),
            sleep_length: self.formatter.format_duration(night),
            quality_label: self.formatter.format_quality(night.sleep_quality),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::TextFormatter;
    use crate::settings::DisplaySettings;

    fn adapter() -> SleepNightAdapter {
        SleepNightAdapter::new(Arc::new(TextFormatter::new(DisplaySettings {
            use_local_time: false,
            ..DisplaySettings::default()
        })))
    }

    fn night(id: i64, start: i64, end: i64, quality: i32) -> SleepNight {
        SleepNight {
            night_id: id,
            start_time_milli: start,
            end_time_milli: end,
            sleep_quality: quality,
        }
    }

    #[test]
    fn icon_follows_quality() {
        assert_eq!(QualityIcon::for_quality(0), QualityIcon::Sleep0);
        assert_eq!(QualityIcon::for_quality(5), QualityIcon::Sleep5);
        assert_eq!(QualityIcon::for_quality(-1), QualityIcon::Active);
        assert_eq!(QualityIcon::for_quality(6), QualityIcon::Active);
        assert_eq!(QualityIcon::Sleep3.asset_name(), "ic_sleep_3");
        assert_eq!(QualityIcon::Active.asset_name(), "ic_sleep_active");
    }

    #[test]
    fn background_is_red_for_poor_nights() {
        assert_eq!(IconBackground::for_quality(-1), IconBackground::Red);
        assert_eq!(IconBackground::for_quality(0), IconBackground::Red);
        assert_eq!(IconBackground::for_quality(1), IconBackground::Red);
        assert_eq!(IconBackground::for_quality(2), IconBackground::Black);
        assert_eq!(IconBackground::for_quality(5), IconBackground::Black);
    }

    #[test]
    fn bind_renders_row() {
        let mut adapter = adapter();
        adapter.submit_list(vec![night(7, 0, 3 * 60 * 60 * 1000, 4)]);

        let row = adapter.bind(0).unwrap();

        assert_eq!(
            row,
            NightRow {
                night_id: 7,
                quality_icon: QualityIcon::Sleep4,
                icon_background: IconBackground::Black,
                sleep_length: "3 hours on Thursday".into(),
                quality_label: "Pretty good".into(),
            }
        );
        assert!(adapter.bind(1).is_none());
    }

    #[test]
    fn submit_list_reports_updates() {
        let mut adapter = adapter();

        let first = adapter.submit_list(vec![night(1, 0, 0, -1)]);
        assert_eq!(first, vec![ListUpdate::Insert { position: 0 }]);

        let second = adapter.submit_list(vec![night(2, 10, 10, -1), night(1, 0, 500, -1)]);
        assert_eq!(
            second,
            vec![
                ListUpdate::Insert { position: 0 },
                ListUpdate::Change { position: 1 },
            ]
        );
        assert_eq!(adapter.item_count(), 2);
        assert_eq!(adapter.item(0).map(|n| n.night_id), Some(2));

        let cleared = adapter.submit_list(Vec::new());
        assert_eq!(cleared.len(), 2);
        assert_eq!(adapter.item_count(), 0);
    }
}
