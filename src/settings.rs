use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{PoisonError, RwLock},
};

/// Overrides where the database and settings file live.
pub const DATA_DIR_ENV: &str = "SLEEPTRACKER_DATA_DIR";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Data directory: `$SLEEPTRACKER_DATA_DIR`, else the platform data dir.
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir));
    }

    dirs::data_dir()
        .map(|dir| dir.join("sleeptracker"))
        .context("could not determine a data directory; set SLEEPTRACKER_DATA_DIR")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// chrono format string for start/end times in the nights summary.
    pub date_format: String,
    /// Render times in the local zone instead of UTC.
    pub use_local_time: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            date_format: "%A %b-%d-%Y Time: %H:%M".into(),
            use_local_time: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct UserSettings {
    display: DisplaySettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring unreadable settings at {}: {err}",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn display(&self) -> DisplaySettings {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .display
            .clone()
    }

    #[allow(dead_code)]
    pub(crate) fn update_display(&self, settings: DisplaySettings) -> Result<()> {
        let mut guard = self.data.write().unwrap_or_else(PoisonError::into_inner);
        guard.display = settings;
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
