pub mod connection;
mod migrations;
pub mod models;
mod repositories;

pub use connection::{Database, DATABASE_FILE_NAME};
pub use migrations::CURRENT_SCHEMA_VERSION;
pub use models::{is_valid_quality, SleepNight, MAX_QUALITY, MIN_QUALITY, UNRATED_QUALITY};
