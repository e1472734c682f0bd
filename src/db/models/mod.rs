pub mod night;

pub use night::{is_valid_quality, SleepNight, MAX_QUALITY, MIN_QUALITY, UNRATED_QUALITY};
