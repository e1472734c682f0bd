pub mod clock;
pub mod commands;
pub mod controller;
pub mod state;

pub use clock::{Clock, SystemClock};
pub use commands::{TrackerCommand, TrackerShell};
pub use controller::SleepTracker;
pub use state::{ControlState, TrackerSnapshot, TrackerStatus};
