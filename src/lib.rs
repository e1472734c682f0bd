pub mod adapter;
pub mod db;
pub mod error;
pub mod format;
pub mod settings;
pub mod tracker;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::io::{AsyncBufReadExt, BufReader};

use db::Database;
use format::{NightFormatter, TextFormatter};
use settings::{resolve_data_dir, SettingsStore, SETTINGS_FILE_NAME};
use tracker::{SleepTracker, TrackerCommand, TrackerShell};

pub use error::SleepError;
pub use utils::logging::init_logging;

/// Entry point of the `sleeptracker` binary: a line-oriented shell over the
/// tracker reading commands from stdin.
pub fn run() -> Result<()> {
    init_logging();

    info!("Sleep tracker starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(run_shell())
}

async fn run_shell() -> Result<()> {
    let data_dir = resolve_data_dir()?;
    let settings = SettingsStore::new(data_dir.join(SETTINGS_FILE_NAME))?;
    let database = Database::get_instance(&data_dir)?;

    let formatter: Arc<dyn NightFormatter> = Arc::new(TextFormatter::new(settings.display()));
    let tracker = SleepTracker::with_system_clock(database.clone(), formatter.clone()).await?;
    let mut shell = TrackerShell::new(tracker, formatter);

    println!("Sleep tracker ready. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<TrackerCommand>() {
            Ok(TrackerCommand::Quit) => break,
            Ok(command) => command,
            Err(err) => {
                println!("error: {err:#}");
                continue;
            }
        };

        match shell.handle(command).await {
            Ok(output) => println!("{output}"),
            Err(err) => println!("error: {err:#}"),
        }
    }

    shell.shutdown().await;
    info!("Sleep tracker shutting down");
    Ok(())
}
