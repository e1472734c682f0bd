use std::{str::FromStr, sync::Arc};

use anyhow::{anyhow, bail, Context, Result};

use crate::{
    adapter::{IconBackground, NightRow, SleepNightAdapter},
    format::NightFormatter,
};

use super::{SleepTracker, TrackerStatus};

pub const HELP_TEXT: &str = "commands:
  start              start tracking a night
  stop               stop the night in progress
  rate <id> <0-5>    rate a night's sleep quality
  clear              delete every night
  list               show all nights
  summary            show the sleep data summary
  status             show whether a night is in progress
  help               show this text
  quit               exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerCommand {
    Start,
    Stop,
    Clear,
    Rate { night_id: i64, quality: i32 },
    List,
    Summary,
    Status,
    Help,
    Quit,
}

impl FromStr for TrackerCommand {
    type Err = anyhow::Error;

    fn from_str(input: &str) -> Result<Self> {
        let mut parts = input.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| anyhow!("empty command"))?
            .to_ascii_lowercase();

        let command = match name.as_str() {
            "start" => TrackerCommand::Start,
            "stop" => TrackerCommand::Stop,
            "clear" => TrackerCommand::Clear,
            "list" | "ls" => TrackerCommand::List,
            "summary" => TrackerCommand::Summary,
            "status" => TrackerCommand::Status,
            "help" | "?" => TrackerCommand::Help,
            "quit" | "exit" => TrackerCommand::Quit,
            "rate" => {
                let (Some(id), Some(quality)) = (parts.next(), parts.next()) else {
                    bail!("usage: rate <night-id> <0-5>");
                };
                TrackerCommand::Rate {
                    night_id: id
                        .parse::<i64>()
                        .with_context(|| format!("invalid night id '{id}'"))?,
                    quality: quality
                        .parse::<i32>()
                        .with_context(|| format!("invalid quality '{quality}'"))?,
                }
            }
            other => bail!("unknown command '{other}' (try 'help')"),
        };

        if parts.next().is_some() {
            bail!("too many arguments for '{name}'");
        }
        Ok(command)
    }
}

/// Text front end over a [`SleepTracker`]: runs commands and renders the
/// results the way a list screen would.
pub struct TrackerShell {
    tracker: SleepTracker,
    adapter: SleepNightAdapter,
    formatter: Arc<dyn NightFormatter>,
}

impl TrackerShell {
    pub fn new(tracker: SleepTracker, formatter: Arc<dyn NightFormatter>) -> Self {
        Self {
            tracker,
            adapter: SleepNightAdapter::new(formatter.clone()),
            formatter,
        }
    }

    pub fn tracker(&self) -> &SleepTracker {
        &self.tracker
    }

    /// Runs one command and returns the text to show. `Quit` is left to the
    /// caller and answers with an empty string.
    pub async fn handle(&mut self, command: TrackerCommand) -> Result<String> {
        match command {
            TrackerCommand::Start => {
                let night = self.tracker.start_tracking().await?;
                Ok(format!("Tracking night #{}", night.night_id))
            }
            TrackerCommand::Stop => match self.tracker.stop_tracking().await? {
                Some(night) => Ok(format!(
                    "Stopped night #{}: {}",
                    night.night_id,
                    self.formatter.format_duration(&night)
                )),
                None => Ok("No night in progress".to_string()),
            },
            TrackerCommand::Clear => {
                let removed = self.tracker.clear().await?;
                self.adapter.submit_list(Vec::new());
                Ok(format!("Cleared {removed} night(s)"))
            }
            TrackerCommand::Rate { night_id, quality } => {
                let night = self.tracker.set_sleep_quality(night_id, quality).await?;
                Ok(format!(
                    "Rated night #{}: {}",
                    night.night_id,
                    self.formatter.format_quality(night.sleep_quality)
                ))
            }
            TrackerCommand::List => {
                let nights = self.tracker.refresh_nights().await?;
                self.adapter.submit_list(nights);
                if self.adapter.item_count() == 0 {
                    return Ok("No nights recorded".to_string());
                }
                Ok(self
                    .adapter
                    .rows()
                    .iter()
                    .map(render_row)
                    .collect::<Vec<_>>()
                    .join("\n"))
            }
            TrackerCommand::Summary => {
                self.tracker.refresh_nights().await?;
                Ok(self.tracker.nights_summary().trim_end().to_string())
            }
            TrackerCommand::Status => Ok(match self.tracker.status() {
                TrackerStatus::Tracking => match self.tracker.tonight() {
                    Some(night) => format!("Tracking night #{}", night.night_id),
                    None => "Tracking".to_string(),
                },
                TrackerStatus::Idle => "Idle".to_string(),
            }),
            TrackerCommand::Help => Ok(HELP_TEXT.to_string()),
            TrackerCommand::Quit => Ok(String::new()),
        }
    }

    pub async fn shutdown(&self) {
        self.tracker.shutdown().await;
    }
}

fn render_row(row: &NightRow) -> String {
    let background = match row.icon_background {
        IconBackground::Red => "red",
        IconBackground::Black => "black",
    };
    format!(
        "#{:<4} {:<16} {:<6} {:<28} {}",
        row.night_id,
        row.quality_icon.asset_name(),
        background,
        row.sleep_length,
        row.quality_label
    )
}
