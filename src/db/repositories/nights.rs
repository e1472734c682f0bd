use anyhow::{Context, Result};
use rusqlite::{params, ErrorCode, OptionalExtension, Row};

use crate::db::{connection::Database, models::SleepNight};
use crate::error::SleepError;

const NIGHT_COLUMNS: &str = "id, start_time_milli, end_time_milli, quality_rating";

fn row_to_night(row: &Row) -> rusqlite::Result<SleepNight> {
    Ok(SleepNight {
        night_id: row.get("id")?,
        start_time_milli: row.get("start_time_milli")?,
        end_time_milli: row.get("end_time_milli")?,
        sleep_quality: row.get("quality_rating")?,
    })
}

fn write_error(err: rusqlite::Error) -> anyhow::Error {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        SleepError::ConstraintViolation(err.to_string()).into()
    } else {
        anyhow::Error::new(err)
    }
}

impl Database {
    /// Inserts `night` and returns it with the id storage assigned.
    pub async fn insert_night(&self, night: &SleepNight) -> Result<SleepNight> {
        let mut record = night.clone();
        let inserted = self
            .execute(move |conn| {
                conn.execute(
                    "INSERT INTO daily_sleep_quality (start_time_milli, end_time_milli, quality_rating)
                     VALUES (?1, ?2, ?3)",
                    params![
                        record.start_time_milli,
                        record.end_time_milli,
                        record.sleep_quality,
                    ],
                )
                .map_err(write_error)
                .context("failed to insert sleep night")?;
                record.night_id = conn.last_insert_rowid();
                Ok(record)
            })
            .await?;

        self.notify_changed();
        Ok(inserted)
    }

    /// Overwrites every column of the stored night with the same id.
    pub async fn update_night(&self, night: &SleepNight) -> Result<()> {
        let record = night.clone();
        self.execute(move |conn| {
            let rows_affected = conn
                .execute(
                    "UPDATE daily_sleep_quality
                     SET start_time_milli = ?1,
                         end_time_milli = ?2,
                         quality_rating = ?3
                     WHERE id = ?4",
                    params![
                        record.start_time_milli,
                        record.end_time_milli,
                        record.sleep_quality,
                        record.night_id,
                    ],
                )
                .map_err(write_error)
                .context("failed to update sleep night")?;

            if rows_affected == 0 {
                return Err(SleepError::RecordNotFound(record.night_id).into());
            }
            Ok(())
        })
        .await?;

        self.notify_changed();
        Ok(())
    }

    pub async fn get_night(&self, night_id: i64) -> Result<Option<SleepNight>> {
        self.execute(move |conn| {
            let night = conn
                .query_row(
                    &format!("SELECT {NIGHT_COLUMNS} FROM daily_sleep_quality WHERE id = ?1"),
                    params![night_id],
                    row_to_night,
                )
                .optional()?;
            Ok(night)
        })
        .await
    }

    /// Deletes every night and returns how many were removed.
    pub async fn clear_nights(&self) -> Result<usize> {
        let removed = self
            .execute(|conn| {
                let removed = conn
                    .execute("DELETE FROM daily_sleep_quality", [])
                    .context("failed to clear sleep nights")?;
                Ok(removed)
            })
            .await?;

        self.notify_changed();
        Ok(removed)
    }

    /// The most recently created night, finished or not.
    pub async fn get_tonight(&self) -> Result<Option<SleepNight>> {
        self.execute(|conn| {
            let night = conn
                .query_row(
                    &format!(
                        "SELECT {NIGHT_COLUMNS} FROM daily_sleep_quality
                         ORDER BY id DESC
                         LIMIT 1"
                    ),
                    [],
                    row_to_night,
                )
                .optional()?;
            Ok(night)
        })
        .await
    }

    /// All nights, most recent first.
    pub async fn get_all_nights(&self) -> Result<Vec<SleepNight>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NIGHT_COLUMNS} FROM daily_sleep_quality ORDER BY id DESC"
            ))?;

            let mut rows = stmt.query([])?;
            let mut nights = Vec::new();
            while let Some(row) = rows.next()? {
                nights.push(row_to_night(row)?);
            }

            Ok(nights)
        })
        .await
    }
}
