use std::{
    future::Future,
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use anyhow::Result;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    db::{is_valid_quality, Database, SleepNight},
    error::SleepError,
    format::NightFormatter,
};

use super::{
    state::current_from_latest, Clock, ControlState, SystemClock, TrackerSnapshot, TrackerStatus,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

/// Mediates between the sleep database and whatever renders it.
///
/// Holds the in-progress night (if any) and the full list of nights, both
/// published through `watch` channels. Operations are serialized: each one
/// waits for its database work before the next starts. Dropping the tracker
/// or calling [`SleepTracker::shutdown`] cancels everything it started.
pub struct SleepTracker {
    db: Database,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn NightFormatter>,
    tonight: watch::Sender<Option<SleepNight>>,
    nights: Arc<watch::Sender<Vec<SleepNight>>>,
    nights_summary: Arc<watch::Sender<String>>,
    op_lock: Mutex<()>,
    cancel_token: CancellationToken,
    observer: StdMutex<Option<JoinHandle<()>>>,
}

impl SleepTracker {
    /// Loads the current night and the list, then keeps the list in sync
    /// with the database until the tracker is shut down.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn new(
        db: Database,
        clock: Arc<dyn Clock>,
        formatter: Arc<dyn NightFormatter>,
    ) -> Result<Self> {
        let (tonight, _) = watch::channel(None);
        let (nights, _) = watch::channel(Vec::new());
        let (nights_summary, _) = watch::channel(formatter.format_nights(&[]));

        let tracker = Self {
            db,
            clock,
            formatter,
            tonight,
            nights: Arc::new(nights),
            nights_summary: Arc::new(nights_summary),
            op_lock: Mutex::new(()),
            cancel_token: CancellationToken::new(),
            observer: StdMutex::new(None),
        };

        // Subscribe before the first load so no write slips between the two.
        let changes = tracker.db.subscribe_changes();
        tracker.refresh_nights().await?;
        tracker.refresh_current().await?;

        let handle = tokio::spawn(observe_nights(
            tracker.db.clone(),
            tracker.formatter.clone(),
            tracker.nights.clone(),
            tracker.nights_summary.clone(),
            changes,
            tracker.cancel_token.clone(),
        ));
        *tracker
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);

        if let Some(night) = tracker.tonight() {
            log_info!("Night {} is in progress", night.night_id);
        }

        Ok(tracker)
    }

    pub async fn with_system_clock(
        db: Database,
        formatter: Arc<dyn NightFormatter>,
    ) -> Result<Self> {
        Self::new(db, Arc::new(SystemClock), formatter).await
    }

    /// Starts a new night at "now".
    ///
    /// If a night is already in progress nothing is written and that night
    /// is returned instead.
    pub async fn start_tracking(&self) -> Result<SleepNight> {
        self.guarded(async {
            let _op = self.op_lock.lock().await;

            if let Some(current) = self.load_tonight().await? {
                log_warn!(
                    "Start ignored: night {} is already in progress",
                    current.night_id
                );
                return Ok(current);
            }

            let night = SleepNight::starting_at(self.clock.now_millis());
            let inserted = self.db.insert_night(&night).await?;
            log_info!("Started night {}", inserted.night_id);

            self.load_tonight().await?;
            Ok(inserted)
        })
        .await
    }

    /// Ends the night in progress at "now" and returns it.
    ///
    /// Returns `None` without touching storage when nothing is in progress.
    pub async fn stop_tracking(&self) -> Result<Option<SleepNight>> {
        self.guarded(async {
            let _op = self.op_lock.lock().await;

            let current = self.tonight.borrow().clone();
            let Some(mut night) = current else {
                log_warn!("Stop ignored: no night in progress");
                return Ok(None);
            };

            // end == start still reads as in progress; an earlier clock is
            // left for the CHECK constraint to reject.
            let now = self.clock.now_millis();
            night.end_time_milli = if now == night.start_time_milli {
                now + 1
            } else {
                now
            };
            self.db.update_night(&night).await?;
            log_info!(
                "Stopped night {} after {} ms",
                night.night_id,
                night.duration_milli()
            );

            self.load_tonight().await?;
            Ok(Some(night))
        })
        .await
    }

    /// Deletes every night and returns how many were removed.
    pub async fn clear(&self) -> Result<usize> {
        self.guarded(async {
            let _op = self.op_lock.lock().await;

            let removed = self.db.clear_nights().await?;
            self.tonight.send_replace(None);
            log_info!("Cleared {removed} night(s)");
            Ok(removed)
        })
        .await
    }

    /// Re-derives the current night from storage.
    pub async fn refresh_current(&self) -> Result<Option<SleepNight>> {
        self.guarded(async {
            let _op = self.op_lock.lock().await;
            self.load_tonight().await
        })
        .await
    }

    /// Reloads the night list and its summary right away instead of waiting
    /// for the background observer.
    pub async fn refresh_nights(&self) -> Result<Vec<SleepNight>> {
        self.guarded(async {
            let nights = self.db.get_all_nights().await?;
            publish_nights(
                &self.nights,
                &self.nights_summary,
                self.formatter.as_ref(),
                nights.clone(),
            );
            Ok(nights)
        })
        .await
    }

    /// Records a 0..=5 rating for a night.
    pub async fn set_sleep_quality(&self, night_id: i64, quality: i32) -> Result<SleepNight> {
        self.guarded(async {
            if !is_valid_quality(quality) {
                return Err(SleepError::InvalidQuality(quality).into());
            }

            let _op = self.op_lock.lock().await;

            let mut night = self
                .db
                .get_night(night_id)
                .await?
                .ok_or(SleepError::RecordNotFound(night_id))?;
            night.sleep_quality = quality;
            self.db.update_night(&night).await?;
            log_info!("Rated night {night_id} with quality {quality}");

            self.load_tonight().await?;
            Ok(night)
        })
        .await
    }

    pub fn tonight(&self) -> Option<SleepNight> {
        self.tonight.borrow().clone()
    }

    pub fn status(&self) -> TrackerStatus {
        TrackerStatus::from_tonight(self.tonight.borrow().as_ref())
    }

    pub fn nights(&self) -> Vec<SleepNight> {
        self.nights.borrow().clone()
    }

    pub fn nights_summary(&self) -> String {
        self.nights_summary.borrow().clone()
    }

    pub fn controls(&self) -> ControlState {
        let tonight = self.tonight.borrow();
        let nights = self.nights.borrow();
        ControlState::derive(tonight.as_ref(), &nights)
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let tonight = self.tonight();
        TrackerSnapshot {
            status: TrackerStatus::from_tonight(tonight.as_ref()),
            controls: self.controls(),
            tonight,
        }
    }

    pub fn subscribe_tonight(&self) -> watch::Receiver<Option<SleepNight>> {
        self.tonight.subscribe()
    }

    pub fn subscribe_nights(&self) -> watch::Receiver<Vec<SleepNight>> {
        self.nights.subscribe()
    }

    pub fn subscribe_nights_summary(&self) -> watch::Receiver<String> {
        self.nights_summary.subscribe()
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel_token.is_cancelled()
    }

    /// Cancels pending and future operations and waits for the list observer
    /// to exit.
    pub async fn shutdown(&self) {
        self.cancel_token.cancel();

        let handle = self
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                log_error!("Night observer task failed to join: {err}");
            }
        }
    }

    async fn load_tonight(&self) -> Result<Option<SleepNight>> {
        let current = current_from_latest(self.db.get_tonight().await?);
        self.tonight.send_replace(current.clone());
        Ok(current)
    }

    async fn guarded<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if self.cancel_token.is_cancelled() {
            return Err(SleepError::Cancelled.into());
        }

        tokio::select! {
            biased;
            _ = self.cancel_token.cancelled() => Err(SleepError::Cancelled.into()),
            result = op => result,
        }
    }
}

impl Drop for SleepTracker {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

fn publish_nights(
    nights: &watch::Sender<Vec<SleepNight>>,
    summary: &watch::Sender<String>,
    formatter: &dyn NightFormatter,
    list: Vec<SleepNight>,
) {
    summary.send_replace(formatter.format_nights(&list));
    nights.send_replace(list);
}

async fn observe_nights(
    db: Database,
    formatter: Arc<dyn NightFormatter>,
    nights: Arc<watch::Sender<Vec<SleepNight>>>,
    summary: Arc<watch::Sender<String>>,
    mut changes: watch::Receiver<u64>,
    cancel_token: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                log_debug!("night observer shutting down");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                match db.get_all_nights().await {
                    Ok(list) => publish_nights(&nights, &summary, formatter.as_ref(), list),
                    Err(err) => log_error!("Failed to reload nights: {err:#}"),
                }
            }
        }
    }
}
