use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex, OnceLock, PoisonError},
    thread::{self, JoinHandle},
};

use anyhow::{Context, Result};
use log::{error, info};
use rusqlite::Connection;
use tokio::sync::{oneshot, watch};

use crate::error::SleepError;

use super::migrations::run_migrations;

/// File name of the database inside the data directory.
pub const DATABASE_FILE_NAME: &str = "sleep_history.sqlite3";

static INSTANCE: OnceLock<Database> = OnceLock::new();
static INSTANCE_INIT: Mutex<()> = Mutex::new(());

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
    changes: watch::Sender<u64>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("Failed to send shutdown to DB thread: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("Failed to join DB thread: {join_err:?}");
            }
        }
    }
}

/// Handle to the sleep database.
///
/// The SQLite connection lives on a dedicated worker thread; every query is
/// shipped there through [`Database::execute`] and awaited by the caller.
/// Clones share the same worker.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    /// Process-wide handle, opened under `data_dir` on the first call.
    ///
    /// Later calls return the same handle and ignore `data_dir`. A failed
    /// open is not remembered, so the next call tries again.
    pub fn get_instance(data_dir: &Path) -> Result<&'static Database> {
        if let Some(db) = INSTANCE.get() {
            return Ok(db);
        }

        let _guard = INSTANCE_INIT
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(db) = INSTANCE.get() {
            return Ok(db);
        }

        let db = Database::new(data_dir.join(DATABASE_FILE_NAME))?;
        Ok(INSTANCE.get_or_init(|| db))
    }

    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel::<Result<()>>();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("sleeptracker-db".into())
            .spawn(move || {
                let mut conn = match Connection::open(&path_for_thread) {
                    Ok(connection) => connection,
                    Err(err) => {
                        let _ = ready_tx.send(Err(SleepError::StorageUnavailable(format!(
                            "failed to open {}: {err}",
                            path_for_thread.display()
                        ))
                        .into()));
                        return;
                    }
                };

                if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
                    error!("Failed to enable WAL mode: {err}");
                }

                let init_result =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(init_result).is_err() {
                    error!("DB initialization receiver dropped before ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .context("failed to spawn database worker thread")?;

        let ready = ready_rx
            .recv()
            .context("database worker exited before signaling readiness")
            .and_then(|result| result);
        if let Err(err) = ready {
            let _ = worker.join();
            return Err(err);
        }

        info!("Database initialized at {}", db_path.display());

        let (changes, _) = watch::channel(0u64);

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
                changes,
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    /// Runs `task` against the connection on the worker thread.
    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();

        let command = DbCommand::Execute(Box::new(move |conn| {
            let result = task(conn);
            if reply_tx.send(result).is_err() {
                error!("DB caller dropped before receiving result");
            }
        }));

        self.inner.sender.send(command).map_err(|err| {
            SleepError::StorageUnavailable(format!("failed to send command to DB thread: {err}"))
        })?;

        reply_rx.await.map_err(|_| {
            SleepError::StorageUnavailable("database thread terminated unexpectedly".into())
        })?
    }

    /// Receiver whose value moves every time the stored nights change.
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    pub(crate) fn notify_changed(&self) {
        self.inner
            .changes
            .send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}
