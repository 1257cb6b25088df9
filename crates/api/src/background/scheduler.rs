//! Lifecycle owner for the three periodic reminder tasks.
//!
//! [`ReminderScheduler`] is an explicit service object: the process entry
//! point constructs it, starts it once the database is ready, and stops it
//! from the graceful-shutdown path. There is no process-global state and no
//! signal handling here; the hosting process decides when to stop.

use std::sync::Mutex;
use std::time::Duration;

use medtrack_db::DbPool;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{due_sweep, replenish, retention};

/// How long `stop` waits for each task to wind down.
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

struct RunningTasks {
    cancel: CancellationToken,
    handles: Vec<(&'static str, JoinHandle<()>)>,
}

/// Drives the three periodic triggers: due-notification sweep, schedule
/// replenishment, and retention cleanup.
///
/// `start` and `stop` are both idempotent; calling either in the wrong state
/// logs a warning and does nothing.
pub struct ReminderScheduler {
    pool: DbPool,
    running: Mutex<Option<RunningTasks>>,
}

impl ReminderScheduler {
    /// Create a scheduler; no tasks run until [`Self::start`] is called.
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            running: Mutex::new(None),
        }
    }

    /// Spawn the three periodic tasks. No-op with a warning if already
    /// running.
    pub fn start(&self) {
        let mut running = self.running.lock().expect("scheduler lock poisoned");
        if running.is_some() {
            tracing::warn!("Reminder scheduler already running, ignoring start");
            return;
        }

        let cancel = CancellationToken::new();
        let handles = vec![
            (
                "due_sweep",
                tokio::spawn(due_sweep::run(self.pool.clone(), cancel.clone())),
            ),
            (
                "replenish",
                tokio::spawn(replenish::run(self.pool.clone(), cancel.clone())),
            ),
            (
                "retention",
                tokio::spawn(retention::run(self.pool.clone(), cancel.clone())),
            ),
        ];

        *running = Some(RunningTasks { cancel, handles });
        tracing::info!("Reminder scheduler started (sweep, replenishment, retention)");
    }

    /// Cancel all tasks and wait briefly for each to finish. No-op with a
    /// warning if not running. In-flight dispatches are not guaranteed to
    /// complete.
    pub async fn stop(&self) {
        let running = self
            .running
            .lock()
            .expect("scheduler lock poisoned")
            .take();
        let Some(running) = running else {
            tracing::warn!("Reminder scheduler not running, ignoring stop");
            return;
        };

        running.cancel.cancel();
        for (name, handle) in running.handles {
            if tokio::time::timeout(STOP_TIMEOUT, handle).await.is_err() {
                tracing::warn!(task = name, "Background task did not stop in time");
            }
        }
        tracing::info!("Reminder scheduler stopped");
    }

    /// Whether the periodic tasks are currently running.
    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .expect("scheduler lock poisoned")
            .is_some()
    }
}
