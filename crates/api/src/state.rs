use std::sync::Arc;

use crate::background::scheduler::ReminderScheduler;
use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: medtrack_db::DbPool,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Background reminder scheduler (exposed for status reporting).
    pub scheduler: Arc<ReminderScheduler>,
}
