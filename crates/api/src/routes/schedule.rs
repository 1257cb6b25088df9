//! Route definitions for the `/schedules` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::schedule;
use crate::state::AppState;

/// Routes mounted at `/schedules`.
///
/// ```text
/// GET  /             -> list
/// POST /{id}/taken   -> mark_taken
/// POST /{id}/missed  -> mark_missed
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(schedule::list))
        .route("/{id}/taken", post(schedule::mark_taken))
        .route("/{id}/missed", post(schedule::mark_missed))
}
