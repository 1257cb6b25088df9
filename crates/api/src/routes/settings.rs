//! Route definitions for the `/settings` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::settings;
use crate::state::AppState;

/// Routes mounted at `/settings`.
///
/// ```text
/// GET  /        -> get
/// PUT  /        -> update
/// POST /test    -> test (SMTP verify + test email)
/// GET  /status  -> status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(settings::get).put(settings::update))
        .route("/test", post(settings::test))
        .route("/status", get(settings::status))
}
