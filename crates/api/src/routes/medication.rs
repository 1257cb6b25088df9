//! Route definitions for the `/medications` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::medication;
use crate::state::AppState;

/// Routes mounted at `/medications`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// GET    /stats           -> stats
/// GET    /{id}            -> get
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// POST   /{id}/toggle     -> toggle
/// GET    /{id}/schedules  -> schedules
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(medication::list).post(medication::create))
        .route("/stats", get(medication::stats))
        .route(
            "/{id}",
            get(medication::get)
                .put(medication::update)
                .delete(medication::delete),
        )
        .route("/{id}/toggle", post(medication::toggle))
        .route("/{id}/schedules", get(medication::schedules))
}
