pub mod auth;
pub mod health;
pub mod medication;
pub mod schedule;
pub mod settings;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                 register (public)
/// /auth/login                    login (public)
/// /auth/me                       current user
///
/// /medications                   list, create
/// /medications/stats             aggregate dose stats + adherence
/// /medications/{id}              get, update, delete
/// /medications/{id}/toggle       pause / resume (POST)
/// /medications/{id}/schedules    recent schedule entries
///
/// /schedules                     list across medications
/// /schedules/{id}/taken          mark dose taken (POST)
/// /schedules/{id}/missed         mark dose missed (POST)
///
/// /settings                      get, update
/// /settings/test                 SMTP verify + test email (POST)
/// /settings/status               configuration completeness
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/medications", medication::router())
        .nest("/schedules", schedule::router())
        .nest("/settings", settings::router())
}
