//! Shared helpers for API integration tests.

// Not every test binary uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use medtrack_api::auth::jwt::JwtConfig;
use medtrack_api::background::scheduler::ReminderScheduler;
use medtrack_api::config::ServerConfig;
use medtrack_api::routes;
use medtrack_api::state::AppState;
use sqlx::PgPool;
use tower::ServiceExt;

/// Build an [`AppState`] with a fixed test configuration.
pub fn test_state(pool: PgPool) -> AppState {
    AppState {
        pool: pool.clone(),
        config: Arc::new(ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origins: vec![],
            request_timeout_secs: 30,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                access_token_expiry_hours: 1,
            },
        }),
        scheduler: Arc::new(ReminderScheduler::new(pool)),
    }
}

/// Build the full application router (health + /api/v1) over a test state.
pub fn test_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
}

/// Fire one request and decode the JSON response body.
pub async fn request_json(
    app: &Router,
    request: Request<Body>,
) -> (axum::http::StatusCode, serde_json::Value) {
    let response: Response<_> = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

/// Build a JSON request with an optional Bearer token.
pub fn json_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(value) => Body::from(value.to_string()),
        None => Body::empty(),
    };
    builder.body(body).unwrap()
}

/// Register a user through the API and return their access token.
pub async fn register_user(app: &Router, email: &str) -> String {
    let (status, json) = request_json(
        app,
        json_request(
            "POST",
            "/api/v1/auth/register",
            None,
            Some(serde_json::json!({
                "name": "Ana",
                "email": email,
                "password": "correct-horse-battery",
            })),
        ),
    )
    .await;
    assert_eq!(status, axum::http::StatusCode::CREATED, "register: {json}");
    json["data"]["token"].as_str().unwrap().to_string()
}
