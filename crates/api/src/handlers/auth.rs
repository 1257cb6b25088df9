//! Handlers for the `/auth` resource: registration, login, current user.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use medtrack_core::error::CoreError;
use medtrack_db::models::user::{CreateUser, UserResponse};
use medtrack_db::repositories::UserRepo;
use serde::Deserialize;

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Request body for `POST /auth/register`.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Reject anything that does not parse as an RFC 5321 address.
fn validate_email(email: &str) -> Result<(), AppError> {
    email
        .parse::<lettre::Address>()
        .map(|_| ())
        .map_err(|_| AppError::Core(CoreError::Validation(format!("Invalid email: {email}"))))
}

/// POST /api/v1/auth/register
///
/// Create an account and return an access token.
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    let name = body.name.trim();
    if name.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Name must not be empty".into(),
        )));
    }
    let email = body.email.trim().to_lowercase();
    validate_email(&email)?;
    validate_password_strength(&body.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let password_hash = hash_password(&body.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            name: name.to_string(),
            email,
            password_hash,
        },
    )
    .await?;

    let token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "data": {
                "user": UserResponse::from(user),
                "token": token,
            }
        })),
    ))
}

/// POST /api/v1/auth/login
///
/// Verify credentials and return an access token. Unknown email and wrong
/// password produce the same response so accounts cannot be enumerated.
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let email = body.email.trim().to_lowercase();

    let invalid =
        || AppError::Core(CoreError::Unauthorized("Invalid email or password".into()));

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(invalid)?;

    let matches = verify_password(&body.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {e}")))?;
    if !matches {
        return Err(invalid());
    }

    let token = generate_access_token(user.id, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation failed: {e}")))?;

    Ok(Json(serde_json::json!({
        "data": {
            "user": UserResponse::from(user),
            "token": token,
        }
    })))
}

/// GET /api/v1/auth/me
///
/// Return the authenticated user's profile.
pub async fn me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let user = UserRepo::find_by_id(&state.pool, auth.user_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "User",
            id: auth.user_id,
        }))?;

    Ok(Json(serde_json::json!({ "data": UserResponse::from(user) })))
}
