use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use crate::auth::identity::{self, Principal, SESSION_USER_KEY};
use crate::db::{NewUser, User};

use super::validation::{validate_email, validate_password, validate_username};
use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Resolves the request's credentials to a [`Principal`] and stores it in the
/// request extensions. Runs on every /api route; handlers decide whether
/// anonymous is acceptable.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = identity::resolve(state.store(), request.headers(), &session)
        .await
        .map_err(ApiError::from)?;

    if let Some(user) = principal.user() {
        tracing::Span::current().record("user_id", user.id);
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}

/// Get the authenticated user or reject with 401.
pub fn require_user(principal: &Principal) -> Result<&User, ApiError> {
    principal.user().ok_or_else(ApiError::unauthorized)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
/// Create a local account and log it in.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserDto>>), ApiError> {
    let username = validate_username(&payload.username)?.to_string();
    let email = validate_email(&payload.email)?.to_string();
    let password = validate_password(&payload.password)?.to_string();

    if state
        .store()
        .username_exists(&username)
        .await
        .map_err(ApiError::from)?
    {
        return Err(ApiError::validation("Username is already taken"));
    }

    if state
        .store()
        .email_exists(&email)
        .await
        .map_err(ApiError::from)?
    {
        return Err(ApiError::validation("Email is already registered"));
    }

    let security = state.config().await.security;
    let user = state
        .store()
        .create_user(
            NewUser {
                username,
                email,
                password,
            },
            &security,
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create user: {e}")))?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    tracing::info!("New user registered: {}", user.username);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(user.into()))))
}

/// POST /api/login
/// Authenticate with username and password; establishes a session.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    // The failure message never distinguishes an unknown user from a wrong
    // password.
    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    session
        .insert(SESSION_USER_KEY, user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    Ok(Json(ApiResponse::success(user.into())))
}

/// GET /api/auth/me
/// Current user, or null when anonymous.
pub async fn get_current_user(
    Extension(principal): Extension<Principal>,
) -> Json<ApiResponse<Option<UserDto>>> {
    Json(ApiResponse::success(
        principal.user().cloned().map(UserDto::from),
    ))
}

/// POST /api/auth/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    session
        .flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to clear session: {e}")))?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Logged out".to_string(),
    })))
}
