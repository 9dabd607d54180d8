use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::Principal;

use super::auth::require_user;
use super::{ApiError, ApiResponse, AppState, TokenDto};

#[derive(Deserialize)]
pub struct CreateTokenRequest {
    pub label: Option<String>,
}

/// GET /api/tokens
/// All tokens owned by the caller.
pub async fn list_tokens(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<Vec<TokenDto>>>, ApiError> {
    let user = require_user(&principal)?;

    let tokens = state
        .store()
        .list_tokens(user.id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list tokens: {e}")))?;

    Ok(Json(ApiResponse::success(
        tokens.into_iter().map(TokenDto::from).collect(),
    )))
}

/// POST /api/tokens
/// Issue a new bearer token; the response carries the raw value.
pub async fn create_token(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateTokenRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TokenDto>>), ApiError> {
    let user = require_user(&principal)?;

    let label = payload
        .label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());

    let token = state
        .store()
        .issue_token(user.id, label)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create token: {e}")))?;

    tracing::info!("API token issued for user: {}", user.username);

    Ok((StatusCode::CREATED, Json(ApiResponse::success(token.into()))))
}

/// DELETE /api/tokens/{id}
/// Revocation is deletion and is idempotent.
pub async fn revoke_token(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let user = require_user(&principal)?;

    state
        .store()
        .revoke_token(id, user)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to revoke token: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}
