use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;
use tokio::task;

use crate::auth::{Principal, policy};
use crate::db::ADMIN_PASSWORD_KEY;
use crate::db::repositories::user::{hash_password, verify_password};

use super::validation::validate_password;
use super::{ApiError, ApiResponse, AppState, MessageResponse};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// POST /api/admin/password
/// Rotate the admin master password held in system settings. Requires the
/// admin flag and the current master password.
pub async fn change_admin_password(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    if principal.is_anonymous() {
        return Err(ApiError::unauthorized());
    }
    if !policy::can_administer(&principal) {
        return Err(ApiError::forbidden());
    }

    let new_password = validate_password(&payload.new_password)?.to_string();

    let stored = state
        .store()
        .get_system_setting(ADMIN_PASSWORD_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to read admin password: {e}")))?;

    if let Some(stored_hash) = stored {
        let current = payload.current_password;
        let is_valid = task::spawn_blocking(move || verify_password(&stored_hash, &current))
            .await
            .map_err(|e| ApiError::internal(format!("Password verification failed: {e}")))?;

        if !is_valid {
            return Err(ApiError::Unauthorized(
                "Invalid current password".to_string(),
            ));
        }
    }

    let security = state.config().await.security;
    let new_hash = task::spawn_blocking(move || hash_password(&new_password, Some(&security)))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {e}")))?
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {e}")))?;

    state
        .store()
        .set_system_setting(ADMIN_PASSWORD_KEY, &new_hash)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store admin password: {e}")))?;

    tracing::info!("Admin master password changed");

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Password updated".to_string(),
    })))
}
