use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use crate::auth::Principal;

use super::auth::require_user;
use super::{ApiError, ApiResponse, AppState, SystemStatus};

/// GET /api/system/status
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ApiResponse<SystemStatus>>, ApiError> {
    require_user(&principal)?;

    let database_ok = state.store().ping().await.is_ok();

    Ok(Json(ApiResponse::success(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: state.start_time.elapsed().as_secs(),
        database_ok,
    })))
}
