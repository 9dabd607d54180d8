use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{Principal, policy};
use crate::db::{BookmarkQuery, BookmarkUpdate, NewBookmark};

use super::auth::require_user;
use super::validation::{validate_limit, validate_page, validate_title, validate_url};
use super::{ApiError, ApiResponse, AppState, BookmarkDto, PaginatedBookmarks};

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    10
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookmarksQuery {
    #[serde(default = "default_page")]
    pub page: u64,

    #[serde(default = "default_limit")]
    pub limit: u64,

    pub search: Option<String>,

    pub is_public: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmarkRequest {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

/// 401 for anonymous callers, 403 for authenticated ones.
fn deny(principal: &Principal) -> ApiError {
    if principal.is_anonymous() {
        ApiError::unauthorized()
    } else {
        ApiError::forbidden()
    }
}

/// GET /api/bookmarks
///
/// `isPublic=true` is the global feed and is open to everyone; any other
/// scope lists the caller's own bookmarks and requires authentication.
pub async fn list_bookmarks(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<ListBookmarksQuery>,
) -> Result<Json<ApiResponse<PaginatedBookmarks>>, ApiError> {
    let page = validate_page(params.page)?;
    let limit = validate_limit(params.limit)?;

    let mut query = BookmarkQuery {
        owner_id: None,
        is_public: params.is_public,
        search: params.search,
        page,
        limit,
    };

    if params.is_public != Some(true) {
        if !policy::can_list_private(&principal) {
            return Err(ApiError::unauthorized());
        }
        let user = require_user(&principal)?;
        query.owner_id = Some(user.id);
    }

    let result = state
        .store()
        .list_bookmarks(&query)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to list bookmarks: {e}")))?;

    Ok(Json(ApiResponse::success(PaginatedBookmarks {
        items: result.items.into_iter().map(BookmarkDto::from).collect(),
        total: result.total,
        page,
        limit,
        total_pages: result.total_pages,
    })))
}

/// GET /api/bookmarks/{id}
pub async fn get_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<BookmarkDto>>, ApiError> {
    let bookmark = state
        .store()
        .get_bookmark(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get bookmark: {e}")))?
        .ok_or_else(|| ApiError::bookmark_not_found(id))?;

    if !policy::can_read_bookmark(&principal, &bookmark) {
        return Err(deny(&principal));
    }

    Ok(Json(ApiResponse::success(bookmark.into())))
}

/// POST /api/bookmarks
pub async fn create_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(payload): Json<CreateBookmarkRequest>,
) -> Result<(StatusCode, Json<ApiResponse<BookmarkDto>>), ApiError> {
    let user = require_user(&principal)?;

    let title = validate_title(&payload.title)?.to_string();
    let url = validate_url(&payload.url)?.to_string();

    let bookmark = state
        .store()
        .create_bookmark(
            user.id,
            NewBookmark {
                title,
                url,
                description: payload.description,
                is_public: payload.is_public,
            },
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create bookmark: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(bookmark.into())),
    ))
}

/// PATCH /api/bookmarks/{id}
///
/// Existence is checked before permission, so a missing bookmark is always
/// 404 and never leaks a 403.
pub async fn update_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateBookmarkRequest>,
) -> Result<Json<ApiResponse<BookmarkDto>>, ApiError> {
    let bookmark = state
        .store()
        .get_bookmark(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get bookmark: {e}")))?
        .ok_or_else(|| ApiError::bookmark_not_found(id))?;

    if !policy::can_write_bookmark(&principal, &bookmark) {
        return Err(deny(&principal));
    }

    let title = payload
        .title
        .as_deref()
        .map(validate_title)
        .transpose()?
        .map(ToString::to_string);
    let url = payload
        .url
        .as_deref()
        .map(validate_url)
        .transpose()?
        .map(ToString::to_string);

    let updated = state
        .store()
        .update_bookmark(
            id,
            BookmarkUpdate {
                title,
                url,
                description: payload.description,
                is_public: payload.is_public,
            },
        )
        .await
        .map_err(|e| ApiError::internal(format!("Failed to update bookmark: {e}")))?;

    Ok(Json(ApiResponse::success(updated.into())))
}

/// DELETE /api/bookmarks/{id}
pub async fn delete_bookmark(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let bookmark = state
        .store()
        .get_bookmark(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get bookmark: {e}")))?
        .ok_or_else(|| ApiError::bookmark_not_found(id))?;

    if !policy::can_write_bookmark(&principal, &bookmark) {
        return Err(deny(&principal));
    }

    state
        .store()
        .delete_bookmark(id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to delete bookmark: {e}")))?;

    Ok(StatusCode::NO_CONTENT)
}
