use serde::Serialize;

use crate::db::{BookmarkWithOwner, User};
use crate::entities::{api_tokens, bookmarks};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkDto {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: String,
    /// Owner display name, present on feed listings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl From<bookmarks::Model> for BookmarkDto {
    fn from(model: bookmarks::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            url: model.url,
            description: model.description,
            is_public: model.is_public,
            created_at: model.created_at,
            username: None,
        }
    }
}

impl From<BookmarkWithOwner> for BookmarkDto {
    fn from(item: BookmarkWithOwner) -> Self {
        let mut dto = Self::from(item.bookmark);
        dto.username = item.username;
        dto
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedBookmarks {
    pub items: Vec<BookmarkDto>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

/// Full token record including the raw value, so listings can show it again.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDto {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub label: Option<String>,
    pub created_at: String,
}

impl From<api_tokens::Model> for TokenDto {
    fn from(model: api_tokens::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            token: model.token,
            label: model.label,
            created_at: model.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemStatus {
    pub version: String,
    pub uptime: u64,
    pub database_ok: bool,
}
