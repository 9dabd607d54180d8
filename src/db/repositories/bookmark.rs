use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use crate::entities::{bookmarks, prelude::*, users};

/// Filter for the bookmark listing.
///
/// When `is_public` is not explicitly true the caller must set `owner_id`;
/// the API layer enforces that only the authenticated user's own id is ever
/// supplied there.
#[derive(Debug, Clone, Default)]
pub struct BookmarkQuery {
    pub owner_id: Option<i32>,
    pub is_public: Option<bool>,
    pub search: Option<String>,
    pub page: u64,
    pub limit: u64,
}

/// One page of results plus pre-pagination totals.
#[derive(Debug)]
pub struct BookmarkPage {
    pub items: Vec<BookmarkWithOwner>,
    pub total: u64,
    pub total_pages: u64,
}

/// A bookmark enriched with its owner's username (read-only join, for feeds).
#[derive(Debug, Clone)]
pub struct BookmarkWithOwner {
    pub bookmark: bookmarks::Model,
    pub username: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub is_public: bool,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct BookmarkUpdate {
    pub title: Option<String>,
    pub url: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

pub struct BookmarkRepository {
    conn: DatabaseConnection,
}

impl BookmarkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Paginated, filtered, searched listing.
    ///
    /// Ordering is creation time descending with id descending as tiebreak,
    /// so repeated fetches of the same filter paginate without duplicating
    /// or skipping rows (absent concurrent writes).
    pub async fn list(&self, query: &BookmarkQuery) -> Result<BookmarkPage> {
        let mut select = Bookmarks::find()
            .find_also_related(Users)
            .order_by_desc(bookmarks::Column::CreatedAt)
            .order_by_desc(bookmarks::Column::Id);

        if let Some(owner_id) = query.owner_id {
            select = select.filter(bookmarks::Column::UserId.eq(owner_id));
        }

        if let Some(is_public) = query.is_public {
            select = select.filter(bookmarks::Column::IsPublic.eq(is_public));
        }

        if let Some(term) = query.search.as_deref() {
            let term = term.trim();
            if !term.is_empty() {
                // Substring match against title, url OR description.
                // SQLite LIKE is case-insensitive for ASCII.
                select = select.filter(
                    Condition::any()
                        .add(bookmarks::Column::Title.contains(term))
                        .add(bookmarks::Column::Url.contains(term))
                        .add(bookmarks::Column::Description.contains(term)),
                );
            }
        }

        let paginator = select.paginate(&self.conn, query.limit);
        let totals = paginator
            .num_items_and_pages()
            .await
            .context("Failed to count bookmarks")?;
        let rows = paginator
            .fetch_page(query.page - 1)
            .await
            .context("Failed to fetch bookmark page")?;

        let items = rows
            .into_iter()
            .map(|(bookmark, owner)| BookmarkWithOwner {
                bookmark,
                username: owner.map(|u| u.username),
            })
            .collect();

        Ok(BookmarkPage {
            items,
            total: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    pub async fn get(&self, id: i32) -> Result<Option<bookmarks::Model>> {
        let bookmark = Bookmarks::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query bookmark by ID")?;

        Ok(bookmark)
    }

    pub async fn create(&self, user_id: i32, input: NewBookmark) -> Result<bookmarks::Model> {
        let active = bookmarks::ActiveModel {
            user_id: Set(user_id),
            title: Set(input.title),
            url: Set(input.url),
            description: Set(input.description),
            is_public: Set(input.is_public),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert bookmark")?;

        Ok(model)
    }

    pub async fn update(&self, id: i32, updates: BookmarkUpdate) -> Result<bookmarks::Model> {
        let bookmark = Bookmarks::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query bookmark for update")?
            .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {id}"))?;

        let mut active: bookmarks::ActiveModel = bookmark.into();

        if let Some(title) = updates.title {
            active.title = Set(title);
        }
        if let Some(url) = updates.url {
            active.url = Set(url);
        }
        if let Some(description) = updates.description {
            active.description = Set(Some(description));
        }
        if let Some(is_public) = updates.is_public {
            active.is_public = Set(is_public);
        }

        let model = active
            .update(&self.conn)
            .await
            .context("Failed to update bookmark")?;

        Ok(model)
    }

    pub async fn delete(&self, id: i32) -> Result<bool> {
        let result = Bookmarks::delete_by_id(id)
            .exec(&self.conn)
            .await
            .context("Failed to delete bookmark")?;

        Ok(result.rows_affected > 0)
    }
}
