use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::entities::{api_tokens, bookmarks};

pub mod migrator;
pub mod repositories;

pub use repositories::bookmark::{
    BookmarkPage, BookmarkQuery, BookmarkUpdate, BookmarkWithOwner, NewBookmark,
};
pub use repositories::settings::ADMIN_PASSWORD_KEY;
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn bookmark_repo(&self) -> repositories::bookmark::BookmarkRepository {
        repositories::bookmark::BookmarkRepository::new(self.conn.clone())
    }

    fn token_repo(&self) -> repositories::token::TokenRepository {
        repositories::token::TokenRepository::new(self.conn.clone())
    }

    fn settings_repo(&self) -> repositories::settings::SettingsRepository {
        repositories::settings::SettingsRepository::new(self.conn.clone())
    }

    // ========== Users ==========

    pub async fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn create_user(&self, input: NewUser, security: &SecurityConfig) -> Result<User> {
        self.user_repo().create(input, security).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    // ========== Bookmarks ==========

    pub async fn list_bookmarks(&self, query: &BookmarkQuery) -> Result<BookmarkPage> {
        self.bookmark_repo().list(query).await
    }

    pub async fn get_bookmark(&self, id: i32) -> Result<Option<bookmarks::Model>> {
        self.bookmark_repo().get(id).await
    }

    pub async fn create_bookmark(
        &self,
        user_id: i32,
        input: NewBookmark,
    ) -> Result<bookmarks::Model> {
        self.bookmark_repo().create(user_id, input).await
    }

    pub async fn update_bookmark(
        &self,
        id: i32,
        updates: BookmarkUpdate,
    ) -> Result<bookmarks::Model> {
        self.bookmark_repo().update(id, updates).await
    }

    pub async fn delete_bookmark(&self, id: i32) -> Result<bool> {
        self.bookmark_repo().delete(id).await
    }

    // ========== API tokens ==========

    pub async fn issue_token(
        &self,
        user_id: i32,
        label: Option<String>,
    ) -> Result<api_tokens::Model> {
        self.token_repo().issue(user_id, label).await
    }

    pub async fn revoke_token(&self, token_id: i32, caller: &User) -> Result<()> {
        self.token_repo().revoke(token_id, caller).await
    }

    pub async fn resolve_token(&self, token: &str) -> Result<Option<User>> {
        self.token_repo().resolve(token).await
    }

    pub async fn list_tokens(&self, user_id: i32) -> Result<Vec<api_tokens::Model>> {
        self.token_repo().list(user_id).await
    }

    // ========== System settings ==========

    pub async fn get_system_setting(&self, key: &str) -> Result<Option<String>> {
        self.settings_repo().get(key).await
    }

    pub async fn set_system_setting(&self, key: &str, value: &str) -> Result<()> {
        self.settings_repo().set(key, value).await
    }

    pub async fn seed_admin_password(&self) -> Result<()> {
        self.settings_repo().seed_admin_password().await
    }
}
