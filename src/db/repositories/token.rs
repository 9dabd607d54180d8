use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};

use crate::entities::{api_tokens, prelude::*, users};

use super::user::User;

pub struct TokenRepository {
    conn: DatabaseConnection,
}

impl TokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a new token for a user. The returned record carries the raw
    /// token value; this is the only time callers should surface it.
    pub async fn issue(&self, user_id: i32, label: Option<String>) -> Result<api_tokens::Model> {
        let active = api_tokens::ActiveModel {
            user_id: Set(user_id),
            token: Set(generate_token()),
            label: Set(label),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        let model = active
            .insert(&self.conn)
            .await
            .context("Failed to insert API token")?;

        Ok(model)
    }

    /// Revoke a token by id, scoped to its owner. Admins may revoke any
    /// token. Idempotent: revoking a missing id is not an error.
    pub async fn revoke(&self, token_id: i32, caller: &User) -> Result<()> {
        let mut delete = ApiTokens::delete_many().filter(api_tokens::Column::Id.eq(token_id));

        if !caller.is_admin {
            delete = delete.filter(api_tokens::Column::UserId.eq(caller.id));
        }

        delete
            .exec(&self.conn)
            .await
            .context("Failed to delete API token")?;

        Ok(())
    }

    /// Resolve a presented token value to its owning user. A single exact
    /// lookup: a value differing by one character never resolves.
    pub async fn resolve(&self, token: &str) -> Result<Option<User>> {
        let row = ApiTokens::find()
            .filter(api_tokens::Column::Token.eq(token))
            .find_also_related(Users)
            .limit(1)
            .one(&self.conn)
            .await
            .context("Failed to resolve API token")?;

        Ok(row.and_then(|(_, user)| user.map(User::from)))
    }

    /// All tokens owned by a user. Ordering is unspecified.
    pub async fn list(&self, user_id: i32) -> Result<Vec<api_tokens::Model>> {
        let tokens = ApiTokens::find()
            .filter(api_tokens::Column::UserId.eq(user_id))
            .all(&self.conn)
            .await
            .context("Failed to list API tokens")?;

        Ok(tokens)
    }
}

/// Generate a random API token (64 character hex string, 256 bits of entropy)
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
