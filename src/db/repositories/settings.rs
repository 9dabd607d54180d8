use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::{prelude::*, system_settings};

/// Settings key holding the hashed admin master password.
pub const ADMIN_PASSWORD_KEY: &str = "admin_password_hash";

pub struct SettingsRepository {
    conn: DatabaseConnection,
}

impl SettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>> {
        let setting = SystemSettings::find()
            .filter(system_settings::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query system setting")?;

        Ok(setting.map(|s| s.value))
    }

    /// Insert or replace a setting value.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let existing = SystemSettings::find()
            .filter(system_settings::Column::Key.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query system setting for upsert")?;

        if let Some(model) = existing {
            let mut active: system_settings::ActiveModel = model.into();
            active.value = Set(value.to_string());
            active
                .update(&self.conn)
                .await
                .context("Failed to update system setting")?;
        } else {
            let active = system_settings::ActiveModel {
                key: Set(key.to_string()),
                value: Set(value.to_string()),
                ..Default::default()
            };
            active
                .insert(&self.conn)
                .await
                .context("Failed to insert system setting")?;
        }

        Ok(())
    }

    /// Seed the admin master password hash on first startup. Idempotent:
    /// existing values are never overwritten.
    pub async fn seed_admin_password(&self) -> Result<()> {
        if self.get(ADMIN_PASSWORD_KEY).await?.is_some() {
            return Ok(());
        }

        let hash = super::user::hash_password("admin", None)?;
        self.set(ADMIN_PASSWORD_KEY, &hash).await?;
        tracing::info!("Admin master password seeded to default; change it via the admin panel");

        Ok(())
    }
}
