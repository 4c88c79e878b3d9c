//! # Configuration Repository
//!
//! Key-value system settings (company name, theme, notification flags).
//! Values are opaque text; nothing in the stock or sale paths reads them.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use almacen_core::{ConfigEntry, DEFAULT_SETTINGS};

const CONFIG_COLUMNS: &str = "key, value, description, updated_at";

/// Repository for the system configuration table.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: SqlitePool,
}

impl ConfigRepository {
    /// Creates a new ConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ConfigRepository { pool }
    }

    /// Lists every setting ordered by key.
    pub async fn list(&self) -> DbResult<Vec<ConfigEntry>> {
        let entries = sqlx::query_as::<_, ConfigEntry>(&format!(
            "SELECT {CONFIG_COLUMNS} FROM system_config ORDER BY key"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Gets one setting.
    ///
    /// ## Returns
    /// * `Ok(Some(entry))` - Key exists
    /// * `Ok(None)` - Key not found
    pub async fn get(&self, key: &str) -> DbResult<Option<ConfigEntry>> {
        let entry = sqlx::query_as::<_, ConfigEntry>(&format!(
            "SELECT {CONFIG_COLUMNS} FROM system_config WHERE key = ?1"
        ))
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Gets one setting, failing with `NotFound` when absent.
    pub async fn get_required(&self, key: &str) -> DbResult<ConfigEntry> {
        self.get(key)
            .await?
            .ok_or_else(|| DbError::not_found("Setting", key))
    }

    /// Updates the value of every listed key that already exists.
    ///
    /// Unknown keys are skipped, not created. All updates share one
    /// transaction. Returns the keys that were updated, in input order.
    pub async fn update_many(&self, values: &[(String, String)]) -> DbResult<Vec<String>> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut updated = Vec::with_capacity(values.len());
        for (key, value) in values {
            let result =
                sqlx::query("UPDATE system_config SET value = ?1, updated_at = ?2 WHERE key = ?3")
                    .bind(value)
                    .bind(now)
                    .bind(key)
                    .execute(&mut *tx)
                    .await?;

            if result.rows_affected() > 0 {
                updated.push(key.clone());
            } else {
                debug!(key = %key, "Skipping unknown setting");
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = updated.len(), "Settings updated");
        Ok(updated)
    }

    /// Creates or replaces one setting.
    ///
    /// `description` of `None` keeps the stored description (empty for a
    /// new key).
    pub async fn upsert(
        &self,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> DbResult<ConfigEntry> {
        debug!(key = %key, "Upserting setting");

        let entry = sqlx::query_as::<_, ConfigEntry>(&format!(
            r#"
            INSERT INTO system_config (key, value, description, updated_at)
            VALUES (?1, ?2, COALESCE(?3, ''), ?4)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                description = COALESCE(?3, system_config.description),
                updated_at = excluded.updated_at
            RETURNING {CONFIG_COLUMNS}
            "#
        ))
        .bind(key)
        .bind(value)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(entry)
    }

    /// Restores every default setting, recreating any that were removed.
    ///
    /// Keys outside the defaults are left alone. Returns the restored keys.
    pub async fn reset_defaults(&self) -> DbResult<Vec<String>> {
        let now = Utc::now();
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        for &(key, value) in DEFAULT_SETTINGS {
            sqlx::query(
                r#"
                INSERT INTO system_config (key, value, description, updated_at)
                VALUES (?1, ?2, '', ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(count = DEFAULT_SETTINGS.len(), "Settings reset to defaults");
        Ok(DEFAULT_SETTINGS
            .iter()
            .map(|(key, _)| key.to_string())
            .collect())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::{Database, DbConfig};

    use super::*;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_migration_seeds_defaults() {
        let db = setup().await;
        let entries = db.config().list().await.unwrap();

        assert_eq!(entries.len(), DEFAULT_SETTINGS.len());
        let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        assert_eq!(keys, sorted);

        let tema = db.config().get("tema").await.unwrap().unwrap();
        assert_eq!(tema.value, "light");
        assert_eq!(tema.description, "Tema de la interfaz");
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let db = setup().await;
        assert!(db.config().get("no_existe").await.unwrap().is_none());
        assert!(matches!(
            db.config().get_required("no_existe").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_update_many_skips_unknown_keys() {
        let db = setup().await;
        let repo = db.config();

        let updated = repo
            .update_many(&[
                ("tema".to_string(), "dark".to_string()),
                ("no_existe".to_string(), "x".to_string()),
                ("idioma".to_string(), "en".to_string()),
            ])
            .await
            .unwrap();

        assert_eq!(updated, vec!["tema".to_string(), "idioma".to_string()]);
        assert_eq!(repo.get("tema").await.unwrap().unwrap().value, "dark");
        assert_eq!(repo.get("idioma").await.unwrap().unwrap().value, "en");
        assert!(repo.get("no_existe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_creates_then_keeps_description() {
        let db = setup().await;
        let repo = db.config();

        let created = repo
            .upsert("smtp_host", "mail.local", Some("Servidor SMTP"))
            .await
            .unwrap();
        assert_eq!(created.description, "Servidor SMTP");

        let changed = repo.upsert("smtp_host", "mail.example", None).await.unwrap();
        assert_eq!(changed.value, "mail.example");
        assert_eq!(changed.description, "Servidor SMTP");

        let bare = repo.upsert("sin_descripcion", "1", None).await.unwrap();
        assert_eq!(bare.description, "");
    }

    #[tokio::test]
    async fn test_reset_restores_defaults_and_keeps_extra_keys() {
        let db = setup().await;
        let repo = db.config();
        repo.upsert("tema", "dark", None).await.unwrap();
        repo.upsert("smtp_host", "mail.local", None).await.unwrap();

        let restored = repo.reset_defaults().await.unwrap();

        assert_eq!(restored.len(), DEFAULT_SETTINGS.len());
        let tema = repo.get("tema").await.unwrap().unwrap();
        assert_eq!(tema.value, "light");
        assert_eq!(tema.description, "Tema de la interfaz");
        assert_eq!(repo.get("smtp_host").await.unwrap().unwrap().value, "mail.local");
    }
}
