use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::model::error::database::DatabaseError;
use crate::model::error::misc::MiscError;
use crate::model::error::Error;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub trait SettingRepository {
    async fn create_setting_table(&self) -> Result<(), Error>;
    async fn get_setting(&self, key: &str) -> Result<Option<String>, Error>;
    async fn set_setting(&self, key: &str, value: &str) -> Result<(), Error>;
    /// Absent or malformed values yield `T::default()`.
    async fn get_setting_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, Error>;
    async fn set_setting_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), Error>;
}

impl SettingRepository for DatabaseManager {
    async fn create_setting_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn get_setting(&self, key: &str) -> Result<Option<String>, Error> {
        let pool = self.get_pool();
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(value)
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            "INSERT INTO settings (key, value) VALUES (?, ?) ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn get_setting_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, Error> {
        let value = self.get_setting(key).await?;
        Ok(value
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default())
    }

    async fn set_setting_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), Error> {
        let raw = serde_json::to_string_pretty(value).map_err(MiscError::SerializeError)?;
        self.set_setting(key, &raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::SettingRepository;
    use crate::core::infrastructure::database_manager::DatabaseManager;
    use serde_json::{json, Value};

    #[tokio::test]
    async fn values_are_upserted() {
        let database_manager = DatabaseManager::in_memory().await.expect("db");
        assert_eq!(database_manager.get_setting("k").await.expect("get"), None);

        database_manager.set_setting("k", "1").await.expect("set");
        database_manager.set_setting("k", "0").await.expect("set");
        assert_eq!(
            database_manager.get_setting("k").await.expect("get"),
            Some("0".to_string())
        );
    }

    #[tokio::test]
    async fn malformed_json_reads_as_default() {
        let database_manager = DatabaseManager::in_memory().await.expect("db");
        database_manager.set_setting("broken", "{not json").await.expect("set");
        let value: Value = database_manager.get_setting_json("broken").await.expect("get");
        assert_eq!(value, Value::Null);

        database_manager
            .set_setting_json("ok", &json!({ "servers": [] }))
            .await
            .expect("set");
        let value: Value = database_manager.get_setting_json("ok").await.expect("get");
        assert_eq!(value, json!({ "servers": [] }));
    }
}
