use crate::interface::repository::profile::ProfileRepository;
use crate::interface::repository::run::RunRepository;
use crate::interface::repository::setting::SettingRepository;
use crate::interface::repository::system_run::SystemRunRepository;
use crate::model::config::Config;
use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use crate::model::error::Error;
use crate::model::log::database::DatabaseLog;
use crate::model::profile::ScheduleFrequency;
use crate::model::setting::*;
use crate::model::ssh_config::SshConfig;
use macros::log;
use serde_json::json;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tokio::fs;

#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    pub async fn new(config: &Config) -> Result<Self, Error> {
        let database_path = Path::new(&config.database_path);
        if let Some(parent) = database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| IOError::CreateDirectoryFailed(parent, err))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(database_path)
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .map_err(DatabaseError::DatabaseConnectFailed)?;
        log!(DatabaseLog::DatabaseConnectSuccess);
        Self::with_pool(pool).await
    }

    /// Single-connection in-memory store, the connection must never be recycled
    /// or the schema disappears with it.
    pub async fn in_memory() -> Result<Self, Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(DatabaseError::CreateDatabaseFailed)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(DatabaseError::DatabaseConnectFailed)?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, Error> {
        let database_manager = Self { pool };
        if !database_manager.exist_table("profiles").await {
            database_manager.create_profile_table().await?;
        }
        if !database_manager.exist_table("runs").await {
            database_manager.create_run_table().await?;
        }
        if !database_manager.exist_table("system_runs").await {
            database_manager.create_system_run_table().await?;
        }
        if !database_manager.exist_table("settings").await {
            database_manager.create_setting_table().await?;
        }
        Ok(database_manager)
    }

    pub fn get_pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub async fn close_connection(&self) {
        self.pool.close().await;
    }

    pub async fn exist_table(&self, table_name: &str) -> bool {
        let pool = self.get_pool();
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(&pool)
        .await
        .unwrap_or(false)
    }

    /// Nothing survives a restart, so records still marked running belong to
    /// a previous process.
    pub async fn sweep_interrupted_runs(&self) -> Result<u64, Error> {
        let count = self.fail_interrupted_runs().await? + self.fail_interrupted_system_runs().await?;
        if count > 0 {
            log!(DatabaseLog::InterruptedRunsFailed { count });
        }
        Ok(count)
    }

    /// Seeds settings that are absent. Existing values are never overwritten.
    pub async fn ensure_default_settings(&self) -> Result<(), Error> {
        let defaults = [
            (SCHEDULER_ENABLED, ENABLED.to_string()),
            (SSH_SCHEDULE_ENABLED, DISABLED.to_string()),
            (SSH_SCHEDULE_TIME, String::new()),
            (SSH_SCHEDULE_FREQUENCY, ScheduleFrequency::Day.as_str().to_string()),
            (
                SSH_CONFIG,
                serde_json::to_string_pretty(&SshConfig::example()).unwrap_or_default(),
            ),
            (
                SAMBA_CONFIG,
                serde_json::to_string_pretty(&json!({ "shares": [] })).unwrap_or_default(),
            ),
        ];
        for (key, value) in defaults {
            if self.get_setting(key).await?.is_none() {
                self.set_setting(key, &value).await?;
            }
        }
        Ok(())
    }
}
