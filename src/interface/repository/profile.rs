use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::model::error::database::DatabaseError;
use crate::model::error::misc::MiscError;
use crate::model::error::Error;
use crate::model::profile::{parse_exclude_patterns, Profile, ScheduleFrequency, VerifyMode};
use chrono::{DateTime, Utc};

pub trait ProfileRepository {
    async fn create_profile_table(&self) -> Result<(), Error>;
    async fn create_profile(&self, profile: &Profile) -> Result<i64, Error>;
    async fn modify_profile(&self, profile: &Profile) -> Result<(), Error>;
    async fn remove_profile(&self, profile_id: i64) -> Result<(), Error>;
    async fn get_profile(&self, profile_id: i64) -> Result<Option<Profile>, Error>;
    async fn get_all_profiles(&self) -> Result<Vec<Profile>, Error>;
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: i64,
    name: String,
    source_path: String,
    dest_path: String,
    exclude_patterns: String,
    schedule_time: Option<String>,
    schedule_frequency: Option<String>,
    schedule_enabled: bool,
    retention_count: i64,
    verify_mode: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            source_path: row.source_path.into(),
            dest_path: row.dest_path.into(),
            exclude_patterns: parse_exclude_patterns(&row.exclude_patterns),
            schedule_time: row.schedule_time.filter(|time| !time.trim().is_empty()),
            schedule_frequency: ScheduleFrequency::normalize(
                row.schedule_frequency.as_deref().unwrap_or_default(),
            ),
            schedule_enabled: row.schedule_enabled,
            retention_count: u32::try_from(row.retention_count.max(0)).unwrap_or(u32::MAX),
            verify_mode: row
                .verify_mode
                .as_deref()
                .map(VerifyMode::normalize)
                .unwrap_or_default(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PROFILE: &str = r#"
    SELECT
        id,
        name,
        source_path,
        dest_path,
        exclude_patterns,
        schedule_time,
        schedule_frequency,
        schedule_enabled,
        retention_count,
        verify_mode,
        created_at,
        updated_at
    FROM profiles
"#;

fn write_error(name: &str, err: sqlx::Error) -> Error {
    match &err {
        sqlx::Error::Database(database_error) if database_error.is_unique_violation() => {
            DatabaseError::DuplicateProfileName(name).into()
        }
        _ => DatabaseError::StatementExecutionFailed(err).into(),
    }
}

impl ProfileRepository for DatabaseManager {
    async fn create_profile_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                source_path TEXT NOT NULL,
                dest_path TEXT NOT NULL,
                exclude_patterns TEXT NOT NULL DEFAULT '[]',
                schedule_time TEXT,
                schedule_frequency TEXT DEFAULT 'day',
                schedule_enabled INTEGER NOT NULL DEFAULT 0,
                retention_count INTEGER NOT NULL DEFAULT 7,
                verify_mode TEXT DEFAULT 'size',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn create_profile(&self, profile: &Profile) -> Result<i64, Error> {
        let pool = self.get_pool();
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO profiles (
                name,
                source_path,
                dest_path,
                exclude_patterns,
                schedule_time,
                schedule_frequency,
                schedule_enabled,
                retention_count,
                verify_mode,
                created_at,
                updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&profile.name)
        .bind(profile.source_path.to_string_lossy().to_string())
        .bind(profile.dest_path.to_string_lossy().to_string())
        .bind(serde_json::to_string(&profile.exclude_patterns).map_err(MiscError::SerializeError)?)
        .bind(&profile.schedule_time)
        .bind(profile.schedule_frequency.as_str())
        .bind(profile.schedule_enabled)
        .bind(i64::from(profile.retention_count))
        .bind(profile.verify_mode.as_str())
        .bind(now)
        .bind(now)
        .execute(&pool)
        .await
        .map_err(|err| write_error(&profile.name, err))?;
        Ok(result.last_insert_rowid())
    }

    async fn modify_profile(&self, profile: &Profile) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            UPDATE profiles
            SET
                name = ?,
                source_path = ?,
                dest_path = ?,
                exclude_patterns = ?,
                schedule_time = ?,
                schedule_frequency = ?,
                schedule_enabled = ?,
                retention_count = ?,
                verify_mode = ?,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&profile.name)
        .bind(profile.source_path.to_string_lossy().to_string())
        .bind(profile.dest_path.to_string_lossy().to_string())
        .bind(serde_json::to_string(&profile.exclude_patterns).map_err(MiscError::SerializeError)?)
        .bind(&profile.schedule_time)
        .bind(profile.schedule_frequency.as_str())
        .bind(profile.schedule_enabled)
        .bind(i64::from(profile.retention_count))
        .bind(profile.verify_mode.as_str())
        .bind(Utc::now())
        .bind(profile.id)
        .execute(&pool)
        .await
        .map_err(|err| write_error(&profile.name, err))?;
        Ok(())
    }

    async fn remove_profile(&self, profile_id: i64) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(profile_id)
            .execute(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn get_profile(&self, profile_id: i64) -> Result<Option<Profile>, Error> {
        let pool = self.get_pool();
        let row = sqlx::query_as::<_, ProfileRow>(&format!("{SELECT_PROFILE} WHERE id = ?"))
            .bind(profile_id)
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(row.map(Profile::from))
    }

    async fn get_all_profiles(&self) -> Result<Vec<Profile>, Error> {
        let pool = self.get_pool();
        let rows = sqlx::query_as::<_, ProfileRow>(&format!("{SELECT_PROFILE} ORDER BY name"))
            .fetch_all(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(rows.into_iter().map(Profile::from).collect())
    }
}
