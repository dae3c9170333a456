use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::model::error::database::DatabaseError;
use crate::model::error::Error;
use crate::model::outcome::JobOutcome;
use crate::model::run::{Run, RunStatus, TriggeredBy};
use chrono::Utc;

pub trait RunRepository {
    async fn create_run_table(&self) -> Result<(), Error>;
    async fn create_run(&self, profile_id: i64, triggered_by: TriggeredBy) -> Result<i64, Error>;
    async fn finish_run(&self, run_id: i64, outcome: &JobOutcome, log_text: &str) -> Result<(), Error>;
    async fn get_run(&self, run_id: i64) -> Result<Option<Run>, Error>;
    async fn list_runs(&self, limit: i64) -> Result<Vec<Run>, Error>;
    async fn get_last_run_for_profile(&self, profile_id: i64) -> Result<Option<Run>, Error>;
    async fn fail_interrupted_runs(&self) -> Result<u64, Error>;
}

impl RunRepository for DatabaseManager {
    async fn create_run_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                profile_id INTEGER NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
                triggered_by TEXT NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT,
                status TEXT NOT NULL,
                message TEXT,
                log_text TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        sqlx::query("CREATE INDEX idx_runs_profile ON runs (profile_id, started_at)")
            .execute(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn create_run(&self, profile_id: i64, triggered_by: TriggeredBy) -> Result<i64, Error> {
        let pool = self.get_pool();
        let result = sqlx::query(
            "INSERT INTO runs (profile_id, triggered_by, started_at, status) VALUES (?, ?, ?, ?)",
        )
        .bind(profile_id)
        .bind(triggered_by)
        .bind(Utc::now())
        .bind(RunStatus::Running)
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(result.last_insert_rowid())
    }

    async fn finish_run(&self, run_id: i64, outcome: &JobOutcome, log_text: &str) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            "UPDATE runs SET finished_at = ?, status = ?, message = ?, log_text = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(outcome.status)
        .bind(&outcome.message)
        .bind(log_text)
        .bind(run_id)
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(())
    }

    async fn get_run(&self, run_id: i64) -> Result<Option<Run>, Error> {
        let pool = self.get_pool();
        let run = sqlx::query_as::<_, Run>("SELECT * FROM runs WHERE id = ?")
            .bind(run_id)
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(run)
    }

    async fn list_runs(&self, limit: i64) -> Result<Vec<Run>, Error> {
        let pool = self.get_pool();
        let runs = sqlx::query_as::<_, Run>(
            "SELECT * FROM runs ORDER BY started_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(runs)
    }

    async fn get_last_run_for_profile(&self, profile_id: i64) -> Result<Option<Run>, Error> {
        let pool = self.get_pool();
        let run = sqlx::query_as::<_, Run>(
            "SELECT * FROM runs WHERE profile_id = ? ORDER BY started_at DESC, id DESC LIMIT 1",
        )
        .bind(profile_id)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(run)
    }

    async fn fail_interrupted_runs(&self) -> Result<u64, Error> {
        let pool = self.get_pool();
        let result = sqlx::query(
            "UPDATE runs SET finished_at = ?, status = ?, message = ? WHERE status = ?",
        )
        .bind(Utc::now())
        .bind(RunStatus::Failed)
        .bind(INTERRUPTED_MESSAGE)
        .bind(RunStatus::Running)
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(result.rows_affected())
    }
}

pub const INTERRUPTED_MESSAGE: &str = "Interrupted before completion";

#[cfg(test)]
mod tests {
    use super::RunRepository;
    use crate::core::infrastructure::database_manager::DatabaseManager;
    use crate::interface::repository::profile::ProfileRepository;
    use crate::model::outcome::JobOutcome;
    use crate::model::profile::Profile;
    use crate::model::run::{RunStatus, TriggeredBy};

    #[tokio::test]
    async fn run_is_opened_then_finished() {
        let database_manager = DatabaseManager::in_memory().await.expect("db");
        let profile_id = database_manager
            .create_profile(&Profile::new("docs", "/a", "/b"))
            .await
            .expect("profile");

        let run_id = database_manager
            .create_run(profile_id, TriggeredBy::Scheduler)
            .await
            .expect("create");
        let run = database_manager.get_run(run_id).await.expect("get").expect("exists");
        assert_eq!(run.status, RunStatus::Running);
        assert_eq!(run.triggered_by, TriggeredBy::Scheduler);
        assert!(run.finished_at.is_none());

        let outcome = JobOutcome::success("Completed: 3 files copied, 1 skipped");
        database_manager
            .finish_run(run_id, &outcome, "line one\nline two")
            .await
            .expect("finish");
        let run = database_manager.get_run(run_id).await.expect("get").expect("exists");
        assert_eq!(run.status, RunStatus::Success);
        assert_eq!(run.message.as_deref(), Some("Completed: 3 files copied, 1 skipped"));
        assert_eq!(run.log_text.as_deref(), Some("line one\nline two"));
        assert!(run.finished_at.is_some_and(|finished| finished >= run.started_at));
    }

    #[tokio::test]
    async fn last_run_is_the_newest_one() {
        let database_manager = DatabaseManager::in_memory().await.expect("db");
        let first = database_manager
            .create_profile(&Profile::new("one", "/a", "/b"))
            .await
            .expect("profile");
        let second = database_manager
            .create_profile(&Profile::new("two", "/a", "/b"))
            .await
            .expect("profile");

        database_manager.create_run(first, TriggeredBy::Manual).await.expect("run");
        let newest = database_manager.create_run(first, TriggeredBy::Manual).await.expect("run");
        database_manager.create_run(second, TriggeredBy::Manual).await.expect("run");

        let last = database_manager
            .get_last_run_for_profile(first)
            .await
            .expect("last")
            .expect("exists");
        assert_eq!(last.id, newest);
        assert_eq!(database_manager.list_runs(2).await.expect("list").len(), 2);
        assert!(database_manager
            .get_last_run_for_profile(999)
            .await
            .expect("last")
            .is_none());
    }
}
