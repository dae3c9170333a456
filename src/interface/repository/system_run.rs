use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::interface::repository::run::INTERRUPTED_MESSAGE;
use crate::model::error::database::DatabaseError;
use crate::model::error::Error;
use crate::model::outcome::JobOutcome;
use crate::model::run::{RunStatus, SystemRun, TaskType};
use chrono::Utc;

pub trait SystemRunRepository {
    async fn create_system_run_table(&self) -> Result<(), Error>;
    async fn create_system_run(&self, task_type: TaskType) -> Result<i64, Error>;
    async fn finish_system_run(&self, run_id: i64, outcome: &JobOutcome, log_text: &str) -> Result<(), Error>;
    async fn get_system_run(&self, run_id: i64) -> Result<Option<SystemRun>, Error>;
    async fn list_system_runs(&self, limit: i64) -> Result<Vec<SystemRun>, Error>;
    async fn get_last_system_run(&self, task_type: TaskType) -> Result<Option<SystemRun>, Error>;
    async fn fail_interrupted_system_runs(&self) -> Result<u64, Error>;
}

impl SystemRunRepository for DatabaseManager {
    async fn create_system_run_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE system_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_type TEXT NOT NULL,
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
        Ok(())
    }

    async fn create_system_run(&self, task_type: TaskType) -> Result<i64, Error> {
        let pool = self.get_pool();
        let result = sqlx::query(
            "INSERT INTO system_runs (task_type, started_at, status) VALUES (?, ?, ?)",
        )
        .bind(task_type)
        .bind(Utc::now())
        .bind(RunStatus::Running)
        .execute(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(result.last_insert_rowid())
    }

    async fn finish_system_run(&self, run_id: i64, outcome: &JobOutcome, log_text: &str) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            "UPDATE system_runs SET finished_at = ?, status = ?, message = ?, log_text = ? WHERE id = ?",
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

    async fn get_system_run(&self, run_id: i64) -> Result<Option<SystemRun>, Error> {
        let pool = self.get_pool();
        let run = sqlx::query_as::<_, SystemRun>("SELECT * FROM system_runs WHERE id = ?")
            .bind(run_id)
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(run)
    }

    async fn list_system_runs(&self, limit: i64) -> Result<Vec<SystemRun>, Error> {
        let pool = self.get_pool();
        let runs = sqlx::query_as::<_, SystemRun>(
            "SELECT * FROM system_runs ORDER BY started_at DESC, id DESC LIMIT ?",
        )
        .bind(limit)
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(runs)
    }

    async fn get_last_system_run(&self, task_type: TaskType) -> Result<Option<SystemRun>, Error> {
        let pool = self.get_pool();
        let run = sqlx::query_as::<_, SystemRun>(
            "SELECT * FROM system_runs WHERE task_type = ? ORDER BY started_at DESC, id DESC LIMIT 1",
        )
        .bind(task_type)
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::StatementExecutionFailed)?;
        Ok(run)
    }

    async fn fail_interrupted_system_runs(&self) -> Result<u64, Error> {
        let pool = self.get_pool();
        let result = sqlx::query(
            "UPDATE system_runs SET finished_at = ?, status = ?, message = ? WHERE status = ?",
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

#[cfg(test)]
mod tests {
    use super::SystemRunRepository;
    use crate::core::infrastructure::database_manager::DatabaseManager;
    use crate::model::outcome::JobOutcome;
    use crate::model::run::{RunStatus, TaskType};

    #[tokio::test]
    async fn last_system_run_is_per_task_type() {
        let database_manager = DatabaseManager::in_memory().await.expect("db");
        let ssh = database_manager.create_system_run(TaskType::Ssh).await.expect("ssh");
        database_manager.create_system_run(TaskType::Samba).await.expect("samba");
        database_manager
            .finish_system_run(ssh, &JobOutcome::failed("SSH connect failed for web"), "")
            .await
            .expect("finish");

        let last = database_manager
            .get_last_system_run(TaskType::Ssh)
            .await
            .expect("last")
            .expect("exists");
        assert_eq!(last.id, ssh);
        assert_eq!(last.task_type, TaskType::Ssh);
        assert_eq!(last.status, RunStatus::Failed);
        assert_eq!(database_manager.list_system_runs(10).await.expect("list").len(), 2);
    }
}
