use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::interface::repository::setting::SettingRepository;
use crate::interface::repository::system_run::SystemRunRepository;
use crate::interface::system_task::SystemTaskHandler;
use crate::model::error::system::SystemError;
use crate::model::error::task::TaskError;
use crate::model::error::Error;
use crate::model::log::task::TaskLog;
use crate::model::outcome::JobOutcome;
use crate::model::queue::SystemTaskStatus;
use crate::model::run::{TaskType, TriggeredBy};
use crate::model::setting::SSH_LAST_SCHEDULED_DATE;
use crate::utils::run_log::RunLog;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use macros::log;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Runs system tasks in the background, at most one instance per task type.
#[derive(Clone)]
pub struct SystemTaskRunner {
    database_manager: Arc<DatabaseManager>,
    handlers: Arc<HashMap<TaskType, Arc<dyn SystemTaskHandler>>>,
    busy: Arc<DashMap<TaskType, TriggeredBy>>,
}

struct BusyGuard {
    busy: Arc<DashMap<TaskType, TriggeredBy>>,
    task_type: TaskType,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.remove(&self.task_type);
    }
}

impl SystemTaskRunner {
    pub fn new(
        database_manager: Arc<DatabaseManager>,
        handlers: HashMap<TaskType, Arc<dyn SystemTaskHandler>>,
    ) -> Self {
        Self {
            database_manager,
            handlers: Arc::new(handlers),
            busy: Arc::new(DashMap::new()),
        }
    }

    /// Returns false without doing anything when the task type is already running.
    pub fn run_system_task(&self, task_type: TaskType, triggered_by: TriggeredBy) -> bool {
        let guard = match self.busy.entry(task_type) {
            Entry::Occupied(_) => {
                log!(TaskLog::SystemTaskBusy {
                    task: task_type.to_string(),
                });
                return false;
            }
            Entry::Vacant(entry) => {
                entry.insert(triggered_by);
                BusyGuard {
                    busy: self.busy.clone(),
                    task_type,
                }
            }
        };

        let runner = self.clone();
        tokio::spawn(async move {
            let _busy = guard;
            if let Err(err) = runner.execute(task_type, triggered_by).await {
                log!(err);
            }
        });
        true
    }

    pub fn status(&self) -> SystemTaskStatus {
        SystemTaskStatus {
            ssh: self.busy.contains_key(&TaskType::Ssh),
            samba: self.busy.contains_key(&TaskType::Samba),
        }
    }

    async fn execute(&self, task_type: TaskType, triggered_by: TriggeredBy) -> Result<(), Error> {
        let run_id = self.database_manager.create_system_run(task_type).await?;
        let run_log = Arc::new(RunLog::new());
        run_log.log(format!("Starting {task_type} task ({triggered_by})"));

        let outcome = self.supervise(task_type, run_log.clone()).await;
        if let Err(err) = self
            .database_manager
            .finish_system_run(run_id, &outcome, &run_log.text())
            .await
        {
            let recorded = JobOutcome::failed(format!("Failed to record result: {err}"));
            self.database_manager
                .finish_system_run(run_id, &recorded, &run_log.text())
                .await?;
            return Err(err);
        }

        if outcome.is_success() && task_type == TaskType::Ssh && triggered_by == TriggeredBy::Scheduler {
            let today = Utc::now().date_naive().to_string();
            self.database_manager
                .set_setting(SSH_LAST_SCHEDULED_DATE, &today)
                .await?;
        }

        log!(TaskLog::SystemTaskFinished {
            task: task_type.to_string(),
            status: outcome.status.to_string(),
            message: outcome.message.clone(),
        });
        Ok(())
    }

    async fn supervise(&self, task_type: TaskType, run_log: Arc<RunLog>) -> JobOutcome {
        let err: Error = match self.dispatch(task_type, run_log.clone()).await {
            Ok(outcome) => return outcome,
            Err(err) => err,
        };
        run_log.log(format!("Task failed: {err}"));
        JobOutcome::failed(err.to_string())
    }

    async fn dispatch(&self, task_type: TaskType, run_log: Arc<RunLog>) -> Result<JobOutcome, Error> {
        let handler = self
            .handlers
            .get(&task_type)
            .cloned()
            .ok_or(TaskError::UnknownTaskType)?;
        let config: Value = self
            .database_manager
            .get_setting_json(task_type.config_key())
            .await?;
        tokio::task::spawn_blocking(move || handler.run(&config, &run_log))
            .await
            .map_err(SystemError::ThreadPanic)?
    }
}

#[cfg(test)]
mod tests {
    use super::SystemTaskRunner;
    use crate::core::infrastructure::database_manager::DatabaseManager;
    use crate::interface::repository::setting::SettingRepository;
    use crate::interface::repository::system_run::SystemRunRepository;
    use crate::interface::system_task::SystemTaskHandler;
    use crate::model::error::Error;
    use crate::model::outcome::JobOutcome;
    use crate::model::run::{RunStatus, SystemRun, TaskType, TriggeredBy};
    use crate::model::setting::{SSH_CONFIG, SSH_LAST_SCHEDULED_DATE};
    use crate::utils::run_log::RunLog;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use std::sync::mpsc::{self, Receiver};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Blocks until released, then reports what configuration it saw.
    struct GatedHandler {
        release: Mutex<Receiver<()>>,
        seen: Mutex<Option<Value>>,
    }

    impl SystemTaskHandler for GatedHandler {
        fn run(&self, config: &Value, run_log: &RunLog) -> Result<JobOutcome, Error> {
            let _ = self.release.lock().expect("gate").recv_timeout(Duration::from_secs(5));
            *self.seen.lock().expect("seen") = Some(config.clone());
            run_log.log("gated work done");
            Ok(JobOutcome::success("SSH backups completed"))
        }
    }

    struct PanickingHandler;

    impl SystemTaskHandler for PanickingHandler {
        fn run(&self, _config: &Value, _run_log: &RunLog) -> Result<JobOutcome, Error> {
            panic!("handler exploded")
        }
    }

    async fn wait_for_finished(database_manager: &DatabaseManager, task_type: TaskType) -> SystemRun {
        for _ in 0..200 {
            let last = database_manager
                .get_last_system_run(task_type)
                .await
                .expect("last");
            if let Some(run) = last.filter(|run| run.status != RunStatus::Running) {
                return run;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("{task_type} task never finished");
    }

    #[tokio::test]
    async fn second_request_is_rejected_while_busy() {
        let database_manager = Arc::new(DatabaseManager::in_memory().await.expect("db"));
        database_manager
            .set_setting_json(SSH_CONFIG, &json!({ "local_backup_dir": "/tmp/x" }))
            .await
            .expect("config");
        let (release, gate) = mpsc::channel();
        let handler = Arc::new(GatedHandler {
            release: Mutex::new(gate),
            seen: Mutex::new(None),
        });
        let mut handlers: HashMap<TaskType, Arc<dyn SystemTaskHandler>> = HashMap::new();
        handlers.insert(TaskType::Ssh, handler.clone());
        let runner = SystemTaskRunner::new(database_manager.clone(), handlers);

        assert!(runner.run_system_task(TaskType::Ssh, TriggeredBy::Scheduler));
        assert!(runner.status().ssh);
        assert!(!runner.run_system_task(TaskType::Ssh, TriggeredBy::Manual));

        release.send(()).expect("release");
        let run = wait_for_finished(&database_manager, TaskType::Ssh).await;
        assert_eq!(run.status, RunStatus::Success);
        assert!(run.log_text.is_some_and(|text| text.contains("gated work done")));
        assert_eq!(
            *handler.seen.lock().expect("seen"),
            Some(json!({ "local_backup_dir": "/tmp/x" }))
        );

        for _ in 0..200 {
            if !runner.status().ssh {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!runner.status().ssh);
        assert_eq!(
            database_manager
                .get_setting(SSH_LAST_SCHEDULED_DATE)
                .await
                .expect("date"),
            Some(Utc::now().date_naive().to_string())
        );
    }

    #[tokio::test]
    async fn unknown_task_type_is_recorded_as_failed() {
        let database_manager = Arc::new(DatabaseManager::in_memory().await.expect("db"));
        let runner = SystemTaskRunner::new(database_manager.clone(), HashMap::new());

        assert!(runner.run_system_task(TaskType::Samba, TriggeredBy::Manual));
        let run = wait_for_finished(&database_manager, TaskType::Samba).await;
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.message.as_deref(), Some("Unknown task type"));
    }

    #[tokio::test]
    async fn handler_panic_is_contained() {
        let database_manager = Arc::new(DatabaseManager::in_memory().await.expect("db"));
        let mut handlers: HashMap<TaskType, Arc<dyn SystemTaskHandler>> = HashMap::new();
        handlers.insert(TaskType::Ssh, Arc::new(PanickingHandler));
        let runner = SystemTaskRunner::new(database_manager.clone(), handlers);

        assert!(runner.run_system_task(TaskType::Ssh, TriggeredBy::Manual));
        let run = wait_for_finished(&database_manager, TaskType::Ssh).await;
        assert_eq!(run.status, RunStatus::Failed);
        assert!(run.message.is_some_and(|message| message.starts_with("Unexpected error")));
        assert!(database_manager
            .get_setting(SSH_LAST_SCHEDULED_DATE)
            .await
            .expect("date")
            .is_none());
    }
}
