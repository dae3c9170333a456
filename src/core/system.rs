use crate::core::backup::backup_queue::BackupQueue;
use crate::core::backup::local_backup::LocalBackup;
use crate::core::infrastructure::app_config::AppConfig;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::core::remote::ssh_backup::SshBackup;
use crate::core::remote::ssh_session::SshConnector;
use crate::core::schedule::scheduler::Scheduler;
use crate::core::system_task::SystemTaskRunner;
use crate::interface::core::runnable::Runnable;
use crate::interface::repository::run::RunRepository;
use crate::interface::repository::system_run::SystemRunRepository;
use crate::interface::system_task::SystemTaskHandler;
use crate::model::error::system::SystemError;
use crate::model::error::Error;
use crate::model::log::system::SystemLog;
use crate::model::queue::{QueueStatus, SystemTaskStatus};
use crate::model::run::{Run, SystemRun, TaskType, TriggeredBy};
use crate::platform::constants::{CONNECT_TIMEOUT, RUN_LIST_LIMIT};
use crate::utils::logging::Logging;
use macros::log;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Owns every long-lived service of the process.
pub struct System {
    _logging: Logging,
    database_manager: Arc<DatabaseManager>,
    backup_queue: Arc<BackupQueue>,
    system_tasks: SystemTaskRunner,
    scheduler: Arc<Scheduler>,
    queue_shutdown: Option<oneshot::Sender<()>>,
}

impl System {
    pub async fn initialize() -> Result<Self, Error> {
        let app_config = AppConfig::new()?;
        let logging = Logging::initialize(&app_config)?;
        log!(SystemLog::Initializing);
        if !app_config.from_file() {
            log!(SystemLog::ConfigNotFound);
        }

        let database_manager = Arc::new(DatabaseManager::new(&app_config).await?);
        database_manager.sweep_interrupted_runs().await?;
        database_manager.ensure_default_settings().await?;

        let local_backup = Arc::new(LocalBackup::new(app_config.hash_type));
        let backup_queue = Arc::new(BackupQueue::new(database_manager.clone(), local_backup));

        let ssh_backup = SshBackup::new(Arc::new(SshConnector::new(CONNECT_TIMEOUT)));
        let mut handlers: HashMap<TaskType, Arc<dyn SystemTaskHandler>> = HashMap::new();
        handlers.insert(TaskType::Ssh, Arc::new(ssh_backup));
        let system_tasks = SystemTaskRunner::new(database_manager.clone(), handlers);

        let scheduler = Arc::new(Scheduler::new(
            database_manager.clone(),
            backup_queue.clone(),
            system_tasks.clone(),
        ));

        log!(SystemLog::InitializeComplete);
        Ok(Self {
            _logging: logging,
            database_manager,
            backup_queue,
            system_tasks,
            scheduler,
            queue_shutdown: None,
        })
    }

    /// Starts the worker and the scheduler, then waits for Ctrl-C.
    pub async fn run(&mut self) -> Result<(), Error> {
        self.queue_shutdown = Some(self.backup_queue.clone().run());
        self.scheduler.clone().start();
        log!(SystemLog::Online);
        tokio::signal::ctrl_c()
            .await
            .map_err(SystemError::ShutdownSignalFailed)?;
        Ok(())
    }

    pub async fn terminate(mut self) {
        log!(SystemLog::Terminating);
        self.scheduler.stop();
        if let Some(queue_shutdown) = self.queue_shutdown.take() {
            let _ = queue_shutdown.send(());
        }
        self.database_manager.close_connection().await;
        log!(SystemLog::TerminateComplete);
    }

    pub fn enqueue(&self, profile_id: i64, triggered_by: TriggeredBy) -> bool {
        self.backup_queue.enqueue(profile_id, triggered_by)
    }

    pub fn queue_status(&self) -> QueueStatus {
        self.backup_queue.status()
    }

    pub fn run_system_task(&self, task_type: TaskType, triggered_by: TriggeredBy) -> bool {
        self.system_tasks.run_system_task(task_type, triggered_by)
    }

    pub fn system_status(&self) -> SystemTaskStatus {
        self.system_tasks.status()
    }

    /// Newest first.
    pub async fn recent_runs(&self) -> Result<Vec<Run>, Error> {
        self.database_manager.list_runs(RUN_LIST_LIMIT).await
    }

    pub async fn recent_system_runs(&self) -> Result<Vec<SystemRun>, Error> {
        self.database_manager.list_system_runs(RUN_LIST_LIMIT).await
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub fn database_manager(&self) -> &Arc<DatabaseManager> {
        &self.database_manager
    }
}
