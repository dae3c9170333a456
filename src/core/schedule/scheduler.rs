use crate::core::backup::backup_queue::BackupQueue;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::core::schedule::due_policy::Schedule;
use crate::core::system_task::SystemTaskRunner;
use crate::interface::core::runnable::Runnable;
use crate::interface::repository::profile::ProfileRepository;
use crate::interface::repository::run::RunRepository;
use crate::interface::repository::setting::SettingRepository;
use crate::interface::repository::system_run::SystemRunRepository;
use crate::model::error::Error;
use crate::model::log::schedule::ScheduleLog;
use crate::model::profile::{Profile, ScheduleFrequency};
use crate::model::run::{RunSnapshot, TaskType, TriggeredBy};
use crate::model::setting::*;
use crate::platform::constants::SCHEDULER_INTERVAL;
use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use macros::log;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::select;
use tokio::sync::oneshot;
use tokio::time::sleep;

/// Periodically enqueues due profile backups and starts the scheduled SSH task.
pub struct Scheduler {
    database_manager: Arc<DatabaseManager>,
    backup_queue: Arc<BackupQueue>,
    system_tasks: SystemTaskRunner,
    shutdown: Mutex<Option<oneshot::Sender<()>>>,
}

impl Scheduler {
    pub fn new(
        database_manager: Arc<DatabaseManager>,
        backup_queue: Arc<BackupQueue>,
        system_tasks: SystemTaskRunner,
    ) -> Self {
        Self {
            database_manager,
            backup_queue,
            system_tasks,
            shutdown: Mutex::new(None),
        }
    }

    /// Starting an already started scheduler is a no-op.
    pub fn start(self: Arc<Self>) {
        let mut shutdown = self.shutdown.lock().unwrap_or_else(PoisonError::into_inner);
        if shutdown.is_some() {
            return;
        }
        *shutdown = Some(self.clone().run());
        log!(ScheduleLog::SchedulerStarted);
    }

    pub fn stop(&self) {
        let shutdown = self
            .shutdown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(shutdown) = shutdown {
            let _ = shutdown.send(());
            log!(ScheduleLog::SchedulerStopped);
        }
    }

    /// A missing setting counts as enabled.
    pub async fn is_enabled(&self) -> Result<bool, Error> {
        let value = self.database_manager.get_setting(SCHEDULER_ENABLED).await?;
        Ok(value.is_none() || is_enabled(value.as_deref()))
    }

    /// Flips the global switch and returns the new state.
    pub async fn toggle_scheduler(&self) -> Result<bool, Error> {
        let enabled = !self.is_enabled().await?;
        let value = if enabled { ENABLED } else { DISABLED };
        self.database_manager.set_setting(SCHEDULER_ENABLED, value).await?;
        Ok(enabled)
    }

    /// One evaluation pass. Errors of one profile never stop the others.
    pub async fn run_cycle<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<(), Error> {
        for profile in self.database_manager.get_all_profiles().await? {
            if let Err(err) = self.check_profile(&profile, now).await {
                log!(err);
            }
        }
        self.check_ssh_schedule(now).await
    }

    async fn check_profile<Tz: TimeZone>(&self, profile: &Profile, now: &DateTime<Tz>) -> Result<(), Error> {
        if !profile.schedule_enabled {
            return Ok(());
        }
        let Some(time) = profile.schedule_time.as_deref().filter(|time| !time.trim().is_empty()) else {
            return Ok(());
        };
        let Ok(schedule) = Schedule::parse(time, profile.schedule_frequency) else {
            log!(ScheduleLog::InvalidScheduleTime {
                owner: profile.name.clone(),
                value: time.to_string(),
            });
            return Ok(());
        };
        if !schedule.slot_reached(now) {
            return Ok(());
        }

        let last_run = self
            .database_manager
            .get_last_run_for_profile(profile.id)
            .await?;
        if schedule.is_due(now, last_run.as_ref().map(RunSnapshot::from).as_ref()) {
            log!(ScheduleLog::ProfileDue {
                profile_id: profile.id,
            });
            self.backup_queue.enqueue(profile.id, TriggeredBy::Scheduler);
        }
        Ok(())
    }

    async fn check_ssh_schedule<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<(), Error> {
        let enabled = self.database_manager.get_setting(SSH_SCHEDULE_ENABLED).await?;
        if !is_enabled(enabled.as_deref()) {
            return Ok(());
        }
        let time = self
            .database_manager
            .get_setting(SSH_SCHEDULE_TIME)
            .await?
            .unwrap_or_default();
        if time.trim().is_empty() {
            return Ok(());
        }
        let frequency = self
            .database_manager
            .get_setting(SSH_SCHEDULE_FREQUENCY)
            .await?
            .map(|value| ScheduleFrequency::normalize(&value))
            .unwrap_or_default();
        let Ok(schedule) = Schedule::parse(&time, frequency) else {
            log!(ScheduleLog::InvalidScheduleTime {
                owner: TaskType::Ssh.to_string(),
                value: time.clone(),
            });
            return Ok(());
        };
        if !schedule.slot_reached(now) {
            return Ok(());
        }

        let last_run = self
            .database_manager
            .get_last_system_run(TaskType::Ssh)
            .await?;
        if schedule.is_due(now, last_run.as_ref().map(RunSnapshot::from).as_ref()) {
            log!(ScheduleLog::SshBackupDue);
            self.system_tasks
                .run_system_task(TaskType::Ssh, TriggeredBy::Scheduler);
        }
        Ok(())
    }
}

#[async_trait]
impl Runnable for Scheduler {
    async fn run_impl(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        loop {
            match self.is_enabled().await {
                Ok(true) => {
                    if let Err(err) = self.run_cycle(&Local::now()).await {
                        log!(err);
                    }
                }
                Ok(false) => log!(ScheduleLog::SchedulerDisabled),
                Err(err) => log!(err),
            }

            select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = sleep(SCHEDULER_INTERVAL) => {}
            }
        }
    }
}
