use crate::core::backup::local_backup::LocalBackup;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::interface::core::runnable::Runnable;
use crate::interface::repository::profile::ProfileRepository;
use crate::interface::repository::run::RunRepository;
use crate::model::error::system::SystemError;
use crate::model::error::task::TaskError;
use crate::model::error::Error;
use crate::model::log::task::TaskLog;
use crate::model::outcome::JobOutcome;
use crate::model::profile::Profile;
use crate::model::queue::{QueueItem, QueueStatus};
use crate::model::run::TriggeredBy;
use crate::utils::run_log::RunLog;
use async_trait::async_trait;
use macros::log;
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::select;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::oneshot::Receiver;

#[derive(Default)]
struct Membership {
    queued: VecDeque<i64>,
    running: BTreeSet<i64>,
}

/// FIFO of profile backups drained by a single worker. A profile id is
/// present at most once across the queued and running sets.
pub struct BackupQueue {
    database_manager: Arc<DatabaseManager>,
    local_backup: Arc<LocalBackup>,
    membership: Mutex<Membership>,
    sender: UnboundedSender<QueueItem>,
    receiver: Mutex<Option<UnboundedReceiver<QueueItem>>>,
}

struct RunningGuard<'a> {
    queue: &'a BackupQueue,
    profile_id: i64,
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.queue.membership().running.remove(&self.profile_id);
    }
}

impl BackupQueue {
    pub fn new(database_manager: Arc<DatabaseManager>, local_backup: Arc<LocalBackup>) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            database_manager,
            local_backup,
            membership: Mutex::new(Membership::default()),
            sender,
            receiver: Mutex::new(Some(receiver)),
        }
    }

    fn membership(&self) -> MutexGuard<'_, Membership> {
        self.membership.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns false when the profile is already queued or running.
    pub fn enqueue(&self, profile_id: i64, triggered_by: TriggeredBy) -> bool {
        let mut membership = self.membership();
        if membership.queued.contains(&profile_id) || membership.running.contains(&profile_id) {
            log!(TaskLog::DuplicateRejected { profile_id });
            return false;
        }
        if self
            .sender
            .send(QueueItem {
                profile_id,
                triggered_by,
            })
            .is_err()
        {
            return false;
        }
        membership.queued.push_back(profile_id);
        log!(TaskLog::Enqueued {
            profile_id,
            triggered_by: triggered_by.to_string(),
        });
        true
    }

    pub fn status(&self) -> QueueStatus {
        let membership = self.membership();
        QueueStatus {
            running: membership.running.iter().copied().collect(),
            queued: membership.queued.iter().copied().collect(),
        }
    }

    fn mark_running(&self, profile_id: i64) -> RunningGuard<'_> {
        let mut membership = self.membership();
        membership.queued.retain(|queued| *queued != profile_id);
        membership.running.insert(profile_id);
        RunningGuard {
            queue: self,
            profile_id,
        }
    }

    async fn process(&self, item: QueueItem) {
        let _running = self.mark_running(item.profile_id);
        if let Err(err) = self.execute(item).await {
            log!(err);
        }
    }

    async fn execute(&self, item: QueueItem) -> Result<(), Error> {
        let Some(profile) = self.database_manager.get_profile(item.profile_id).await? else {
            log!(TaskError::ProfileNotFound(item.profile_id));
            return Ok(());
        };

        let run_id = self
            .database_manager
            .create_run(profile.id, item.triggered_by)
            .await?;
        let run_log = Arc::new(RunLog::new());
        let outcome = self.supervise(profile, run_log.clone()).await;
        if let Err(err) = self
            .database_manager
            .finish_run(run_id, &outcome, &run_log.text())
            .await
        {
            // A run left in `running` is never retried by the scheduler.
            let recorded = JobOutcome::failed(format!("Failed to record result: {err}"));
            self.database_manager
                .finish_run(run_id, &recorded, &run_log.text())
                .await?;
            return Err(err);
        }

        log!(TaskLog::RunFinished {
            profile_id: item.profile_id,
            status: outcome.status.to_string(),
            message: outcome.message.clone(),
        });
        Ok(())
    }

    /// Runs the engine on a blocking thread. Errors and panics both become a failed outcome.
    async fn supervise(&self, profile: Profile, run_log: Arc<RunLog>) -> JobOutcome {
        let local_backup = self.local_backup.clone();
        let job_log = run_log.clone();
        let result =
            tokio::task::spawn_blocking(move || local_backup.run(&profile, &job_log)).await;
        let err: Error = match result {
            Ok(Ok(outcome)) => return outcome,
            Ok(Err(err)) => err,
            Err(join_err) => SystemError::ThreadPanic(join_err).into(),
        };
        run_log.log(format!("Backup failed: {err}"));
        JobOutcome::failed(err.to_string())
    }
}

#[async_trait]
impl Runnable for BackupQueue {
    async fn run_impl(self: Arc<Self>, mut shutdown_rx: Receiver<()>) {
        let receiver = self
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(mut receiver) = receiver else {
            return;
        };

        loop {
            select! {
                biased;
                _ = &mut shutdown_rx => break,
                item = receiver.recv() => match item {
                    Some(item) => self.process(item).await,
                    None => break,
                },
            }
        }
    }
}
