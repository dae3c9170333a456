use macros::loggable;

loggable! {
    ScheduleLog {
        #[error("Scheduler started")]
        SchedulerStarted => tracing::Level::INFO,

        #[error("Scheduler stopped")]
        SchedulerStopped => tracing::Level::INFO,

        #[error("Scheduler is disabled, skipping cycle")]
        SchedulerDisabled => tracing::Level::DEBUG,

        #[error("Profile {profile_id} is due")]
        ProfileDue { profile_id: i64 } => tracing::Level::INFO,

        #[error("SSH backup is due")]
        SshBackupDue => tracing::Level::INFO,

        #[error("Ignoring schedule of {owner}: invalid time {value}")]
        InvalidScheduleTime { owner: String, value: String } => tracing::Level::WARN,
    }
}
