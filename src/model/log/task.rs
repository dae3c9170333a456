use macros::loggable;

loggable! {
    TaskLog {
        #[error("Profile {profile_id} queued by {triggered_by}")]
        Enqueued { profile_id: i64, triggered_by: String } => tracing::Level::INFO,

        #[error("Profile {profile_id} is already queued or running")]
        DuplicateRejected { profile_id: i64 } => tracing::Level::DEBUG,

        #[error("Profile {profile_id} finished: {status} ({message})")]
        RunFinished { profile_id: i64, status: String, message: String } => tracing::Level::INFO,

        #[error("System task {task} is already running")]
        SystemTaskBusy { task: String } => tracing::Level::WARN,

        #[error("System task {task} finished: {status} ({message})")]
        SystemTaskFinished { task: String, status: String, message: String } => tracing::Level::INFO,
    }
}
