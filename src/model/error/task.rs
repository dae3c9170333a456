use macros::traceable;

traceable! {
    TaskError {
        #[no_source]
        #[error("Source path does not exist")]
        SourceNotFound => tracing::Level::ERROR,

        #[no_source]
        #[error("Destination cannot be inside source")]
        DestinationInsideSource => tracing::Level::ERROR,

        #[no_source]
        #[error("Missing local_backup_dir")]
        MissingLocalBackupDir => tracing::Level::ERROR,

        #[no_source]
        #[error("No SSH servers configured")]
        NoServersConfigured => tracing::Level::ERROR,

        #[no_source]
        #[error("Unknown task type")]
        UnknownTaskType => tracing::Level::ERROR,

        #[no_source]
        #[error("Profile not found: {profile_id}")]
        ProfileNotFound { profile_id: i64 } => tracing::Level::WARN,
    }
}
