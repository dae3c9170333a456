use macros::loggable;

loggable! {
    DatabaseLog {
        #[error("Connected to database successfully")]
        DatabaseConnectSuccess => tracing::Level::INFO,

        #[error("Marked {count} interrupted runs as failed")]
        InterruptedRunsFailed { count: u64 } => tracing::Level::WARN,
    }
}
