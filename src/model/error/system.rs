use macros::traceable;

traceable! {
    SystemError {
        #[error("Failed to read configuration: {err}")]
        ConfigReadFailed => tracing::Level::ERROR,

        #[error("Invalid configuration: {err}")]
        InvalidConfig => tracing::Level::ERROR,

        #[error("Failed to initialize logging: {err}")]
        LoggerInitFailed => tracing::Level::ERROR,

        #[error("Unexpected error: {err}")]
        ThreadPanic => tracing::Level::ERROR,

        #[error("Failed to listen for shutdown signal: {err}")]
        ShutdownSignalFailed => tracing::Level::ERROR,
    }
}
