use crate::model::config::Config;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use crate::model::error::Error;
use crate::platform::constants::LOG_FILE_NAME;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Holds the background writer of the log file alive for the process lifetime.
pub struct Logging {
    _guard: WorkerGuard,
}

impl Logging {
    pub fn initialize(config: &Config) -> Result<Self, Error> {
        fs::create_dir_all(&config.log_directory)
            .map_err(|err| IOError::CreateDirectoryFailed(&config.log_directory, err))?;

        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log_level))
            .map_err(SystemError::LoggerInitFailed)?;

        let file_appender = tracing_appender::rolling::daily(&config.log_directory, LOG_FILE_NAME);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .with(fmt::layer().with_ansi(false).with_writer(file_writer))
            .try_init()
            .map_err(SystemError::LoggerInitFailed)?;

        log_panics::init();

        Ok(Self { _guard: guard })
    }
}
