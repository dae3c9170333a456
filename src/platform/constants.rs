use std::time::Duration;

pub const CONFIG_PATH: &str = "./config.toml";
pub const LOG_FILE_NAME: &str = "backup-sphere.log";

pub const SCHEDULER_INTERVAL: Duration = Duration::from_secs(30);
pub const RETRY_BACKOFF_SECONDS: i64 = 3600;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(3600);
pub const COMMAND_POLL_INTERVAL: Duration = Duration::from_millis(20);

pub const HASH_BUFFER_SIZE: usize = 1024 * 1024;

// Sorting these names lexicographically orders them chronologically.
pub const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
pub const SCHEDULE_TIME_FORMAT: &str = "%H:%M";

pub const REMOTE_SCRATCH_DIR: &str = "/tmp";
pub const RUN_LIST_LIMIT: i64 = 50;
