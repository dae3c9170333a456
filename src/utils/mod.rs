pub mod file_hash;
pub mod logging;
pub mod path;
pub mod run_log;
