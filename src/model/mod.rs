pub mod config;
pub mod error;
pub mod hash_type;
pub mod log;
pub mod outcome;
pub mod profile;
pub mod queue;
pub mod run;
pub mod setting;
pub mod ssh_config;
