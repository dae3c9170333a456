pub mod command;
pub mod ssh_backup;
pub mod ssh_session;
