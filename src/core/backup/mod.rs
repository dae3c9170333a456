pub mod backup_queue;
pub mod exclusion;
pub mod local_backup;
pub mod retention;
pub mod verifier;
