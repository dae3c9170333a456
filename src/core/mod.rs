pub mod backup;
pub mod infrastructure;
pub mod remote;
pub mod schedule;
pub mod system;
pub mod system_task;
