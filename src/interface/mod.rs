pub mod core;
pub mod remote_session;
pub mod repository;
pub mod system_task;
