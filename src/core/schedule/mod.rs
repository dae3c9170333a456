pub mod due_policy;
pub mod scheduler;
