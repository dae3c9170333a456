use crate::model::run::RunStatus;

/// Terminal result of one job, persisted as the `(status, message)` pair of its run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub status: RunStatus,
    pub message: String,
}

impl JobOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Success,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}
