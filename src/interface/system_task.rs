use crate::model::error::Error;
use crate::model::outcome::JobOutcome;
use crate::utils::run_log::RunLog;
use serde_json::Value;

/// Body of a system task. Runs on a blocking thread with the task's JSON settings.
pub trait SystemTaskHandler: Send + Sync {
    fn run(&self, config: &Value, run_log: &RunLog) -> Result<JobOutcome, Error>;
}
