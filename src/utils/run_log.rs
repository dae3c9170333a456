use chrono::Utc;
use std::sync::{Mutex, PoisonError};
use tracing::info;

/// Timestamped lines collected while a job executes.
/// The joined text is persisted with the finished run.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Mutex<Vec<String>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, message: impl AsRef<str>) {
        let message = message.as_ref();
        info!(target: "run", "{message}");
        let line = format!("{} {message}", Utc::now().format("%Y-%m-%dT%H:%M:%SZ"));
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|line| line.contains(fragment))
    }
}

#[cfg(test)]
mod tests {
    use super::RunLog;

    #[test]
    fn lines_are_timestamped_and_joined() {
        let run_log = RunLog::new();
        run_log.log("first");
        run_log.log(String::from("second"));

        let lines = run_log.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("Z first"));
        assert!(run_log.text().contains("\n"));
        assert!(run_log.contains("second"));
    }
}
