use crate::model::error::io::IOError;
use crate::model::error::Error;
use crate::utils::run_log::RunLog;
use std::fs;
use std::path::Path;

/// Keeps the `keep` newest timestamped directories under `destination_base`.
/// Directory names sort chronologically. Returns how many were removed.
pub fn apply_retention(destination_base: &Path, keep: usize, run_log: &RunLog) -> Result<usize, Error> {
    if keep == 0 {
        return Ok(0);
    }

    let entries = fs::read_dir(destination_base)
        .map_err(|err| IOError::ReadDirectoryFailed(destination_base, err))?;
    let mut snapshots: Vec<_> = entries
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_ok_and(|file_type| file_type.is_dir()))
        .map(|entry| entry.file_name())
        .collect();
    snapshots.sort();

    let excess = snapshots.len().saturating_sub(keep);
    let mut removed = 0;
    for name in snapshots.into_iter().take(excess) {
        let path = destination_base.join(&name);
        match fs::remove_dir_all(&path) {
            Ok(()) => {
                run_log.log(format!("Removed old backup: {}", path.display()));
                removed += 1;
            }
            Err(err) => run_log.log(IOError::DeleteDirectoryFailed(&path, err).to_string()),
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::apply_retention;
    use crate::utils::run_log::RunLog;
    use std::fs;

    #[test]
    fn oldest_snapshots_are_removed() {
        let dir = tempfile::tempdir().expect("tempdir");
        for name in ["20240101-020000", "20240103-020000", "20240102-020000"] {
            fs::create_dir(dir.path().join(name)).expect("mkdir");
        }
        fs::write(dir.path().join("notes.txt"), b"kept").expect("write");

        let run_log = RunLog::new();
        let removed = apply_retention(dir.path(), 2, &run_log).expect("retention");

        assert_eq!(removed, 1);
        assert!(!dir.path().join("20240101-020000").exists());
        assert!(dir.path().join("20240102-020000").exists());
        assert!(dir.path().join("20240103-020000").exists());
        assert!(dir.path().join("notes.txt").exists());
        assert!(run_log.contains("Removed old backup"));
    }

    #[test]
    fn five_snapshots_keep_the_two_newest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let names = [
            "20240101-000000",
            "20240102-000000",
            "20240103-000000",
            "20240104-000000",
            "20240105-000000",
        ];
        for name in names {
            fs::create_dir(dir.path().join(name)).expect("mkdir");
        }

        let removed = apply_retention(dir.path(), 2, &RunLog::new()).expect("retention");
        assert_eq!(removed, 3);

        let mut remaining: Vec<String> = fs::read_dir(dir.path())
            .expect("read")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        remaining.sort();
        assert_eq!(remaining, vec!["20240104-000000", "20240105-000000"]);
    }

    #[test]
    fn zero_keeps_everything() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("20240101-020000")).expect("mkdir");
        assert_eq!(apply_retention(dir.path(), 0, &RunLog::new()).expect("retention"), 0);
        assert!(dir.path().join("20240101-020000").exists());
    }
}
