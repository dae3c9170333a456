use crate::core::backup::exclusion::ExcludeMatcher;
use crate::core::backup::retention::apply_retention;
use crate::core::backup::verifier::verify_tree;
use crate::model::error::io::IOError;
use crate::model::error::task::TaskError;
use crate::model::error::Error;
use crate::model::hash_type::HashType;
use crate::model::outcome::JobOutcome;
use crate::model::profile::{Profile, VerifyMode};
use crate::platform::attributes::copy_attributes;
use crate::platform::constants::BACKUP_TIMESTAMP_FORMAT;
use crate::utils::path::{expand_home, resolve};
use crate::utils::run_log::RunLog;
use chrono::Utc;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CopySummary {
    pub copied: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Copies a profile's source tree into a fresh timestamped directory, then
/// verifies the copy and prunes old snapshots.
pub struct LocalBackup {
    hash_type: HashType,
}

impl LocalBackup {
    pub fn new(hash_type: HashType) -> Self {
        Self { hash_type }
    }

    pub fn run(&self, profile: &Profile, run_log: &RunLog) -> Result<JobOutcome, Error> {
        let source = expand_home(&profile.source_path);
        let destination_base = profile.destination_base();

        if !source.exists() {
            run_log.log(format!("Source does not exist: {}", source.display()));
            return Err(TaskError::SourceNotFound.into());
        }
        ensure_outside_source(&source, &destination_base, run_log)?;
        fs::create_dir_all(&destination_base)
            .map_err(|err| IOError::CreateDirectoryFailed(&destination_base, err))?;

        let exclusion = ExcludeMatcher::new(&profile.exclude_patterns);
        for rejected in exclusion.rejected() {
            run_log.log(rejected.to_string());
        }

        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let destination_root = destination_base.join(timestamp);
        run_log.log(format!(
            "Starting backup: {} -> {}",
            source.display(),
            destination_root.display()
        ));

        let summary = copy_tree(&source, &destination_root, &exclusion, run_log);

        let mismatches = if profile.verify_mode == VerifyMode::None {
            0
        } else {
            run_log.log(format!("Verifying files using {}", profile.verify_mode.as_str()));
            verify_tree(
                &source,
                &destination_root,
                &exclusion,
                profile.verify_mode,
                self.hash_type,
                run_log,
            )
        };

        if profile.retention_count > 0 {
            let keep = usize::try_from(profile.retention_count).unwrap_or(usize::MAX);
            if let Err(err) = apply_retention(&destination_base, keep, run_log) {
                run_log.log(err.to_string());
            }
        }

        let outcome = if summary.errors > 0 || mismatches > 0 {
            JobOutcome::failed(format!(
                "Completed with {} errors and {} mismatches",
                summary.errors, mismatches
            ))
        } else {
            JobOutcome::success(format!(
                "Completed: {} files copied, {} skipped",
                summary.copied, summary.skipped
            ))
        };
        run_log.log(&outcome.message);
        Ok(outcome)
    }
}

fn ensure_outside_source(source: &Path, destination: &Path, run_log: &RunLog) -> Result<(), Error> {
    let source = resolve(source).map_err(|err| IOError::ResolvePathFailed(source, err))?;
    let destination =
        resolve(destination).map_err(|err| IOError::ResolvePathFailed(destination, err))?;
    if destination.starts_with(&source) {
        run_log.log(format!(
            "Destination {} is inside source {}",
            destination.display(),
            source.display()
        ));
        return Err(TaskError::DestinationInsideSource.into());
    }
    Ok(())
}

/// Walks `source` without following directory symlinks. Excluded directories
/// are pruned whole. Per-entry failures are logged and counted.
pub fn copy_tree(
    source: &Path,
    destination_root: &Path,
    exclusion: &ExcludeMatcher,
    run_log: &RunLog,
) -> CopySummary {
    let mut summary = CopySummary::default();

    if let Err(err) = fs::create_dir_all(destination_root) {
        run_log.log(IOError::CreateDirectoryFailed(destination_root, err).to_string());
        summary.errors += 1;
        return summary;
    }

    let mut walker = WalkDir::new(source).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                run_log.log(format!("Cannot read entry: {err}"));
                summary.errors += 1;
                continue;
            }
        };
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        if relative.as_os_str().is_empty() {
            continue;
        }

        if exclusion.is_excluded(relative) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            summary.skipped += 1;
            continue;
        }

        let target = destination_root.join(relative);
        if entry.file_type().is_dir() {
            if let Err(err) = fs::create_dir_all(&target) {
                run_log.log(IOError::CreateDirectoryFailed(&target, err).to_string());
                summary.errors += 1;
                walker.skip_current_dir();
            }
            continue;
        }
        // Symlinked directories are not descended into; symlinked files are copied by content.
        if !entry.path().is_file() {
            continue;
        }

        match fs::copy(entry.path(), &target) {
            Ok(_) => {
                if let Err(err) = copy_attributes(entry.path(), &target) {
                    run_log.log(err.to_string());
                }
                summary.copied += 1;
            }
            Err(err) => {
                run_log.log(IOError::CopyFileFailed(entry.path(), &target, err).to_string());
                summary.errors += 1;
            }
        }
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::LocalBackup;
    use crate::model::error::task::TaskError;
    use crate::model::error::Error;
    use crate::model::hash_type::HashType;
    use crate::model::profile::{Profile, VerifyMode};
    use crate::model::run::RunStatus;
    use crate::utils::run_log::RunLog;
    use std::fs;
    use std::path::Path;

    fn snapshots(base: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(base)
            .expect("read base")
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn excluded_entries_are_skipped_and_counted() {
        let source = tempfile::tempdir().expect("source");
        let destination = tempfile::tempdir().expect("destination");
        fs::write(source.path().join("a.txt"), b"alpha").expect("write");
        fs::write(source.path().join("b.tmp"), b"beta").expect("write");
        fs::create_dir(source.path().join("logs")).expect("mkdir");
        fs::write(source.path().join("logs/x.log"), b"log").expect("write");

        let mut profile = Profile::new("docs", source.path(), destination.path());
        profile.exclude_patterns = vec!["*.tmp".to_string(), "logs".to_string()];
        profile.verify_mode = VerifyMode::Hash;

        let run_log = RunLog::new();
        let outcome = LocalBackup::new(HashType::SHA256)
            .run(&profile, &run_log)
            .expect("run");

        assert_eq!(outcome.status, RunStatus::Success);
        assert_eq!(outcome.message, "Completed: 1 files copied, 2 skipped");

        let base = destination.path().join("docs");
        let names = snapshots(&base);
        assert_eq!(names.len(), 1);
        let snapshot = base.join(&names[0]);
        assert_eq!(fs::read(snapshot.join("a.txt")).expect("copy"), b"alpha");
        assert!(!snapshot.join("b.tmp").exists());
        assert!(!snapshot.join("logs").exists());
        assert!(run_log.contains("Verifying files using hash"));
    }

    #[test]
    fn nested_directories_and_metadata_are_preserved() {
        let source = tempfile::tempdir().expect("source");
        let destination = tempfile::tempdir().expect("destination");
        fs::create_dir_all(source.path().join("a/b/c")).expect("mkdir");
        fs::write(source.path().join("a/b/c/deep.txt"), b"deep").expect("write");
        fs::create_dir(source.path().join("empty")).expect("mkdir");

        let profile = Profile::new("tree", source.path(), destination.path());
        let outcome = LocalBackup::new(HashType::SHA256)
            .run(&profile, &RunLog::new())
            .expect("run");
        assert!(outcome.is_success());

        let base = destination.path().join("tree");
        let snapshot = base.join(&snapshots(&base)[0]);
        assert!(snapshot.join("empty").is_dir());

        let original = fs::metadata(source.path().join("a/b/c/deep.txt")).expect("meta");
        let copy = fs::metadata(snapshot.join("a/b/c/deep.txt")).expect("meta");
        assert_eq!(original.len(), copy.len());
        assert_eq!(original.modified().expect("mtime"), copy.modified().expect("mtime"));
    }

    #[test]
    fn missing_source_fails_without_creating_destination() {
        let destination = tempfile::tempdir().expect("destination");
        let profile = Profile::new("gone", destination.path().join("absent"), destination.path());

        let run_log = RunLog::new();
        let result = LocalBackup::new(HashType::SHA256).run(&profile, &run_log);

        assert!(matches!(result, Err(Error::Task(TaskError::SourceNotFound))));
        assert!(!destination.path().join("gone").exists());
    }

    #[test]
    fn destination_inside_source_is_refused_before_touching_files() {
        let source = tempfile::tempdir().expect("source");
        fs::write(source.path().join("a.txt"), b"alpha").expect("write");
        let profile = Profile::new("loop", source.path(), source.path().join("backups"));

        let result = LocalBackup::new(HashType::SHA256).run(&profile, &RunLog::new());

        assert!(matches!(
            result,
            Err(Error::Task(TaskError::DestinationInsideSource))
        ));
        assert!(!source.path().join("backups").exists());
    }

    #[test]
    fn destination_equal_to_source_is_refused() {
        let source = tempfile::tempdir().expect("source");
        let profile = Profile::new("", source.path(), source.path());

        let result = LocalBackup::new(HashType::SHA256).run(&profile, &RunLog::new());
        assert!(matches!(
            result,
            Err(Error::Task(TaskError::DestinationInsideSource))
        ));
    }

    #[test]
    fn retention_prunes_older_snapshots() {
        let source = tempfile::tempdir().expect("source");
        let destination = tempfile::tempdir().expect("destination");
        fs::write(source.path().join("a.txt"), b"alpha").expect("write");
        let base = destination.path().join("kept");
        for name in ["20200101-000000", "20200102-000000", "20200103-000000"] {
            fs::create_dir_all(base.join(name)).expect("mkdir");
        }

        let mut profile = Profile::new("kept", source.path(), destination.path());
        profile.retention_count = 2;
        let outcome = LocalBackup::new(HashType::SHA256)
            .run(&profile, &RunLog::new())
            .expect("run");
        assert!(outcome.is_success());

        let names = snapshots(&base);
        assert_eq!(names.len(), 2);
        assert_eq!(names[0], "20200103-000000");
        assert!(names[1].as_str() > "20200103-000000");
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_file_fails_the_run() {
        use std::os::unix::fs::PermissionsExt;

        let source = tempfile::tempdir().expect("source");
        let destination = tempfile::tempdir().expect("destination");
        let locked = source.path().join("locked.txt");
        fs::write(&locked, b"secret").expect("write");
        fs::write(source.path().join("open.txt"), b"open").expect("write");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");
        if fs::read(&locked).is_ok() {
            // Privileged users can read anything, nothing to assert.
            return;
        }

        let mut profile = Profile::new("partial", source.path(), destination.path());
        profile.verify_mode = VerifyMode::None;
        let outcome = LocalBackup::new(HashType::SHA256)
            .run(&profile, &RunLog::new())
            .expect("run");

        assert!(!outcome.is_success());
        assert_eq!(outcome.message, "Completed with 1 errors and 0 mismatches");
    }
}
