use crate::core::backup::exclusion::ExcludeMatcher;
use crate::model::hash_type::HashType;
use crate::model::profile::VerifyMode;
use crate::utils::file_hash::file_hash;
use crate::utils::run_log::RunLog;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

/// Compares every non-excluded source file with its copy and returns the number of mismatches.
pub fn verify_tree(
    source: &Path,
    destination_root: &Path,
    exclusion: &ExcludeMatcher,
    mode: VerifyMode,
    hash_type: HashType,
    run_log: &RunLog,
) -> usize {
    if mode == VerifyMode::None {
        return 0;
    }

    let mut mismatches = 0;
    let mut walker = WalkDir::new(source).into_iter();
    while let Some(entry) = walker.next() {
        let Ok(entry) = entry else { continue };
        let Ok(relative) = entry.path().strip_prefix(source) else { continue };

        if exclusion.is_excluded(relative) {
            if entry.file_type().is_dir() {
                walker.skip_current_dir();
            }
            continue;
        }
        if entry.file_type().is_dir() || !entry.path().is_file() {
            continue;
        }

        let copy = destination_root.join(relative);
        if !copy.exists() {
            run_log.log(format!("Missing in backup: {}", relative.display()));
            mismatches += 1;
            continue;
        }
        if !matches(entry.path(), &copy, mode, hash_type) {
            run_log.log(format!("Mismatch ({}): {}", mode.as_str(), relative.display()));
            mismatches += 1;
        }
    }
    mismatches
}

fn matches(original: &Path, copy: &Path, mode: VerifyMode, hash_type: HashType) -> bool {
    match mode {
        VerifyMode::None => true,
        VerifyMode::Size => match (fs::metadata(original), fs::metadata(copy)) {
            (Ok(original), Ok(copy)) => original.len() == copy.len(),
            _ => false,
        },
        VerifyMode::Hash => match (file_hash(original, hash_type), file_hash(copy, hash_type)) {
            (Ok(original), Ok(copy)) => original == copy,
            _ => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::verify_tree;
    use crate::core::backup::exclusion::ExcludeMatcher;
    use crate::model::hash_type::HashType;
    use crate::model::profile::VerifyMode;
    use crate::utils::run_log::RunLog;
    use std::fs;

    #[test]
    fn detects_missing_and_altered_copies() {
        let source = tempfile::tempdir().expect("source");
        let copy = tempfile::tempdir().expect("copy");
        fs::write(source.path().join("same.txt"), b"same").expect("write");
        fs::write(source.path().join("altered.txt"), b"abcd").expect("write");
        fs::write(source.path().join("missing.txt"), b"gone").expect("write");
        fs::write(source.path().join("skip.tmp"), b"excluded").expect("write");
        fs::write(copy.path().join("same.txt"), b"same").expect("write");
        fs::write(copy.path().join("altered.txt"), b"abce").expect("write");

        let exclusion = ExcludeMatcher::new(&["*.tmp".to_string()]);
        let run_log = RunLog::new();

        let size = verify_tree(source.path(), copy.path(), &exclusion, VerifyMode::Size, HashType::SHA256, &run_log);
        assert_eq!(size, 1);

        let hash = verify_tree(source.path(), copy.path(), &exclusion, VerifyMode::Hash, HashType::SHA256, &run_log);
        assert_eq!(hash, 2);
        assert!(run_log.contains("Missing in backup: missing.txt"));

        let none = verify_tree(source.path(), copy.path(), &exclusion, VerifyMode::None, HashType::SHA256, &run_log);
        assert_eq!(none, 0);
    }
}
