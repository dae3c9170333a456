use crate::model::error::misc::MiscError;
use globset::{Glob, GlobSet, GlobSetBuilder};
use macros::log;
use std::path::Path;

/// Shell-style exclusion rules. A path is excluded when any pattern matches
/// either the whole relative path or just its final component.
pub struct ExcludeMatcher {
    globset: GlobSet,
    rejected: Vec<MiscError>,
}

impl ExcludeMatcher {
    /// Invalid patterns are logged and ignored.
    pub fn new(patterns: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        let mut rejected = Vec::new();
        for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(err) => {
                    let err = MiscError::InvalidPattern(pattern, err);
                    log!(err);
                    rejected.push(err);
                }
            }
        }
        let globset = builder.build().unwrap_or_else(|_| GlobSet::empty());
        Self { globset, rejected }
    }

    pub fn rejected(&self) -> &[MiscError] {
        &self.rejected
    }

    pub fn is_excluded(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return false;
        }
        self.globset.is_match(path)
            || path
                .file_name()
                .is_some_and(|name| self.globset.is_match(Path::new(name)))
    }
}

#[cfg(test)]
mod tests {
    use super::ExcludeMatcher;

    fn matcher(patterns: &[&str]) -> ExcludeMatcher {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        ExcludeMatcher::new(&patterns)
    }

    #[test]
    fn base_name_and_relative_path_both_match() {
        let matcher = matcher(&["*.tmp", "logs", "cache/*"]);
        assert!(matcher.is_excluded("a.tmp"));
        assert!(matcher.is_excluded("deep/nested/b.tmp"));
        assert!(matcher.is_excluded("logs"));
        assert!(matcher.is_excluded("app/logs"));
        assert!(matcher.is_excluded("cache/index"));
        assert!(!matcher.is_excluded("data/readme.md"));
        assert!(!matcher.is_excluded("logs.txt"));
    }

    #[test]
    fn star_crosses_separators_like_shell_matching() {
        let matcher = matcher(&["/var/log/*"]);
        assert!(matcher.is_excluded("/var/log/nginx/access.log"));
        assert!(!matcher.is_excluded("/var/lib/x"));
    }

    #[test]
    fn invalid_patterns_are_skipped() {
        let matcher = matcher(&["[unclosed", "*.bak", "  "]);
        assert_eq!(matcher.rejected().len(), 1);
        assert!(matcher.is_excluded("old.bak"));
        assert!(!matcher.is_excluded("[unclosed"));
    }

    #[test]
    fn empty_path_is_never_excluded() {
        assert!(!matcher(&["*"]).is_excluded(""));
    }
}
