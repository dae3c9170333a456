use std::env;
use std::path::{Component, Path, PathBuf};

/// Replaces a leading `~` with the home directory of the current user.
pub fn expand_home(path: impl AsRef<Path>) -> PathBuf {
    let path = path.as_ref();
    let Ok(rest) = path.strip_prefix("~") else {
        return path.to_path_buf();
    };
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(rest),
        None => path.to_path_buf(),
    }
}

/// Resolves symlinks of the longest existing ancestor and lexically
/// normalizes whatever does not exist yet.
pub fn resolve(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir()?.join(path)
    };

    let mut existing = absolute.as_path();
    let mut pending = Vec::new();
    // `..` is kept as a pending component; `file_name` would stop the walk on it.
    while !existing.exists() {
        match (existing.parent(), existing.components().next_back()) {
            (Some(parent), Some(last)) => {
                pending.push(last.as_os_str().to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut resolved = existing.canonicalize()?;
    for name in pending.into_iter().rev() {
        resolved.push(name);
    }
    Ok(normalize(&resolved))
}

fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::{expand_home, resolve};
    use std::fs;
    use std::path::Path;

    #[test]
    fn plain_paths_are_untouched() {
        assert_eq!(expand_home("/srv/data"), Path::new("/srv/data"));
        assert_eq!(expand_home("relative/~x"), Path::new("relative/~x"));
    }

    #[test]
    fn tilde_uses_home() {
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expand_home("~/backups"), Path::new(&home).join("backups"));
        }
    }

    #[test]
    fn resolve_handles_missing_tail() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("src")).expect("mkdir");
        let root = dir.path().canonicalize().expect("canonical");

        let resolved = resolve(&dir.path().join("src/new/../other")).expect("resolve");
        assert_eq!(resolved, root.join("src/other"));
    }

    #[test]
    fn resolve_climbs_out_of_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("src")).expect("mkdir");
        let root = dir.path().canonicalize().expect("canonical");

        let resolved = resolve(&dir.path().join("src/a/b/../../..")).expect("resolve");
        assert_eq!(resolved, root);
        let resolved = resolve(&dir.path().join("missing/../src/inner")).expect("resolve");
        assert_eq!(resolved, root.join("src/inner"));
    }
}
