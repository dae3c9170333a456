//! Shell command builders for the remote side. Every interpolated value is
//! single-quoted so paths with spaces or quotes reach the remote shell intact.

/// POSIX single-quote escaping.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r#"'"'"'"#))
}

/// Runs `command` through `sudo -S`, which reads the password from stdin.
pub fn elevate(command: &str, use_sudo: bool) -> String {
    if use_sudo {
        format!("sudo -S -p '' sh -c {}", quote(command))
    } else {
        command.to_string()
    }
}

/// Splits a remote path into its parent directory and final component.
/// Trailing slashes are ignored and the root itself has an empty base.
pub fn split_remote_path(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        return ("/".to_string(), String::new());
    }
    match trimmed.rfind('/') {
        Some(0) => ("/".to_string(), trimmed[1..].to_string()),
        Some(index) => (trimmed[..index].to_string(), trimmed[index + 1..].to_string()),
        None => (".".to_string(), trimmed.to_string()),
    }
}

/// Name used for local artifacts of a remote path, `root` for `/`.
pub fn base_name(path: &str) -> String {
    let (_, base) = split_remote_path(path);
    if base.is_empty() {
        "root".to_string()
    } else {
        base
    }
}

pub fn join_remote(parent: &str, name: &str) -> String {
    format!("{}/{}", parent.trim_end_matches('/'), name)
}

/// Keeps a value usable as a single file name component.
pub fn sanitize(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Gzipped tarball of `remote_path`, created from its parent so the archive
/// holds a single top-level entry.
pub fn archive(remote_path: &str, archive_path: &str, excludes: &[String]) -> String {
    let (parent, base) = split_remote_path(remote_path);
    let target = if base.is_empty() { ".".to_string() } else { base };
    let mut command = format!("cd {} && tar -czf {}", quote(&parent), quote(archive_path));
    for pattern in excludes {
        command.push_str(&format!(" --exclude={}", quote(pattern)));
    }
    if target == "." {
        command.push_str(&format!(" --exclude={}", quote(archive_path.trim_start_matches('/'))));
    }
    command.push_str(&format!(" {} 2>/dev/null", quote(&target)));
    command
}

pub fn cat(path: &str) -> String {
    format!("cat {}", quote(path))
}

pub fn remove(path: &str) -> String {
    format!("rm -f {}", quote(path))
}

pub fn exists(path: &str) -> String {
    format!("test -e {} && echo yes", quote(path))
}
