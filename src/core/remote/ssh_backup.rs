use crate::core::backup::exclusion::ExcludeMatcher;
use crate::core::remote::command;
use crate::interface::remote_session::{
    CommandOutput, RemoteConnector, RemoteFileKind, RemoteSession,
};
use crate::interface::system_task::SystemTaskHandler;
use crate::model::error::io::IOError;
use crate::model::error::misc::MiscError;
use crate::model::error::task::TaskError;
use crate::model::error::Error;
use crate::model::outcome::JobOutcome;
use crate::model::ssh_config::{ServerConfig, SshConfig};
use crate::platform::constants::{BACKUP_TIMESTAMP_FORMAT, REMOTE_SCRATCH_DIR};
use crate::utils::path::expand_home;
use crate::utils::run_log::RunLog;
use chrono::Utc;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Pulls configured paths from every enabled server into
/// `<local_backup_dir>/<server>/<timestamp>/`. The first failing server
/// ends the job.
pub struct SshBackup {
    connector: Arc<dyn RemoteConnector>,
}

impl SshBackup {
    pub fn new(connector: Arc<dyn RemoteConnector>) -> Self {
        Self { connector }
    }

    pub fn backup(&self, config: &SshConfig, run_log: &RunLog) -> Result<JobOutcome, Error> {
        if config.servers.is_empty() {
            run_log.log("No SSH servers configured");
            return Err(TaskError::NoServersConfigured.into());
        }
        if config.local_backup_dir.trim().is_empty() {
            run_log.log("Missing local_backup_dir");
            return Err(TaskError::MissingLocalBackupDir.into());
        }

        let local_base = expand_home(config.local_backup_dir.trim());
        fs::create_dir_all(&local_base)
            .map_err(|err| IOError::CreateDirectoryFailed(&local_base, err))?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();

        for server in config.servers.iter().filter(|server| server.enabled) {
            let outcome = self.backup_server(server, &local_base, &config.exclude_patterns, &timestamp, run_log);
            if !outcome.is_success() {
                return Ok(outcome);
            }
        }
        run_log.log("SSH backups completed");
        Ok(JobOutcome::success("SSH backups completed"))
    }

    fn backup_server(
        &self,
        server: &ServerConfig,
        local_base: &Path,
        global_excludes: &[String],
        timestamp: &str,
        run_log: &RunLog,
    ) -> JobOutcome {
        let name = server.display_name();
        run_log.log(format!("Starting SSH backup for {name} ({}:{})", server.host, server.port));

        let mut session = match self.connector.connect(server, run_log) {
            Ok(session) => session,
            Err(err) => {
                run_log.log(err.to_string());
                return JobOutcome::failed(format!("SSH connect failed for {name}"));
            }
        };

        let backup_dir = local_base.join(command::sanitize(name)).join(timestamp);
        let exclude_patterns = server.effective_excludes(global_excludes);
        let outcome = ServerBackup {
            session: session.as_mut(),
            server,
            backup_dir,
            exclusion: ExcludeMatcher::new(&exclude_patterns),
            exclude_patterns,
            timestamp,
            run_log,
            download_errors: 0,
        }
        .execute();
        session.close();
        outcome
    }
}

impl SystemTaskHandler for SshBackup {
    fn run(&self, config: &Value, run_log: &RunLog) -> Result<JobOutcome, Error> {
        let config = parse_config(config)?;
        self.backup(&config, run_log)
    }
}

fn parse_config(value: &Value) -> Result<SshConfig, Error> {
    if value.is_null() {
        return Ok(SshConfig::default());
    }
    let config = serde_json::from_value(value.clone()).map_err(MiscError::DeserializeError)?;
    Ok(config)
}

/// One server's share of the job, run over an already authenticated session.
struct ServerBackup<'a> {
    session: &'a mut dyn RemoteSession,
    server: &'a ServerConfig,
    backup_dir: PathBuf,
    exclusion: ExcludeMatcher,
    exclude_patterns: Vec<String>,
    timestamp: &'a str,
    run_log: &'a RunLog,
    download_errors: usize,
}

impl ServerBackup<'_> {
    fn execute(&mut self) -> JobOutcome {
        let name = self.server.display_name().to_string();

        if !self.run_pre_commands() {
            return JobOutcome::failed(format!("Pre-commands failed for {name}"));
        }
        if let Err(err) = fs::create_dir_all(&self.backup_dir) {
            self.run_log
                .log(IOError::CreateDirectoryFailed(&self.backup_dir, err).to_string());
            return JobOutcome::failed(format!("Failed to create backup directory for {name}"));
        }

        let remote_paths: Vec<String> = self
            .server
            .remote_paths
            .iter()
            .map(|path| path.trim().to_string())
            .filter(|path| !path.is_empty())
            .collect();
        for remote_path in remote_paths {
            let succeeded = if self.server.use_compression {
                self.backup_archive(&remote_path)
            } else {
                self.backup_raw(&remote_path)
            };
            if !succeeded {
                return JobOutcome::failed(format!("Failed to backup {remote_path}"));
            }
        }

        self.run_log.log(format!("SSH backup finished for {name}"));
        JobOutcome::success(format!("SSH backup finished for {name}"))
    }

    fn sudo_input(&self, use_sudo: bool) -> Option<String> {
        let password = self.server.sudo_password();
        (use_sudo && !password.is_empty()).then(|| format!("{password}\n"))
    }

    fn exec(
        &mut self,
        shell_command: &str,
        use_sudo: bool,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, Error> {
        let input = self.sudo_input(use_sudo);
        self.session
            .exec(&command::elevate(shell_command, use_sudo), input.as_deref(), timeout)
    }

    fn run_pre_commands(&mut self) -> bool {
        for pre_command in self.server.resolved_pre_commands() {
            self.run_log.log(format!("Running pre-command: {}", pre_command.command));
            match self.exec(&pre_command.command, pre_command.use_sudo, Some(pre_command.timeout)) {
                Ok(output) if output.succeeded() => {}
                Ok(output) => {
                    self.run_log.log(format!(
                        "Pre-command failed with status {}: {} {}",
                        output.exit_status,
                        pre_command.command,
                        output.stderr.trim()
                    ));
                    return false;
                }
                Err(err) => {
                    self.run_log.log(err.to_string());
                    return false;
                }
            }
        }
        true
    }

    fn backup_archive(&mut self, remote_path: &str) -> bool {
        let base = command::base_name(remote_path);
        let remote_archive = format!(
            "{REMOTE_SCRATCH_DIR}/backup_{}_{}_{}.tar.gz",
            command::sanitize(self.server.display_name()),
            self.timestamp,
            command::sanitize(&base),
        );
        let local_archive = self
            .backup_dir
            .join(format!("{}_{}.tar.gz", command::sanitize(&base), self.timestamp));

        self.run_log.log(format!("Archiving {remote_path}"));
        let archive_command = command::archive(remote_path, &remote_archive, &self.exclude_patterns);
        match self.exec(&archive_command, self.server.use_sudo, None) {
            Ok(output) if output.succeeded() => {}
            Ok(output) => {
                self.run_log.log(format!(
                    "Archive of {remote_path} failed with status {}",
                    output.exit_status
                ));
                self.remove_remote(&remote_archive);
                return false;
            }
            Err(err) => {
                self.run_log.log(err.to_string());
                self.remove_remote(&remote_archive);
                return false;
            }
        }

        let fetched = self.fetch_archive(&remote_archive, &local_archive);
        self.remove_remote(&remote_archive);
        if fetched {
            self.run_log.log(format!("Saved {}", local_archive.display()));
        }
        fetched
    }

    fn fetch_archive(&mut self, remote_archive: &str, local_archive: &Path) -> bool {
        let err = match self.session.download(remote_archive, local_archive) {
            Ok(()) => return true,
            Err(err) => err,
        };
        self.run_log.log(err.to_string());
        if !self.server.use_sudo {
            return false;
        }

        self.run_log.log(format!("Retrying download of {remote_archive} with sudo"));
        match self.sudo_read(remote_archive) {
            Some(data) => match fs::write(local_archive, data) {
                Ok(()) => true,
                Err(err) => {
                    self.run_log
                        .log(IOError::WriteFileFailed(local_archive, err).to_string());
                    false
                }
            },
            None => false,
        }
    }

    fn sudo_read(&mut self, remote_path: &str) -> Option<Vec<u8>> {
        match self.exec(&command::cat(remote_path), true, None) {
            Ok(output) if output.succeeded() && !output.stdout.is_empty() => Some(output.stdout),
            Ok(_) => {
                self.run_log.log(format!("sudo read of {remote_path} returned nothing"));
                None
            }
            Err(err) => {
                self.run_log.log(err.to_string());
                None
            }
        }
    }

    fn remove_remote(&mut self, remote_path: &str) {
        match self.exec(&command::remove(remote_path), self.server.use_sudo, None) {
            Ok(output) if output.succeeded() => {}
            Ok(output) => self.run_log.log(format!(
                "Could not remove {remote_path}: {}",
                output.stderr.trim()
            )),
            Err(err) => self.run_log.log(err.to_string()),
        }
    }

    fn backup_raw(&mut self, remote_path: &str) -> bool {
        let kind = match self.session.stat(remote_path) {
            Ok(kind) => kind,
            Err(err) => {
                self.run_log.log(err.to_string());
                if !self.server.use_sudo || !self.sudo_exists(remote_path) {
                    return false;
                }
                // Exists behind a permission wall. Listing decides whether it is readable.
                RemoteFileKind::Directory
            }
        };

        let local_path = self.backup_dir.join(command::sanitize(&command::base_name(remote_path)));
        match kind {
            RemoteFileKind::Directory => {
                self.download_errors = 0;
                if let Err(err) = self.download_directory(remote_path, &local_path) {
                    self.run_log.log(err.to_string());
                    return false;
                }
                if self.download_errors > 0 {
                    self.run_log.log(format!(
                        "{} items under {remote_path} could not be downloaded",
                        self.download_errors
                    ));
                    return false;
                }
                true
            }
            RemoteFileKind::File => self.download_file(remote_path, &local_path),
        }
    }

    fn sudo_exists(&mut self, remote_path: &str) -> bool {
        match self.exec(&command::exists(remote_path), true, None) {
            Ok(output) => String::from_utf8_lossy(&output.stdout).trim() == "yes",
            Err(err) => {
                self.run_log.log(err.to_string());
                false
            }
        }
    }

    /// Listing failure of `remote_dir` itself is returned, failures below it are counted.
    fn download_directory(&mut self, remote_dir: &str, local_dir: &Path) -> Result<(), Error> {
        fs::create_dir_all(local_dir).map_err(|err| IOError::CreateDirectoryFailed(local_dir, err))?;
        let entries = self.session.list_directory(remote_dir)?;
        for entry in entries {
            let remote_item = command::join_remote(remote_dir, &entry.name);
            if self.exclusion.is_excluded(&remote_item) {
                continue;
            }
            let local_item = local_dir.join(&entry.name);
            match entry.kind {
                RemoteFileKind::Directory => {
                    if let Err(err) = self.download_directory(&remote_item, &local_item) {
                        self.run_log.log(err.to_string());
                        self.download_errors += 1;
                    }
                }
                RemoteFileKind::File => {
                    if !self.download_file(&remote_item, &local_item) {
                        self.download_errors += 1;
                    }
                }
            }
        }
        Ok(())
    }

    fn download_file(&mut self, remote_path: &str, local_path: &Path) -> bool {
        match self.session.download(remote_path, local_path) {
            Ok(()) => true,
            Err(err) => {
                self.run_log.log(err.to_string());
                false
            }
        }
    }
}
