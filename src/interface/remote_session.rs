use crate::model::error::Error;
use crate::model::ssh_config::ServerConfig;
use crate::utils::run_log::RunLog;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_status: i32,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_status == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFileKind {
    Directory,
    File,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub name: String,
    pub kind: RemoteFileKind,
}

/// An authenticated connection to one server: a command channel plus a file
/// transfer sub-session.
pub trait RemoteSession {
    /// `stdin` is written and closed right after the command starts.
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, Error>;
    fn stat(&mut self, path: &str) -> Result<RemoteFileKind, Error>;
    fn list_directory(&mut self, path: &str) -> Result<Vec<RemoteEntry>, Error>;
    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<(), Error>;
    fn close(&mut self);
}

pub trait RemoteConnector: Send + Sync {
    fn connect(&self, server: &ServerConfig, run_log: &RunLog) -> Result<Box<dyn RemoteSession>, Error>;
}
