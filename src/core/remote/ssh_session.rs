use crate::interface::remote_session::{
    CommandOutput, RemoteConnector, RemoteEntry, RemoteFileKind, RemoteSession,
};
use crate::model::error::io::IOError;
use crate::model::error::remote::RemoteError;
use crate::model::error::Error;
use crate::model::ssh_config::ServerConfig;
use crate::platform::constants::COMMAND_POLL_INTERVAL;
use crate::utils::path::expand_home;
use crate::utils::run_log::RunLog;
use ssh2::{Channel, CheckResult, HashType as HostKeyHash, KnownHostFileKind, Session, Sftp};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

/// Opens libssh2 sessions. Blocking, callers run it off the async runtime.
pub struct SshConnector {
    connect_timeout: Duration,
}

impl SshConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    fn open_session(&self, server: &ServerConfig) -> Result<Session, Error> {
        let host = server.host.as_str();
        let address = (host, server.port)
            .to_socket_addrs()
            .map_err(|err| RemoteError::ConnectFailed(host, err))?
            .next()
            .ok_or_else(|| RemoteError::ConnectFailed(host, "address did not resolve"))?;
        let stream = TcpStream::connect_timeout(&address, self.connect_timeout)
            .map_err(|err| RemoteError::ConnectFailed(host, err))?;

        let mut session = Session::new().map_err(|err| RemoteError::ConnectFailed(host, err))?;
        session.set_tcp_stream(stream);
        session.set_timeout(millis(self.connect_timeout));
        session
            .handshake()
            .map_err(|err| RemoteError::ConnectFailed(host, err))?;
        Ok(session)
    }
}

impl RemoteConnector for SshConnector {
    fn connect(&self, server: &ServerConfig, run_log: &RunLog) -> Result<Box<dyn RemoteSession>, Error> {
        let session = self.open_session(server)?;
        verify_host_key(&session, server, run_log)?;
        authenticate(&session, server)?;
        let sftp = session.sftp().map_err(RemoteError::SftpFailed)?;
        Ok(Box::new(SshSession {
            session,
            sftp: Some(sftp),
            default_timeout: self.connect_timeout,
        }))
    }
}

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// With a known_hosts file the key must match it. Without one the key is
/// accepted and its fingerprint recorded in the run log.
fn verify_host_key(session: &Session, server: &ServerConfig, run_log: &RunLog) -> Result<(), Error> {
    let host = server.host.as_str();
    let Some((key, _)) = session.host_key() else {
        return Err(RemoteError::HostKeyRejected(host).into());
    };

    match server.known_hosts_path.as_deref().filter(|path| !path.trim().is_empty()) {
        Some(path) => {
            let mut known_hosts = session
                .known_hosts()
                .map_err(|err| RemoteError::ConnectFailed(host, err))?;
            known_hosts
                .read_file(&expand_home(path), KnownHostFileKind::OpenSSH)
                .map_err(|err| RemoteError::ConnectFailed(host, err))?;
            match known_hosts.check_port(host, server.port, key) {
                CheckResult::Match => Ok(()),
                _ => Err(RemoteError::HostKeyRejected(host).into()),
            }
        }
        None => {
            let fingerprint = session
                .host_key_hash(HostKeyHash::Sha256)
                .map(|hash| {
                    hash.iter()
                        .map(|byte| format!("{byte:02x}"))
                        .collect::<Vec<_>>()
                        .join(":")
                })
                .unwrap_or_default();
            run_log.log(format!("Accepted host key of {host} (SHA256 {fingerprint})"));
            Ok(())
        }
    }
}

/// Key file first, then password, then the local agent when nothing is configured.
fn authenticate(session: &Session, server: &ServerConfig) -> Result<(), Error> {
    let host = server.host.as_str();
    let username = server.username.as_str();
    let key_path = server.ssh_key_path.as_deref().filter(|path| !path.trim().is_empty());
    let password = server.password.as_deref().filter(|password| !password.is_empty());
    let mut last_error = String::from("no credentials configured");

    if let Some(key_path) = key_path {
        if let Err(err) = session.userauth_pubkey_file(username, None, &expand_home(key_path), None) {
            last_error = err.to_string();
        }
    }
    if let Some(password) = password.filter(|_| !session.authenticated()) {
        if let Err(err) = session.userauth_password(username, password) {
            last_error = err.to_string();
        }
    }
    if key_path.is_none() && password.is_none() {
        if let Err(err) = session.userauth_agent(username) {
            last_error = err.to_string();
        }
    }

    if session.authenticated() {
        Ok(())
    } else {
        Err(RemoteError::AuthenticationFailed(host, last_error).into())
    }
}

pub struct SshSession {
    session: Session,
    sftp: Option<Sftp>,
    default_timeout: Duration,
}

impl SshSession {
    fn sftp(&self) -> Result<&Sftp, Error> {
        self.sftp
            .as_ref()
            .ok_or_else(|| RemoteError::SftpFailed("session already closed").into())
    }

    fn run_command(
        &self,
        command: &str,
        stdin: Option<&str>,
        timeout: Option<Duration>,
    ) -> io::Result<CommandOutput> {
        let mut channel = self.session.channel_session()?;
        channel.exec(command)?;
        if let Some(input) = stdin {
            channel.write_all(input.as_bytes())?;
        }
        channel.send_eof()?;

        self.session.set_blocking(false);
        let drained = drain_channel(&mut channel, timeout.map(|timeout| Instant::now() + timeout));
        self.session.set_blocking(true);
        let (stdout, stderr) = drained?;
        channel.wait_close()?;

        Ok(CommandOutput {
            exit_status: channel.exit_status()?,
            stdout,
            stderr: String::from_utf8_lossy(&stderr).to_string(),
        })
    }
}

/// Reads stdout and stderr in turns so neither stream can stall the other
/// by filling its window. Expects a non-blocking session.
fn drain_channel(channel: &mut Channel, deadline: Option<Instant>) -> io::Result<(Vec<u8>, Vec<u8>)> {
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let mut buffer = vec![0u8; 32 * 1024];
    loop {
        let mut progressed = read_available(channel, &mut buffer, &mut stdout)?;
        progressed |= read_available(&mut channel.stderr(), &mut buffer, &mut stderr)?;
        if progressed {
            continue;
        }
        if channel.eof() {
            return Ok((stdout, stderr));
        }
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "command timed out"));
        }
        thread::sleep(COMMAND_POLL_INTERVAL);
    }
}

fn read_available(reader: &mut impl Read, buffer: &mut [u8], output: &mut Vec<u8>) -> io::Result<bool> {
    match reader.read(buffer) {
        Ok(0) => Ok(false),
        Ok(read) => {
            output.extend_from_slice(&buffer[..read]);
            Ok(true)
        }
        Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(false),
        Err(err) => Err(err),
    }
}

impl RemoteSession for SshSession {
    fn exec(
        &mut self,
        command: &str,
        stdin: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<CommandOutput, Error> {
        // Zero disables the libssh2 timeout.
        self.session.set_timeout(timeout.map(millis).unwrap_or(0));
        let result = self.run_command(command, stdin, timeout);
        self.session.set_timeout(millis(self.default_timeout));
        result.map_err(|err| RemoteError::ExecFailed(command, err).into())
    }

    fn stat(&mut self, path: &str) -> Result<RemoteFileKind, Error> {
        let stat = self
            .sftp()?
            .stat(Path::new(path))
            .map_err(|err| RemoteError::StatFailed(path, err))?;
        Ok(if stat.is_dir() {
            RemoteFileKind::Directory
        } else {
            RemoteFileKind::File
        })
    }

    fn list_directory(&mut self, path: &str) -> Result<Vec<RemoteEntry>, Error> {
        let entries = self
            .sftp()?
            .readdir(Path::new(path))
            .map_err(|err| RemoteError::ListDirectoryFailed(path, err))?;
        Ok(entries
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().to_string();
                if name == "." || name == ".." {
                    return None;
                }
                let kind = if stat.is_dir() {
                    RemoteFileKind::Directory
                } else {
                    RemoteFileKind::File
                };
                Some(RemoteEntry { name, kind })
            })
            .collect())
    }

    fn download(&mut self, remote_path: &str, local_path: &Path) -> Result<(), Error> {
        let mut remote_file = self
            .sftp()?
            .open(Path::new(remote_path))
            .map_err(|err| RemoteError::DownloadFailed(remote_path, err))?;
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|err| IOError::CreateDirectoryFailed(parent, err))?;
        }
        let mut local_file =
            File::create(local_path).map_err(|err| IOError::WriteFileFailed(local_path, err))?;
        if let Err(err) = io::copy(&mut remote_file, &mut local_file) {
            drop(local_file);
            let _ = fs::remove_file(local_path);
            return Err(RemoteError::DownloadFailed(remote_path, err).into());
        }
        Ok(())
    }

    fn close(&mut self) {
        self.sftp.take();
        let _ = self.session.disconnect(None, "backup finished", None);
    }
}

impl Drop for SshSession {
    fn drop(&mut self) {
        if self.sftp.is_some() {
            self.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::read_available;
    use std::io::{self, Cursor, Read};

    struct Pending;

    impl Read for Pending {
        fn read(&mut self, _buffer: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::WouldBlock))
        }
    }

    #[test]
    fn pending_stream_reports_no_progress() {
        let mut buffer = [0u8; 8];
        let mut output = Vec::new();
        assert!(!read_available(&mut Pending, &mut buffer, &mut output).expect("read"));
        assert!(output.is_empty());
    }

    #[test]
    fn available_bytes_are_appended_in_chunks() {
        let mut stream = Cursor::new(b"permission denied".to_vec());
        let mut buffer = [0u8; 8];
        let mut output = Vec::new();
        while read_available(&mut stream, &mut buffer, &mut output).expect("read") {}
        assert_eq!(output, b"permission denied");
    }

    #[test]
    fn hard_errors_are_returned() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buffer: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(io::ErrorKind::ConnectionReset))
            }
        }
        let mut buffer = [0u8; 8];
        let result = read_available(&mut Broken, &mut buffer, &mut Vec::new());
        assert_eq!(result.expect_err("reset").kind(), io::ErrorKind::ConnectionReset);
    }
}
