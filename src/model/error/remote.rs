use macros::traceable;

traceable! {
    RemoteError {
        #[error("SSH connect failed for {host}: {err}")]
        ConnectFailed { host: String } => tracing::Level::ERROR,

        #[error("SSH authentication failed for {host}: {err}")]
        AuthenticationFailed { host: String } => tracing::Level::ERROR,

        #[no_source]
        #[error("Host key for {host} does not match known hosts")]
        HostKeyRejected { host: String } => tracing::Level::ERROR,

        #[error("Failed to open SFTP session: {err}")]
        SftpFailed => tracing::Level::ERROR,

        #[error("Failed to execute remote command {command}: {err}")]
        ExecFailed { command: String } => tracing::Level::ERROR,

        #[error("Remote path not accessible: {path}: {err}")]
        StatFailed { path: String } => tracing::Level::WARN,

        #[error("Cannot list remote directory {path}: {err}")]
        ListDirectoryFailed { path: String } => tracing::Level::WARN,

        #[error("Failed to download {path}: {err}")]
        DownloadFailed { path: String } => tracing::Level::WARN,
    }
}
