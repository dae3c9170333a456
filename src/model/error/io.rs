use macros::traceable;
use std::path::PathBuf;

traceable! {
    IOError {
        #[error("Failed to create directory: {path}: {err}")]
        CreateDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to read directory: {path}: {err}")]
        ReadDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to read file: {path}: {err}")]
        ReadFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to write file: {path}: {err}")]
        WriteFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to copy file: From {src} To {dst}: {err}")]
        CopyFileFailed { src: PathBuf, dst: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to delete directory: {path}: {err}")]
        DeleteDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to get file metadata: {path}: {err}")]
        GetMetadataFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to set file metadata: {path}: {err}")]
        SetMetadataFailed { path: PathBuf } => tracing::Level::WARN,

        #[error("Failed to resolve path: {path}: {err}")]
        ResolvePathFailed { path: PathBuf } => tracing::Level::ERROR,
    }
}
