pub mod database;
pub mod io;
pub mod misc;
pub mod remote;
pub mod system;
pub mod task;

use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use crate::model::error::misc::MiscError;
use crate::model::error::remote::RemoteError;
use crate::model::error::system::SystemError;
use crate::model::error::task::TaskError;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Database(DatabaseError),
    #[error(transparent)]
    IO(IOError),
    #[error(transparent)]
    Misc(MiscError),
    #[error(transparent)]
    Remote(RemoteError),
    #[error(transparent)]
    System(SystemError),
    #[error(transparent)]
    Task(TaskError),
}

impl Error {
    pub fn level(&self) -> tracing::Level {
        match self {
            Self::Database(err) => err.level(),
            Self::IO(err) => err.level(),
            Self::Misc(err) => err.level(),
            Self::Remote(err) => err.level(),
            Self::System(err) => err.level(),
            Self::Task(err) => err.level(),
        }
    }
}

impl From<DatabaseError> for Error {
    fn from(error: DatabaseError) -> Self {
        Self::Database(error)
    }
}

impl From<IOError> for Error {
    fn from(error: IOError) -> Self {
        Self::IO(error)
    }
}

impl From<MiscError> for Error {
    fn from(error: MiscError) -> Self {
        Self::Misc(error)
    }
}

impl From<RemoteError> for Error {
    fn from(error: RemoteError) -> Self {
        Self::Remote(error)
    }
}

impl From<SystemError> for Error {
    fn from(error: SystemError) -> Self {
        Self::System(error)
    }
}

impl From<TaskError> for Error {
    fn from(error: TaskError) -> Self {
        Self::Task(error)
    }
}
