use crate::model::config::{Config, ConfigTable};
use crate::model::error::system::SystemError;
use crate::model::error::Error;
use crate::platform::constants::CONFIG_PATH;
use std::fs;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::Path;

pub struct AppConfig {
    config: Config,
    from_file: bool,
}

impl AppConfig {
    pub fn new() -> Result<Self, Error> {
        Self::load(CONFIG_PATH)
    }

    /// A missing file yields the defaults, an unreadable or invalid one is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(toml_string) => {
                let config = toml::from_str::<ConfigTable>(&toml_string)
                    .map_err(SystemError::InvalidConfig)?
                    .config;
                Ok(Self {
                    config,
                    from_file: true,
                })
            }
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Self {
                config: Config::default(),
                from_file: false,
            }),
            Err(err) => Err(SystemError::ConfigReadFailed(err).into()),
        }
    }

    pub fn from_file(&self) -> bool {
        self.from_file
    }
}

impl Deref for AppConfig {
    type Target = Config;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::AppConfig;
    use crate::model::hash_type::HashType;
    use std::fs;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app_config = AppConfig::load(dir.path().join("config.toml")).expect("load");
        assert!(!app_config.from_file());
        assert_eq!(app_config.log_level, "info");
        assert_eq!(app_config.hash_type, HashType::SHA256);
    }

    #[test]
    fn partial_table_keeps_other_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[Config]\nlog_level = \"debug\"\nhash_type = \"BLAKE3\"\n").expect("write");

        let app_config = AppConfig::load(&path).expect("load");
        assert!(app_config.from_file());
        assert_eq!(app_config.log_level, "debug");
        assert_eq!(app_config.hash_type, HashType::BLAKE3);
        assert_eq!(app_config.database_path, "./data/backup.sqlite");
    }

    #[test]
    fn invalid_file_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "[Config\nlog_level = ").expect("write");
        assert!(AppConfig::load(&path).is_err());
    }
}
