use crate::model::hash_type::HashType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ConfigTable {
    #[serde(rename = "Config")]
    pub config: Config,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub database_path: String,
    pub log_directory: String,
    pub log_level: String,      // EnvFilter directive
    pub hash_type: HashType,    // verify_mode = hash
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: "./data/backup.sqlite".to_string(),
            log_directory: "./logs".to_string(),
            log_level: "info".to_string(),
            hash_type: HashType::default(),
        }
    }
}
