use crate::platform::constants::DEFAULT_COMMAND_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct SshConfig {
    pub local_backup_dir: String,
    pub exclude_patterns: Vec<String>,
    pub servers: Vec<ServerConfig>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub name: Option<String>,
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Option<String>,
    pub ssh_key_path: Option<String>,
    pub known_hosts_path: Option<String>,
    pub remote_paths: Vec<String>,
    pub exclude_patterns: Vec<String>,
    pub use_sudo: bool,
    pub sudo_password: Option<String>,
    pub use_compression: bool,
    pub pre_commands: Vec<PreCommand>,
    pub pre_backup_commands: Vec<PreCommand>,
    pub pre_commands_use_sudo: Option<bool>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum PreCommand {
    Plain(String),
    Detailed {
        command: String,
        #[serde(default)]
        use_sudo: Option<bool>,
        #[serde(default)]
        timeout: Option<u64>,
        #[serde(default)]
        description: Option<String>,
    },
}

/// A pre-command with the server defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub command: String,
    pub use_sudo: bool,
    pub timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: None,
            enabled: true,
            host: String::new(),
            port: 22,
            username: String::new(),
            password: None,
            ssh_key_path: None,
            known_hosts_path: None,
            remote_paths: Vec::new(),
            exclude_patterns: Vec::new(),
            use_sudo: false,
            sudo_password: None,
            use_compression: true,
            pre_commands: Vec::new(),
            pre_backup_commands: Vec::new(),
            pre_commands_use_sudo: None,
        }
    }
}

impl ServerConfig {
    pub fn display_name(&self) -> &str {
        match self.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => &self.host,
        }
    }

    pub fn sudo_password(&self) -> &str {
        self.sudo_password.as_deref().unwrap_or_default()
    }

    /// Global patterns first, then the server's own.
    pub fn effective_excludes(&self, global: &[String]) -> Vec<String> {
        global
            .iter()
            .chain(self.exclude_patterns.iter())
            .filter(|pattern| !pattern.trim().is_empty())
            .cloned()
            .collect()
    }

    pub fn resolved_pre_commands(&self) -> Vec<ResolvedCommand> {
        let default_sudo = self.pre_commands_use_sudo.unwrap_or(self.use_sudo);
        self.pre_commands
            .iter()
            .chain(self.pre_backup_commands.iter())
            .filter_map(|item| {
                let (command, use_sudo, timeout) = match item {
                    PreCommand::Plain(command) => (command.as_str(), None, None),
                    PreCommand::Detailed {
                        command,
                        use_sudo,
                        timeout,
                        ..
                    } => (command.as_str(), *use_sudo, *timeout),
                };
                let command = command.trim();
                if command.is_empty() {
                    return None;
                }
                Some(ResolvedCommand {
                    command: command.to_string(),
                    use_sudo: use_sudo.unwrap_or(default_sudo),
                    timeout: timeout
                        .map(Duration::from_secs)
                        .unwrap_or(DEFAULT_COMMAND_TIMEOUT),
                })
            })
            .collect()
    }
}

impl SshConfig {
    /// Seeded on first start so the settings page has something to edit.
    pub fn example() -> Self {
        Self {
            local_backup_dir: "/tmp/ssh_backups".to_string(),
            exclude_patterns: vec!["*.tmp".to_string(), "*.log".to_string()],
            servers: vec![ServerConfig {
                name: Some("example-server".to_string()),
                enabled: false,
                host: "192.168.1.100".to_string(),
                username: "backup".to_string(),
                ssh_key_path: Some("~/.ssh/id_rsa".to_string()),
                remote_paths: vec!["/etc".to_string(), "/home".to_string()],
                pre_commands: vec![PreCommand::Detailed {
                    command: "pg_dump -U postgres mydb > /tmp/mydb.sql".to_string(),
                    use_sudo: Some(false),
                    timeout: Some(300),
                    description: Some("Dump database".to_string()),
                }],
                ..ServerConfig::default()
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SshConfig;
    use std::time::Duration;

    #[test]
    fn server_defaults_and_pre_command_forms() {
        let raw = r#"{
            "local_backup_dir": "/backups",
            "exclude_patterns": ["*.tmp"],
            "servers": [{
                "host": "db1",
                "username": "ops",
                "use_sudo": true,
                "exclude_patterns": ["cache"],
                "pre_commands": ["sync", {"command": "pg_dump x", "use_sudo": false, "timeout": 60}],
                "pre_backup_commands": ["  "]
            }]
        }"#;
        let config: SshConfig = serde_json::from_str(raw).expect("parse ssh config");
        let server = &config.servers[0];
        assert!(server.enabled);
        assert!(server.use_compression);
        assert_eq!(server.port, 22);
        assert_eq!(server.display_name(), "db1");
        assert_eq!(
            server.effective_excludes(&config.exclude_patterns),
            vec!["*.tmp".to_string(), "cache".to_string()]
        );

        let commands = server.resolved_pre_commands();
        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].command, "sync");
        assert!(commands[0].use_sudo);
        assert_eq!(commands[0].timeout, Duration::from_secs(3600));
        assert_eq!(commands[1].command, "pg_dump x");
        assert!(!commands[1].use_sudo);
        assert_eq!(commands[1].timeout, Duration::from_secs(60));
    }
}
