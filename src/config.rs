//! Configuration handling for WiFried

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub socket: SocketConfig,
    #[serde(default)]
    pub interface: InterfaceConfig,
}

/// Control socket settings. The path is the protocol's well-known
/// address; both the daemon and the client take it from here so tests
/// and alternate installs can point elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketConfig {
    #[serde(default = "default_socket_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConfig {
    /// Name of the AWDL interface
    #[serde(default = "default_interface_name")]
    pub name: String,
    /// How often the observer re-reads interface state
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/var/tmp/wifried.sock")
}

fn default_interface_name() -> String {
    "awdl0".to_string()
}

fn default_poll_interval() -> u64 {
    2
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            path: default_socket_path(),
        }
    }
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self {
            name: default_interface_name(),
            poll_interval_secs: default_poll_interval(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket: SocketConfig::default(),
            interface: InterfaceConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).expect("Failed to serialize config");
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.socket.path, PathBuf::from("/var/tmp/wifried.sock"));
        assert_eq!(config.interface.name, "awdl0");
        assert_eq!(config.interface.poll_interval_secs, 2);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test-config.toml");

        let config = Config::default();
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.socket.path, config.socket.path);
        assert_eq!(loaded.interface.name, config.interface.name);
    }

    #[test]
    fn test_custom_config_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom-config.toml");

        let config = Config {
            socket: SocketConfig {
                path: PathBuf::from("/tmp/alternate.sock"),
            },
            interface: InterfaceConfig {
                name: "awdl1".to_string(),
                poll_interval_secs: 5,
            },
        };
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.socket.path, PathBuf::from("/tmp/alternate.sock"));
        assert_eq!(loaded.interface.name, "awdl1");
        assert_eq!(loaded.interface.poll_interval_secs, 5);
    }

    #[test]
    fn test_partial_config_gets_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");

        std::fs::write(&config_path, "[socket]\npath = \"/tmp/elsewhere.sock\"\n").unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.socket.path, PathBuf::from("/tmp/elsewhere.sock"));
        assert_eq!(loaded.interface.name, "awdl0");
        assert_eq!(loaded.interface.poll_interval_secs, 2);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let path = PathBuf::from("/nonexistent/path/config.toml");
        let result = Config::load(&path);
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("invalid.toml");

        std::fs::write(&config_path, "this is not valid toml {{{{").unwrap();

        let result = Config::load(&config_path);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization_format() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("format-test.toml");

        let config = Config::default();
        config.save(&config_path).unwrap();

        let content = std::fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[socket]"));
        assert!(content.contains("path"));
        assert!(content.contains("[interface]"));
        assert!(content.contains("poll_interval_secs"));
    }
}
