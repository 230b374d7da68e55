//! Server configuration.
//!
//! Defaults, then an optional TOML file, then environment variables (a `.env`
//! file is loaded into the environment first, without overriding variables
//! that are already set).

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "questcraft.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Deployment environment name ("development", "production", ...)
    pub environment: String,
    /// Directory containing `quests/*.toml` seed files
    pub data_dir: PathBuf,
    /// `tracing_subscriber::EnvFilter` directives
    pub log_filter: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            data_dir: PathBuf::from("data"),
            log_filter: "questcraft_server=info,tower_http=info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from the config file (if any) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let path = std::env::var("QUESTCRAFT_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));

        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Override fields from `lookup` (normally the process environment)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("HOST") {
            self.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue { key: "PORT", value: port })?;
        }
        if let Some(environment) = lookup("QUESTCRAFT_ENV") {
            self.environment = environment;
        }
        if let Some(data_dir) = lookup("QUESTCRAFT_DATA_DIR") {
            self.data_dir = PathBuf::from(data_dir);
        }
        if let Some(filter) = lookup("RUST_LOG") {
            self.log_filter = filter;
        }
        Ok(())
    }

    /// Resolve `host:port` to a bindable address; hostnames and bare IPv6
    /// literals are both accepted
    pub async fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        tokio::net::lookup_host((self.host.as_str(), self.port))
            .await
            .ok()
            .and_then(|mut addrs| addrs.next())
            .ok_or_else(|| ConfigError::InvalidValue { key: "HOST", value: self.host.clone() })
    }

    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[tokio::test]
    async fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.environment, "development");
        assert!(!config.is_production());
        assert_eq!(config.socket_addr().await.unwrap().port(), 3000);
    }

    #[test]
    fn test_file_with_partial_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("questcraft.toml");
        std::fs::write(&path, "port = 8080\nenvironment = \"production\"\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.port, 8080);
        assert!(config.is_production());
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }

    #[test]
    fn test_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("questcraft.toml");
        std::fs::write(&path, "port = \"not a number\"").unwrap();

        assert!(matches!(ServerConfig::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = ServerConfig::default();
        config
            .apply_overrides(lookup_from(&[
                ("PORT", "4000"),
                ("QUESTCRAFT_DATA_DIR", "/srv/quests"),
                ("RUST_LOG", "debug"),
            ]))
            .unwrap();

        assert_eq!(config.port, 4000);
        assert_eq!(config.data_dir, PathBuf::from("/srv/quests"));
        assert_eq!(config.log_filter, "debug");
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_invalid_port() {
        let mut config = ServerConfig::default();
        let err = config
            .apply_overrides(lookup_from(&[("PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "PORT", .. }));
    }

    #[tokio::test]
    async fn test_hostnames_and_ipv6_resolve() {
        let mut config = ServerConfig::default();

        config.apply_overrides(lookup_from(&[("HOST", "localhost")])).unwrap();
        let addr = config.socket_addr().await.unwrap();
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 3000);

        config.apply_overrides(lookup_from(&[("HOST", "::1"), ("PORT", "8080")])).unwrap();
        let addr = config.socket_addr().await.unwrap();
        assert!(addr.is_ipv6());
        assert!(addr.ip().is_loopback());
        assert_eq!(addr.port(), 8080);
    }

    #[tokio::test]
    async fn test_invalid_host() {
        let config = ServerConfig {
            host: "bad\0host".to_string(),
            ..ServerConfig::default()
        };
        let err = config.socket_addr().await.unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "HOST", .. }));
    }
}
