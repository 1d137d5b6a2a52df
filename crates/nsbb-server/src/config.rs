//! Server configuration loading from file and environment variables.

use nsbb_nationstates::NationStatesConfig;
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// NationStates plugin settings.
    #[serde(default)]
    pub nationstates: NationStatesConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,

    /// Pooled SQLite connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "nsbb_nationstates=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "nsbb.db".to_string()
}

fn default_max_connections() -> u32 {
    nsbb_db::DEFAULT_MAX_CONNECTIONS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `NSBB_HOST` overrides `server.host`
/// - `NSBB_PORT` overrides `server.port`
/// - `NSBB_DB_PATH` overrides `database.path`
/// - `NSBB_LOG_LEVEL` overrides `logging.level`
/// - `NSBB_LOG_JSON` overrides `logging.json` (set to "true" to enable)
/// - `NSBB_NS_API_URL` overrides `nationstates.api_url`
/// - `NSBB_NS_USER_AGENT` overrides `nationstates.user_agent`
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    Ok(apply_env_overrides(config, |key| std::env::var(key).ok()))
}

fn apply_env_overrides(mut config: Config, var: impl Fn(&str) -> Option<String>) -> Config {
    if let Some(host) = var("NSBB_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = var("NSBB_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(db_path) = var("NSBB_DB_PATH") {
        config.database.path = db_path;
    }
    if let Some(level) = var("NSBB_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = var("NSBB_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
    if let Some(api_url) = var("NSBB_NS_API_URL") {
        config.nationstates.api_url = api_url;
    }
    if let Some(user_agent) = var("NSBB_NS_USER_AGENT") {
        config.nationstates.user_agent = user_agent;
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.path, "nsbb.db");
        assert_eq!(config.nationstates, NationStatesConfig::default());
    }

    #[test]
    fn parses_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[server]
port = 8080

[database]
path = "/var/lib/nsbb/forum.db"

[nationstates]
timeout_secs = 3
user_agent = "example forum (admin@example.org)"
"#,
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.path, "/var/lib/nsbb/forum.db");
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.nationstates.timeout_secs, 3);
        assert_eq!(
            config.nationstates.user_agent,
            "example forum (admin@example.org)"
        );
        assert_eq!(
            config.nationstates.api_url,
            "https://www.nationstates.net/cgi-bin/api.cgi"
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server\nport = ").unwrap();
        assert!(matches!(
            load_config(path.to_str()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let env = HashMap::from([
            ("NSBB_PORT", "4000"),
            ("NSBB_HOST", "not-an-ip"),
            ("NSBB_LOG_JSON", "1"),
            ("NSBB_NS_API_URL", "http://127.0.0.1:9999/api.cgi"),
        ]);
        let config = apply_env_overrides(Config::default(), |key| {
            env.get(key).map(|v| v.to_string())
        });
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.host, default_host());
        assert!(config.logging.json);
        assert_eq!(config.nationstates.api_url, "http://127.0.0.1:9999/api.cgi");
    }
}
