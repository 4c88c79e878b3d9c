//! API configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable, for development.
    Pretty,
    /// One JSON object per line, for log collectors.
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT".to_string())),
        }
    }
}

/// API server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// HTTP port
    pub port: u16,

    /// Interface to bind
    pub bind_addr: String,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// Deadline for one sale's unit of work, in milliseconds
    pub sale_timeout_ms: u64,

    /// Raise low-stock alerts after stock changes
    pub alerts_enabled: bool,

    pub log_format: LogFormat,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            port: 3000,
            bind_addr: "0.0.0.0".to_string(),
            database_path: PathBuf::from("./data/almacen.db"),
            db_max_connections: 5,
            sale_timeout_ms: 5_000,
            alerts_enabled: true,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. `load` passes the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ApiConfig::default();

        let config = ApiConfig {
            port: parse_or(&lookup, "PORT", defaults.port)?,

            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),

            database_path: lookup("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.database_path),

            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", defaults.db_max_connections)?,

            sale_timeout_ms: parse_or(&lookup, "SALE_TIMEOUT_MS", defaults.sale_timeout_ms)?,

            alerts_enabled: parse_or(&lookup, "ALERTS_ENABLED", defaults.alerts_enabled)?,

            log_format: match lookup("LOG_FORMAT") {
                Some(raw) => raw.parse()?,
                None => defaults.log_format,
            },
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }
        if config.sale_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue("SALE_TIMEOUT_MS".to_string()));
        }

        Ok(config)
    }

    /// `host:port` to bind the listener on.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    pub fn sale_timeout(&self) -> Duration {
        Duration::from_millis(self.sale_timeout_ms)
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_pairs(&[]).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.database_path, PathBuf::from("./data/almacen.db"));
        assert_eq!(config.db_max_connections, 5);
        assert_eq!(config.sale_timeout(), Duration::from_secs(5));
        assert!(config.alerts_enabled);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let config = from_pairs(&[
            ("PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("DATABASE_PATH", "/var/lib/almacen/pos.db"),
            ("SALE_TIMEOUT_MS", "250"),
            ("ALERTS_ENABLED", "false"),
            ("LOG_FORMAT", "JSON"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.database_path, PathBuf::from("/var/lib/almacen/pos.db"));
        assert_eq!(config.sale_timeout(), Duration::from_millis(250));
        assert!(!config.alerts_enabled);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_values_name_the_variable() {
        let err = from_pairs(&[("PORT", "http")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for PORT");

        let err = from_pairs(&[("ALERTS_ENABLED", "si")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for ALERTS_ENABLED");

        let err = from_pairs(&[("LOG_FORMAT", "xml")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for LOG_FORMAT");

        let err = from_pairs(&[("SALE_TIMEOUT_MS", "0")]).unwrap_err();
        assert_eq!(err.to_string(), "Invalid value for SALE_TIMEOUT_MS");
    }
}
