//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPD_DATABASE_URL` - `PostgreSQL` connection string; falls back to the
//!   generic `DATABASE_URL`, and without either the server runs on the
//!   in-memory store (development only)
//! - `SHOPD_HOST` - Bind address (default: 127.0.0.1)
//! - `SHOPD_PORT` - Listen port (default: 3000)
//! - `SHOPD_MEDIA_ROOT` - Directory for uploaded pictures (default: ./media)
//! - `SHOPD_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output for development.
    Pretty,
    /// One JSON object per line for log shippers.
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected 'pretty' or 'json')")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL (contains password). `None` selects the
    /// in-memory store.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory uploaded pictures are written to
    pub media_root: PathBuf,
    /// Log output format
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a set variable fails to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("SHOPD_DATABASE_URL");
        let host = get_env_or_default("SHOPD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("SHOPD_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPD_PORT".to_string(), e.to_string()))?;
        let media_root = PathBuf::from(get_env_or_default("SHOPD_MEDIA_ROOT", "media"));
        let log_format = get_env_or_default("SHOPD_LOG_FORMAT", "pretty")
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPD_LOG_FORMAT".to_string(), e))?;

        Ok(Self {
            database_url,
            host,
            port,
            media_root,
            log_format,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Get database URL with fallback to generic `DATABASE_URL` (set by managed
/// Postgres attachments).
fn get_database_url(primary_key: &str) -> Option<SecretString> {
    if let Ok(value) = std::env::var(primary_key) {
        return Some(SecretString::from(value));
    }
    std::env::var("DATABASE_URL").ok().map(SecretString::from)
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig {
            database_url: None,
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            media_root: PathBuf::from("media"),
            log_format: LogFormat::Pretty,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }
}
