// Server configuration loaded from environment variables.
// Decision: Default port 3000, matching the frontend service template the probe was deployed from

use std::env;
use std::net::{Ipv4Addr, SocketAddr};
use storeprobe_core::{ConfigError, StoreConfig};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("PORT must be a number between 1 and 65535: {0}")]
    InvalidPort(String),

    #[error(transparent)]
    Store(#[from] ConfigError),
}

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Serve reads from memory instead of DynamoDB (`STORE_BACKEND=memory`)
    pub in_memory_store: bool,
    pub store: StoreConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - `PORT`: listen port (default: 3000)
    /// - `STORE_BACKEND`: `dynamodb` (default) or `memory`
    /// - everything read by `StoreConfig::from_env`
    pub fn from_env() -> Result<Self, AppConfigError> {
        let port = match env::var("PORT").ok().filter(|p| !p.trim().is_empty()) {
            Some(value) => parse_port(&value)?,
            None => DEFAULT_PORT,
        };

        let in_memory_store = env::var("STORE_BACKEND")
            .map(|v| v.eq_ignore_ascii_case("memory"))
            .unwrap_or(false);

        Ok(Self {
            port,
            in_memory_store,
            store: StoreConfig::from_env()?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_port(value: &str) -> Result<u16, AppConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(AppConfigError::InvalidPort(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_port() {
        assert_eq!(parse_port("8085").unwrap(), 8085);
        assert_eq!(parse_port(" 3000 ").unwrap(), 3000);
        assert!(parse_port("0").is_err());
        assert!(parse_port("70000").is_err());
        assert!(parse_port("http").is_err());
    }

    #[test]
    fn test_listen_addr_binds_all_interfaces() {
        let config = AppConfig {
            port: 3000,
            in_memory_store: true,
            store: StoreConfig::from_lookup(|_| None).unwrap(),
        };
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:3000");
    }
}
