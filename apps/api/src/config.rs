//! API server configuration.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use defter_core::ledger::DebtLimits;
use defter_core::{ExchangeRate, Money};

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Interface to bind
    pub http_host: String,

    /// HTTP port
    pub http_port: u16,

    /// SQLite database file
    pub database_path: PathBuf,

    /// Pool size
    pub db_max_connections: u32,

    /// TRY per USD, used for debt postings and reports
    pub usd_try_rate: ExchangeRate,

    /// Credit limits reported by `GET /api/customers/{id}/debt`
    pub debt_limits: DebtLimits,

    /// Requests running longer than this are answered with 408
    pub request_timeout: Duration,
}

impl ApiConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = ApiConfig {
            http_host: var("HTTP_HOST", "0.0.0.0"),

            http_port: var("HTTP_PORT", "5000")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("HTTP_PORT".to_string()))?,

            database_path: PathBuf::from(var("DATABASE_PATH", "./defter.db")),

            db_max_connections: var("DB_MAX_CONNECTIONS", "5")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()))?,

            usd_try_rate: var("USD_TRY_RATE", "33")
                .parse()
                .map_err(|_| ConfigError::InvalidValue("USD_TRY_RATE".to_string()))?,

            debt_limits: DebtLimits {
                try_limit: Money::from_major(
                    var("DEBT_LIMIT_TRY", "5000")
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("DEBT_LIMIT_TRY".to_string()))?,
                ),
                usd_limit: Money::from_major(
                    var("DEBT_LIMIT_USD", "150")
                        .parse()
                        .map_err(|_| ConfigError::InvalidValue("DEBT_LIMIT_USD".to_string()))?,
                ),
            },

            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECS", "30")
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string()))?,
            ),
        };

        if config.db_max_connections == 0 {
            return Err(ConfigError::InvalidValue("DB_MAX_CONNECTIONS".to_string()));
        }

        Ok(config)
    }

    /// Address the server listens on.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.http_host, self.http_port)
            .parse()
            .map_err(|_| ConfigError::InvalidValue("HTTP_HOST".to_string()))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            http_host: "0.0.0.0".to_string(),
            http_port: 5000,
            database_path: PathBuf::from("./defter.db"),
            db_max_connections: 5,
            usd_try_rate: ExchangeRate::default(),
            debt_limits: DebtLimits::default(),
            request_timeout: Duration::from_secs(30),
        }
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

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.http_port, 5000);
        assert_eq!(config.usd_try_rate, ExchangeRate::from_whole(33));
        assert_eq!(config.debt_limits, DebtLimits::default());
        assert_eq!(config.bind_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("HTTP_PORT", "8080"),
            ("USD_TRY_RATE", "34.25"),
            ("DEBT_LIMIT_TRY", "10000"),
        ]))
        .unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.usd_try_rate, ExchangeRate::from_scaled(342_500));
        assert_eq!(config.debt_limits.try_limit, Money::from_major(10_000));
    }

    #[test]
    fn test_invalid_values() {
        let err = ApiConfig::from_lookup(lookup(&[("USD_TRY_RATE", "abc")])).unwrap_err();
        assert!(err.to_string().contains("USD_TRY_RATE"));

        assert!(ApiConfig::from_lookup(lookup(&[("HTTP_PORT", "99999")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
