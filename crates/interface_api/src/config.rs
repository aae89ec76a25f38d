//! API configuration

use std::time::Duration;

use core_kernel::CoreError;
use domain_ledger::ListingLimits;
use infra_db::DatabaseConfig;
use serde::Deserialize;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    Json,
}

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// JWT secret for authentication
    pub jwt_secret: String,
    /// JWT expiration in seconds, used when issuing tokens
    pub jwt_expiration_secs: u64,
    /// Database URL
    pub database_url: String,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    pub log_format: LogFormat,
    /// Pool size
    pub max_connections: u32,
    /// Upper bound on waiting for an account lock
    pub lock_timeout_ms: u64,
    pub default_page_limit: u32,
    pub max_page_limit: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        let limits = ListingLimits::default();
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            jwt_secret: "change-me-in-production".to_string(),
            jwt_expiration_secs: 3600,
            database_url: "postgres://localhost/ledger".to_string(),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            max_connections: 10,
            lock_timeout_ms: 5_000,
            default_page_limit: limits.default_limit,
            max_page_limit: limits.max_limit,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `LEDGER_*` environment variables
    ///
    /// Nested keys use `__` as separator. Unset keys keep their defaults.
    pub fn from_env() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(
                config::Environment::with_prefix("LEDGER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Rejects values the server cannot run with
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(CoreError::Configuration("jwt_secret must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(CoreError::Configuration("max_connections must be positive".into()));
        }
        if self.lock_timeout_ms == 0 {
            return Err(CoreError::Configuration("lock_timeout_ms must be positive".into()));
        }
        if self.max_page_limit == 0 || self.default_page_limit == 0 {
            return Err(CoreError::Configuration("page limits must be positive".into()));
        }
        if self.default_page_limit > self.max_page_limit {
            return Err(CoreError::Configuration(format!(
                "default_page_limit {} exceeds max_page_limit {}",
                self.default_page_limit, self.max_page_limit
            )));
        }
        Ok(())
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn listing_limits(&self) -> ListingLimits {
        ListingLimits {
            default_limit: self.default_page_limit,
            max_limit: self.max_page_limit,
        }
    }

    /// Pool settings derived from this configuration
    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.max_connections.min(2))
            .lock_timeout(self.lock_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ApiConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
        assert_eq!(config.listing_limits(), ListingLimits::default());
        assert_eq!(config.lock_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_default_limit_above_max_is_rejected() {
        let config = ApiConfig {
            default_page_limit: 200,
            max_page_limit: 100,
            ..ApiConfig::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Configuration(_))));
    }

    #[test]
    fn test_empty_secret_is_rejected() {
        let config = ApiConfig {
            jwt_secret: "  ".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_format_parses_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(format, LogFormat::Json);
    }
}
