//! # Application Configuration
//!
//! Configuration for the database handle, listings and loans.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     BIBLIO_DB_PATH=/var/lib/biblio/biblio.db                           │
//! │     BIBLIO_MAX_CONNECTIONS=8                                           │
//! │     BIBLIO_LOAN_PERIOD_DAYS=14                                         │
//! │     BIBLIO_DEFAULT_PAGE_LIMIT=20                                       │
//! │                                                                         │
//! │  2. TOML Config File (biblio.toml)                                     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     ./biblio.db, 7-day loans, pages of 10 (max 100)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! database_path = "./data/biblio.db"
//! max_connections = 5
//!
//! [pagination]
//! default_limit = 10
//! max_limit = 100
//!
//! [loans]
//! period_days = 7
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

use biblio_core::{PageRequest, DEFAULT_LOAN_PERIOD_DAYS, DEFAULT_PAGE_LIMIT, MAX_LOAN_PERIOD_DAYS, MAX_PAGE_LIMIT};

use crate::pool::DbConfig;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Sections
// =============================================================================

/// Page sizes for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Used when a request does not ask for a page size.
    pub default_limit: u64,
    /// Largest page size a request may ask for.
    pub max_limit: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        PaginationConfig {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: MAX_PAGE_LIMIT,
        }
    }
}

impl PaginationConfig {
    /// Builds a page request, falling back to `default_limit` when the
    /// caller gave no limit.
    pub fn request(&self, limit: Option<u64>, offset: u64) -> PageRequest {
        PageRequest::new(limit.unwrap_or(self.default_limit), offset)
    }
}

/// Loan settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoanConfig {
    /// Days between issue date and due date.
    pub period_days: i64,
}

impl Default for LoanConfig {
    fn default() -> Self {
        LoanConfig {
            period_days: DEFAULT_LOAN_PERIOD_DAYS,
        }
    }
}

// =============================================================================
// Application Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DbConfig,

    #[serde(default)]
    pub pagination: PaginationConfig,

    #[serde(default)]
    pub loans: LoanConfig,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file, if `path` is given and exists
    /// 3. Environment variables
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut config = match path {
            Some(path) if path.exists() => {
                info!(?path, "Loading config from file");
                Self::from_toml(&std::fs::read_to_string(path)?)?
            }
            Some(path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml(contents: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies overrides read through `lookup` (the process environment in
    /// [`AppConfig::load`]).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<()> {
        if let Some(path) = lookup("BIBLIO_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.database_path = PathBuf::from(path);
        }

        if let Some(max) = lookup("BIBLIO_MAX_CONNECTIONS") {
            self.database.max_connections = parse("BIBLIO_MAX_CONNECTIONS", &max)?;
        }

        if let Some(days) = lookup("BIBLIO_LOAN_PERIOD_DAYS") {
            self.loans.period_days = parse("BIBLIO_LOAN_PERIOD_DAYS", &days)?;
        }

        if let Some(limit) = lookup("BIBLIO_DEFAULT_PAGE_LIMIT") {
            self.pagination.default_limit = parse("BIBLIO_DEFAULT_PAGE_LIMIT", &limit)?;
        }

        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".into()));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be greater than 0".into()));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigError::Invalid(
                "min_connections must not exceed max_connections".into(),
            ));
        }

        if self.pagination.max_limit == 0 {
            return Err(ConfigError::Invalid("max_limit must be greater than 0".into()));
        }

        if self.pagination.default_limit == 0 || self.pagination.default_limit > self.pagination.max_limit {
            return Err(ConfigError::Invalid(format!(
                "default_limit must be between 1 and {}",
                self.pagination.max_limit
            )));
        }

        if !(1..=MAX_LOAN_PERIOD_DAYS).contains(&self.loans.period_days) {
            return Err(ConfigError::Invalid(format!(
                "period_days must be between 1 and {MAX_LOAN_PERIOD_DAYS}"
            )));
        }

        Ok(())
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> ConfigResult<T> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.loans.period_days, 7);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [database]
            database_path = "/tmp/library.db"

            [loans]
            period_days = 14
            "#,
        )
        .unwrap();

        assert_eq!(config.database.database_path, PathBuf::from("/tmp/library.db"));
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.loans.period_days, 14);
        assert_eq!(config.pagination, PaginationConfig::default());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[
                ("BIBLIO_DB_PATH", "/data/b.db"),
                ("BIBLIO_MAX_CONNECTIONS", "8"),
                ("BIBLIO_LOAN_PERIOD_DAYS", "21"),
                ("BIBLIO_DEFAULT_PAGE_LIMIT", "25"),
            ]))
            .unwrap();

        assert_eq!(config.database.database_path, PathBuf::from("/data/b.db"));
        assert_eq!(config.database.max_connections, 8);
        assert_eq!(config.loans.period_days, 21);
        assert_eq!(config.pagination.default_limit, 25);
    }

    #[test]
    fn test_oversized_loan_period_override_fails_validation() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(env(&[("BIBLIO_LOAN_PERIOD_DAYS", "200000000")]))
            .unwrap();

        assert_eq!(config.loans.period_days, 200_000_000);
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_unparseable_override_is_an_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(env(&[("BIBLIO_LOAN_PERIOD_DAYS", "a week")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_page_request_uses_default_limit() {
        let pagination = PaginationConfig::default();
        assert_eq!(pagination.request(None, 20).limit, 10);
        assert_eq!(pagination.request(Some(3), 0).limit, 3);
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.pagination.default_limit = 500;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.loans.period_days = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.loans.period_days = 200_000_000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }
}
