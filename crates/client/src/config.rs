//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! All variables are optional:
//! - `PARATHA_API_BASE_URL` - API base URL, optionally with a path prefix (default: the hosted Paratha API)
//! - `PARATHA_API_TIMEOUT_SECS` - Per-request timeout in seconds (default: 10)
//! - `PARATHA_DELIVERY_FEE` - Flat delivery fee added at checkout (default: 2.99)
//! - `PARATHA_DATA_DIR` - Directory holding the persisted session (default: .paratha)
//! - `PARATHA_CATALOG_PATH` - JSON menu file replacing the built-in catalog

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use paratha_core::Price;
use rust_decimal::Decimal;
use thiserror::Error;
use url::Url;

/// Hosted API used when `PARATHA_API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "https://paratha-app-3c86d136e58d.herokuapp.com";

const DEFAULT_TIMEOUT_SECS: &str = "10";
const DEFAULT_DELIVERY_FEE: &str = "2.99";
const DEFAULT_DATA_DIR: &str = ".paratha";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Client application configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the REST API
    pub api_base_url: Url,
    /// Timeout applied to every HTTP request
    pub request_timeout: Duration,
    /// Flat fee added to every order
    pub delivery_fee: Price,
    /// Directory for the session file
    pub data_dir: PathBuf,
    /// Optional catalog file replacing the built-in menu
    pub catalog_path: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(DEFAULT_API_BASE_URL)
                .unwrap_or_else(|_| unreachable!("default API URL is valid")),
            request_timeout: Duration::from_secs(10),
            delivery_fee: Price::from_cents(299),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            catalog_path: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_env("PARATHA_API_BASE_URL", DEFAULT_API_BASE_URL, |raw| {
            Url::parse(raw).map_err(|e| e.to_string())
        })?;
        let timeout_secs = parse_env("PARATHA_API_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS, |raw| {
            raw.parse::<u64>()
                .map_err(|e| e.to_string())
                .and_then(|secs| {
                    if secs == 0 {
                        Err("must be greater than zero".to_string())
                    } else {
                        Ok(secs)
                    }
                })
        })?;
        let delivery_fee = parse_env("PARATHA_DELIVERY_FEE", DEFAULT_DELIVERY_FEE, parse_fee)?;
        let data_dir = PathBuf::from(get_env_or_default("PARATHA_DATA_DIR", DEFAULT_DATA_DIR));
        let catalog_path = get_optional_env("PARATHA_CATALOG_PATH").map(PathBuf::from);

        Ok(Self {
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            delivery_fee,
            data_dir,
            catalog_path,
        })
    }

    /// Path of the file holding the persisted token and role hint.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.data_dir.join("session.json")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Read a variable (or its default) and parse it, naming the variable on failure.
fn parse_env<T>(
    key: &str,
    default: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ConfigError> {
    let raw = get_env_or_default(key, default);
    parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e))
}

/// Parse a non-negative decimal fee.
fn parse_fee(raw: &str) -> Result<Price, String> {
    let amount = Decimal::from_str(raw).map_err(|e| e.to_string())?;
    if amount.is_sign_negative() {
        return Err("fee cannot be negative".to_string());
    }
    Ok(Price::new(amount))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url.as_str(), "https://paratha-app-3c86d136e58d.herokuapp.com/");
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.delivery_fee.to_string(), "$2.99");
    }

    #[test]
    fn test_session_file_lives_in_data_dir() {
        let config = ClientConfig {
            data_dir: PathBuf::from("/tmp/paratha"),
            ..ClientConfig::default()
        };
        assert_eq!(config.session_file(), PathBuf::from("/tmp/paratha/session.json"));
    }

    #[test]
    fn test_parse_fee() {
        assert_eq!(parse_fee("2.99").unwrap(), Price::from_cents(299));
        assert_eq!(parse_fee("0").unwrap(), Price::ZERO);
        assert!(parse_fee("-1").is_err());
        assert!(parse_fee("two").is_err());
    }

    #[test]
    fn test_parse_env_reports_variable_name() {
        let err = parse_env("PARATHA_TEST_UNSET_VAR", "abc", |raw| {
            raw.parse::<u64>().map_err(|e| e.to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("PARATHA_TEST_UNSET_VAR"));
    }
}
