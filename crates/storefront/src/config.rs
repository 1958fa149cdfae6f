//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `JUST_MART_API_URL` - Marketplace backend base URL (default: `http://localhost:5000`)
//! - `JUST_MART_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none, transport default)
//! - `JUST_MART_PRODUCT_CACHE_TTL_SECS` - Product cache time-to-live (default: 300)
//! - `JUST_MART_PRODUCT_CACHE_CAPACITY` - Product cache max entries (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default backend used by local development setups.
pub const DEFAULT_API_URL: &str = "http://localhost:5000";

const DEFAULT_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_CACHE_CAPACITY: u64 = 1000;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Invalid API base URL {0}: {1}")]
    InvalidBaseUrl(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Marketplace backend base URL; endpoint paths are appended to it
    pub api_base_url: Url,
    /// Per-request timeout; `None` leaves it to the transport
    pub request_timeout: Option<Duration>,
    /// Product record cache settings
    pub product_cache: ProductCacheConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., "production")
    pub sentry_environment: Option<String>,
}

/// In-memory product cache configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProductCacheConfig {
    pub time_to_live: Duration,
    pub max_capacity: u64,
}

impl Default for ProductCacheConfig {
    fn default() -> Self {
        Self {
            time_to_live: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            max_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl StorefrontConfig {
    /// Configuration pointing at `api_base_url` with every other setting at
    /// its default.
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            request_timeout: None,
            product_cache: ProductCacheConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

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

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let raw_url = lookup("JUST_MART_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_base_url = parse_base_url(&raw_url)?;

        let request_timeout = lookup("JUST_MART_REQUEST_TIMEOUT_SECS")
            .map(|v| parse_u64("JUST_MART_REQUEST_TIMEOUT_SECS", &v))
            .transpose()?
            .map(Duration::from_secs);

        let time_to_live = lookup("JUST_MART_PRODUCT_CACHE_TTL_SECS")
            .map(|v| parse_u64("JUST_MART_PRODUCT_CACHE_TTL_SECS", &v))
            .transpose()?
            .map_or(Duration::from_secs(DEFAULT_CACHE_TTL_SECS), Duration::from_secs);

        let max_capacity = lookup("JUST_MART_PRODUCT_CACHE_CAPACITY")
            .map(|v| parse_u64("JUST_MART_PRODUCT_CACHE_CAPACITY", &v))
            .transpose()?
            .unwrap_or(DEFAULT_CACHE_CAPACITY);

        Ok(Self {
            api_base_url,
            request_timeout,
            product_cache: ProductCacheConfig {
                time_to_live,
                max_capacity,
            },
            sentry_dsn: lookup("SENTRY_DSN").filter(|v| !v.is_empty()),
            sentry_environment: lookup("SENTRY_ENVIRONMENT").filter(|v| !v.is_empty()),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse and validate a backend base URL.
///
/// The URL must be `http` or `https` and able to carry path segments.
///
/// # Errors
///
/// Returns `ConfigError::InvalidBaseUrl` if the URL is unusable.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidBaseUrl(raw.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl(
            raw.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidBaseUrl(
            raw.to_string(),
            "cannot be used as a base".to_string(),
        ));
    }

    Ok(url)
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:5000/");
        assert!(config.request_timeout.is_none());
        assert_eq!(config.product_cache.time_to_live, Duration::from_secs(300));
        assert_eq!(config.product_cache.max_capacity, 1000);
        assert!(config.sentry_dsn.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup_from(&[
            ("JUST_MART_API_URL", "https://api.justmart.app/v1/"),
            ("JUST_MART_REQUEST_TIMEOUT_SECS", "15"),
            ("JUST_MART_PRODUCT_CACHE_TTL_SECS", "60"),
            ("JUST_MART_PRODUCT_CACHE_CAPACITY", "10"),
            ("SENTRY_DSN", ""),
            ("SENTRY_ENVIRONMENT", "staging"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url.as_str(), "https://api.justmart.app/v1/");
        assert_eq!(config.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.product_cache.time_to_live, Duration::from_secs(60));
        assert_eq!(config.product_cache.max_capacity, 10);
        assert!(config.sentry_dsn.is_none());
        assert_eq!(config.sentry_environment.as_deref(), Some("staging"));
    }

    #[test]
    fn test_invalid_number() {
        let result = StorefrontConfig::from_lookup(lookup_from(&[(
            "JUST_MART_REQUEST_TIMEOUT_SECS",
            "soon",
        )]));
        assert!(matches!(result, Err(ConfigError::InvalidEnvVar(_, _))));
    }

    #[test]
    fn test_parse_base_url_rejects_bad_urls() {
        assert!(matches!(
            parse_base_url("not a url"),
            Err(ConfigError::InvalidBaseUrl(_, _))
        ));
        assert!(matches!(
            parse_base_url("ftp://files.example.com"),
            Err(ConfigError::InvalidBaseUrl(_, _))
        ));
        assert!(matches!(
            parse_base_url("mailto:a@x.com"),
            Err(ConfigError::InvalidBaseUrl(_, _))
        ));
    }
}
