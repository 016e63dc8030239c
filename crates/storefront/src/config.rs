//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SUTURAHUB_API_BASE` - Backend origin (e.g., `https://api.suturahub.com`)
//!
//! ## Optional
//! - `SUTURAHUB_STORAGE_PATH` - Persisted client state (default: .suturahub/storage.json)
//! - `SUTURAHUB_REQUEST_TIMEOUT_SECS` - Per-request HTTP timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag (default: development)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_STORAGE_PATH: &str = ".suturahub/storage.json";
const DEFAULT_TIMEOUT_SECS: &str = "30";
const DEFAULT_SENTRY_ENVIRONMENT: &str = "development";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Backend origin. Always ends with `/`.
    pub api_base: Url,
    /// File backing the persisted cart and session.
    pub storage_path: PathBuf,
    /// Timeout applied to every backend request.
    pub request_timeout: Duration,
    /// Error tracking configuration
    pub sentry: SentryConfig,
}

/// Sentry configuration.
#[derive(Debug, Clone, Default)]
pub struct SentryConfig {
    /// Sentry DSN; tracking is disabled when absent
    pub dsn: Option<String>,
    /// Environment tag attached to events
    pub environment: String,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(lookup);

        let api_base = parse_api_base(&env.required("SUTURAHUB_API_BASE")?)?;
        let storage_path =
            PathBuf::from(env.or_default("SUTURAHUB_STORAGE_PATH", DEFAULT_STORAGE_PATH));
        let timeout_secs = env
            .or_default("SUTURAHUB_REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SUTURAHUB_REQUEST_TIMEOUT_SECS".to_owned(), e.to_string())
            })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SUTURAHUB_REQUEST_TIMEOUT_SECS".to_owned(),
                "must be greater than zero".to_owned(),
            ));
        }

        let sentry = SentryConfig {
            dsn: env.optional("SENTRY_DSN"),
            environment: env.or_default("SENTRY_ENVIRONMENT", DEFAULT_SENTRY_ENVIRONMENT),
        };

        Ok(Self {
            api_base,
            storage_path,
            request_timeout: Duration::from_secs(timeout_secs),
            sentry,
        })
    }

    /// Configuration pointing at `api_base` with every optional value defaulted.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `api_base` is not an http(s) URL.
    pub fn for_api_base(api_base: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| (key == "SUTURAHUB_API_BASE").then(|| api_base.to_owned()))
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F: Fn(&str) -> Option<String>> Env<F> {
    /// Get an optional variable. Blank values count as unset.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_owned()))
    }

    /// Get a variable with a default value.
    fn or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_owned())
    }
}

/// Parse the backend origin, forcing a trailing slash so relative joins
/// append instead of replacing the last path segment.
fn parse_api_base(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("SUTURAHUB_API_BASE".to_owned(), reason);

    let mut url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}
