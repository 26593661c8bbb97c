//! Data layer configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional (remote store - both or neither)
//! - `SHOEBOX_REMOTE_URL` - Base URL of the hosted store (e.g., `https://xyz.supabase.co`)
//! - `SHOEBOX_REMOTE_KEY` - API key sent as `apikey` and bearer token
//!
//! ## Optional (remote store tuning)
//! - `SHOEBOX_REMOTE_TIMEOUT_SECS` - Per-request deadline (default: 30)
//! - `SHOEBOX_USERS_TABLE` - Users table (default: `custom_users`)
//! - `SHOEBOX_PRODUCTS_TABLE` - Products table (default: `products`)
//! - `SHOEBOX_IMAGE_BUCKET` - Object storage bucket for product images (default: `products`)
//!
//! ## Optional (local)
//! - `SHOEBOX_DATA_DIR` - Fallback store directory (default: `<data-local-dir>/shoebox`)
//! - `SHOEBOX_ADMIN_PIN` - Dashboard passcode (default: `1290`)
//! - `SHOEBOX_LOG_JSON` - Emit JSON logs when set
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//!
//! Without the remote pair every operation is served by the local fallback
//! store.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use crate::auth::DEFAULT_ADMIN_PIN;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_USERS_TABLE: &str = "custom_users";
const DEFAULT_PRODUCTS_TABLE: &str = "products";
const DEFAULT_IMAGE_BUCKET: &str = "products";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Data layer configuration.
#[derive(Debug, Clone)]
pub struct ShoeboxConfig {
    /// Remote store connection (optional - fallback only when absent)
    pub remote: Option<RemoteConfig>,
    /// Directory holding the fallback store files
    pub data_dir: PathBuf,
    /// Shared dashboard passcode
    pub admin_pin: SecretString,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
    /// Emit logs as JSON
    pub log_json: bool,
}

/// Remote store connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct RemoteConfig {
    /// Base URL, always ending in `/`
    pub base_url: Url,
    /// API key (sent as `apikey` header and bearer token)
    pub api_key: SecretString,
    /// Deadline applied to every request
    pub timeout: Duration,
    /// Users table name
    pub users_table: String,
    /// Products table name
    pub products_table: String,
    /// Object storage bucket for product images
    pub image_bucket: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("users_table", &self.users_table)
            .field("products_table", &self.products_table)
            .field("image_bucket", &self.image_bucket)
            .finish()
    }
}

impl RemoteConfig {
    /// Build a remote configuration with default tables, bucket and timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str, api_key: SecretString) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            api_key,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            users_table: DEFAULT_USERS_TABLE.to_string(),
            products_table: DEFAULT_PRODUCTS_TABLE.to_string(),
            image_bucket: DEFAULT_IMAGE_BUCKET.to_string(),
        })
    }

    /// Replace the per-request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub(crate) fn api_key_str(&self) -> &str {
        self.api_key.expose_secret()
    }

    fn from_env() -> Result<Option<Self>, ConfigError> {
        let url = get_optional_env("SHOEBOX_REMOTE_URL");
        let key = get_optional_env("SHOEBOX_REMOTE_KEY");

        let (url, key) = match (url, key) {
            (Some(url), Some(key)) => (url, key),
            (None, None) => return Ok(None),
            _ => {
                return Err(ConfigError::InvalidEnvVar(
                    "SHOEBOX_REMOTE_*".to_string(),
                    "Both SHOEBOX_REMOTE_URL and SHOEBOX_REMOTE_KEY must be set together"
                        .to_string(),
                ));
            }
        };

        if let Err(e) = check_key_entropy(&key) {
            tracing::warn!("SHOEBOX_REMOTE_KEY validation warning: {e}");
        }

        let timeout_secs = get_env_or_default(
            "SHOEBOX_REMOTE_TIMEOUT_SECS",
            &DEFAULT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("SHOEBOX_REMOTE_TIMEOUT_SECS".to_string(), e.to_string())
        })?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SHOEBOX_REMOTE_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Some(Self {
            base_url: parse_base_url(&url)?,
            api_key: SecretString::from(key),
            timeout: Duration::from_secs(timeout_secs),
            users_table: get_env_or_default("SHOEBOX_USERS_TABLE", DEFAULT_USERS_TABLE),
            products_table: get_env_or_default("SHOEBOX_PRODUCTS_TABLE", DEFAULT_PRODUCTS_TABLE),
            image_bucket: get_env_or_default("SHOEBOX_IMAGE_BUCKET", DEFAULT_IMAGE_BUCKET),
        }))
    }
}

impl ShoeboxConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or only half of the
    /// remote pair is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let remote = RemoteConfig::from_env()?;
        let data_dir = get_optional_env("SHOEBOX_DATA_DIR")
            .map_or_else(default_data_dir, PathBuf::from);
        let admin_pin = SecretString::from(get_env_or_default(
            "SHOEBOX_ADMIN_PIN",
            DEFAULT_ADMIN_PIN,
        ));

        Ok(Self {
            remote,
            data_dir,
            admin_pin,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            log_json: get_optional_env("SHOEBOX_LOG_JSON").is_some(),
        })
    }

    /// Configuration with no remote store, keeping fallback files in `data_dir`.
    #[must_use]
    pub fn local_only(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            remote: None,
            data_dir: data_dir.into(),
            admin_pin: SecretString::from(DEFAULT_ADMIN_PIN),
            sentry_dsn: None,
            sentry_environment: None,
            log_json: false,
        }
    }

    /// Returns a reference to the remote configuration, if available.
    ///
    /// Returns `None` if the remote pair was not set, which routes every
    /// operation to the fallback store.
    #[must_use]
    pub const fn remote(&self) -> Option<&RemoteConfig> {
        self.remote.as_ref()
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

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("shoebox")
}

/// Parse the remote base URL, forcing a trailing slash so relative joins keep
/// any path prefix.
fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar("SHOEBOX_REMOTE_URL".to_string(), e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            "SHOEBOX_REMOTE_URL".to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Real API keys are long random tokens; flag anything that looks typed in.
fn check_key_entropy(key: &str) -> Result<(), String> {
    let entropy = shannon_entropy(key);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(format!(
            "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
        ));
    }
    Ok(())
}
