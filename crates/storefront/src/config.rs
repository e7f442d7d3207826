//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `PAYMENT_PUBLISHABLE_KEY` - Payment gateway publishable key (`pk_...`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `CATALOG_API_URL` - Product catalog endpoint (default: <https://fakestoreapi.com/products>)
//! - `CATALOG_FETCH_ATTEMPTS` - Catalog load attempts before giving up (default: 3)
//! - `CATALOG_TIMEOUT_SECS` - Per-attempt catalog request timeout (default: 10)
//! - `CHECKOUT_SESSION_URL` - Session-creation backend base URL (default: <http://localhost:8081>)
//! - `CHECKOUT_HOSTED_URL` - Hosted checkout page base URL (default: <https://checkout.stripe.com/c/pay/>)
//! - `CHECKOUT_TIMEOUT_SECS` - Session-creation request timeout (default: 15)
//! - `CHECKOUT_FAILURE_RETENTION_SECS` - How long an unreported checkout failure is kept (default: 600)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error event sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Performance trace sample rate (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

const DEFAULT_CATALOG_API_URL: &str = "https://fakestoreapi.com/products";
const DEFAULT_CHECKOUT_SESSION_URL: &str = "http://localhost:8081";
const DEFAULT_CHECKOUT_HOSTED_URL: &str = "https://checkout.stripe.com/c/pay/";

/// Publishable keys are the only gateway credential allowed in storefront config.
const PUBLISHABLE_KEY_PREFIX: &str = "pk_";
const TEST_KEY_PREFIX: &str = "pk_test_";

/// Prefixes of server-side gateway credentials (secret and restricted keys).
const SECRET_KEY_PREFIXES: &[&str] = &["sk_", "rk_"];

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "your_",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Product catalog upstream
    pub catalog: CatalogConfig,
    /// Checkout session backend and payment gateway
    pub checkout: CheckoutConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g., production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of error events sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions traced
    pub sentry_traces_sample_rate: f32,
}

/// Product catalog upstream configuration.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Endpoint returning the JSON product array
    pub api_url: Url,
    /// Number of load attempts at startup (at least 1)
    pub fetch_attempts: u32,
    /// Per-attempt request timeout
    pub timeout: Duration,
}

/// Checkout configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Base URL of the session-creation backend (always ends with `/`)
    pub session_url: Url,
    /// Base URL of the hosted checkout page (always ends with `/`)
    pub hosted_url: Url,
    /// Payment gateway publishable key (safe to expose in the browser)
    pub publishable_key: String,
    /// Session-creation request timeout
    pub timeout: Duration,
    /// How long a failed checkout waits for its visitor to come back
    pub failure_retention: Duration,
}

impl CheckoutConfig {
    /// Whether the gateway key is a test-mode key.
    #[must_use]
    pub fn is_test_mode(&self) -> bool {
        self.publishable_key.starts_with(TEST_KEY_PREFIX)
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the gateway key is a secret key or a placeholder.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// See [`StorefrontConfig::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env.parse_or("STOREFRONT_HOST", "127.0.0.1")?;
        let port = env.parse_or("STOREFRONT_PORT", "3000")?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;

        let catalog = CatalogConfig {
            api_url: env.url_or("CATALOG_API_URL", DEFAULT_CATALOG_API_URL)?,
            fetch_attempts: env.parse_or::<u32>("CATALOG_FETCH_ATTEMPTS", "3")?.max(1),
            timeout: Duration::from_secs(env.parse_or("CATALOG_TIMEOUT_SECS", "10")?),
        };

        let publishable_key = env.required("PAYMENT_PUBLISHABLE_KEY")?;
        validate_publishable_key(&publishable_key, "PAYMENT_PUBLISHABLE_KEY")?;

        let checkout = CheckoutConfig {
            session_url: with_trailing_slash(
                env.url_or("CHECKOUT_SESSION_URL", DEFAULT_CHECKOUT_SESSION_URL)?,
            ),
            hosted_url: with_trailing_slash(
                env.url_or("CHECKOUT_HOSTED_URL", DEFAULT_CHECKOUT_HOSTED_URL)?,
            ),
            publishable_key,
            timeout: Duration::from_secs(env.parse_or("CHECKOUT_TIMEOUT_SECS", "15")?),
            failure_retention: Duration::from_secs(
                env.parse_or("CHECKOUT_FAILURE_RETENTION_SECS", "600")?,
            ),
        };

        Ok(Self {
            host,
            port,
            base_url,
            catalog,
            checkout,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env.parse_or("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: env.parse_or("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the storefront is served over HTTPS.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Typed access to a variable source.
struct Env<'a, F: Fn(&str) -> Option<String>>(&'a F);

impl<F: Fn(&str) -> Option<String>> Env<'_, F> {
    /// Get an optional variable (empty values count as unset).
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a required variable.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Parse a variable, falling back to `default` when unset.
    fn parse_or<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .as_deref()
            .unwrap_or(default)
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }

    /// Parse an HTTP(S) URL variable, falling back to `default` when unset.
    fn url_or(&self, key: &str, default: &str) -> Result<Url, ConfigError> {
        let url: Url = self.parse_or(key, default)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEnvVar(
                key.to_string(),
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(url)
    }
}

/// Ensure a base URL ends with `/` so `Url::join` appends instead of replacing.
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Validate that a gateway key is a real publishable key.
fn validate_publishable_key(key: &str, var_name: &str) -> Result<(), ConfigError> {
    if SECRET_KEY_PREFIXES
        .iter()
        .any(|prefix| key.starts_with(prefix))
    {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            "this is a server-side secret key; only publishable keys belong in storefront config"
                .to_string(),
        ));
    }

    if !key.starts_with(PUBLISHABLE_KEY_PREFIX) {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("expected a publishable key starting with '{PUBLISHABLE_KEY_PREFIX}'"),
        ));
    }

    let lower = key.to_lowercase();
    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    Ok(())
}
