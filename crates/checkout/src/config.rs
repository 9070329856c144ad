//! Checkout configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CHECKOUT_BASE_URL` - Public URL of the shop (used for redirect URLs and cookie security)
//! - `CHECKOUT_ADMIN_TOKEN` - Bearer token for admin routes (min 32 chars, high entropy)
//!
//! ## Optional
//! - `CHECKOUT_HOST` - Bind address (default: 127.0.0.1)
//! - `CHECKOUT_PORT` - Listen port (default: 3000)
//! - `CHECKOUT_DATABASE_URL` / `DATABASE_URL` - `PostgreSQL` connection string
//!   (in-memory stores when unset)
//! - `CHECKOUT_CURRENCY` - Store currency (default: EUR)
//! - `CHECKOUT_PAYMENT_GATEWAYS` - Comma-separated gateways (default: cod,bacs)
//! - `CHECKOUT_RATE_LIMIT_PER_MINUTE` - Per-IP limit on order and intent creation (default: 30)
//! - `CHECKOUT_SESSION_CACHE_CAPACITY` - Max shipping sessions held (default: 10000)
//! - `STRIPE_SECRET_KEY` - Enables Stripe payment intents
//! - `STRIPE_PUBLISHABLE_KEY` - Returned to the front end
//! - `STRIPE_TEST_MODE` - `true`/`false` (default: false)
//! - `STRIPE_API_BASE` - API origin (default: <https://api.stripe.com>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

use directpay_core::CurrencyCode;

use crate::services::gateways::GatewayId;

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_GATEWAYS: &str = "cod,bacs";

/// Fragments that only show up in copied `.env` templates.
const PLACEHOLDER_MARKERS: &[&str] = &[
    "changeme",
    "change-me",
    "placeholder",
    "your_",
    "your-",
    "secret-here",
    "token-here",
    "sk_test_xxx",
    "sk_live_xxx",
    "dummy",
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

/// Checkout service configuration.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL of the shop
    pub base_url: String,
    /// Bearer token for admin routes
    pub admin_token: SecretString,
    /// `PostgreSQL` connection URL; `None` runs on in-memory stores
    pub database_url: Option<SecretString>,
    /// Store currency
    pub currency: CurrencyCode,
    /// Gateways offered at checkout, in display order
    pub gateways: Vec<GatewayId>,
    /// Stripe configuration, present when `STRIPE_SECRET_KEY` is set
    pub stripe: Option<StripeConfig>,
    /// Requests per minute per client IP on order and intent creation
    pub rate_limit_per_minute: u32,
    /// Maximum number of shipping sessions kept in the cache
    pub session_cache_capacity: u64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Stripe API configuration.
///
/// Implements `Debug` manually to redact the secret key.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key (server-side only)
    pub secret_key: SecretString,
    /// Publishable key (safe to expose in browser)
    pub publishable_key: Option<String>,
    /// Whether the keys are test-mode keys
    pub test_mode: bool,
    /// API origin, overridable for tests
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("publishable_key", &self.publishable_key)
            .field("test_mode", &self.test_mode)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let base_url = env_required("CHECKOUT_BASE_URL")?;
        if let Err(e) = url::Url::parse(&base_url) {
            return Err(ConfigError::InvalidEnvVar(
                "CHECKOUT_BASE_URL".to_string(),
                e.to_string(),
            ));
        }
        let currency = env_or("CHECKOUT_CURRENCY", "EUR")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CHECKOUT_CURRENCY".to_string(), e))?;

        let stripe = StripeConfig::from_env()?;
        let gateways = parse_gateways(
            &env_or("CHECKOUT_PAYMENT_GATEWAYS", DEFAULT_GATEWAYS),
            stripe.is_some(),
        )?;

        Ok(Self {
            host: env_parsed("CHECKOUT_HOST", "127.0.0.1")?,
            port: env_parsed("CHECKOUT_PORT", "3000")?,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token: SecretPolicy::ADMIN_TOKEN.load("CHECKOUT_ADMIN_TOKEN")?,
            database_url: database_url_from_env(),
            currency,
            gateways,
            stripe,
            rate_limit_per_minute: env_parsed("CHECKOUT_RATE_LIMIT_PER_MINUTE", "30")?,
            session_cache_capacity: env_parsed("CHECKOUT_SESSION_CACHE_CAPACITY", "10000")?,
            sentry_dsn: env_optional("SENTRY_DSN"),
            sentry_environment: env_optional("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration with defaults for everything but the base URL and admin
    /// token. In-memory stores, no Stripe, `cod` and `bacs` gateways.
    #[must_use]
    pub fn with_defaults(base_url: &str, admin_token: &str) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token: SecretString::from(admin_token),
            database_url: None,
            currency: CurrencyCode::EUR,
            gateways: vec![GatewayId::Cod, GatewayId::Bacs],
            stripe: None,
            rate_limit_per_minute: 30,
            session_cache_capacity: 10_000,
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Session cookies carry `Secure` when the shop is served over https.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

impl StripeConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        if env_optional("STRIPE_SECRET_KEY").is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            secret_key: SecretPolicy::API_KEY.load("STRIPE_SECRET_KEY")?,
            publishable_key: env_optional("STRIPE_PUBLISHABLE_KEY"),
            test_mode: env_parsed("STRIPE_TEST_MODE", "false")?,
            api_base: env_or("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE)
                .trim_end_matches('/')
                .to_string(),
        }))
    }
}

/// Parse the gateway list; `stripe` is always offered when keys are present.
fn parse_gateways(raw: &str, stripe_configured: bool) -> Result<Vec<GatewayId>, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidEnvVar("CHECKOUT_PAYMENT_GATEWAYS".into(), reason);

    let mut gateways = Vec::new();
    for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let id = part.parse::<GatewayId>().map_err(invalid)?;
        if id == GatewayId::Stripe && !stripe_configured {
            return Err(invalid("stripe requires STRIPE_SECRET_KEY".into()));
        }
        if !gateways.contains(&id) {
            gateways.push(id);
        }
    }
    if stripe_configured && !gateways.contains(&GatewayId::Stripe) {
        gateways.insert(0, GatewayId::Stripe);
    }
    Ok(gateways)
}

fn env_required(key: &str) -> Result<String, ConfigError> {
    env_optional(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
}

/// Unset and blank variables both read as `None`.
fn env_optional(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_optional(key).unwrap_or_else(|| default.to_string())
}

fn env_parsed<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// `CHECKOUT_DATABASE_URL`, then the generic `DATABASE_URL`.
fn database_url_from_env() -> Option<SecretString> {
    env_optional("CHECKOUT_DATABASE_URL")
        .or_else(|| env_optional("DATABASE_URL"))
        .map(SecretString::from)
}

/// Rules a credential read from the environment must satisfy.
#[derive(Debug, Clone, Copy)]
struct SecretPolicy {
    min_len: usize,
    min_bits_per_char: f64,
}

impl SecretPolicy {
    const ADMIN_TOKEN: Self = Self {
        min_len: 32,
        min_bits_per_char: 3.3,
    };

    /// Stripe issues its own keys, so only the placeholder check applies.
    const API_KEY: Self = Self {
        min_len: 0,
        min_bits_per_char: 0.0,
    };

    /// Describe the first rule `value` breaks, if any.
    fn violation(self, value: &str) -> Option<String> {
        let lowered = value.to_ascii_lowercase();
        if let Some(marker) = PLACEHOLDER_MARKERS.iter().find(|m| lowered.contains(*m)) {
            return Some(format!("looks like a template value (contains \"{marker}\")"));
        }

        let len = value.chars().count();
        if len < self.min_len {
            return Some(format!("needs {} characters, found {len}", self.min_len));
        }

        let bits = bits_per_char(value);
        if bits < self.min_bits_per_char {
            return Some(format!(
                "too predictable ({bits:.2} bits per character, minimum {:.1}); generate it randomly",
                self.min_bits_per_char
            ));
        }
        None
    }

    /// Read `key` and reject it when it breaks the policy.
    fn load(self, key: &str) -> Result<SecretString, ConfigError> {
        let value = env_required(key)?;
        match self.violation(&value) {
            Some(reason) => Err(ConfigError::InsecureSecret(key.to_string(), reason)),
            None => Ok(SecretString::from(value)),
        }
    }
}

/// Shannon entropy of the character distribution.
fn bits_per_char(value: &str) -> f64 {
    let mut counts: BTreeMap<char, u32> = BTreeMap::new();
    for c in value.chars() {
        *counts.entry(c).or_default() += 1;
    }
    let total: u32 = counts.values().sum();
    if total == 0 {
        return 0.0;
    }

    let total = f64::from(total);
    counts
        .values()
        .map(|&n| f64::from(n) / total)
        .map(|p| -p * p.log2())
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_char() {
        assert!(bits_per_char("").abs() < f64::EPSILON);
        assert!(bits_per_char("zzzz").abs() < f64::EPSILON);
        assert!((bits_per_char("abab") - 1.0).abs() < 1e-9);
        assert!((bits_per_char("abcd") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_admin_token_policy() {
        let policy = SecretPolicy::ADMIN_TOKEN;
        assert!(policy.violation("Kq7v2M9xR4pL8wZ1nB6tY3cF0hJ5dG2s").is_none());

        let template = policy.violation("changeme-changeme-changeme-changeme");
        assert!(template.unwrap().contains("template"));

        let short = policy.violation("Kq7v2M9x");
        assert!(short.unwrap().contains("needs 32"));

        let repetitive = policy.violation("abababababababababababababababab");
        assert!(repetitive.unwrap().contains("predictable"));
    }

    #[test]
    fn test_api_key_policy_only_rejects_templates() {
        let policy = SecretPolicy::API_KEY;
        assert!(policy.violation("sk_test_4eC39HqLyjWDarjtT1zdp7dc").is_none());
        assert!(policy.violation("sk_test_xxxxxxxx").is_some());
    }

    #[test]
    fn test_parse_gateways_adds_stripe_when_configured() {
        let gateways = parse_gateways("cod, bacs", true).unwrap();
        assert_eq!(
            gateways,
            vec![GatewayId::Stripe, GatewayId::Cod, GatewayId::Bacs]
        );
    }

    #[test]
    fn test_parse_gateways_rejects_stripe_without_keys() {
        assert!(parse_gateways("stripe,cod", false).is_err());
        assert!(parse_gateways("cod,paypal", false).is_err());
    }

    #[test]
    fn test_secure_cookies_follow_scheme() {
        let config = CheckoutConfig::with_defaults("https://shop.example", "t");
        assert!(config.secure_cookies());
        let config = CheckoutConfig::with_defaults("http://localhost:3000/", "t");
        assert!(!config.secure_cookies());
        assert_eq!(config.base_url, "http://localhost:3000");
    }

    #[test]
    fn test_socket_addr() {
        let config = CheckoutConfig::with_defaults("http://localhost:3000", "t");
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_stripe_config_debug_redacts_secret() {
        let config = StripeConfig {
            secret_key: SecretString::from("sk_live_super_secret_value"),
            publishable_key: Some("pk_live_visible".to_string()),
            test_mode: false,
            api_base: DEFAULT_STRIPE_API_BASE.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("pk_live_visible"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_super_secret_value"));
    }
}
