//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FORMCART_API_KEY` - Form API key
//!
//! ## Optional
//! - `FORMCART_API_BASE_URL` - API root (default: `https://api.jotform.com`)
//! - `FORMCART_SOURCE_FORMS` - Comma-separated catalog form ids
//! - `FORMCART_ORDER_FORM` - Form receiving orders (default: first source)
//! - `FORMCART_ENVIRONMENT` - `production` or `development` (default: production)
//! - `FORMCART_DEV_SUBMISSION_FALLBACK` - Fake order success when the endpoint
//!   fails; development only (default: false)
//! - `FORMCART_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 12)
//! - `FORMCART_SHIPPING_FEE` - Flat shipping shown in the order summary (default: 4.99)
//! - `FORMCART_CONFIRMATION_RESET_SECS` - Confirmation screen dwell time (default: 3)
//! - `FORMCART_SYNTHETIC_FALLBACK` - Generate a stand-in catalog for dead sources (default: true)
//! - `FORMCART_STATE_PATH` - State file used by the binary (default: `formcart-state.json`)

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

use crate::domain::value_objects::{Money, SourceId};

pub const DEFAULT_BASE_URL: &str = "https://api.jotform.com";
pub const DEFAULT_SOURCE_FORMS: &[&str] = &["251074098711961", "251074116166956", "251073669442965"];
const DEFAULT_TIMEOUT_SECS: u64 = 12;
const DEFAULT_RESET_SECS: u64 = 3;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("{0} cannot be enabled in production")]
    DevelopmentOnly(String),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Environment {
    #[default]
    Production,
    Development,
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Self::Production),
            "development" | "dev" => Ok(Self::Development),
            other => Err(format!("unknown environment '{other}'")),
        }
    }
}

/// Form field ids the order submission maps onto.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    pub full_name: String,
    pub address: String,
    pub order_summary: String,
    pub total_amount: String,
    /// First id used for per-item fields not found in `product_fields`
    pub product_details: u32,
    /// Known product name → field id pairs
    pub product_fields: Vec<(String, String)>,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            full_name: "1".into(),
            address: "2".into(),
            order_summary: "3".into(),
            total_amount: "4".into(),
            product_details: 5,
            product_fields: vec![
                ("Apple, Red".into(), "5".into()),
                ("Asparagus".into(), "6".into()),
                ("Avocado, Hass 60 ct #1".into(), "7".into()),
            ],
        }
    }
}

/// Storefront configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct StorefrontConfig {
    pub base_url: String,
    pub api_key: SecretString,
    pub sources: Vec<SourceId>,
    /// Form receiving orders; the first source when unset
    pub order_form: Option<SourceId>,
    pub environment: Environment,
    pub dev_submission_fallback: bool,
    pub http_timeout: Duration,
    pub shipping_fee: Money,
    pub confirmation_reset: Duration,
    pub synthetic_fallback: bool,
    pub fields: FieldMapping,
    pub state_path: PathBuf,
}

impl std::fmt::Debug for StorefrontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorefrontConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("sources", &self.sources)
            .field("order_form", &self.order_form)
            .field("environment", &self.environment)
            .field("dev_submission_fallback", &self.dev_submission_fallback)
            .field("http_timeout", &self.http_timeout)
            .field("shipping_fee", &self.shipping_fee)
            .field("confirmation_reset", &self.confirmation_reset)
            .field("synthetic_fallback", &self.synthetic_fallback)
            .field("state_path", &self.state_path)
            .finish_non_exhaustive()
    }
}

impl StorefrontConfig {
    /// Defaults for everything but the key; handy for tests and embedding.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let sources = DEFAULT_SOURCE_FORMS.iter().filter_map(|id| SourceId::new(*id).ok()).collect();
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: SecretString::from(api_key.into()),
            sources,
            order_form: None,
            environment: Environment::Production,
            dev_submission_fallback: false,
            http_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            shipping_fee: Money::new(Decimal::new(499, 2)),
            confirmation_reset: Duration::from_secs(DEFAULT_RESET_SECS),
            synthetic_fallback: true,
            fields: FieldMapping::default(),
            state_path: PathBuf::from("formcart-state.json"),
        }
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid, or
    /// if the development submission fallback is requested in production.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_key = get_required_env("FORMCART_API_KEY")?;
        let mut config = Self::new(get_env_or_default("FORMCART_API_BASE_URL", DEFAULT_BASE_URL), api_key);

        if let Some(raw) = get_optional_env("FORMCART_SOURCE_FORMS") {
            config.sources = parse_sources(&raw)?;
        }
        if let Some(raw) = get_optional_env("FORMCART_ORDER_FORM") {
            let form = SourceId::new(raw)
                .map_err(|e| ConfigError::InvalidEnvVar("FORMCART_ORDER_FORM".into(), e.to_string()))?;
            config.order_form = Some(form);
        }
        config.environment = parse_env("FORMCART_ENVIRONMENT", config.environment)?;
        config.dev_submission_fallback = parse_bool("FORMCART_DEV_SUBMISSION_FALLBACK", false)?;
        config.http_timeout = Duration::from_secs(parse_env("FORMCART_HTTP_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?);
        config.shipping_fee = Money::new(parse_env("FORMCART_SHIPPING_FEE", config.shipping_fee.amount())?);
        config.confirmation_reset = Duration::from_secs(parse_env("FORMCART_CONFIRMATION_RESET_SECS", DEFAULT_RESET_SECS)?);
        config.synthetic_fallback = parse_bool("FORMCART_SYNTHETIC_FALLBACK", true)?;
        if let Some(path) = get_optional_env("FORMCART_STATE_PATH") {
            config.state_path = PathBuf::from(path);
        }

        config.validate()?;
        Ok(config)
    }

    /// Cross-field checks shared by every construction path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dev_submission_fallback && self.environment == Environment::Production {
            return Err(ConfigError::DevelopmentOnly("FORMCART_DEV_SUBMISSION_FALLBACK".into()));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::InvalidEnvVar("FORMCART_SOURCE_FORMS".into(), "no form ids".into()));
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar("FORMCART_HTTP_TIMEOUT_SECS".into(), "must be positive".into()));
        }
        Ok(())
    }

    pub fn order_form(&self) -> Option<&SourceId> {
        self.order_form.as_ref().or_else(|| self.sources.first())
    }

    /// Whether failed submissions may be replaced with a synthetic success.
    pub fn allows_dev_fallback(&self) -> bool {
        self.dev_submission_fallback && self.environment == Environment::Development
    }
}

fn parse_sources(raw: &str) -> Result<Vec<SourceId>, ConfigError> {
    raw.split(',')
        .filter(|s| !s.trim().is_empty())
        .map(|s| SourceId::new(s).map_err(|e| ConfigError::InvalidEnvVar("FORMCART_SOURCE_FORMS".into(), format!("{s}: {e}"))))
        .collect()
}

fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn get_optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(name: &str, default: &str) -> String {
    get_optional_env(name).unwrap_or_else(|| default.to_string())
}

fn parse_env<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get_optional_env(name) {
        Some(raw) => raw.trim().parse::<T>().map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(name: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(name).map(|v| v.trim().to_ascii_lowercase()) {
        None => Ok(default),
        Some(v) if matches!(v.as_str(), "1" | "true" | "yes" | "on") => Ok(true),
        Some(v) if matches!(v.as_str(), "0" | "false" | "no" | "off") => Ok(false),
        Some(v) => Err(ConfigError::InvalidEnvVar(name.to_string(), format!("not a boolean: {v}"))),
    }
}
