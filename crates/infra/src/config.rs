//! Runtime configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use fenestra_catalog::DEFAULT_PRODUCT_BASE_URL;

pub const DEFAULT_AI_ENDPOINT: &str = "https://gemini-endpoint-yf2trly67a-uc.a.run.app/";
pub const DEFAULT_HANDOFF_PHONE: &str = "5511976810216";
const DEFAULT_AI_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_HYDRATION_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is invalid: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Assistant service URL (`FENESTRA_AI_ENDPOINT`).
    pub ai_endpoint: String,
    /// Per-request assistant timeout (`FENESTRA_AI_TIMEOUT_MS`).
    pub ai_timeout: Duration,
    /// WhatsApp number specialists are reached on, digits only (`FENESTRA_HANDOFF_PHONE`).
    pub handoff_phone: String,
    /// Prefix for product links (`FENESTRA_PRODUCT_BASE_URL`).
    pub product_base_url: String,
    /// Catalog document to load instead of the embedded one (`FENESTRA_CATALOG_PATH`).
    pub catalog_path: Option<PathBuf>,
    /// How long to wait for the first session snapshot (`FENESTRA_HYDRATION_TIMEOUT_MS`).
    pub hydration_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ai_endpoint: DEFAULT_AI_ENDPOINT.to_string(),
            ai_timeout: Duration::from_millis(DEFAULT_AI_TIMEOUT_MS),
            handoff_phone: DEFAULT_HANDOFF_PHONE.to_string(),
            product_base_url: DEFAULT_PRODUCT_BASE_URL.to_string(),
            catalog_path: None,
            hydration_timeout: Duration::from_millis(DEFAULT_HYDRATION_TIMEOUT_MS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self::default();

        if let Some(endpoint) = get("FENESTRA_AI_ENDPOINT") {
            config.ai_endpoint = url_value("FENESTRA_AI_ENDPOINT", endpoint)?;
        }
        if let Some(ms) = get("FENESTRA_AI_TIMEOUT_MS") {
            config.ai_timeout = millis("FENESTRA_AI_TIMEOUT_MS", ms)?;
        }
        if let Some(phone) = get("FENESTRA_HANDOFF_PHONE") {
            if !phone.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::Invalid {
                    key: "FENESTRA_HANDOFF_PHONE",
                    value: phone,
                    reason: "expected digits only, with country code",
                });
            }
            config.handoff_phone = phone;
        }
        if let Some(base) = get("FENESTRA_PRODUCT_BASE_URL") {
            config.product_base_url = url_value("FENESTRA_PRODUCT_BASE_URL", base)?;
        }
        if let Some(path) = get("FENESTRA_CATALOG_PATH") {
            config.catalog_path = Some(PathBuf::from(path));
        }
        if let Some(ms) = get("FENESTRA_HYDRATION_TIMEOUT_MS") {
            config.hydration_timeout = millis("FENESTRA_HYDRATION_TIMEOUT_MS", ms)?;
        }

        Ok(config)
    }
}

fn millis(key: &'static str, value: String) -> Result<Duration, ConfigError> {
    match value.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected a positive number of milliseconds",
        }),
    }
}

fn url_value(key: &'static str, value: String) -> Result<String, ConfigError> {
    match reqwest::Url::parse(&value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(value),
        _ => Err(ConfigError::Invalid {
            key,
            value,
            reason: "expected an http(s) URL",
        }),
    }
}
