//! Client configuration.
//!
//! A `ClientConfig` is built once per API consumer and never changes for
//! the lifetime of the client made from it.

use std::env;
use std::time::Duration;

/// Production endpoint of the waitlist service.
pub const DEFAULT_BASE_URL: &str = "https://api.waitinglist.dev";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Backoff before attempt `n + 1` is `2^n` units.
pub const DEFAULT_BACKOFF_UNIT: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    MissingApiKey,

    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid value {value:?} for {var}")]
    InvalidValue { var: &'static str, value: String },

    #[error("HTTP client could not be built: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Total attempts per call, counting the first one.
    pub max_retries: u32,
    pub backoff_unit: Duration,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_unit: DEFAULT_BACKOFF_UNIT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// A zero timeout means the default.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = or_default_timeout(timeout);
        self
    }

    /// Zero means the default.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = or_default_retries(max_retries);
        self
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// Load configuration from `WAITLIST_*` environment variables.
    ///
    /// `WAITLIST_API_KEY` is required; `WAITLIST_API_URL`,
    /// `WAITLIST_TIMEOUT_MS` and `WAITLIST_MAX_RETRIES` fall back to the
    /// defaults when unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("WAITLIST_API_KEY")
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        let mut config = Self::new(api_key);
        if let Some(url) = lookup("WAITLIST_API_URL") {
            config.base_url = url;
        }
        if let Some(raw) = lookup("WAITLIST_TIMEOUT_MS") {
            let millis = parse_var("WAITLIST_TIMEOUT_MS", raw)?;
            config = config.with_timeout(Duration::from_millis(millis));
        }
        if let Some(raw) = lookup("WAITLIST_MAX_RETRIES") {
            config = config.with_max_retries(parse_var("WAITLIST_MAX_RETRIES", raw)?);
        }
        Ok(config)
    }

    /// Replace zero-valued settings, including ones written straight into
    /// the public fields, with their defaults.
    pub fn normalized(self) -> Self {
        let timeout = self.timeout;
        let max_retries = self.max_retries;
        self.with_timeout(timeout).with_max_retries(max_retries)
    }
}

pub(crate) fn or_default_timeout(timeout: Duration) -> Duration {
    if timeout.is_zero() {
        DEFAULT_TIMEOUT
    } else {
        timeout
    }
}

pub(crate) fn or_default_retries(max_retries: u32) -> u32 {
    if max_retries == 0 {
        DEFAULT_MAX_RETRIES
    } else {
        max_retries
    }
}

fn parse_var<T: std::str::FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("key");
        assert_eq!(config.base_url, "https://api.waitinglist.dev");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.backoff_unit, Duration::from_secs(1));
    }

    #[test]
    fn from_lookup_reads_overrides() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("WAITLIST_API_KEY", "wl_123"),
            ("WAITLIST_API_URL", "http://localhost:4000"),
            ("WAITLIST_TIMEOUT_MS", "2500"),
            ("WAITLIST_MAX_RETRIES", "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "wl_123");
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert_eq!(config.max_retries, 5);
    }

    #[test]
    fn from_lookup_requires_api_key() {
        let err = ClientConfig::from_lookup(lookup(&[("WAITLIST_API_KEY", "")])).unwrap_err();
        assert_eq!(err, ConfigError::MissingApiKey);
    }

    #[test]
    fn zero_builder_values_fall_back_to_defaults() {
        let config = ClientConfig::new("key")
            .with_timeout(Duration::ZERO)
            .with_max_retries(0);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn zero_env_values_fall_back_to_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("WAITLIST_API_KEY", "k"),
            ("WAITLIST_TIMEOUT_MS", "0"),
            ("WAITLIST_MAX_RETRIES", "0"),
        ]))
        .unwrap();
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn normalized_repairs_zeroed_fields() {
        let mut config = ClientConfig::new("key").with_max_retries(5);
        config.timeout = Duration::ZERO;
        config.max_retries = 0;
        let config = config.normalized();
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
    }

    #[test]
    fn from_lookup_rejects_garbage_numbers() {
        let err = ClientConfig::from_lookup(lookup(&[
            ("WAITLIST_API_KEY", "k"),
            ("WAITLIST_MAX_RETRIES", "lots"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue { var: "WAITLIST_MAX_RETRIES", .. }
        ));
    }
}
