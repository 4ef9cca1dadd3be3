use std::time::Duration;
use thiserror::Error;

use crate::error::RelayError;

pub const API_KEY_VAR: &str = "AI_GATEWAY_API_KEY";
pub const DEFAULT_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not configured")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value}")]
    Invalid { var: &'static str, value: String },
}

/// Relay settings, loaded once at startup and shared read-only by every request.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub api_key: Option<String>,
    pub gateway_url: String,
    pub model: String,
    pub request_timeout: Duration,
    pub max_body_bytes: usize,
    pub port: u16,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            port: DEFAULT_PORT,
        }
    }
}

impl RelayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Builds the config from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let request_timeout = match get("AI_GATEWAY_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_number("AI_GATEWAY_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };
        let max_body_bytes = match get("MAX_BODY_BYTES") {
            Some(raw) => parse_number("MAX_BODY_BYTES", &raw)?,
            None => defaults.max_body_bytes,
        };
        let port = match get("PORT") {
            Some(raw) => parse_number("PORT", &raw)?,
            None => defaults.port,
        };

        Ok(Self {
            api_key: get(API_KEY_VAR),
            gateway_url: get("AI_GATEWAY_URL").unwrap_or(defaults.gateway_url),
            model: get("AI_GATEWAY_MODEL").unwrap_or(defaults.model),
            request_timeout,
            max_body_bytes,
            port,
        })
    }

    /// Startup check: the relay refuses to serve without a gateway credential.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() {
            return Err(ConfigError::Missing(API_KEY_VAR));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "AI_GATEWAY_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn api_key(&self) -> Result<&str, RelayError> {
        self.api_key
            .as_deref()
            .ok_or(RelayError::NotConfigured(API_KEY_VAR))
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = RelayConfig::from_lookup(lookup(&[(API_KEY_VAR, "secret")])).unwrap();

        assert_eq!(config.api_key.as_deref(), Some("secret"));
        assert_eq!(config.gateway_url, DEFAULT_GATEWAY_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_key_counts_as_missing() {
        let config = RelayConfig::from_lookup(lookup(&[(API_KEY_VAR, "  ")])).unwrap();

        assert!(config.api_key.is_none());
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "AI_GATEWAY_API_KEY is not configured");
    }

    #[test]
    fn overrides_are_parsed() {
        let config = RelayConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            ("AI_GATEWAY_URL", "http://localhost:9999/v1/chat/completions"),
            ("AI_GATEWAY_MODEL", "openai/gpt-4.1-mini"),
            ("AI_GATEWAY_TIMEOUT_SECS", "30"),
            ("MAX_BODY_BYTES", "1024"),
            ("PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.gateway_url, "http://localhost:9999/v1/chat/completions");
        assert_eq!(config.model, "openai/gpt-4.1-mini");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_body_bytes, 1024);
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = RelayConfig::from_lookup(lookup(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "PORT", .. }));
    }

    #[test]
    fn zero_timeout_fails_validation() {
        let config = RelayConfig::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            ("AI_GATEWAY_TIMEOUT_SECS", "0"),
        ]))
        .unwrap();
        assert!(config.validate().is_err());
    }
}
