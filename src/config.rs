//! Configuration types.

use std::net::{Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Most emails accepted in one classification batch.
pub const MAX_BATCH_SIZE: usize = 50;

/// Settings for the batch classifier.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Sampling temperature (kept low for terse, structured output).
    pub temperature: f32,
    /// Max tokens for the classification completion.
    pub max_tokens: u32,
    /// Pause after every email, including the last one.
    pub inter_item_delay: Duration,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 300,
            inter_item_delay: Duration::from_millis(100),
        }
    }
}

/// Provider settings shared by every request; the API key arrives per request.
#[derive(Debug, Clone)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Browser origin allowed by CORS.
    pub frontend_url: String,
    pub llm: LlmSettings,
    pub classifier: ClassifierConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            frontend_url: "http://localhost:5173".to_string(),
            llm: LlmSettings::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = parse_or(&lookup, "PORT", defaults.port)?;
        let frontend_url = lookup("FRONTEND_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.frontend_url);

        let model = lookup("OPENAI_MODEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.llm.model);
        let base_url = lookup("OPENAI_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.llm.base_url);
        let timeout_secs: u64 =
            parse_or(&lookup, "OPENAI_TIMEOUT_SECS", defaults.llm.timeout.as_secs())?;

        let delay_ms: u64 = parse_or(
            &lookup,
            "CLASSIFY_DELAY_MS",
            defaults.classifier.inter_item_delay.as_millis() as u64,
        )?;

        Ok(Self {
            port,
            frontend_url,
            llm: LlmSettings {
                model,
                base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            classifier: ClassifierConfig {
                inter_item_delay: Duration::from_millis(delay_ms),
                ..defaults.classifier
            },
        })
    }

    /// Address the server listens on.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, self.port))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{raw:?}: {e}"),
                })
        }
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.frontend_url, "http://localhost:5173");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.timeout, Duration::from_secs(30));
        assert_eq!(config.classifier.inter_item_delay, Duration::from_millis(100));
        assert_eq!(config.classifier.max_tokens, 300);
        assert!((config.classifier.temperature - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn overrides_from_environment() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("PORT", "8081"),
            ("FRONTEND_URL", "https://mail.example.com"),
            ("OPENAI_MODEL", "gpt-4o-mini"),
            ("OPENAI_BASE_URL", "http://127.0.0.1:9000/v1"),
            ("OPENAI_TIMEOUT_SECS", "5"),
            ("CLASSIFY_DELAY_MS", "0"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8081);
        assert_eq!(config.frontend_url, "https://mail.example.com");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.base_url, "http://127.0.0.1:9000/v1");
        assert_eq!(config.llm.timeout, Duration::from_secs(5));
        assert_eq!(config.classifier.inter_item_delay, Duration::ZERO);
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = ServerConfig::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "PORT"),
        }
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config =
            ServerConfig::from_lookup(lookup_from(&[("PORT", "  "), ("OPENAI_MODEL", "")]))
                .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn bind_addr_uses_all_interfaces() {
        let config = ServerConfig {
            port: 6000,
            ..ServerConfig::default()
        };
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:6000");
    }
}
