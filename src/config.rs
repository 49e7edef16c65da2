//! Server configuration loaded from the environment
//!
//! `.env` is read first (if present) via dotenvy, then each variable falls
//! back to the default below.

use std::net::SocketAddr;
use std::time::Duration;

use crate::agent::AgentConfig;
use crate::sandbox::{DEFAULT_IMAGE, DEFAULT_TIMEOUT};

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Top-level configuration for the chatgate server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP server binds to
    pub bind_addr: SocketAddr,
    /// Agent backend settings
    pub agent: AgentConfig,
    /// Image used by `/execute` when the request names none
    pub sandbox_image: String,
    /// Default execution timeout
    pub sandbox_timeout: Duration,
    /// OTLP collector endpoint; tracing export is off when unset
    pub otlp_endpoint: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            agent: AgentConfig::default(),
            sandbox_image: DEFAULT_IMAGE.to_string(),
            sandbox_timeout: DEFAULT_TIMEOUT,
            otlp_endpoint: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let bind_addr: SocketAddr = match lookup("CHATGATE_BIND") {
            Some(value) => value.parse().map_err(|e: std::net::AddrParseError| {
                ConfigError::Invalid {
                    name: "CHATGATE_BIND",
                    value,
                    reason: e.to_string(),
                }
            })?,
            None => defaults.bind_addr,
        };

        let sandbox_timeout = match lookup("SANDBOX_TIMEOUT_SECS") {
            Some(value) => {
                let secs: u64 = value.parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::Invalid {
                        name: "SANDBOX_TIMEOUT_SECS",
                        value: value.clone(),
                        reason: e.to_string(),
                    }
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.sandbox_timeout,
        };

        let agent_defaults = defaults.agent;
        let agent = AgentConfig {
            base_url: lookup("OLLAMA_URL").unwrap_or(agent_defaults.base_url),
            model: lookup("OLLAMA_MODEL").unwrap_or(agent_defaults.model),
            name: lookup("AGENT_NAME").unwrap_or(agent_defaults.name),
            instructions: lookup("AGENT_INSTRUCTIONS").unwrap_or(agent_defaults.instructions),
        };

        Ok(Self {
            bind_addr,
            agent,
            sandbox_image: lookup("SANDBOX_IMAGE").unwrap_or(defaults.sandbox_image),
            sandbox_timeout,
            otlp_endpoint: lookup("OTEL_EXPORTER_OTLP_ENDPOINT").filter(|s| !s.is_empty()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = ServerConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.sandbox_image, "python:3.11-slim");
        assert_eq!(config.sandbox_timeout, Duration::from_secs(30));
        assert!(config.otlp_endpoint.is_none());
        assert_eq!(config.agent.model, "llama3.2");
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup_from(&[
            ("CHATGATE_BIND", "127.0.0.1:9000"),
            ("OLLAMA_MODEL", "qwen3"),
            ("SANDBOX_TIMEOUT_SECS", "5"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:9000");
        assert_eq!(config.agent.model, "qwen3");
        assert_eq!(config.sandbox_timeout, Duration::from_secs(5));
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://collector:4317"));
    }

    #[test]
    fn test_invalid_timeout_is_rejected() {
        let err = ServerConfig::from_lookup(lookup_from(&[("SANDBOX_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("SANDBOX_TIMEOUT_SECS"));
    }
}
