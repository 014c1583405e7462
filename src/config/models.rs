use crate::humanize::HumanDuration;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub mock: MockConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which backend the API client talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientMode {
    #[default]
    Mock,
    Http,
}

/// API client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub mode: ClientMode,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout: HumanDuration,
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: HumanDuration,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Bearer token (loaded from environment, not from config file)
    #[serde(skip)]
    pub api_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            mode: ClientMode::Mock,
            base_url: default_base_url(),
            timeout: default_timeout(),
            retries: default_retries(),
            retry_delay: default_retry_delay(),
            user_agent: default_user_agent(),
            api_token: None,
        }
    }
}

/// Record store behind the mock handlers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MockStoreKind {
    #[default]
    Memory,
    Fjall,
}

/// Mock backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MockConfig {
    #[serde(default)]
    pub store: MockStoreKind,
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Simulated latency before every mock response
    #[serde(default)]
    pub latency: HumanDuration,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            store: MockStoreKind::Memory,
            store_path: default_store_path(),
            latency: HumanDuration::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// tracing env-filter directive; `RUST_LOG` takes precedence
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

fn default_timeout() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay() -> HumanDuration {
    HumanDuration::from_secs(1)
}

fn default_user_agent() -> String {
    format!("workshop/{}", env!("CARGO_PKG_VERSION"))
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data/mock")
}

fn default_filter() -> String {
    "info,workshop=debug".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.client.mode, ClientMode::Mock);
        assert_eq!(config.client.retries, 3);
        assert_eq!(config.client.timeout, HumanDuration::from_secs(30));
        assert_eq!(config.mock.store, MockStoreKind::Memory);
        assert!(config.mock.latency.is_zero());
    }

    #[test]
    fn test_token_never_serialized() {
        let mut config = Config::default();
        config.client.api_token = Some("secret".to_string());

        let rendered = toml::to_string(&config).unwrap();
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("timeout = \"30s\""));
    }
}
