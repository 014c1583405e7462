//! Client, mock and logging settings
//!
//! Values are layered: struct defaults, then `config/workshop.toml` (or the
//! file named by `WORKSHOP_CONFIG`), then `.env`, then the environment.
//!
//! # Usage
//!
//! ```no_run
//! use workshop::config::Config;
//!
//! let config = Config::load().expect("workshop config");
//! println!("Client mode: {:?}", config.client.mode);
//! ```
//!
//! # Environment overrides
//!
//! Any key can be set as
//! `WORKSHOP__<section>__<key>`
//!
//! Examples:
//! - `WORKSHOP__CLIENT__MODE=http`
//! - `WORKSHOP__CLIENT__TIMEOUT=10s`
//! - `WORKSHOP__MOCK__STORE=fjall`
//!
//! The bearer token is read from `WORKSHOP_API_TOKEN` only.
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/workshop.toml`.
//! This can be overridden using the `WORKSHOP_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{ClientConfig, ClientMode, Config, LoggingConfig, MockConfig, MockStoreKind};
pub use validation::{MAX_RETRIES, MAX_RETRY_DELAY, ValidationError};

use thiserror::Error;

use crate::client::{ClientDefaults, HttpSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read workshop configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("invalid workshop configuration: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Layered load with secrets, then validation
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or a value
    /// is out of range.
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Read an explicit file instead of the default location. Secrets are
    /// not read from the environment.
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let config = sources::read_layers(path.as_ref())?;
        validation::validate(&config)?;
        Ok(config)
    }
}

impl ClientConfig {
    pub fn defaults(&self) -> ClientDefaults {
        ClientDefaults {
            timeout: self.timeout.as_duration(),
            retries: self.retries,
            retry_delay: self.retry_delay.as_duration(),
        }
    }

    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            base_url: self.base_url.clone(),
            user_agent: self.user_agent.clone(),
            auth_token: self.api_token.clone(),
            ..HttpSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[client]\nretries = 2\n").unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        let defaults = config.client.defaults();
        assert_eq!(defaults.retries, 2);
        assert_eq!(defaults.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_validation_runs_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        fs::write(&config_path, "[client]\nmode = \"http\"\nbase_url = \"mailto:ops@example.com\"\n").unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::InvalidBaseUrl { .. })
        ));
    }

    #[test]
    fn test_http_settings_carry_token() {
        let mut config = Config::default();
        config.client.api_token = Some("t0k3n".to_string());

        let settings = config.client.http_settings();
        assert_eq!(settings.auth_token.as_deref(), Some("t0k3n"));
        assert_eq!(settings.base_url, config.client.base_url);
    }
}
