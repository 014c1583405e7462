use super::models::{ClientMode, Config};
use std::time::Duration;
use thiserror::Error;

pub const MAX_RETRIES: u32 = 10;
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Client timeout must be positive")]
    ZeroTimeout,

    #[error("retries ({actual}) exceeds limit of {limit}")]
    TooManyRetries { actual: u32, limit: u32 },

    #[error("retry_delay ({actual:?}) exceeds limit of {limit:?}")]
    RetryDelayTooLong { actual: Duration, limit: Duration },
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_base_url(config)?;
    validate_client_limits(config)?;
    Ok(())
}

/// Only enforced when the real transport is used
fn validate_base_url(config: &Config) -> Result<(), ValidationError> {
    if config.client.mode != ClientMode::Http {
        return Ok(());
    }

    let url = &config.client.base_url;
    let parsed = reqwest::Url::parse(url).map_err(|e| ValidationError::InvalidBaseUrl {
        url: url.clone(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(ValidationError::InvalidBaseUrl {
            url: url.clone(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

fn validate_client_limits(config: &Config) -> Result<(), ValidationError> {
    let client = &config.client;

    if client.timeout.is_zero() {
        return Err(ValidationError::ZeroTimeout);
    }

    if client.retries > MAX_RETRIES {
        return Err(ValidationError::TooManyRetries {
            actual: client.retries,
            limit: MAX_RETRIES,
        });
    }

    if client.retry_delay.as_duration() > MAX_RETRY_DELAY {
        return Err(ValidationError::RetryDelayTooLong {
            actual: client.retry_delay.as_duration(),
            limit: MAX_RETRY_DELAY,
        });
    }

    Ok(())
}
