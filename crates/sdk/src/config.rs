//! SDK configuration.

use std::time::Duration;

use crate::error::ClientError;

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;

/// Configuration for [`crate::GatewayClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base URL, without trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry attempts for transport failures and 429 responses.
    pub retry_attempts: u32,
}

impl ClientConfig {
    /// Build a configuration from a base URL with default timeout/retries.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(ClientError::Configuration(
                "base_url cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    /// Load configuration from `AUTH_GATEWAY_*` environment variables.
    ///
    /// `AUTH_GATEWAY_URL` is required; `AUTH_GATEWAY_TIMEOUT` (seconds) and
    /// `AUTH_GATEWAY_RETRY_ATTEMPTS` are optional.
    pub fn from_env() -> Result<Self, ClientError> {
        let base_url = std::env::var("AUTH_GATEWAY_URL").map_err(|_| {
            ClientError::Configuration(
                "AUTH_GATEWAY_URL must be set (e.g. https://auth.example.com)".to_string(),
            )
        })?;

        let mut config = Self::new(&base_url)?;

        if let Ok(raw) = std::env::var("AUTH_GATEWAY_TIMEOUT") {
            let secs: u64 = raw.parse().map_err(|_| {
                ClientError::Configuration("AUTH_GATEWAY_TIMEOUT must be a number".to_string())
            })?;
            if secs == 0 {
                return Err(ClientError::Configuration(
                    "AUTH_GATEWAY_TIMEOUT must be greater than 0".to_string(),
                ));
            }
            config.timeout = Duration::from_secs(secs);
        }

        if let Ok(raw) = std::env::var("AUTH_GATEWAY_RETRY_ATTEMPTS") {
            config.retry_attempts = raw.parse().map_err(|_| {
                ClientError::Configuration(
                    "AUTH_GATEWAY_RETRY_ATTEMPTS must be a number".to_string(),
                )
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = ClientConfig::new("https://auth.example.com/").expect("should build");
        assert_eq!(config.base_url, "https://auth.example.com");
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            ClientConfig::new("   "),
            Err(ClientError::Configuration(_))
        ));
    }

    #[test]
    fn defaults_are_sensible() {
        let config = ClientConfig::new("https://auth.example.com").expect("should build");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.retry_attempts, 3);
    }
}
