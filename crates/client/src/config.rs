//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BEANPASS_SERVICE_URL` - Base URL of the remote account service
//! - `BEANPASS_SERVICE_KEY` - Public API key sent with every request
//!
//! ## Optional
//! - `BEANPASS_DATA_DIR` - Directory for durable client-side preferences
//!   (default: `.beanpass`)

use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Beanpass client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the remote account service.
    pub service_url: Url,
    /// Public API key for the remote account service.
    pub service_key: SecretString,
    /// Directory for durable client-side preferences.
    pub data_dir: PathBuf,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("service_url", &self.service_url.as_str())
            .field("service_key", &"[REDACTED]")
            .field("data_dir", &self.data_dir)
            .finish()
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let service_url = get_required_env("BEANPASS_SERVICE_URL")?;
        let service_url = Url::parse(&service_url).map_err(|e| {
            ConfigError::InvalidEnvVar("BEANPASS_SERVICE_URL".to_string(), e.to_string())
        })?;

        let service_key = SecretString::from(get_required_env("BEANPASS_SERVICE_KEY")?);

        let data_dir = PathBuf::from(get_env_or_default("BEANPASS_DATA_DIR", ".beanpass"));

        Ok(Self {
            service_url,
            service_key,
            data_dir,
        })
    }
}

/// Get a required environment variable.
fn get_required_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

/// Get an environment variable with a default value.
fn get_env_or_default(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_var() {
        // Environment is process-global; use a name no test environment sets.
        assert!(matches!(
            get_required_env("BEANPASS_TEST_DOES_NOT_EXIST"),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }

    #[test]
    fn test_default_value() {
        assert_eq!(
            get_env_or_default("BEANPASS_TEST_DOES_NOT_EXIST", "fallback"),
            "fallback"
        );
    }
}
