//! Configuration for the journeys API client.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{GiroError, Result};

/// Environment variable holding the API base URL.
pub const API_URL_ENV: &str = "GIROPRO_API_URL";
/// Environment variable holding the bearer token.
pub const API_TOKEN_ENV: &str = "GIROPRO_API_TOKEN";

const DEFAULT_BASE_URL: &str = "http://localhost:3000/api/v1";

/// Connection settings for the GiroPro REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    /// Base URL without trailing slash, e.g. `https://api.giropro.app/api/v1`
    pub base_url: String,
    /// Bearer token sent with every request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries for transient failures (429, 5xx, connection errors)
    pub max_retries: u32,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Read `GIROPRO_API_URL` and `GIROPRO_API_TOKEN`.
    ///
    /// The URL is required; the token is optional.
    pub fn from_env() -> Result<Self> {
        let base_url = std::env::var(API_URL_ENV).map_err(|_| GiroError::Config {
            message: format!("{} is not set", API_URL_ENV),
        })?;
        let mut config = Self::new(base_url);
        if let Ok(token) = std::env::var(API_TOKEN_ENV) {
            if !token.is_empty() {
                config.auth_token = Some(token);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(GiroError::Config {
                message: format!("base URL must be http(s): '{}'", self.base_url),
            });
        }
        if self.timeout_secs == 0 {
            return Err(GiroError::Config {
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Absolute URL for an API path such as `/journeys`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_token: None,
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let config = ApiConfig::new("https://api.giropro.app/api/v1/");
        assert_eq!(config.base_url, "https://api.giropro.app/api/v1");
        assert_eq!(
            config.url("/journeys/abc"),
            "https://api.giropro.app/api/v1/journeys/abc"
        );
        assert_eq!(config.url("journeys"), "https://api.giropro.app/api/v1/journeys");
    }

    #[test]
    fn test_validate() {
        assert!(ApiConfig::default().validate().is_ok());
        assert!(ApiConfig::new("ftp://files").validate().is_err());
        assert!(ApiConfig::new("https://x").with_timeout(0).validate().is_err());
    }

    #[test]
    fn test_builder() {
        let config = ApiConfig::new("https://x")
            .with_token("secret")
            .with_timeout(5)
            .with_max_retries(0);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert_eq!(config.max_retries, 0);
    }

    // Only test touching these variables; tests run in parallel
    #[test]
    fn test_from_env() {
        std::env::set_var(API_URL_ENV, "https://api.giropro.app/api/v1/");
        std::env::set_var(API_TOKEN_ENV, "token-123");
        let config = ApiConfig::from_env().unwrap();
        assert_eq!(config.base_url, "https://api.giropro.app/api/v1");
        assert_eq!(config.auth_token.as_deref(), Some("token-123"));

        std::env::set_var(API_TOKEN_ENV, "");
        assert!(ApiConfig::from_env().unwrap().auth_token.is_none());

        std::env::set_var(API_URL_ENV, "ftp://files");
        assert!(matches!(ApiConfig::from_env(), Err(GiroError::Config { .. })));

        std::env::remove_var(API_URL_ENV);
        std::env::remove_var(API_TOKEN_ENV);
        assert!(matches!(ApiConfig::from_env(), Err(GiroError::Config { .. })));
    }
}
