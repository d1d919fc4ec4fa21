//! Sandbox client configuration.

use std::time::Duration;

use derive_builder::Builder;
use url::Url;

use crate::error::{SandboxError, SandboxResult};

/// Configuration for the sandbox executor client.
#[derive(Debug, Clone, Builder)]
#[builder(
    name = "SandboxConfigBuilder",
    pattern = "owned",
    setter(into, strip_option, prefix = "with"),
    build_fn(validate = "Self::validate_config")
)]
pub struct SandboxConfig {
    /// Base URL for the sandbox API.
    #[builder(setter(custom), default = "SandboxConfig::default_base_url()")]
    pub base_url: Url,
    /// Request timeout duration.
    ///
    /// Must exceed the per-execution timeout, since `/execute` blocks until
    /// the code finishes.
    #[builder(default = "Duration::from_secs(60)")]
    pub timeout: Duration,
    /// Connection timeout duration.
    #[builder(default = "Duration::from_secs(10)")]
    pub connect_timeout: Duration,
    /// Maximum concurrent requests per client.
    #[builder(default = "4")]
    pub max_concurrent_requests: usize,
    /// Default memory limit passed with each execution, in megabytes.
    #[builder(default = "512")]
    pub memory_limit_mb: u64,
    /// User agent string for requests.
    #[builder(default = "SandboxConfig::default_user_agent()")]
    pub user_agent: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(10),
            max_concurrent_requests: 4,
            memory_limit_mb: 512,
            user_agent: Self::default_user_agent(),
        }
    }
}

impl SandboxConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }

    fn default_base_url() -> Url {
        "http://localhost:8000".parse().expect("valid default URL")
    }

    fn default_user_agent() -> String {
        format!("voltra-sandbox/{}", env!("CARGO_PKG_VERSION"))
    }
}

impl SandboxConfigBuilder {
    /// Sets the base URL for the sandbox API.
    pub fn with_base_url(mut self, url: &str) -> SandboxResult<Self> {
        self.base_url = Some(url.parse().map_err(|e| {
            SandboxError::invalid_config(format!("invalid base URL '{url}': {e}"))
        })?);
        Ok(self)
    }

    fn validate_config(&self) -> Result<(), String> {
        if let Some(timeout) = &self.timeout
            && timeout.as_secs() == 0
        {
            return Err("timeout must be greater than 0".to_string());
        }

        if let Some(max_concurrent) = &self.max_concurrent_requests
            && *max_concurrent == 0
        {
            return Err("max concurrent requests must be greater than 0".to_string());
        }

        if let Some(memory_limit) = &self.memory_limit_mb
            && *memory_limit == 0
        {
            return Err("memory limit must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Authentication credentials for the sandbox service.
#[derive(Debug, Clone)]
pub enum SandboxCredentials {
    /// Bearer token authentication.
    BearerToken(String),
    /// No authentication (internal network deployments).
    None,
}

impl SandboxCredentials {
    /// Creates bearer token credentials.
    pub fn bearer_token(token: impl Into<String>) -> Self {
        Self::BearerToken(token.into())
    }

    /// Creates credentials with no authentication.
    pub fn none() -> Self {
        Self::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = SandboxConfig::builder()
            .with_timeout(Duration::from_secs(120))
            .with_max_concurrent_requests(2usize)
            .build()
            .expect("valid config");

        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_concurrent_requests, 2);
        assert_eq!(config.memory_limit_mb, 512);
    }

    #[test]
    fn test_custom_base_url() {
        let config = SandboxConfig::builder()
            .with_base_url("http://sandbox.internal:8000")
            .expect("valid URL")
            .build()
            .expect("valid config");

        assert_eq!(config.base_url.as_str(), "http://sandbox.internal:8000/");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(SandboxConfig::builder().with_base_url("not a url").is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let result = SandboxConfig::builder()
            .with_timeout(Duration::from_secs(0))
            .build();

        assert!(result.is_err());
    }

    #[test]
    fn test_validation_zero_concurrency() {
        let result = SandboxConfig::builder()
            .with_max_concurrent_requests(0usize)
            .build();

        assert!(result.is_err());
    }
}
