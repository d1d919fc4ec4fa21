//! Sandbox executor client.

use std::sync::Arc;

use reqwest::{Client as HttpClient, ClientBuilder, Method};
use serde::Deserialize;
use tokio::sync::Semaphore;

use crate::config::{SandboxConfig, SandboxCredentials};
use crate::error::{SandboxError, SandboxResult};
use crate::types::{ExecuteOptions, ExecutionRequest, ExecutionResult, FileInfo};
use crate::TRACING_TARGET;

/// Client for the sandboxed code executor.
///
/// This type is cheap to clone; all clones share the same connection pool
/// and concurrency limiter.
#[derive(Debug, Clone)]
pub struct SandboxClient {
    http_client: HttpClient,
    config: SandboxConfig,
    credentials: SandboxCredentials,
    limiter: Arc<Semaphore>,
}

#[derive(Debug, Deserialize)]
struct FilesResponse {
    files: Vec<FileInfo>,
}

impl SandboxClient {
    /// Creates a new sandbox client with the given configuration and
    /// credentials.
    pub fn new(config: SandboxConfig, credentials: SandboxCredentials) -> SandboxResult<Self> {
        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            "Creating sandbox client"
        );

        let http_client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(SandboxError::Http)?;

        let limiter = Arc::new(Semaphore::new(config.max_concurrent_requests));

        Ok(Self {
            http_client,
            config,
            credentials,
            limiter,
        })
    }

    /// Creates a client with default configuration.
    pub fn with_defaults(base_url: impl AsRef<str>) -> SandboxResult<Self> {
        let config = SandboxConfig::builder()
            .with_base_url(base_url.as_ref())?
            .build()
            .map_err(|e| SandboxError::invalid_config(e.to_string()))?;

        Self::new(config, SandboxCredentials::none())
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &SandboxConfig {
        &self.config
    }

    /// Executes code in the persistent sandbox session.
    pub async fn execute_code(
        &self,
        code: impl Into<String>,
        options: ExecuteOptions,
    ) -> SandboxResult<ExecutionResult> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| SandboxError::invalid_config("client limiter closed"))?;

        let request = ExecutionRequest {
            code: code.into(),
            timeout: options.timeout_secs,
            memory_limit_mb: options
                .memory_limit_mb
                .or(Some(self.config.memory_limit_mb)),
            save_visualization: Some(options.save_visualization),
            environment: options.environment,
        };

        tracing::debug!(
            target: TRACING_TARGET,
            timeout_secs = request.timeout,
            code_bytes = request.code.len(),
            "Executing code in sandbox"
        );

        let response = self
            .request(Method::POST, "/execute")?
            .json(&request)
            .send()
            .await
            .map_err(SandboxError::Http)?;

        let result: ExecutionResult = Self::decode(response).await?;

        tracing::info!(
            target: TRACING_TARGET,
            success = result.success,
            execution_time = result.execution_time,
            visualizations = result.visualizations.len(),
            "Sandbox execution finished"
        );

        Ok(result)
    }

    /// Performs a health check against the sandbox service.
    pub async fn health_check(&self) -> SandboxResult<()> {
        let response = self
            .request(Method::GET, "/healthz")?
            .send()
            .await
            .map_err(SandboxError::Http)?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status().as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());

            Err(SandboxError::api_error(status, message))
        }
    }

    /// Lists the files currently in the scratch directory.
    pub async fn list_files(&self) -> SandboxResult<Vec<FileInfo>> {
        let response = self
            .request(Method::GET, "/files")?
            .send()
            .await
            .map_err(SandboxError::Http)?;

        let files: FilesResponse = Self::decode(response).await?;
        Ok(files.files)
    }

    /// Removes all files from the scratch directory.
    pub async fn clear_files(&self) -> SandboxResult<()> {
        let response = self
            .request(Method::DELETE, "/files")?
            .send()
            .await
            .map_err(SandboxError::Http)?;

        Self::check_status(response).await
    }

    /// Resets the persistent interpreter session.
    pub async fn reset_session(&self) -> SandboxResult<()> {
        let response = self
            .request(Method::DELETE, "/session")?
            .send()
            .await
            .map_err(SandboxError::Http)?;

        tracing::info!(target: TRACING_TARGET, "Sandbox session reset");

        Self::check_status(response).await
    }

    /// Creates a request builder with base configuration and auth headers.
    fn request(&self, method: Method, path: &str) -> SandboxResult<reqwest::RequestBuilder> {
        let url = self
            .config
            .base_url
            .join(path)
            .map_err(|e| SandboxError::invalid_config(format!("invalid request URL: {e}")))?;

        let mut request = self.http_client.request(method, url);

        if let SandboxCredentials::BearerToken(token) = &self.credentials {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        Ok(request)
    }

    /// Decodes a JSON response, mapping non-success statuses to API errors.
    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> SandboxResult<T> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(SandboxError::api_error(status.as_u16(), message));
        }

        let body = response.text().await.map_err(SandboxError::Http)?;
        serde_json::from_str(&body).map_err(|e| SandboxError::Decode(e.to_string()))
    }

    async fn check_status(response: reqwest::Response) -> SandboxResult<()> {
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(SandboxError::api_error(status.as_u16(), message))
        }
    }
}
