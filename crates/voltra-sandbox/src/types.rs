//! Wire types for the sandbox executor API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// A code execution request.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionRequest {
    /// Python source to execute in the persistent session.
    pub code: String,
    /// Execution timeout in seconds.
    pub timeout: u64,
    /// Memory limit in megabytes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_limit_mb: Option<u64>,
    /// Whether produced figures should be captured and returned inline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_visualization: Option<bool>,
    /// Environment variables exposed to the executed code.
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,
}

/// Caller-facing execution options.
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Execution timeout in seconds.
    pub timeout_secs: u64,
    /// Memory limit override in megabytes.
    pub memory_limit_mb: Option<u64>,
    /// Whether produced figures should be captured and returned inline.
    pub save_visualization: bool,
    /// Environment variables exposed to the executed code.
    pub environment: HashMap<String, String>,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            memory_limit_mb: None,
            save_visualization: true,
            environment: HashMap::new(),
        }
    }
}

impl ExecuteOptions {
    /// Sets the execution timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the memory limit.
    pub fn with_memory_limit_mb(mut self, memory_limit_mb: u64) -> Self {
        self.memory_limit_mb = Some(memory_limit_mb);
        self
    }

    /// Adds an environment variable.
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// A file present in the sandbox scratch directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// File name.
    pub name: String,
    /// File extension (".png", ".html", ...) or "unknown".
    #[serde(rename = "type")]
    pub file_type: String,
    /// File size in bytes.
    pub size: u64,
    /// Absolute path inside the sandbox.
    pub path: String,
}

/// Format of a produced visualization artifact.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VisualizationFormat {
    /// Interactive HTML (plotly).
    Html,
    /// Scalable vector graphics.
    Svg,
    /// Raster image.
    Png,
    /// Chart data as JSON.
    Json,
}

impl VisualizationFormat {
    /// Returns the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Html => "text/html",
            Self::Svg => "image/svg+xml",
            Self::Png => "image/png",
            Self::Json => "application/json",
        }
    }

    /// Maps a scratch-file extension to a format.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.') {
            "html" => Some(Self::Html),
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// A visualization produced by executed code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualizationArtifact {
    /// Artifact file name.
    pub name: String,
    /// Artifact format.
    pub format: VisualizationFormat,
    /// MIME type of the payload.
    pub mime_type: String,
    /// Payload: base64 for binary formats, UTF-8 text for HTML/SVG/JSON.
    pub data: String,
}

/// Result of a code execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error (includes tracebacks).
    pub stderr: String,
    /// Whether the code ran to completion.
    pub success: bool,
    /// Wall-clock execution time in seconds.
    pub execution_time: f64,
    /// Files present in the scratch directory after execution.
    #[serde(default)]
    pub files: Vec<FileInfo>,
    /// Visualizations captured during execution.
    #[serde(default)]
    pub visualizations: Vec<VisualizationArtifact>,
    /// Error message when `success` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            VisualizationFormat::from_extension(".png"),
            Some(VisualizationFormat::Png)
        );
        assert_eq!(
            VisualizationFormat::from_extension("html"),
            Some(VisualizationFormat::Html)
        );
        assert_eq!(VisualizationFormat::from_extension(".csv"), None);
    }

    #[test]
    fn test_execution_result_defaults_optional_fields() {
        let json = r#"{
            "stdout": "done",
            "stderr": "",
            "success": true,
            "execution_time": 0.42
        }"#;

        let result: ExecutionResult = serde_json::from_str(json).expect("decodable result");
        assert!(result.files.is_empty());
        assert!(result.visualizations.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_request_skips_empty_environment() {
        let request = ExecutionRequest {
            code: "print('hi')".into(),
            timeout: 30,
            memory_limit_mb: None,
            save_visualization: None,
            environment: HashMap::new(),
        };

        let json = serde_json::to_value(&request).expect("serializable request");
        assert!(json.get("environment").is_none());
        assert!(json.get("memory_limit_mb").is_none());
    }
}
