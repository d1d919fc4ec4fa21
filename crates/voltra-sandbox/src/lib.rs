#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod types;

pub use client::SandboxClient;
pub use config::{SandboxConfig, SandboxConfigBuilder, SandboxCredentials};
pub use error::{SandboxError, SandboxResult};
pub use types::{
    ExecuteOptions, ExecutionRequest, ExecutionResult, FileInfo, VisualizationArtifact,
    VisualizationFormat,
};

/// Tracing target for sandbox client operations.
pub const TRACING_TARGET: &str = "voltra_sandbox";
