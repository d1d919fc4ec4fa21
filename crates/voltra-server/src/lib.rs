#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod extract;
pub mod handler;
pub mod service;

/// Tracing target for authentication.
pub const TRACING_TARGET_AUTH: &str = "voltra_server::auth";
