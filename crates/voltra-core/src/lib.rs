#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod common;
pub mod emb;

mod error;
mod health;
mod provider;

pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};
pub use provider::IntoProvider;

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "voltra_core";
