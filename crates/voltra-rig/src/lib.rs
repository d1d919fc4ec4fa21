#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod codegen;
pub mod provider;
pub mod router;

mod chat;
mod error;
mod text;

pub use chat::ChatComposer;
pub use error::{Error, Result};

/// Tracing target for the main library.
pub const TRACING_TARGET: &str = "voltra_rig";
