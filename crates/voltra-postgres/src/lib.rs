#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

/// Embeds all migrations into the final binary.
pub(crate) const MIGRATIONS: diesel_migrations::EmbeddedMigrations =
    diesel_migrations::embed_migrations!();

/// Tracing target for client-related operations.
pub const TRACING_TARGET_CLIENT: &str = "voltra_postgres::client";

/// Tracing target for database query operations.
pub const TRACING_TARGET_QUERY: &str = "voltra_postgres::queries";

/// Tracing target for database connection operations.
pub const TRACING_TARGET_CONNECTION: &str = "voltra_postgres::connection";

mod client;
mod error;
pub mod model;
pub mod query;
mod schema;
pub mod types;

pub use diesel_async::AsyncPgConnection as PgConnection;

pub use crate::client::{PgClient, PgConfig, PooledConnection};
pub use crate::error::{PgError, PgResult};
