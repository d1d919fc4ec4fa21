//! All `axum::`[`Router`]s with related `axum::`[`Handler`]s.
//!
//! [`Router`]: axum::routing::Router
//! [`Handler`]: axum::handler::Handler

mod chat;
mod data_sources;
mod dispatch;
mod error;
mod monitors;
mod query;
mod request;
mod response;

use aide::axum::ApiRouter;

pub use crate::handler::error::{Error, ErrorKind, Result};
use crate::service::ServiceState;

/// Returns an [`ApiRouter`] with every route.
///
/// All routes except health require bearer-token authentication, enforced
/// by the [`AuthState`](crate::extract::AuthState) extractor per handler.
pub fn routes() -> ApiRouter<ServiceState> {
    ApiRouter::new()
        .merge(chat::routes())
        .merge(data_sources::routes())
        .merge(query::routes())
        .merge(monitors::routes())
}
