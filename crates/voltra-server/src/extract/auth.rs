//! Bearer-token authentication extractor.

use axum::extract::{FromRef, FromRequestParts};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use crate::TRACING_TARGET_AUTH;
use crate::handler::{Error, ErrorKind};
use crate::service::AuthKeys;

/// Authenticated request state.
///
/// Extraction succeeds only when the `Authorization: Bearer` token resolves
/// to a known organization; every downstream query is scoped by that
/// organization id.
#[derive(Debug, Clone, Copy)]
pub struct AuthState {
    /// The organization the token belongs to.
    pub organization_id: i64,
}

impl<S> FromRequestParts<S> for AuthState
where
    S: Send + Sync,
    AuthKeys: FromRef<S>,
{
    type Rejection = Error<'static>;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = AuthKeys::from_ref(state);

        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ErrorKind::Unauthorized.with_message("Missing authorization header."))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ErrorKind::Unauthorized.with_message("Expected a bearer token."))?;

        let Some(organization_id) = keys.resolve(token) else {
            tracing::debug!(target: TRACING_TARGET_AUTH, "Unknown bearer token");
            return Err(ErrorKind::Unauthorized.with_message("Invalid bearer token."));
        };

        Ok(Self { organization_id })
    }
}

impl aide::operation::OperationInput for AuthState {}
