//! HTTP error handling with a builder for dynamic error responses.

use std::borrow::Cow;
use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::handler::response::ErrorResponse;

/// Result type alias for HTTP handlers.
pub type Result<T, E = Error<'static>> = std::result::Result<T, E>;

/// Category of an HTTP handler error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorKind {
    /// Malformed or invalid request input.
    BadRequest,
    /// Missing or invalid bearer token.
    Unauthorized,
    /// The requested resource does not exist (or belongs to another
    /// organization, which is indistinguishable by design).
    NotFound,
    /// A conflicting operation is already in flight.
    Conflict,
    /// Body was readable but failed validation.
    UnprocessableEntity,
    /// Unexpected internal failure.
    #[default]
    InternalServerError,
    /// An upstream collaborator failed.
    BadGateway,
    /// The service is not ready to handle requests.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Returns the HTTP status code for this kind.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the default user-facing message for this kind.
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "The request could not be understood.",
            Self::Unauthorized => "Authentication is required.",
            Self::NotFound => "The requested resource was not found.",
            Self::Conflict => "A conflicting operation is already in progress.",
            Self::UnprocessableEntity => "The request failed validation.",
            Self::InternalServerError => "An internal error occurred.",
            Self::BadGateway => "An upstream service failed.",
            Self::ServiceUnavailable => "The service is temporarily unavailable.",
        }
    }

    /// Attaches a custom message, producing an [`Error`].
    pub fn with_message<'a>(self, message: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_message(message)
    }

    /// Attaches a resource name, producing an [`Error`].
    pub fn with_resource<'a>(self, resource: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_resource(resource)
    }

    /// Attaches debugging context, producing an [`Error`].
    pub fn with_context<'a>(self, context: impl Into<Cow<'a, str>>) -> Error<'a> {
        Error::new(self).with_context(context)
    }
}

impl IntoResponse for ErrorKind {
    fn into_response(self) -> Response {
        Error::new(self).into_response()
    }
}

/// The error type for HTTP handlers.
#[derive(Clone)]
#[must_use = "errors do nothing unless serialized"]
pub struct Error<'a> {
    kind: ErrorKind,
    message: Option<Cow<'a, str>>,
    resource: Option<Cow<'a, str>>,
    context: Option<Cow<'a, str>>,
}

impl Error<'static> {
    /// Creates a new error with the specified kind.
    #[inline]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            resource: None,
            context: None,
        }
    }
}

impl<'a> Error<'a> {
    /// Sets a custom user-friendly message.
    #[inline]
    pub fn with_message(self, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            message: Some(message.into()),
            ..self
        }
    }

    /// Sets the resource that caused the error.
    #[inline]
    pub fn with_resource(self, resource: impl Into<Cow<'a, str>>) -> Self {
        Self {
            resource: Some(resource.into()),
            ..self
        }
    }

    /// Attaches debugging context, included in the response body.
    #[inline]
    pub fn with_context(self, context: impl Into<Cow<'a, str>>) -> Self {
        Self {
            context: Some(context.into()),
            ..self
        }
    }

    /// Returns the error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

impl fmt::Debug for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("resource", &self.resource)
            .field("context", &self.context)
            .finish()
    }
}

impl fmt::Display for Error<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self
            .message
            .as_deref()
            .unwrap_or_else(|| self.kind.default_message());
        write!(f, "{message}")
    }
}

impl aide::OperationOutput for Error<'_> {
    type Inner = ErrorResponse;
}

impl IntoResponse for Error<'_> {
    fn into_response(self) -> Response {
        let status = self.kind.status_code();
        let body = ErrorResponse {
            status: status.as_u16(),
            message: self
                .message
                .map(Cow::into_owned)
                .unwrap_or_else(|| self.kind.default_message().to_string()),
            resource: self.resource.map(Cow::into_owned),
            context: self.context.map(Cow::into_owned),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<voltra_postgres::PgError> for Error<'static> {
    fn from(err: voltra_postgres::PgError) -> Self {
        if err.is_not_found() {
            return ErrorKind::NotFound.with_context(err.to_string());
        }

        tracing::error!(error = %err, "Database error");
        Error::new(ErrorKind::InternalServerError)
    }
}

impl From<voltra_engine::EngineError> for Error<'static> {
    fn from(err: voltra_engine::EngineError) -> Self {
        use voltra_engine::EngineError;

        match &err {
            EngineError::InvalidDataSourceId(id) => ErrorKind::BadRequest
                .with_message(format!("Invalid data source id: {id}")),
            EngineError::SourceNotFound(_) | EngineError::MissingFile(_) => {
                ErrorKind::NotFound.with_resource("data_source")
            }
            EngineError::RetrievalExhausted { .. } => ErrorKind::BadGateway
                .with_message("All retrieval backends are unavailable."),
            EngineError::Database(pg) if pg.is_not_found() => {
                ErrorKind::NotFound.with_context(err.to_string())
            }
            _ => {
                tracing::error!(error = %err, "Engine error");
                ErrorKind::BadGateway.with_context(err.to_string())
            }
        }
    }
}

impl From<voltra_vector::VectorError> for Error<'static> {
    fn from(err: voltra_vector::VectorError) -> Self {
        tracing::error!(error = %err, "Vector store error");
        ErrorKind::BadGateway.with_context(err.to_string())
    }
}

impl From<voltra_rig::Error> for Error<'static> {
    fn from(err: voltra_rig::Error) -> Self {
        tracing::error!(error = %err, "Provider error");
        ErrorKind::BadGateway.with_context(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error<'static> {
    fn from(err: validator::ValidationErrors) -> Self {
        ErrorKind::UnprocessableEntity.with_context(err.to_string())
    }
}

impl From<axum::extract::rejection::JsonRejection> for Error<'static> {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        ErrorKind::BadRequest.with_context(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ErrorKind::BadRequest.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::Conflict.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorKind::BadGateway.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_invalid_id_maps_to_bad_request() {
        let error: Error<'static> =
            voltra_engine::EngineError::InvalidDataSourceId("abc".into()).into();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
    }

    #[test]
    fn test_exhaustion_maps_to_bad_gateway() {
        let error: Error<'static> =
            voltra_engine::EngineError::RetrievalExhausted { attempted: 3 }.into();
        assert_eq!(error.kind(), ErrorKind::BadGateway);
    }
}
