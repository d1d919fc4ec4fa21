//! HTTP request extractors.

mod auth;
mod validated_json;

pub use auth::AuthState;
pub use validated_json::ValidateJson;
