//! Provider creation trait.

use crate::Result;

/// Trait for creating a provider from parameters and credentials.
///
/// This trait bridges non-sensitive parameters (like collection name, model)
/// with sensitive credentials (like API keys) to construct a fully configured
/// provider instance.
///
/// # Type Parameters
///
/// - `Params`: Non-sensitive configuration (e.g., model name, base URL)
/// - `Credentials`: Sensitive authentication data (e.g., API keys)
#[async_trait::async_trait]
pub trait IntoProvider: Send {
    /// Non-sensitive parameters (model, collection, endpoint, etc.).
    type Params: Send;
    /// Sensitive credentials (API keys, secrets, etc.).
    type Credentials: Send;

    /// Creates a new provider from parameters and credentials.
    async fn create(params: Self::Params, credentials: Self::Credentials) -> Result<Self>
    where
        Self: Sized;
}
