//! # Sociauth Core
//!
//! `sociauth-core` provides the foundational traits and types for the sociauth
//! social-login framework. It defines the provider capability trait, the shared
//! user and profile model, and the error taxonomy used across the ecosystem.

#![warn(missing_docs)]

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors that can occur during the login flow.
pub mod error;
pub use crate::error::AuthError;

/// The shared user and profile model.
pub mod model;
pub use crate::model::{ExternalProfile, User};

/// Controls whether a cookie is sent with cross-site requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    /// The cookie is sent with "safe" cross-site requests (e.g., following a link).
    Lax,
    /// The cookie is only sent for same-site requests.
    Strict,
    /// The cookie is sent with all requests, including cross-site. Requires `Secure`.
    None,
}

/// Trait for a third-party OAuth provider.
///
/// Each provider wraps its own authorization endpoint and code-exchange
/// protocol behind this one capability, so the rest of the system stays
/// provider-agnostic. Implementations perform network calls but never persist
/// anything.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    /// The registered provider name, e.g. `"github"`.
    fn provider_id(&self) -> &str;

    /// Build the provider-specific authorization URL for the given CSRF state.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for a normalized [`ExternalProfile`].
    ///
    /// Any handshake failure (bad or expired code, network failure, timeout,
    /// malformed response) surfaces as [`AuthError::Provider`]. A provider
    /// that does not supply an email yields `email: None`, never an error.
    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError>;
}

#[async_trait]
impl<T: OAuthProvider + ?Sized> OAuthProvider for std::sync::Arc<T> {
    fn provider_id(&self) -> &str {
        (**self).provider_id()
    }

    fn authorization_url(&self, state: &str) -> String {
        (**self).authorization_url(state)
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        (**self).exchange_code(code).await
    }
}
