//! # Sociauth Axum
//!
//! Axum integration for sociauth. [`SocialLogin`] bundles the three core
//! components (gateway, resolver, issuer) and exposes them as a router:
//!
//! - `GET /auth/{provider}` redirects to the provider's consent screen.
//! - `GET /auth/{provider}/callback` completes the handshake, resolves the
//!   user, issues a persistent session, and redirects to the configured
//!   landing path. Provider failures redirect back to `/auth/{provider}` so
//!   the user can retry; they never surface as error pages.
//! - `GET /auth/logout` deletes the session and clears the cookie.
//!
//! The [`AuthSession`] extractor gives downstream handlers access to the
//! validated session.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use sociauth_gateway::ProviderGateway;
use sociauth_resolver::IdentityResolver;
use sociauth_session::{Session, SessionIssuer};
use tower_cookies::{CookieManagerLayer, Cookies};

pub mod handlers;

pub use sociauth_session::SessionConfig;

/// Shared state for the social-login routes.
#[derive(Clone)]
pub struct SocialLogin {
    /// The provider registry.
    pub gateway: Arc<ProviderGateway>,
    /// The identity reconciliation core.
    pub resolver: IdentityResolver,
    /// The session issuer.
    pub issuer: SessionIssuer,
}

impl SocialLogin {
    /// Bundle the three components.
    pub fn new(gateway: ProviderGateway, resolver: IdentityResolver, issuer: SessionIssuer) -> Self {
        Self {
            gateway: Arc::new(gateway),
            resolver,
            issuer,
        }
    }

    /// Build the login router, with the cookie layer applied.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/auth/{provider}", get(handlers::login_handler))
            .route("/auth/{provider}/callback", get(handlers::callback_handler))
            .route("/auth/logout", get(handlers::logout_handler))
            .layer(CookieManagerLayer::new())
            .with_state(self.clone())
    }
}

/// Errors surfaced by the HTTP boundary.
///
/// Provider internals are never leaked: infrastructure failures all collapse
/// into one generic internal-error response.
#[derive(Debug)]
pub enum SociauthAxumError {
    /// The requested provider is not registered.
    NotFound,
    /// No valid session accompanies the request.
    Unauthorized,
    /// Storage or session-store failure. The detail is logged, not returned.
    Internal(String),
}

impl IntoResponse for SociauthAxumError {
    fn into_response(self) -> Response {
        match self {
            SociauthAxumError::NotFound => {
                (StatusCode::NOT_FOUND, "provider not found").into_response()
            }
            SociauthAxumError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "authentication required").into_response()
            }
            SociauthAxumError::Internal(detail) => {
                log::error!("internal error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
            }
        }
    }
}

/// Extractor for a validated session, read from the session cookie.
pub struct AuthSession(pub Session);

impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
    SocialLogin: FromRef<S>,
{
    type Rejection = SociauthAxumError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let login = SocialLogin::from_ref(state);
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| SociauthAxumError::Internal(msg.to_string()))?;

        let cookie_name = login.issuer.config().cookie_name.clone();
        let session_id = cookies
            .get(&cookie_name)
            .map(|c| c.value().to_string())
            .ok_or(SociauthAxumError::Unauthorized)?;

        let session = login
            .issuer
            .store()
            .load_session(&session_id)
            .await
            .map_err(|e| SociauthAxumError::Internal(e.to_string()))?
            .ok_or(SociauthAxumError::Unauthorized)?;

        Ok(AuthSession(session))
    }
}
