//! # Sociauth Gateway
//!
//! `sociauth-gateway` holds the registry of configured OAuth providers and
//! orchestrates both halves of the login handshake:
//!
//! - [`ProviderGateway::begin_auth`] produces the redirect target for a
//!   provider's consent screen, with a fresh CSRF state.
//! - [`ProviderGateway::complete_auth`] takes the inbound callback, classifies
//!   provider-side failures, and exchanges the code for an [`ExternalProfile`].
//!
//! The gateway performs no persistence; it is the only place the rest of the
//! system touches provider-specific behavior.

#![warn(missing_docs)]

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use sociauth_core::{AuthError, ExternalProfile, OAuthProvider};

/// Instruction to redirect the caller to a provider's consent screen.
#[derive(Debug, Clone)]
pub struct RedirectTarget {
    /// The full provider authorization URL.
    pub url: String,
    /// The CSRF state embedded in the URL. The caller is expected to hold on
    /// to it (typically in a short-lived cookie) and present it again when the
    /// provider redirects back.
    pub state: String,
}

/// Query parameters carried by an OAuth callback request.
///
/// Providers that deny consent send `error` instead of `code`.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackParams {
    /// Authorization code, present on a successful handshake.
    pub code: Option<String>,
    /// Echo of the CSRF state issued by [`ProviderGateway::begin_auth`].
    pub state: Option<String>,
    /// Provider error code, e.g. `access_denied`.
    pub error: Option<String>,
    /// Optional human-readable detail accompanying `error`.
    pub error_description: Option<String>,
}

/// Registry of OAuth providers behind one provider-agnostic capability.
pub struct ProviderGateway {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl ProviderGateway {
    /// Create a new [`GatewayBuilder`].
    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    /// The names of all registered providers.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }

    /// Start the login handshake for `provider`.
    ///
    /// Generates a fresh CSRF state and builds the provider-specific
    /// authorization URL. Fails with [`AuthError::UnknownProvider`] if the
    /// provider is not registered.
    pub fn begin_auth(&self, provider: &str) -> Result<RedirectTarget, AuthError> {
        let p = self.lookup(provider)?;
        let state = uuid::Uuid::new_v4().to_string();
        let url = p.authorization_url(&state);
        Ok(RedirectTarget { url, state })
    }

    /// Complete the handshake for `provider` from an inbound callback.
    ///
    /// Consent denial and a missing authorization code are classified here;
    /// everything past that (token exchange, profile fetch, normalization) is
    /// delegated to the provider. All handshake failures come back as
    /// [`AuthError::Provider`].
    pub async fn complete_auth(
        &self,
        provider: &str,
        params: &CallbackParams,
    ) -> Result<ExternalProfile, AuthError> {
        let p = self.lookup(provider)?;

        if let Some(err) = &params.error {
            let detail = params.error_description.as_deref().unwrap_or("no detail");
            return Err(AuthError::Provider(format!(
                "callback rejected by {provider}: {err} ({detail})"
            )));
        }

        let code = params
            .code
            .as_deref()
            .ok_or_else(|| AuthError::Provider("callback missing authorization code".into()))?;

        let profile = p.exchange_code(code).await?;
        log::debug!(
            "completed {provider} handshake for external id {}",
            profile.external_id
        );
        Ok(profile)
    }

    fn lookup(&self, provider: &str) -> Result<&Arc<dyn OAuthProvider>, AuthError> {
        self.providers
            .get(provider)
            .ok_or_else(|| AuthError::UnknownProvider(provider.to_string()))
    }
}

/// A builder for configuring and creating a [`ProviderGateway`].
#[derive(Default)]
pub struct GatewayBuilder {
    providers: HashMap<String, Arc<dyn OAuthProvider>>,
}

impl GatewayBuilder {
    /// Register an OAuth provider under its own [`OAuthProvider::provider_id`].
    pub fn provider<P: OAuthProvider + 'static>(mut self, provider: P) -> Self {
        let id = provider.provider_id().to_string();
        self.providers.insert(id, Arc::new(provider));
        self
    }

    /// Build the [`ProviderGateway`].
    pub fn build(self) -> ProviderGateway {
        ProviderGateway {
            providers: self.providers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct FakeProvider {
        id: &'static str,
        fail: bool,
    }

    #[async_trait]
    impl OAuthProvider for FakeProvider {
        fn provider_id(&self) -> &str {
            self.id
        }

        fn authorization_url(&self, state: &str) -> String {
            format!("https://example.test/authorize?client_id=abc&state={state}")
        }

        async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
            if self.fail {
                return Err(AuthError::Provider("invalid code".into()));
            }
            Ok(ExternalProfile {
                provider: self.id.to_string(),
                external_id: format!("{}_{code}", self.id),
                display_name: "Carol".to_string(),
                email: None,
            })
        }
    }

    fn gateway() -> ProviderGateway {
        ProviderGateway::builder()
            .provider(FakeProvider {
                id: "github",
                fail: false,
            })
            .provider(FakeProvider {
                id: "facebook",
                fail: true,
            })
            .build()
    }

    #[test]
    fn begin_auth_embeds_fresh_state() {
        let gw = gateway();
        let target = gw.begin_auth("github").unwrap();
        assert!(target.url.contains(&target.state));

        let again = gw.begin_auth("github").unwrap();
        assert_ne!(target.state, again.state);
    }

    #[test]
    fn begin_auth_unknown_provider() {
        let err = gateway().begin_auth("myspace").unwrap_err();
        assert!(matches!(err, AuthError::UnknownProvider(name) if name == "myspace"));
    }

    #[tokio::test]
    async fn complete_auth_returns_profile() {
        let gw = gateway();
        let params = CallbackParams {
            code: Some("c123".into()),
            state: Some("s".into()),
            error: None,
            error_description: None,
        };
        let profile = gw.complete_auth("github", &params).await.unwrap();
        assert_eq!(profile.external_id, "github_c123");
        assert_eq!(profile.email, None);
    }

    #[tokio::test]
    async fn complete_auth_denied_consent() {
        let gw = gateway();
        let params = CallbackParams {
            code: None,
            state: Some("s".into()),
            error: Some("access_denied".into()),
            error_description: Some("The user denied your request.".into()),
        };
        let err = gw.complete_auth("github", &params).await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[tokio::test]
    async fn complete_auth_missing_code() {
        let gw = gateway();
        let params = CallbackParams {
            code: None,
            state: Some("s".into()),
            error: None,
            error_description: None,
        };
        let err = gw.complete_auth("github", &params).await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[tokio::test]
    async fn complete_auth_propagates_exchange_failure() {
        let gw = gateway();
        let params = CallbackParams {
            code: Some("expired".into()),
            state: Some("s".into()),
            error: None,
            error_description: None,
        };
        let err = gw.complete_auth("facebook", &params).await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }
}
