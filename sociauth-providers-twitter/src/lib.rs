//! Twitter OAuth provider for sociauth.
//!
//! Twitter's v2 API does not expose an email claim, so every profile this
//! provider produces carries `email: None`. Account creation downstream must
//! not depend on it.

use async_trait::async_trait;
use serde::Deserialize;
use sociauth_core::{AuthError, ExternalProfile, OAuthProvider};

const DEFAULT_AUTH_URL: &str = "https://twitter.com/i/oauth2/authorize";
const DEFAULT_TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";
const DEFAULT_API_URL: &str = "https://api.twitter.com";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Twitter OAuth provider.
pub struct TwitterProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    api_url: String,
    http: reqwest::Client,
}

impl TwitterProvider {
    /// Create a provider against Twitter's production endpoints.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            redirect_uri,
            DEFAULT_AUTH_URL.to_string(),
            DEFAULT_TOKEN_URL.to_string(),
            DEFAULT_API_URL.to_string(),
        )
    }

    /// Create a provider against custom endpoints. Used by tests to point at
    /// a mock server.
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        auth_url: String,
        token_url: String,
        api_url: String,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client_id,
            client_secret,
            redirect_uri,
            auth_url,
            token_url,
            api_url,
            http,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct UsersMeResponse {
    data: TwitterUser,
}

#[derive(Deserialize)]
struct TwitterUser {
    id: String,
    name: String,
}

#[async_trait]
impl OAuthProvider for TwitterProvider {
    fn provider_id(&self) -> &str {
        "twitter"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope=users.read%20tweet.read&state={}",
            self.auth_url, self.client_id, self.redirect_uri, state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        let token: TokenResponse = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.client_id, Some(&self.client_secret))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("twitter token request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("twitter rejected code: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("twitter token response malformed: {e}")))?;

        let me: UsersMeResponse = self
            .http
            .get(format!("{}/2/users/me", self.api_url))
            .bearer_auth(&token.access_token)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("twitter profile request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("twitter profile fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("twitter profile malformed: {e}")))?;

        Ok(ExternalProfile {
            provider: self.provider_id().to_string(),
            external_id: me.data.id,
            display_name: me.data.name,
            email: None,
        })
    }
}
