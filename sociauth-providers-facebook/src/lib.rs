//! Facebook OAuth provider for sociauth.
//!
//! Uses the Graph API: the token exchange is a GET against
//! `/oauth/access_token`, the profile comes from `/me`. The email field is
//! only present when the user granted the `email` permission.

use async_trait::async_trait;
use serde::Deserialize;
use sociauth_core::{AuthError, ExternalProfile, OAuthProvider};

const DEFAULT_AUTH_URL: &str = "https://www.facebook.com/v19.0/dialog/oauth";
const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com/v19.0";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Facebook OAuth provider.
pub struct FacebookProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    graph_url: String,
    http: reqwest::Client,
}

impl FacebookProvider {
    /// Create a provider against Facebook's production endpoints.
    pub fn new(client_id: String, client_secret: String, redirect_uri: String) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            redirect_uri,
            DEFAULT_AUTH_URL.to_string(),
            DEFAULT_GRAPH_URL.to_string(),
        )
    }

    /// Create a provider against custom endpoints. Used by tests to point at
    /// a mock server.
    pub fn with_endpoints(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        auth_url: String,
        graph_url: String,
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
            graph_url,
            http,
        }
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct FacebookUser {
    id: String,
    name: String,
    email: Option<String>,
}

#[async_trait]
impl OAuthProvider for FacebookProvider {
    fn provider_id(&self) -> &str {
        "facebook"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope=public_profile,email&state={}",
            self.auth_url, self.client_id, self.redirect_uri, state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        let token_url = format!(
            "{}/oauth/access_token?client_id={}&client_secret={}&redirect_uri={}&code={}",
            self.graph_url, self.client_id, self.client_secret, self.redirect_uri, code
        );
        let token: TokenResponse = self
            .http
            .get(token_url)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("facebook token request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("facebook rejected code: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("facebook token response malformed: {e}")))?;

        let me_url = format!(
            "{}/me?fields=id,name,email&access_token={}",
            self.graph_url, token.access_token
        );
        let user: FacebookUser = self
            .http
            .get(me_url)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("facebook profile request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("facebook profile fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("facebook profile malformed: {e}")))?;

        Ok(ExternalProfile {
            provider: self.provider_id().to_string(),
            external_id: user.id,
            display_name: user.name,
            email: user.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> FacebookProvider {
        FacebookProvider::with_endpoints(
            "fb-client".into(),
            "fb-secret".into(),
            "https://app.example/auth/facebook/callback".into(),
            format!("{}/dialog/oauth", server.uri()),
            server.uri(),
        )
    }

    #[test]
    fn authorization_url_carries_client_and_callback() {
        let p = FacebookProvider::new(
            "fb-client".into(),
            "fb-secret".into(),
            "https://app.example/auth/facebook/callback".into(),
        );
        let url = p.authorization_url("s");
        assert!(url.contains("client_id=fb-client"));
        assert!(url.contains("redirect_uri=https://app.example/auth/facebook/callback"));
        assert!(url.contains("state=s"));
    }

    #[tokio::test]
    async fn exchange_code_normalizes_profile() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "fb-token",
                "token_type": "bearer",
                "expires_in": 5183944
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "fb_999",
                "name": "Dana",
                "email": "dana@example.com"
            })))
            .mount(&server)
            .await;

        let profile = provider(&server).exchange_code("good-code").await.unwrap();
        assert_eq!(profile.provider, "facebook");
        assert_eq!(profile.external_id, "fb_999");
        assert_eq!(profile.email.as_deref(), Some("dana@example.com"));
    }

    #[tokio::test]
    async fn ungranted_email_permission_yields_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fb-token" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "fb_1000",
                "name": "Eve"
            })))
            .mount(&server)
            .await;

        let profile = provider(&server).exchange_code("good-code").await.unwrap();
        assert_eq!(profile.email, None);
    }

    #[tokio::test]
    async fn rejected_code_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": { "message": "Invalid verification code format." }
            })))
            .mount(&server)
            .await;

        let err = provider(&server).exchange_code("bad").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }
}
