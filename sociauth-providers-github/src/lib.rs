//! GitHub OAuth provider for sociauth.
//!
//! Exchanges the authorization code at GitHub's token endpoint, then fetches
//! `/user` and normalizes it into an [`ExternalProfile`]. GitHub does not
//! guarantee a public email; a missing one is preserved as `None`.

use async_trait::async_trait;
use serde::Deserialize;
use sociauth_core::{AuthError, ExternalProfile, OAuthProvider};

const DEFAULT_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const DEFAULT_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const DEFAULT_API_URL: &str = "https://api.github.com";
const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// GitHub OAuth provider.
pub struct GithubProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    api_url: String,
    http: reqwest::Client,
}

impl GithubProvider {
    /// Create a provider against GitHub's production endpoints.
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
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

#[derive(Deserialize)]
struct GithubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn provider_id(&self) -> &str {
        "github"
    }

    fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&scope=read:user%20user:email&state={}",
            self.auth_url, self.client_id, self.redirect_uri, state
        )
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalProfile, AuthError> {
        let token: TokenResponse = self
            .http
            .post(&self.token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("github token request failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("github token response malformed: {e}")))?;

        // GitHub answers 200 even for a bad code; the error lives in the body.
        let access_token = match (token.access_token, token.error) {
            (Some(t), _) => t,
            (None, Some(err)) => {
                let detail = token.error_description.unwrap_or_default();
                return Err(AuthError::Provider(format!(
                    "github rejected code: {err} {detail}"
                )));
            }
            (None, None) => {
                return Err(AuthError::Provider(
                    "github token response missing access_token".into(),
                ))
            }
        };

        let user: GithubUser = self
            .http
            .get(format!("{}/user", self.api_url))
            .bearer_auth(&access_token)
            .header(reqwest::header::USER_AGENT, "sociauth")
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("github profile request failed: {e}")))?
            .error_for_status()
            .map_err(|e| AuthError::Provider(format!("github profile fetch failed: {e}")))?
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("github profile malformed: {e}")))?;

        Ok(ExternalProfile {
            provider: self.provider_id().to_string(),
            external_id: user.id.to_string(),
            display_name: user.name.unwrap_or(user.login),
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

    fn provider(server: &MockServer) -> GithubProvider {
        GithubProvider::with_endpoints(
            "client-abc".into(),
            "secret".into(),
            "https://app.example/auth/github/callback".into(),
            format!("{}/login/oauth/authorize", server.uri()),
            format!("{}/login/oauth/access_token", server.uri()),
            server.uri(),
        )
    }

    #[test]
    fn authorization_url_carries_client_and_callback() {
        let p = GithubProvider::new(
            "client-abc".into(),
            "secret".into(),
            "https://app.example/auth/github/callback".into(),
        );
        let url = p.authorization_url("state-1");
        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(url.contains("client_id=client-abc"));
        assert!(url.contains("redirect_uri=https://app.example/auth/github/callback"));
        assert!(url.contains("state=state-1"));
    }

    #[tokio::test]
    async fn exchange_code_normalizes_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "gho_token",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 12345,
                "login": "alice",
                "name": "Alice",
                "email": "alice@example.com"
            })))
            .mount(&server)
            .await;

        let profile = provider(&server).exchange_code("good-code").await.unwrap();
        assert_eq!(profile.provider, "github");
        assert_eq!(profile.external_id, "12345");
        assert_eq!(profile.display_name, "Alice");
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn missing_name_falls_back_to_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "access_token": "gho_token" })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "login": "bob",
                "name": null,
                "email": null
            })))
            .mount(&server)
            .await;

        let profile = provider(&server).exchange_code("good-code").await.unwrap();
        assert_eq!(profile.display_name, "bob");
        assert_eq!(profile.email, None);
    }

    #[tokio::test]
    async fn bad_code_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": "bad_verification_code",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let err = provider(&server).exchange_code("expired").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[tokio::test]
    async fn malformed_token_response_is_a_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server).exchange_code("code").await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }
}
