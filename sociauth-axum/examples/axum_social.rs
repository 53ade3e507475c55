//! Minimal social-login server over in-memory stores.
//!
//! ```sh
//! GITHUB_CLIENT_ID=... GITHUB_CLIENT_SECRET=... \
//! TWITTER_CLIENT_ID=... TWITTER_CLIENT_SECRET=... \
//! FACEBOOK_CLIENT_ID=... FACEBOOK_CLIENT_SECRET=... \
//! cargo run --example axum_social
//! ```

use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use sociauth_axum::{AuthSession, SessionConfig, SocialLogin};
use sociauth_gateway::ProviderGateway;
use sociauth_providers_facebook::FacebookProvider;
use sociauth_providers_github::GithubProvider;
use sociauth_providers_twitter::TwitterProvider;
use sociauth_resolver::{IdentityResolver, MemoryUserStore};
use sociauth_session::{MemorySessionStore, SessionIssuer};
use tower_cookies::CookieManagerLayer;

fn env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| panic!("{key} must be set"))
}

async fn index() -> Html<&'static str> {
    Html(
        r#"<a href="/auth/github">Sign in with GitHub</a><br>
           <a href="/auth/twitter">Sign in with Twitter</a><br>
           <a href="/auth/facebook">Sign in with Facebook</a>"#,
    )
}

async fn welcome(AuthSession(session): AuthSession) -> String {
    format!("signed in as user {}", session.user_id)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let base = std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());

    let gateway = ProviderGateway::builder()
        .provider(GithubProvider::new(
            env("GITHUB_CLIENT_ID"),
            env("GITHUB_CLIENT_SECRET"),
            format!("{base}/auth/github/callback"),
        ))
        .provider(TwitterProvider::new(
            env("TWITTER_CLIENT_ID"),
            env("TWITTER_CLIENT_SECRET"),
            format!("{base}/auth/twitter/callback"),
        ))
        .provider(FacebookProvider::new(
            env("FACEBOOK_CLIENT_ID"),
            env("FACEBOOK_CLIENT_SECRET"),
            format!("{base}/auth/facebook/callback"),
        ))
        .build();

    let social = SocialLogin::new(
        gateway,
        IdentityResolver::new(Arc::new(MemoryUserStore::new())),
        SessionIssuer::with_config(
            Arc::new(MemorySessionStore::new()),
            SessionConfig {
                secure: base.starts_with("https"),
                post_login_path: "/welcome".to_string(),
                ..SessionConfig::default()
            },
        ),
    );

    let app = Router::new()
        .route("/", get(index))
        .route("/welcome", get(welcome))
        .layer(CookieManagerLayer::new())
        .with_state(social.clone())
        .merge(social.router());

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
