//! # Sociauth Session
//!
//! `sociauth-session` turns a resolved [`User`] into an authenticated session
//! and decides where the caller goes after login. Issuance is stateless: every
//! request builds a fresh session record and writes it straight to the
//! configured [`SessionStore`]; nothing is cached in-process.

#![warn(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sociauth_core::{AuthError, SameSite, User};

/// In-memory session store.
pub mod memory;
pub use memory::MemorySessionStore;

/// SQL-backed session store.
#[cfg(feature = "store-sqlx")]
pub mod sql_store;
#[cfg(feature = "store-sqlx")]
pub use sql_store::SqlSessionStore;

/// An authenticated session bound to a user.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier, handed to the caller as the cookie value.
    pub id: String,
    /// The [`User::id`] this session authenticates.
    pub user_id: String,
    /// Whether this is a long-lived "remember me" session.
    pub persistent: bool,
    /// Expiry instant; the store treats the session as absent after this.
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

/// Storage backend for sessions.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Load an unexpired session by id.
    async fn load_session(&self, id: &str) -> Result<Option<Session>, AuthError>;
    /// Persist a session.
    async fn save_session(&self, session: &Session) -> Result<(), AuthError>;
    /// Delete a session by id. Deleting an absent session is not an error.
    async fn delete_session(&self, id: &str) -> Result<(), AuthError>;
}

/// Configuration for issued sessions and their cookie.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name of the session cookie.
    pub cookie_name: String,
    /// Cookie path.
    pub path: String,
    /// Whether the cookie should only be sent over HTTPS.
    pub secure: bool,
    /// Whether the cookie is hidden from client-side scripts.
    pub http_only: bool,
    /// Cross-site policy for the cookie.
    pub same_site: SameSite,
    /// Lifetime of a persistent ("remember me") session.
    pub persistent_max_age: chrono::Duration,
    /// Lifetime of a transient session. No cookie `Max-Age` is set for these,
    /// so the cookie itself dies with the browser session.
    pub transient_max_age: chrono::Duration,
    /// Where to send the caller after a successful login, regardless of the
    /// provider used.
    pub post_login_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "sociauth_session".to_string(),
            path: "/".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Lax,
            persistent_max_age: chrono::Duration::days(30),
            transient_max_age: chrono::Duration::hours(2),
            post_login_path: "/".to_string(),
        }
    }
}

/// Issues sessions for resolved users.
#[derive(Clone)]
pub struct SessionIssuer {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl SessionIssuer {
    /// Create an issuer over the given store with default configuration.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self::with_config(store, SessionConfig::default())
    }

    /// Create an issuer with explicit configuration.
    pub fn with_config(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    /// The issuer's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// Create and persist a session bound to `user.id`.
    ///
    /// `persistent` selects the long "remember me" lifetime; social logins
    /// always request it, since there is no password re-entry to fall back on.
    /// A store failure is fatal for the request and comes back as
    /// [`AuthError::Session`]; it is not retried.
    pub async fn issue(&self, user: &User, persistent: bool) -> Result<Session, AuthError> {
        let max_age = if persistent {
            self.config.persistent_max_age
        } else {
            self.config.transient_max_age
        };
        let session = Session {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            persistent,
            expires_at: chrono::Utc::now() + max_age,
        };

        self.store.save_session(&session).await?;
        Ok(session)
    }

    /// The statically configured landing location after a successful login.
    pub fn post_login_destination(&self) -> &str {
        &self.config.post_login_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sociauth_core::ExternalProfile;

    fn user() -> User {
        User::from_profile(&ExternalProfile {
            provider: "github".to_string(),
            external_id: "gh_1".to_string(),
            display_name: "Alice".to_string(),
            email: None,
        })
    }

    #[tokio::test]
    async fn issue_binds_session_to_user() {
        let store = Arc::new(MemorySessionStore::new());
        let issuer = SessionIssuer::new(store.clone());
        let u = user();

        let session = issuer.issue(&u, true).await.unwrap();
        assert_eq!(session.user_id, u.id);
        assert!(session.persistent);

        let loaded = store.load_session(&session.id).await.unwrap().unwrap();
        assert_eq!(loaded.user_id, u.id);
    }

    #[tokio::test]
    async fn persistent_sessions_outlive_transient_ones() {
        let issuer = SessionIssuer::new(Arc::new(MemorySessionStore::new()));
        let u = user();

        let long = issuer.issue(&u, true).await.unwrap();
        let short = issuer.issue(&u, false).await.unwrap();

        assert!(long.expires_at > short.expires_at);
        assert_ne!(long.id, short.id);
    }

    #[tokio::test]
    async fn expired_sessions_are_not_loaded() {
        let store = Arc::new(MemorySessionStore::new());
        let stale = Session {
            id: "stale".to_string(),
            user_id: "u1".to_string(),
            persistent: true,
            expires_at: chrono::Utc::now() - chrono::Duration::minutes(1),
        };
        store.save_session(&stale).await.unwrap();

        assert!(store.load_session("stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_session_is_idempotent() {
        let store = Arc::new(MemorySessionStore::new());
        store.delete_session("never-existed").await.unwrap();
    }

    #[test]
    fn post_login_destination_comes_from_config() {
        let issuer = SessionIssuer::with_config(
            Arc::new(MemorySessionStore::new()),
            SessionConfig {
                post_login_path: "/dashboard".to_string(),
                ..SessionConfig::default()
            },
        );
        assert_eq!(issuer.post_login_destination(), "/dashboard");
    }
}
