//! # Sociauth Resolver
//!
//! `sociauth-resolver` maps a freshly obtained [`ExternalProfile`] to exactly
//! one persisted [`User`], creating the account on first sight. The
//! find-or-create sequence is not atomic, so the store's uniqueness constraint
//! on `(provider, provider_id)` acts as the concurrency primitive: a duplicate
//! insert from a concurrent callback is reported as
//! [`InsertOutcome::DuplicateIdentity`] and absorbed by one re-lookup rather
//! than surfaced to the caller.

#![warn(missing_docs)]

use std::sync::Arc;

use async_trait::async_trait;
use sociauth_core::{AuthError, ExternalProfile, User};

/// In-memory user store.
pub mod memory;
pub use memory::MemoryUserStore;

/// SQL-backed user store.
#[cfg(feature = "store-sqlx")]
pub mod sql_store;
#[cfg(feature = "store-sqlx")]
pub use sql_store::SqlUserStore;

/// Result of attempting to insert a new user row.
#[derive(Debug)]
pub enum InsertOutcome {
    /// The row was created; this caller is the creator.
    Inserted(User),
    /// A row with the same `(provider, provider_id)` already exists. The
    /// concurrent creator won; re-run the lookup to observe its row.
    DuplicateIdentity,
}

/// Persistence boundary for user accounts.
///
/// Implementations must enforce uniqueness of `(provider, provider_id)` and
/// report a violation through [`InsertOutcome::DuplicateIdentity`] rather than
/// an error. Any other failure is infrastructure trouble and comes back as
/// [`AuthError::Persistence`].
#[async_trait]
pub trait UserStore: Send + Sync + 'static {
    /// Look up a user by its external identity.
    async fn find_by_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AuthError>;

    /// Insert a new user row, or signal that the identity already exists.
    async fn insert(&self, user: User) -> Result<InsertOutcome, AuthError>;
}

/// Maps external profiles to canonical local users with find-or-create
/// semantics.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
}

impl IdentityResolver {
    /// Create a resolver over the given store.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> Arc<dyn UserStore> {
        self.store.clone()
    }

    /// Resolve `profile` to the single canonical [`User`].
    ///
    /// An existing row is returned unchanged; none of its fields are resynced
    /// from the fresh profile, so locally edited values (e.g. the name) are
    /// never clobbered. On first sight a new row is inserted; if a concurrent
    /// callback for the same identity created the row in the meantime, the
    /// winner's row is looked up and returned.
    pub async fn resolve(&self, profile: &ExternalProfile) -> Result<User, AuthError> {
        if let Some(user) = self
            .store
            .find_by_identity(&profile.provider, &profile.external_id)
            .await?
        {
            return Ok(user);
        }

        match self.store.insert(User::from_profile(profile)).await? {
            InsertOutcome::Inserted(user) => Ok(user),
            InsertOutcome::DuplicateIdentity => {
                log::debug!(
                    "lost creation race for {}:{}, reusing existing row",
                    profile.provider,
                    profile.external_id
                );
                self.store
                    .find_by_identity(&profile.provider, &profile.external_id)
                    .await?
                    .ok_or_else(|| {
                        AuthError::Persistence(
                            "row missing after duplicate-identity insert".into(),
                        )
                    })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(provider: &str, external_id: &str, name: &str, email: Option<&str>) -> ExternalProfile {
        ExternalProfile {
            provider: provider.to_string(),
            external_id: external_id.to_string(),
            display_name: name.to_string(),
            email: email.map(str::to_string),
        }
    }

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(MemoryUserStore::new()))
    }

    #[tokio::test]
    async fn resolve_is_idempotent() {
        let resolver = resolver();
        let p = profile("github", "gh_1", "Alice", Some("alice@example.com"));

        let first = resolver.resolve(&p).await.unwrap();
        let second = resolver.resolve(&p).await.unwrap();

        assert_eq!(first.id, second.id);
        let store = resolver.store();
        assert!(store.find_by_identity("github", "gh_1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn concurrent_resolves_create_one_row() {
        let store = Arc::new(MemoryUserStore::new());
        let resolver = IdentityResolver::new(store.clone());
        let p = profile("github", "gh_race", "Alice", None);

        let mut handles = Vec::new();
        for _ in 0..16 {
            let resolver = resolver.clone();
            let p = p.clone();
            handles.push(tokio::spawn(async move { resolver.resolve(&p).await }));
        }

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap().id);
        }

        ids.dedup();
        assert_eq!(ids.len(), 1, "all callers must observe the same user");
        assert_eq!(store.len(), 1, "exactly one row for the identity");
    }

    #[tokio::test]
    async fn missing_email_is_stored_as_none() {
        let resolver = resolver();
        let user = resolver
            .resolve(&profile("twitter", "tw_123", "Carol", None))
            .await
            .unwrap();
        assert_eq!(user.email, None);
        assert_eq!(user.password_hash, None);
    }

    #[tokio::test]
    async fn later_profile_does_not_clobber_fields() {
        let resolver = resolver();
        let created = resolver
            .resolve(&profile("github", "gh_2", "Alice", Some("alice@example.com")))
            .await
            .unwrap();

        let relogin = resolver
            .resolve(&profile("github", "gh_2", "Alicia", Some("alicia@new.example")))
            .await
            .unwrap();

        assert_eq!(relogin.id, created.id);
        assert_eq!(relogin.name, "Alice");
        assert_eq!(relogin.email.as_deref(), Some("alice@example.com"));
    }

    #[tokio::test]
    async fn same_external_id_on_different_providers_is_isolated() {
        let resolver = resolver();
        let a = resolver
            .resolve(&profile("github", "42", "Alice", None))
            .await
            .unwrap();
        let b = resolver
            .resolve(&profile("facebook", "42", "Bob", None))
            .await
            .unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(a.provider, "github");
        assert_eq!(b.provider, "facebook");
    }

    #[tokio::test]
    async fn blank_display_name_passes_through() {
        let resolver = resolver();
        let user = resolver.resolve(&profile("github", "gh_3", "", None)).await.unwrap();
        assert_eq!(user.name, "");
    }
}
