use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A normalized, provider-agnostic profile as returned by a provider.
///
/// Produced fresh on every callback and never persisted or cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalProfile {
    /// The provider that attested this profile, e.g. `"twitter"`.
    pub provider: String,
    /// The subject identifier the provider assigns to this person.
    pub external_id: String,
    /// Display name as reported by the provider. A blank name passes through
    /// as-is; no default is substituted.
    pub display_name: String,
    /// Email claim, if the provider supplies one.
    pub email: Option<String>,
}

/// A locally persisted user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Internal identifier, assigned at creation, immutable.
    pub id: String,
    /// Display name, sourced from the provider profile at creation time only.
    /// Not resynced on subsequent logins.
    pub name: String,
    /// Optional and not unique: several providers may omit or share a value.
    pub email: Option<String>,
    /// Populated only for accounts created through credential signup; always
    /// `None` for OAuth-originated accounts.
    pub password_hash: Option<String>,
    /// Provider used at account-creation time.
    pub provider: String,
    /// The provider's subject identifier. `(provider, provider_id)` is the
    /// external identity and is unique across all users.
    pub provider_id: String,
    /// Creation timestamp, system-managed.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp, system-managed.
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Construct a new account from a first-seen profile.
    pub fn from_profile(profile: &ExternalProfile) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: profile.display_name.clone(),
            email: profile.email.clone(),
            password_hash: None,
            provider: profile.provider.clone(),
            provider_id: profile.external_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}
