use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sociauth_core::{AuthError, User};

use crate::{InsertOutcome, UserStore};

/// A process-local [`UserStore`] keyed on `(provider, provider_id)`.
///
/// The map entry check and insert happen under one write lock, which gives the
/// same at-most-one-creation guarantee a database uniqueness constraint does.
/// Intended for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<(String, String), User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted users.
    pub fn len(&self) -> usize {
        self.users.read().map(|u| u.len()).unwrap_or(0)
    }

    /// Whether the store holds no users.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AuthError> {
        let users = self
            .users
            .read()
            .map_err(|_| AuthError::Persistence("user store lock poisoned".into()))?;
        Ok(users
            .get(&(provider.to_string(), provider_id.to_string()))
            .cloned())
    }

    async fn insert(&self, user: User) -> Result<InsertOutcome, AuthError> {
        let mut users = self
            .users
            .write()
            .map_err(|_| AuthError::Persistence("user store lock poisoned".into()))?;
        let key = (user.provider.clone(), user.provider_id.clone());
        if users.contains_key(&key) {
            return Ok(InsertOutcome::DuplicateIdentity);
        }
        users.insert(key, user.clone());
        Ok(InsertOutcome::Inserted(user))
    }
}
