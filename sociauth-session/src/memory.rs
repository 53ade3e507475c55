use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use sociauth_core::AuthError;

use crate::{Session, SessionStore};

/// A process-local [`SessionStore`] for tests and single-process deployments.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| AuthError::Session("session store lock poisoned".into()))?;
        Ok(sessions
            .get(id)
            .filter(|s| s.expires_at > chrono::Utc::now())
            .cloned())
    }

    async fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AuthError::Session("session store lock poisoned".into()))?;
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), AuthError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| AuthError::Session("session store lock poisoned".into()))?;
        sessions.remove(id);
        Ok(())
    }
}
