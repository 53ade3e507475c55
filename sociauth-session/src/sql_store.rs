use async_trait::async_trait;
use sociauth_core::AuthError;
use sqlx::Database;

use crate::{Session, SessionStore};

type SessionRow = (String, String, bool, chrono::DateTime<chrono::Utc>);

fn row_to_session(row: SessionRow) -> Session {
    let (id, user_id, persistent, expires_at) = row;
    Session {
        id,
        user_id,
        persistent,
        expires_at,
    }
}

/// A [`SessionStore`] backed by a sqlx pool.
///
/// Expected schema:
///
/// ```sql
/// CREATE TABLE sociauth_sessions (
///     id TEXT PRIMARY KEY,
///     user_id TEXT NOT NULL,
///     persistent BOOLEAN NOT NULL,
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```
#[derive(Clone, Debug)]
pub struct SqlSessionStore<DB: Database> {
    pool: sqlx::Pool<DB>,
    table_name: String,
}

impl<DB: Database> SqlSessionStore<DB> {
    /// Create a store over the default `sociauth_sessions` table.
    pub fn new(pool: sqlx::Pool<DB>) -> Self {
        Self {
            pool,
            table_name: "sociauth_sessions".to_string(),
        }
    }

    /// Create a store over a custom table.
    pub fn with_table_name(pool: sqlx::Pool<DB>, table_name: String) -> Self {
        Self { pool, table_name }
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl SessionStore for SqlSessionStore<sqlx::Postgres> {
    async fn load_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let query = format!(
            "SELECT id, user_id, persistent, expires_at FROM {} \
             WHERE id = $1 AND expires_at > $2",
            self.table_name
        );

        let row: Option<SessionRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(chrono::Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Session(format!("Postgres load_session error: {e}")))?;

        Ok(row.map(row_to_session))
    }

    async fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let query = format!(
            "INSERT INTO {} (id, user_id, persistent, expires_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT(id) DO UPDATE SET \
             user_id = $2, persistent = $3, expires_at = $4",
            self.table_name
        );

        sqlx::query(&query)
            .bind(&session.id)
            .bind(&session.user_id)
            .bind(session.persistent)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Session(format!("Postgres save_session error: {e}")))?;

        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), AuthError> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table_name);
        sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Session(format!("Postgres delete_session error: {e}")))?;
        Ok(())
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl SessionStore for SqlSessionStore<sqlx::Sqlite> {
    async fn load_session(&self, id: &str) -> Result<Option<Session>, AuthError> {
        let query = format!(
            "SELECT id, user_id, persistent, expires_at FROM {} \
             WHERE id = ?1 AND expires_at > ?2",
            self.table_name
        );

        let row: Option<SessionRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(chrono::Utc::now())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Session(format!("Sqlite load_session error: {e}")))?;

        Ok(row.map(row_to_session))
    }

    async fn save_session(&self, session: &Session) -> Result<(), AuthError> {
        let query = format!(
            "INSERT INTO {} (id, user_id, persistent, expires_at) \
             VALUES (?1, ?2, ?3, ?4) \
             ON CONFLICT(id) DO UPDATE SET \
             user_id = ?2, persistent = ?3, expires_at = ?4",
            self.table_name
        );

        sqlx::query(&query)
            .bind(&session.id)
            .bind(&session.user_id)
            .bind(session.persistent)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Session(format!("Sqlite save_session error: {e}")))?;

        Ok(())
    }

    async fn delete_session(&self, id: &str) -> Result<(), AuthError> {
        let query = format!("DELETE FROM {} WHERE id = ?1", self.table_name);
        sqlx::query(&query)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AuthError::Session(format!("Sqlite delete_session error: {e}")))?;
        Ok(())
    }
}
