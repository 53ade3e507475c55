use async_trait::async_trait;
use sociauth_core::{AuthError, User};
use sqlx::Database;

use crate::{InsertOutcome, UserStore};

type UserRow = (
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
    chrono::DateTime<chrono::Utc>,
    chrono::DateTime<chrono::Utc>,
);

fn row_to_user(row: UserRow) -> User {
    let (id, name, email, password_hash, provider, provider_id, created_at, updated_at) = row;
    User {
        id,
        name,
        email,
        password_hash,
        provider,
        provider_id,
        created_at,
        updated_at,
    }
}

/// A [`UserStore`] backed by a sqlx pool.
///
/// The table must carry a uniqueness constraint on `(provider, provider_id)`;
/// that constraint, not an application lock, is what enforces
/// at-most-one-creation under concurrent callbacks. Expected schema:
///
/// ```sql
/// CREATE TABLE sociauth_users (
///     id TEXT PRIMARY KEY,
///     name TEXT NOT NULL,
///     email TEXT,
///     password_hash TEXT,
///     provider TEXT NOT NULL,
///     provider_id TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL,
///     UNIQUE (provider, provider_id)
/// );
/// ```
#[derive(Clone, Debug)]
pub struct SqlUserStore<DB: Database> {
    pool: sqlx::Pool<DB>,
    table_name: String,
}

impl<DB: Database> SqlUserStore<DB> {
    /// Create a store over the default `sociauth_users` table.
    pub fn new(pool: sqlx::Pool<DB>) -> Self {
        Self {
            pool,
            table_name: "sociauth_users".to_string(),
        }
    }

    /// Create a store over a custom table.
    pub fn with_table_name(pool: sqlx::Pool<DB>, table_name: String) -> Self {
        Self { pool, table_name }
    }
}

#[cfg(feature = "postgres")]
#[async_trait]
impl UserStore for SqlUserStore<sqlx::Postgres> {
    async fn find_by_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AuthError> {
        let query = format!(
            "SELECT id, name, email, password_hash, provider, provider_id, created_at, updated_at \
             FROM {} WHERE provider = $1 AND provider_id = $2",
            self.table_name
        );

        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(provider)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Persistence(format!("Postgres find_by_identity error: {e}")))?;

        Ok(row.map(row_to_user))
    }

    async fn insert(&self, user: User) -> Result<InsertOutcome, AuthError> {
        let query = format!(
            "INSERT INTO {} (id, name, email, password_hash, provider, provider_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.provider)
            .bind(&user.provider_id)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(user)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::DuplicateIdentity),
            Err(e) => Err(AuthError::Persistence(format!(
                "Postgres insert error: {e}"
            ))),
        }
    }
}

#[cfg(feature = "sqlite")]
#[async_trait]
impl UserStore for SqlUserStore<sqlx::Sqlite> {
    async fn find_by_identity(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<User>, AuthError> {
        let query = format!(
            "SELECT id, name, email, password_hash, provider, provider_id, created_at, updated_at \
             FROM {} WHERE provider = ?1 AND provider_id = ?2",
            self.table_name
        );

        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(provider)
            .bind(provider_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AuthError::Persistence(format!("Sqlite find_by_identity error: {e}")))?;

        Ok(row.map(row_to_user))
    }

    async fn insert(&self, user: User) -> Result<InsertOutcome, AuthError> {
        let query = format!(
            "INSERT INTO {} (id, name, email, password_hash, provider, provider_id, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            self.table_name
        );

        let result = sqlx::query(&query)
            .bind(&user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.provider)
            .bind(&user.provider_id)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(InsertOutcome::Inserted(user)),
            Err(e) if is_unique_violation(&e) => Ok(InsertOutcome::DuplicateIdentity),
            Err(e) => Err(AuthError::Persistence(format!("Sqlite insert error: {e}"))),
        }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
