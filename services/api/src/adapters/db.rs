//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete PostgreSQL implementation
//! of the `UserStore` and `CredentialService` ports from the core crate. It handles
//! all interactions with the database using `sqlx`.
//!
//! Favorites live in a `TEXT[]` column. Adding and removing are single conditional
//! `UPDATE` statements: the membership test sits in the `WHERE` clause, so Postgres'
//! row locking makes the check and the write one atomic step. A concurrent writer of
//! the same row re-evaluates the condition against the committed version.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use globe_explorer_core::domain::{AuthSession, NewUser, SetMutation, User, UserCredentials};
use globe_explorer_core::ports::{CredentialService, PortError, PortResult, UserStore};
use sqlx::{FromRow, PgPool};
use tracing::error;
use uuid::Uuid;

const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `UserStore` and `CredentialService` ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    token_ttl: Duration,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, token_ttl: Duration) -> Self {
        Self { pool, token_ttl }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// Reads the current set after a conditional update matched no row.
    async fn unchanged_or_missing(&self, user_id: Uuid) -> PortResult<SetMutation> {
        let current: Option<Vec<String>> =
            sqlx::query_scalar("SELECT favorite_countries FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(unexpected)?;

        current
            .map(SetMutation::Unchanged)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user_id)))
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    error!("Database error: {:?}", e);
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    favorite_countries: Vec<String>,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            favorite_countries: self.favorite_countries,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, name, email, hashed_password) VALUES ($1, $2, $3, $4) \
             RETURNING id, name, email, favorite_countries, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .and_then(|d| d.code())
                .is_some_and(|code| code == UNIQUE_VIOLATION);
            if duplicate {
                PortError::Conflict(format!("User {} already exists", new_user.email))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, name, email, favorite_countries, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", user_id)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id, email, hashed_password FROM users WHERE lower(email) = lower($1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::NotFound(format!("User {} not found", email)),
            _ => unexpected(e),
        })?;
        Ok(record.to_domain())
    }

    async fn add_favorite_if_absent(&self, user_id: Uuid, code: &str) -> PortResult<SetMutation> {
        let updated: Option<Vec<String>> = sqlx::query_scalar(
            "UPDATE users SET favorite_countries = array_append(favorite_countries, $2) \
             WHERE id = $1 AND NOT ($2 = ANY(favorite_countries)) \
             RETURNING favorite_countries",
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match updated {
            Some(favorites) => Ok(SetMutation::Applied(favorites)),
            None => self.unchanged_or_missing(user_id).await,
        }
    }

    async fn remove_favorite_if_present(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> PortResult<SetMutation> {
        let updated: Option<Vec<String>> = sqlx::query_scalar(
            "UPDATE users SET favorite_countries = array_remove(favorite_countries, $2) \
             WHERE id = $1 AND $2 = ANY(favorite_countries) \
             RETURNING favorite_countries",
        )
        .bind(user_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        match updated {
            Some(favorites) => Ok(SetMutation::Applied(favorites)),
            None => self.unchanged_or_missing(user_id).await,
        }
    }
}

//=========================================================================================
// `CredentialService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CredentialService for DbAdapter {
    async fn issue_token(&self, user_id: Uuid) -> PortResult<AuthSession> {
        let session = AuthSession {
            token: Uuid::new_v4().to_string(),
            user_id,
            expires_at: Utc::now() + self.token_ttl,
        };
        sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= now()")
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        sqlx::query("INSERT INTO auth_sessions (token, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(session)
    }

    async fn resolve_token(&self, token: &str) -> PortResult<Uuid> {
        let user_id: Option<Uuid> = sqlx::query_scalar(
            "SELECT user_id FROM auth_sessions WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;
        user_id.ok_or(PortError::Unauthorized)
    }

    async fn revoke_token(&self, token: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }
}
