//! crates/globe_explorer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or HTTP APIs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{AuthSession, Country, NewUser, SetMutation, User, UserCredentials};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    /// A remote service answered with an error message meant for the user.
    #[error("{0}")]
    Rejected(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Server-side Ports
//=========================================================================================

#[async_trait]
pub trait UserStore: Send + Sync {
    // --- User Management ---
    /// Fails with `PortError::Conflict` when the email is already registered.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    /// `email` must already be lower-cased.
    async fn get_credentials_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    // --- Favorites (atomic set mutations) ---
    /// Appends `code` unless it is already present. The membership check and the
    /// append are one atomic step with respect to other mutations of the same user.
    async fn add_favorite_if_absent(&self, user_id: Uuid, code: &str) -> PortResult<SetMutation>;

    /// Removes `code` if present, atomically like [`UserStore::add_favorite_if_absent`].
    async fn remove_favorite_if_present(
        &self,
        user_id: Uuid,
        code: &str,
    ) -> PortResult<SetMutation>;
}

#[async_trait]
pub trait CredentialService: Send + Sync {
    async fn issue_token(&self, user_id: Uuid) -> PortResult<AuthSession>;

    /// Resolves a bearer token to the user it was issued for.
    /// Unknown or expired tokens yield `PortError::Unauthorized`.
    async fn resolve_token(&self, token: &str) -> PortResult<Uuid>;

    async fn revoke_token(&self, token: &str) -> PortResult<()>;
}

//=========================================================================================
// Client-side Ports
//=========================================================================================

/// Token and profile returned by a successful registration or login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthPayload {
    pub token: String,
    pub user: User,
}

/// Server answer to a successful favorites mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FavoritesUpdate {
    pub message: String,
    pub favorite_countries: Vec<String>,
}

/// The backend as seen by a client.
#[async_trait]
pub trait ExplorerApi: Send + Sync {
    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<AuthPayload>;

    async fn login(&self, email: &str, password: &str) -> PortResult<AuthPayload>;

    async fn current_user(&self, token: &str) -> PortResult<User>;

    async fn logout(&self, token: &str) -> PortResult<()>;

    async fn list_favorites(&self, token: &str) -> PortResult<Vec<String>>;

    async fn add_favorite(&self, token: &str, code: &str) -> PortResult<FavoritesUpdate>;

    async fn remove_favorite(&self, token: &str, code: &str) -> PortResult<FavoritesUpdate>;

    async fn check_favorite(&self, token: &str, code: &str) -> PortResult<bool>;
}

/// Read-only source of country metadata.
#[async_trait]
pub trait CountryDirectory: Send + Sync {
    async fn all(&self) -> PortResult<Vec<Country>>;

    async fn by_code(&self, code: &str) -> PortResult<Country>;

    /// An unknown name is not an error; it yields an empty list.
    async fn search_by_name(&self, name: &str) -> PortResult<Vec<Country>>;

    async fn by_region(&self, region: &str) -> PortResult<Vec<Country>>;

    /// Countries with a spoken language containing `language`, ignoring case.
    async fn by_language(&self, language: &str) -> PortResult<Vec<Country>> {
        let needle = language.to_lowercase();
        let countries = self.all().await?;
        Ok(countries
            .into_iter()
            .filter(|country| {
                country
                    .languages
                    .iter()
                    .any(|lang| lang.to_lowercase().contains(&needle))
            })
            .collect())
    }
}
