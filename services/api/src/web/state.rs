//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the identity attached to
//! authenticated requests.

use crate::config::Config;
use globe_explorer_core::favorites::FavoritesService;
use globe_explorer_core::ports::{CredentialService, UserStore};
use std::sync::Arc;
use uuid::Uuid;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserStore>,
    pub credentials: Arc<dyn CredentialService>,
    pub favorites: FavoritesService,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        credentials: Arc<dyn CredentialService>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            favorites: FavoritesService::new(users.clone()),
            users,
            credentials,
            config,
        }
    }
}

//=========================================================================================
// AuthUser (Specific to One Request)
//=========================================================================================

/// The caller's identity, resolved from its bearer token by the auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub token: String,
}
