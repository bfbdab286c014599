//! crates/globe_explorer_core/src/favorites.rs
//!
//! The favorites service: the four operations that read and mutate the favorite
//! countries of the authenticated user.
//!
//! Every operation takes the caller's identity as resolved from its bearer token.
//! Mutations go through the store's conditional atomic primitives, so the
//! "already present" / "not present" checks can never be separated from the
//! write by a concurrent request.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{CountryCode, SetMutation};
use crate::ports::{PortError, UserStore};

#[derive(Debug, thiserror::Error)]
pub enum FavoritesError {
    #[error("Country code is required")]
    MissingInput,
    #[error("Country is already in favorites")]
    AlreadyFavorite(String),
    #[error("Country is not in favorites")]
    NotFavorite(String),
    #[error("Not authorized")]
    NotAuthenticated,
    #[error("Store error: {0}")]
    Store(PortError),
}

impl From<PortError> for FavoritesError {
    fn from(err: PortError) -> Self {
        match err {
            // The token resolved to a user that no longer exists.
            PortError::NotFound(_) | PortError::Unauthorized => Self::NotAuthenticated,
            other => Self::Store(other),
        }
    }
}

pub type FavoritesResult<T> = Result<T, FavoritesError>;

#[derive(Clone)]
pub struct FavoritesService {
    store: Arc<dyn UserStore>,
}

impl FavoritesService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Adds `country_code` to the user's favorites and returns the updated set.
    pub async fn add(
        &self,
        user_id: Uuid,
        country_code: Option<&str>,
    ) -> FavoritesResult<Vec<String>> {
        let code = CountryCode::parse(country_code).ok_or(FavoritesError::MissingInput)?;

        match self
            .store
            .add_favorite_if_absent(user_id, code.as_str())
            .await?
        {
            SetMutation::Applied(favorites) => {
                info!(%user_id, %code, "Country added to favorites");
                Ok(favorites)
            }
            SetMutation::Unchanged(_) => {
                debug!(%user_id, %code, "Country already in favorites");
                Err(FavoritesError::AlreadyFavorite(code.to_string()))
            }
        }
    }

    /// Removes `country_code` from the user's favorites and returns the updated set.
    pub async fn remove(&self, user_id: Uuid, country_code: &str) -> FavoritesResult<Vec<String>> {
        let code = CountryCode::parse(Some(country_code)).ok_or(FavoritesError::MissingInput)?;

        match self
            .store
            .remove_favorite_if_present(user_id, code.as_str())
            .await?
        {
            SetMutation::Applied(favorites) => {
                info!(%user_id, %code, "Country removed from favorites");
                Ok(favorites)
            }
            SetMutation::Unchanged(_) => {
                debug!(%user_id, %code, "Country not in favorites");
                Err(FavoritesError::NotFavorite(code.to_string()))
            }
        }
    }

    pub async fn list(&self, user_id: Uuid) -> FavoritesResult<Vec<String>> {
        let user = self.store.get_user_by_id(user_id).await?;
        Ok(user.favorite_countries)
    }

    /// Membership test. Absence is `false`, never an error; a blank code is
    /// never a member.
    pub async fn check(&self, user_id: Uuid, country_code: &str) -> FavoritesResult<bool> {
        let user = self.store.get_user_by_id(user_id).await?;
        let Some(code) = CountryCode::parse(Some(country_code)) else {
            return Ok(false);
        };
        Ok(user.favorite_countries.iter().any(|c| c == code.as_str()))
    }
}
