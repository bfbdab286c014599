//! services/api/src/adapters/http_client.rs
//!
//! This module contains the HTTP client adapter for the Globe Explorer backend.
//! It implements the `ExplorerApi` port from the core crate, which is what a
//! client-side `ExplorerSession` talks to.

use async_trait::async_trait;
use globe_explorer_core::domain::User;
use globe_explorer_core::ports::{
    AuthPayload, ExplorerApi, FavoritesUpdate, PortError, PortResult,
};
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ErrorBody;
use crate::web::dto::{
    AddFavoriteRequest, AuthResponse, CheckFavoriteResponse, FavoritesMutationResponse,
    FavoritesResponse, LoginRequest, MeResponse, RegisterRequest,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ExplorerApi` port over HTTP.
#[derive(Clone)]
pub struct HttpExplorerClient {
    client: Client,
    base_url: Url,
}

impl HttpExplorerClient {
    /// Creates a new client for a backend rooted at `base_url` (e.g. `http://localhost:5000`).
    pub fn new(client: Client, base_url: &str) -> PortResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| PortError::Unexpected(format!("Invalid backend URL {base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(PortError::Unexpected(format!(
                "Backend URL {base_url} cannot be a base"
            )));
        }
        Ok(Self { client, base_url })
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> PortResult<T> {
        let response = request
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        decode(response).await
    }
}

/// Maps a response onto the port's error taxonomy.
async fn decode<T: DeserializeOwned>(response: Response) -> PortResult<T> {
    let status = response.status();
    debug!("Backend answered {}", status);

    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed response: {e}")));
    }

    // Any error answer carrying `{success, message}` keeps the server's message;
    // only bodiless answers fall back to the generic variants.
    let body = response.json::<ErrorBody>().await.ok();

    Err(match (status, body) {
        (StatusCode::UNAUTHORIZED, _) => PortError::Unauthorized,
        (_, Some(body)) => PortError::Rejected(body.message),
        (StatusCode::NOT_FOUND, None) => PortError::NotFound(status.to_string()),
        (_, None) => PortError::Unexpected(format!("Backend answered {status}")),
    })
}

//=========================================================================================
// `ExplorerApi` Trait Implementation
//=========================================================================================

#[async_trait]
impl ExplorerApi for HttpExplorerClient {
    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<AuthPayload> {
        let body = RegisterRequest {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .send(
                self.client
                    .post(self.url(&["api", "auth", "register"]))
                    .json(&body),
            )
            .await?;
        Ok(AuthPayload {
            token: response.token,
            user: response.user.into(),
        })
    }

    async fn login(&self, email: &str, password: &str) -> PortResult<AuthPayload> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response: AuthResponse = self
            .send(
                self.client
                    .post(self.url(&["api", "auth", "login"]))
                    .json(&body),
            )
            .await?;
        Ok(AuthPayload {
            token: response.token,
            user: response.user.into(),
        })
    }

    async fn current_user(&self, token: &str) -> PortResult<User> {
        let response: MeResponse = self
            .send(
                self.client
                    .get(self.url(&["api", "auth", "me"]))
                    .bearer_auth(token),
            )
            .await?;
        Ok(response.user.into())
    }

    async fn logout(&self, token: &str) -> PortResult<()> {
        let _: serde_json::Value = self
            .send(
                self.client
                    .post(self.url(&["api", "auth", "logout"]))
                    .bearer_auth(token),
            )
            .await?;
        Ok(())
    }

    async fn list_favorites(&self, token: &str) -> PortResult<Vec<String>> {
        let response: FavoritesResponse = self
            .send(
                self.client
                    .get(self.url(&["api", "users", "favorites"]))
                    .bearer_auth(token),
            )
            .await?;
        Ok(response.favorite_countries)
    }

    async fn add_favorite(&self, token: &str, code: &str) -> PortResult<FavoritesUpdate> {
        let body = AddFavoriteRequest {
            country_code: Some(code.to_string()),
        };
        let response: FavoritesMutationResponse = self
            .send(
                self.client
                    .post(self.url(&["api", "users", "favorites"]))
                    .bearer_auth(token)
                    .json(&body),
            )
            .await?;
        Ok(FavoritesUpdate {
            message: response.message,
            favorite_countries: response.favorite_countries,
        })
    }

    async fn remove_favorite(&self, token: &str, code: &str) -> PortResult<FavoritesUpdate> {
        let response: FavoritesMutationResponse = self
            .send(
                self.client
                    .delete(self.url(&["api", "users", "favorites", code]))
                    .bearer_auth(token),
            )
            .await?;
        Ok(FavoritesUpdate {
            message: response.message,
            favorite_countries: response.favorite_countries,
        })
    }

    async fn check_favorite(&self, token: &str, code: &str) -> PortResult<bool> {
        let response: CheckFavoriteResponse = self
            .send(
                self.client
                    .get(self.url(&["api", "users", "favorites", "check", code]))
                    .bearer_auth(token),
            )
            .await?;
        Ok(response.is_favorite)
    }
}
