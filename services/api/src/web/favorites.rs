//! services/api/src/web/favorites.rs
//!
//! Handlers for the favorites endpoints. The caller's identity always comes from
//! the [`AuthUser`] inserted by the auth middleware, never from the request.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::{
    AddFavoriteRequest, CheckFavoriteResponse, FavoritesMutationResponse, FavoritesResponse,
};
use crate::web::state::{AppState, AuthUser};

/// GET /api/users/favorites - List the caller's favorite countries
#[utoipa::path(
    get,
    path = "/api/users/favorites",
    responses(
        (status = 200, description = "Current favorites", body = FavoritesResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn list_favorites_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<FavoritesResponse>, HttpError> {
    let favorite_countries = state.favorites.list(auth.user_id).await?;
    Ok(Json(FavoritesResponse {
        success: true,
        favorite_countries,
    }))
}

/// POST /api/users/favorites - Add a country to the caller's favorites
#[utoipa::path(
    post,
    path = "/api/users/favorites",
    request_body = AddFavoriteRequest,
    responses(
        (status = 200, description = "Country added", body = FavoritesMutationResponse),
        (status = 400, description = "Missing code or already a favorite", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn add_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<AddFavoriteRequest>, JsonRejection>,
) -> Result<Json<FavoritesMutationResponse>, HttpError> {
    // An unreadable body carries no country code.
    let request = payload.map(|Json(req)| req).unwrap_or_default();

    let favorite_countries = state
        .favorites
        .add(auth.user_id, request.country_code.as_deref())
        .await?;

    Ok(Json(FavoritesMutationResponse {
        success: true,
        message: "Country added to favorites".to_string(),
        favorite_countries,
    }))
}

/// DELETE /api/users/favorites/{country_code} - Remove a country from the caller's favorites
#[utoipa::path(
    delete,
    path = "/api/users/favorites/{country_code}",
    params(("country_code" = String, Path, description = "Country identifier, e.g. `USA`.")),
    responses(
        (status = 200, description = "Country removed", body = FavoritesMutationResponse),
        (status = 400, description = "Country is not a favorite", body = ErrorBody),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn remove_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(country_code): Path<String>,
) -> Result<Json<FavoritesMutationResponse>, HttpError> {
    let favorite_countries = state.favorites.remove(auth.user_id, &country_code).await?;

    Ok(Json(FavoritesMutationResponse {
        success: true,
        message: "Country removed from favorites".to_string(),
        favorite_countries,
    }))
}

/// GET /api/users/favorites/check/{country_code} - Is this country a favorite?
#[utoipa::path(
    get,
    path = "/api/users/favorites/check/{country_code}",
    params(("country_code" = String, Path, description = "Country identifier, e.g. `USA`.")),
    responses(
        (status = 200, description = "Membership result", body = CheckFavoriteResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn check_favorite_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(country_code): Path<String>,
) -> Result<Json<CheckFavoriteResponse>, HttpError> {
    let is_favorite = state.favorites.check(auth.user_id, &country_code).await?;
    Ok(Json(CheckFavoriteResponse {
        success: true,
        is_favorite,
    }))
}
