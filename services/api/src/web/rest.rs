//! services/api/src/web/rest.rs
//!
//! Contains the service-level REST handlers and the master definition for the
//! OpenAPI specification.

use axum::http::Uri;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::error::{ErrorBody, HttpError};
use crate::web::{auth, dto, favorites};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        auth::logout_handler,
        favorites::list_favorites_handler,
        favorites::add_favorite_handler,
        favorites::remove_favorite_handler,
        favorites::check_favorite_handler,
    ),
    components(
        schemas(
            dto::RegisterRequest,
            dto::LoginRequest,
            dto::UserResponse,
            dto::AuthResponse,
            dto::MeResponse,
            dto::MessageResponse,
            dto::AddFavoriteRequest,
            dto::FavoritesResponse,
            dto::FavoritesMutationResponse,
            dto::CheckFavoriteResponse,
            ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Globe Explorer API", description = "Accounts and favorite countries.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer token scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

//=========================================================================================
// Service-level Handlers
//=========================================================================================

/// GET / - Liveness text.
pub async fn root_handler() -> &'static str {
    "Countries API Backend is running!"
}

/// Fallback for every unknown route.
pub async fn not_found_handler(uri: Uri) -> HttpError {
    HttpError::not_found(format!("Route not found: {}", uri))
}
