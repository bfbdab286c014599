pub mod auth;
pub mod dto;
pub mod favorites;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

pub use middleware::require_auth;
pub use state::{AppState, AuthUser};

/// Builds the complete application router: accounts, favorites, service routes
/// and the JSON 404 fallback.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_auth_routes = Router::new()
        .route("/register", post(auth::register_handler))
        .route("/login", post(auth::login_handler));

    // Protected routes (auth required)
    let protected_auth_routes = Router::new()
        .route("/me", get(auth::me_handler))
        .route("/logout", post(auth::logout_handler))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let favorites_routes = Router::new()
        .route(
            "/favorites",
            get(favorites::list_favorites_handler).post(favorites::add_favorite_handler),
        )
        .route(
            "/favorites/{country_code}",
            delete(favorites::remove_favorite_handler),
        )
        .route(
            "/favorites/check/{country_code}",
            get(favorites::check_favorite_handler),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    let cors = cors_layer(&app_state.config.cors_origins);

    Router::new()
        .route("/", get(rest::root_handler))
        .nest(
            "/api/auth",
            public_auth_routes.merge(protected_auth_routes),
        )
        .nest("/api/users", favorites_routes)
        .fallback(rest::not_found_handler)
        .layer(cors)
        .with_state(app_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}
