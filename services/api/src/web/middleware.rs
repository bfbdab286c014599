//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use globe_explorer_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, warn};

use crate::error::HttpError;
use crate::web::state::{AppState, AuthUser};

/// Middleware that resolves the `Authorization: Bearer` token to a user.
///
/// If valid, inserts an [`AuthUser`] into request extensions for handlers to use.
/// If missing or invalid, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    // 1. Extract the bearer token
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .ok_or_else(|| HttpError::unauthorized("Not authorized, no token"))?
        .to_string();

    // 2. Resolve the token through the credential service
    let user_id = state
        .credentials
        .resolve_token(&token)
        .await
        .map_err(|e| match e {
            PortError::Unauthorized | PortError::NotFound(_) => {
                warn!("Rejected bearer token");
                HttpError::unauthorized("Not authorized, token failed")
            }
            other => {
                error!("Failed to resolve bearer token: {:?}", other);
                HttpError::internal("Failed to validate credentials")
            }
        })?;

    // 3. Insert the identity into request extensions
    req.extensions_mut().insert(AuthUser { user_id, token });

    // 4. Continue to the handler
    Ok(next.run(req).await)
}

/// Extracts the token from an `Authorization` header value.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::bearer_token;

    #[test]
    fn parses_bearer_header() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer  abc "), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
