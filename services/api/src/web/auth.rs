//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for registration, login, current user and logout.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use globe_explorer_core::accounts::{LoginAttempt, Registration};
use globe_explorer_core::domain::{NewUser, User};
use globe_explorer_core::ports::PortError;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ErrorBody, HttpError};
use crate::web::dto::{
    AuthResponse, LoginRequest, MeResponse, MessageResponse, RegisterRequest, UserResponse,
};
use crate::web::state::{AppState, AuthUser};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new user account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = AuthResponse),
        (status = 400, description = "Invalid input or email already registered", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = payload.map_err(|e| HttpError::bad_request(e.body_text()))?;

    // 1. Validate the input
    let registration = Registration::validate(&req.name, &req.email, &req.password)?;

    // 2. Hash the password
    let hashed_password = hash_password(&registration.password)?;

    // 3. Create user in the store
    let user = state
        .users
        .create_user(NewUser {
            name: registration.name,
            email: registration.email,
            hashed_password,
        })
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => HttpError::bad_request("User already exists"),
            other => {
                error!("Failed to create user: {:?}", other);
                HttpError::internal("Failed to create user")
            }
        })?;
    info!(user_id = %user.id, "User registered");

    // 4. Issue a bearer token
    let token = issue_token(&state, user.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

/// POST /api/auth/login - Login with an existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AuthResponse),
        (status = 400, description = "Missing email or password", body = ErrorBody),
        (status = 401, description = "Invalid credentials", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(req) = payload.map_err(|e| HttpError::bad_request(e.body_text()))?;
    let attempt = LoginAttempt::validate(&req.email, &req.password)?;

    // 1. Get credentials by email
    let creds = state
        .users
        .get_credentials_by_email(&attempt.email)
        .await
        .map_err(|e| match e {
            PortError::NotFound(_) => HttpError::unauthorized(INVALID_CREDENTIALS),
            other => {
                error!("Failed to get user: {:?}", other);
                HttpError::internal("Authentication error")
            }
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        HttpError::internal("Authentication error")
    })?;

    if Argon2::default()
        .verify_password(attempt.password.as_bytes(), &parsed_hash)
        .is_err()
    {
        warn!(user_id = %creds.user_id, "Failed login attempt");
        return Err(HttpError::unauthorized(INVALID_CREDENTIALS));
    }

    // 3. Issue a bearer token and load the profile
    let token = issue_token(&state, creds.user_id).await?;
    let user = load_user(&state, creds.user_id).await?;
    info!(user_id = %user.id, "User logged in");

    Ok((
        StatusCode::OK,
        Json(AuthResponse {
            success: true,
            token,
            user: user.into(),
        }),
    ))
}

/// GET /api/auth/me - Profile of the authenticated user
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn me_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MeResponse>, HttpError> {
    let user = load_user(&state, auth.user_id).await?;
    Ok(Json(MeResponse {
        success: true,
        user: UserResponse::from(user),
    }))
}

/// POST /api/auth/logout - Revoke the presented token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful", body = MessageResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody)
    ),
    security(("bearer_token" = []))
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, HttpError> {
    state
        .credentials
        .revoke_token(&auth.token)
        .await
        .map_err(|e| {
            error!("Failed to revoke token: {:?}", e);
            HttpError::internal("Failed to logout")
        })?;
    info!(user_id = %auth.user_id, "User logged out");

    Ok(Json(MessageResponse {
        success: true,
        message: "Logged out successfully".to_string(),
    }))
}

//=========================================================================================
// Helpers
//=========================================================================================

fn hash_password(password: &str) -> Result<String, HttpError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            HttpError::internal("Failed to hash password")
        })
}

async fn issue_token(state: &AppState, user_id: Uuid) -> Result<String, HttpError> {
    state
        .credentials
        .issue_token(user_id)
        .await
        .map(|session| session.token)
        .map_err(|e| {
            error!("Failed to issue token: {:?}", e);
            HttpError::internal("Failed to create session")
        })
}

async fn load_user(state: &AppState, user_id: Uuid) -> Result<User, HttpError> {
    state.users.get_user_by_id(user_id).await.map_err(|e| match e {
        PortError::NotFound(_) => HttpError::unauthorized("Not authorized, user not found"),
        other => {
            error!("Failed to load user: {:?}", other);
            HttpError::internal("Failed to load user")
        }
    })
}
