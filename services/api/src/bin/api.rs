//! services/api/src/bin/api.rs

use api_lib::{
    adapters::{db::DbAdapter, memory::InMemoryStore},
    config::Config,
    error::ApiError,
    web::{self, rest::ApiDoc, state::AppState},
};
use axum::Router;
use chrono::Duration;
use globe_explorer_core::ports::{CredentialService, UserStore};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to the Store & Run Migrations ---
    let token_ttl = Duration::days(config.token_ttl_days);
    let (users, credentials): (Arc<dyn UserStore>, Arc<dyn CredentialService>) =
        match &config.database_url {
            Some(database_url) => {
                info!("Connecting to database...");
                let db_pool = PgPoolOptions::new()
                    .max_connections(config.db_max_connections)
                    .connect(database_url)
                    .await?;
                let db_adapter = Arc::new(DbAdapter::new(db_pool, token_ttl));
                info!("Running database migrations...");
                db_adapter.run_migrations().await?;
                info!("Database migrations complete.");
                let users: Arc<dyn UserStore> = db_adapter.clone();
                let credentials: Arc<dyn CredentialService> = db_adapter;
                (users, credentials)
            }
            None => {
                warn!("DATABASE_URL is not set; users and favorites are kept in memory only");
                let store = Arc::new(InMemoryStore::new(token_ttl));
                let users: Arc<dyn UserStore> = store.clone();
                let credentials: Arc<dyn CredentialService> = store;
                (users, credentials)
            }
        };

    // --- 3. Build the Shared AppState ---
    let app_state = Arc::new(AppState::new(users, credentials, config.clone()));

    // --- 4. Create the Web Router ---
    // Merge the API router with the Swagger UI router for a complete application.
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(web::router(app_state));

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
