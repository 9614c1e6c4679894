//! Siren API Server
//!
//! Main entry point for the ambulance bill workflow service.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use siren_api::{create_router, AppState};
use siren_core::storage::{StorageConfig, StorageProvider, StorageService};
use siren_db::connect;
use siren_shared::{AppConfig, JwtConfig, JwtService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siren=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load()?;

    // Connect to database
    let db = connect(&config.database.url, config.database.max_connections).await?;
    info!("Connected to database");

    // Create JWT service
    let jwt_service = JwtService::new(JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expiry_secs: config.jwt.access_token_expiry_secs,
    });

    // Create storage service
    let provider = match config.storage.backend.as_str() {
        "s3" => StorageProvider::s3(
            &config.storage.endpoint,
            &config.storage.bucket,
            &config.storage.access_key_id,
            &config.storage.secret_access_key,
            &config.storage.region,
        ),
        _ => StorageProvider::local_fs(PathBuf::from(&config.storage.root)),
    };
    let mut storage_config = StorageConfig::new(provider);
    storage_config.max_file_size = config.storage.max_file_size;
    let storage = StorageService::from_config(storage_config)
        .map_err(|e| anyhow::anyhow!("storage init failed: {e}"))?;
    info!(provider = storage.provider_name(), "Storage configured");

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(jwt_service),
        storage: Arc::new(storage),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
