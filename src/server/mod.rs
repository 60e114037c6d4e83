pub mod app;
pub mod auth;
pub mod extract;
pub mod handlers;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::signal;
use tracing::{error, info};

use crate::config::AppConfig;
use crate::database::{establish_connection, get_database_url, setup_database};
use crate::imagegen::{DisabledImageGenerator, HttpImageGenerator, ImageGenerator};
use crate::services::AuthService;
use crate::storage::{LocalObjectStore, ObjectStore};

pub use app::{create_app, AppState};

pub async fn start_server(config: AppConfig) -> Result<()> {
    let auth = AuthService::new(&config.auth).map_err(|e| anyhow!("Auth setup failed: {e}"))?;

    let database_url = get_database_url(Some(&config.database.path));
    let db = establish_connection(&database_url).await?;
    setup_database(&db).await?;
    info!("Database migrations completed");

    let local_store = LocalObjectStore::new(&config.storage.root, &config.storage.public_base_url);
    let uploads_dir = local_store.root().to_path_buf();
    let store: Arc<dyn ObjectStore> = Arc::new(local_store);
    let generator: Arc<dyn ImageGenerator> = match &config.image_generator.endpoint {
        Some(endpoint) => {
            info!("City images generated via {}", endpoint);
            Arc::new(HttpImageGenerator::new(
                endpoint.clone(),
                config.image_generator.api_key.clone(),
                store.clone(),
            ))
        }
        None => {
            info!("No image generator configured; implicit cities get no image");
            Arc::new(DisabledImageGenerator)
        }
    };

    let state = AppState::new(db, store, generator, auth);
    let app = create_app(state, &config.server.cors_origins, Some(uploads_dir.as_path()))?;

    log_routes();

    let port = config.server.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    info!("Server running on http://0.0.0.0:{}", port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn log_routes() {
    info!("API Endpoints:");
    info!("  /health                     - Health check");
    info!("  /cities[/:id]               - City registry (writes require admin)");
    info!("  /connections[/:id]          - Connection registry (writes require admin)");
    info!("  /user-search/search         - Route search");
    info!("  /auth/login, /auth/profile  - Admin session");
    info!("  /uploads/*                  - Stored city images");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
