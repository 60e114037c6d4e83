use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use super::auth::require_admin;
use super::handlers::{auth, cities, connections, health, search};
use crate::imagegen::ImageGenerator;
use crate::services::{AuthService, CityService, ConnectionService, SearchService};
use crate::storage::ObjectStore;

const MAX_IMAGE_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub cities: CityService,
    pub connections: ConnectionService,
    pub search: SearchService,
    pub auth: Arc<AuthService>,
}

impl AppState {
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        generator: Arc<dyn ImageGenerator>,
        auth: AuthService,
    ) -> Self {
        let cities = CityService::new(db.clone(), store, generator);
        let connections = ConnectionService::new(db.clone(), cities.clone());
        let search = SearchService::new(db.clone());

        Self {
            db,
            cities,
            connections,
            search,
            auth: Arc::new(auth),
        }
    }
}

/// Build the router. `uploads_dir`, when given, is served under `/uploads`.
pub fn create_app(
    state: AppState,
    cors_origins: &[String],
    uploads_dir: Option<&Path>,
) -> Result<Router> {
    let cors = if cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<axum::http::HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin {origin}"))
            })
            .collect::<Result<Vec<_>>>()?;
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .merge(public_routes())
        .merge(admin_routes(state.clone()))
        .layer(DefaultBodyLimit::max(MAX_IMAGE_UPLOAD_BYTES));

    if let Some(dir) = uploads_dir {
        app = app.nest_service("/uploads", ServeDir::new(dir));
    }

    let app = app
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/cities", get(cities::list_cities))
        .route("/cities/:id", get(cities::get_city))
        .route("/connections", get(connections::list_connections))
        .route("/user-search/search", get(search::search_routes))
        .route("/auth/login", post(auth::login))
}

fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/cities", post(cities::create_city))
        .route(
            "/cities/:id",
            axum::routing::patch(cities::update_city).delete(cities::delete_city),
        )
        .route("/connections", post(connections::create_connection))
        .route(
            "/connections/:id",
            axum::routing::patch(connections::update_connection)
                .delete(connections::delete_connection),
        )
        .route("/auth/profile", get(auth::profile))
        .route_layer(middleware::from_fn_with_state(state, require_admin))
}
