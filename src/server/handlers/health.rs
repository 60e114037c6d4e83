use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{json, Value};
use tracing::warn;

use crate::server::app::AppState;

/// Reports 503 when the database does not answer a ping.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (status, database) = match state.db.ping().await {
        Ok(()) => (StatusCode::OK, "connected"),
        Err(e) => {
            warn!("Health check database ping failed: {}", e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };

    (
        status,
        Json(json!({
            "status": if status.is_success() { "healthy" } else { "degraded" },
            "service": "airfare-server",
            "database": database,
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
