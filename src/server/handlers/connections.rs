use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};

use crate::database::entities::connections;
use crate::errors::AirfareResult;
use crate::server::app::AppState;
use crate::server::extract::{ApiJson, ApiPath};
use crate::services::{CreateConnection, UpdateConnection};

pub async fn list_connections(
    State(state): State<AppState>,
) -> AirfareResult<Json<Vec<connections::Model>>> {
    Ok(Json(state.connections.list_connections().await?))
}

pub async fn create_connection(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateConnection>,
) -> AirfareResult<(StatusCode, Json<connections::Model>)> {
    let connection = state.connections.create_connection(payload).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

pub async fn update_connection(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
    ApiJson(payload): ApiJson<UpdateConnection>,
) -> AirfareResult<Json<connections::Model>> {
    Ok(Json(state.connections.update_connection(id, payload).await?))
}

/// Returns the deleted row.
pub async fn delete_connection(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i32>,
) -> AirfareResult<Json<connections::Model>> {
    Ok(Json(state.connections.delete_connection(id).await?))
}
