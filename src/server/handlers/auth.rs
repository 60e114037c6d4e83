use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use serde_json::json;

use crate::errors::AuthResult;
use crate::server::app::AppState;
use crate::server::auth::session_cookie;
use crate::server::extract::ApiJson;
use crate::services::SessionClaims;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let token = state.auth.login(&payload.username, &payload.password)?;
    let cookie = session_cookie(&token, state.auth.session_ttl_secs());

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "access_token": token })),
    ))
}

pub async fn profile(Extension(claims): Extension<SessionClaims>) -> Json<SessionClaims> {
    Json(claims)
}
