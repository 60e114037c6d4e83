//! Authentication error types

use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Username or password did not match the configured admin credentials
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// No session token on the request
    #[error("Authentication required")]
    MissingToken,

    /// Token was malformed or its signature did not verify
    #[error("Invalid session token")]
    InvalidToken,

    /// Token signature is valid but the session has expired
    #[error("Session expired")]
    TokenExpired,

    /// Server side auth configuration is unusable
    #[error("Authentication is misconfigured: {0}")]
    Misconfigured(String),
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Misconfigured(_) => "AUTH_MISCONFIGURED",
            _ => "UNAUTHORIZED",
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Misconfigured(_) => 500,
            _ => 401,
        }
    }
}

#[cfg(feature = "server")]
impl axum::response::IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = StatusCode::from_u16(self.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::json!({
            "error": self.error_code(),
            "message": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}
