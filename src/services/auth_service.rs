use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::errors::{AuthError, AuthResult};

type HmacSha256 = Hmac<Sha256>;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "jwt";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Admin credential check and signed session tokens.
///
/// Tokens are `base64url(claims json) "." base64url(hmac-sha256)`.
#[derive(Clone)]
pub struct AuthService {
    admin_username: String,
    admin_password: String,
    secret: Vec<u8>,
    session_ttl_secs: i64,
}

impl AuthService {
    pub fn new(config: &AuthConfig) -> AuthResult<Self> {
        if config.admin_username.is_empty() || config.admin_password.is_empty() {
            return Err(AuthError::Misconfigured(
                "admin username and password must be set".to_string(),
            ));
        }
        if config.token_secret.len() < 16 {
            return Err(AuthError::Misconfigured(
                "token secret must be at least 16 bytes".to_string(),
            ));
        }
        if config.session_ttl_secs <= 0 {
            return Err(AuthError::Misconfigured(
                "session ttl must be positive".to_string(),
            ));
        }

        Ok(Self {
            admin_username: config.admin_username.clone(),
            admin_password: config.admin_password.clone(),
            secret: config.token_secret.as_bytes().to_vec(),
            session_ttl_secs: config.session_ttl_secs,
        })
    }

    pub fn session_ttl_secs(&self) -> i64 {
        self.session_ttl_secs
    }

    /// Check the admin credentials and issue a session token.
    pub fn login(&self, username: &str, password: &str) -> AuthResult<String> {
        let username_ok = digest_eq(username, &self.admin_username);
        let password_ok = digest_eq(password, &self.admin_password);
        if !(username_ok && password_ok) {
            warn!("Rejected admin login for {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        info!("Admin {} logged in", username);
        self.issue_token(username)
    }

    pub fn issue_token(&self, subject: &str) -> AuthResult<String> {
        self.issue_token_at(subject, Utc::now().timestamp())
    }

    pub fn issue_token_at(&self, subject: &str, now: i64) -> AuthResult<String> {
        let claims = SessionClaims {
            sub: subject.to_string(),
            iat: now,
            exp: now + self.session_ttl_secs,
        };
        let json = serde_json::to_vec(&claims)
            .map_err(|e| AuthError::Misconfigured(format!("unserializable claims: {e}")))?;
        let payload = URL_SAFE_NO_PAD.encode(json);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload)?.finalize().into_bytes());

        Ok(format!("{payload}.{signature}"))
    }

    pub fn verify_token(&self, token: &str) -> AuthResult<SessionClaims> {
        self.verify_token_at(token, Utc::now().timestamp())
    }

    pub fn verify_token_at(&self, token: &str, now: i64) -> AuthResult<SessionClaims> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::InvalidToken)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::InvalidToken)?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| AuthError::InvalidToken)?;

        let json = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::InvalidToken)?;
        let claims: SessionClaims =
            serde_json::from_slice(&json).map_err(|_| AuthError::InvalidToken)?;

        if now >= claims.exp {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn mac(&self, payload: &str) -> AuthResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AuthError::Misconfigured(e.to_string()))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}

// Compare fixed-size digests so the comparison time does not depend on where
// the inputs first differ.
fn digest_eq(given: &str, expected: &str) -> bool {
    let given = Sha256::digest(given.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    given
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
