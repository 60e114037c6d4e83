use std::{env, fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub image_generator: ImageGeneratorConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_origins: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "airfare.db".to_string(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub admin_username: String,
    pub admin_password: String,
    pub token_secret: String,
    pub session_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_username: String::new(),
            admin_password: String::new(),
            token_secret: String::new(),
            session_ttl_secs: 60 * 60 * 24,
        }
    }
}

// Keeps the password and secret out of debug logs.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"<redacted>")
            .field("token_secret", &"<redacted>")
            .field("session_ttl_secs", &self.session_ttl_secs)
            .finish()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory that stored objects are written under
    pub root: String,
    /// URL prefix returned for stored objects
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: "uploads".to_string(),
            public_base_url: "http://localhost:5000/uploads".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageGeneratorConfig {
    /// Generation endpoint. Unset disables image generation.
    pub endpoint: Option<String>,
    pub api_key: Option<String>,
}

impl AppConfig {
    /// Load from an optional TOML file, then apply environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                info!("No config file given, using defaults");
                Self::default()
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env(&mut self) {
        if let Some(value) = var("ADMIN_USERNAME") {
            self.auth.admin_username = value;
        }
        if let Some(value) = var("ADMIN_PASSWORD") {
            self.auth.admin_password = value;
        }
        if let Some(value) = var("AUTH_TOKEN_SECRET") {
            self.auth.token_secret = value;
        }
        if let Some(value) = var("IMAGE_GENERATOR_API_KEY") {
            self.image_generator.api_key = Some(value);
        }
        if let Some(value) = var("PORT") {
            match value.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!("Invalid PORT value {value}: {e}"),
            }
        }
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}
