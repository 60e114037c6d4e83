use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{city_prompt, ImageGenError, ImageGenerator};
use crate::storage::{ObjectStore, CITY_IMAGE_PREFIX};

#[derive(Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    /// Base64 encoded PNG
    image: Option<String>,
    text: Option<String>,
}

/// Calls an HTTP image generation endpoint and stores the result.
///
/// The endpoint receives `{"prompt": "..."}` and answers with
/// `{"image": "<base64 png>", "text": "..."}`, either field optional.
#[derive(Clone)]
pub struct HttpImageGenerator {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    store: Arc<dyn ObjectStore>,
}

impl HttpImageGenerator {
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key,
            store,
        }
    }
}

#[async_trait]
impl ImageGenerator for HttpImageGenerator {
    async fn generate(
        &self,
        city_name: &str,
        city_id: i32,
    ) -> Result<Option<String>, ImageGenError> {
        let prompt = city_prompt(city_name);
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&GenerateRequest { prompt: &prompt });
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageGenError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: GenerateResponse = response.json().await?;
        if let Some(text) = &payload.text {
            debug!("Image generator text for {}: {}", city_name, text);
        }

        let Some(encoded) = payload.image else {
            info!("Image generator returned no image for {}", city_name);
            return Ok(None);
        };

        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded.as_bytes())?;
        let key = format!(
            "{}/{}-{}-{}.png",
            CITY_IMAGE_PREFIX,
            city_id,
            chrono::Utc::now().timestamp_millis(),
            city_name.replace(char::is_whitespace, "_")
        );
        let url = self.store.upload(bytes, &key, "image/png").await?;
        info!("Generated image for {} stored at {}", city_name, url);

        Ok(Some(url))
    }
}
