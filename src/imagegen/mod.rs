//! Image generation for cities created implicitly by a connection write.

use async_trait::async_trait;
use thiserror::Error;

use crate::storage::StorageError;

pub mod http;

pub use http::HttpImageGenerator;

#[derive(Error, Debug)]
pub enum ImageGenError {
    #[error("Image generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Image generation returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generated image was not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),

    #[error("Failed to store generated image: {0}")]
    Storage(#[from] StorageError),
}

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Produce and store an image of `city_name`, returning its URL.
    ///
    /// `Ok(None)` means the provider answered without any image data.
    async fn generate(&self, city_name: &str, city_id: i32)
        -> Result<Option<String>, ImageGenError>;
}

/// Used when no generator endpoint is configured. Cities created from a
/// connection write are stored without an image.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledImageGenerator;

#[async_trait]
impl ImageGenerator for DisabledImageGenerator {
    async fn generate(
        &self,
        city_name: &str,
        city_id: i32,
    ) -> Result<Option<String>, ImageGenError> {
        tracing::debug!(
            "Image generation disabled, skipping {} (city {})",
            city_name,
            city_id
        );
        Ok(None)
    }
}

pub(crate) fn city_prompt(city_name: &str) -> String {
    format!(
        "Generate a high-quality, realistic image that visually represents the city of {city_name}. \
         Create a detailed cityscape showing iconic landmarks, architecture, and atmosphere typical of {city_name}."
    )
}
