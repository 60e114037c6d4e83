//! Object storage for city images.
//!
//! The registries only see the [`ObjectStore`] trait. `LocalObjectStore`
//! backs a real deployment with a directory served under `/uploads`,
//! `InMemoryObjectStore` backs tests and throwaway runs.

use async_trait::async_trait;
use thiserror::Error;

pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;

/// Prefix shared by every stored city image.
pub const CITY_IMAGE_PREFIX: &str = "city-images";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under `key` and return the public URL of the object.
    async fn upload(&self, bytes: Vec<u8>, key: &str, content_type: &str)
        -> Result<String, StorageError>;

    /// Remove the object stored under `key`. Removing a missing object is not
    /// an error.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Key for an uploaded city image: `city-images/<id>-<millis>-<file_name>`
/// with whitespace and path separators in the file name replaced by `_`.
pub fn city_image_key(city_id: i32, file_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let file_name: String = file_name
        .chars()
        .map(|c| if c.is_whitespace() || c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{CITY_IMAGE_PREFIX}/{city_id}-{millis}-{file_name}")
}

/// Recover the object key from a URL returned by [`ObjectStore::upload`].
pub fn key_from_url(url: &str) -> Option<String> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(|segment| format!("{CITY_IMAGE_PREFIX}/{segment}"))
}

pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|part| part.is_empty() || part == "." || part == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
