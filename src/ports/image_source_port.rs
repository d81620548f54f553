use crate::{domain::entities::hydrated_result::ResourcePath, helper::error_chain_fmt};
use async_trait::async_trait;

/// Reads the encoded bytes of an image, wherever it is stored
#[async_trait]
pub trait ImageSourcePort: Send + Sync {
    async fn fetch(&self, path: &ResourcePath) -> Result<Vec<u8>, ImageSourceError>;
}

#[derive(thiserror::Error)]
pub enum ImageSourceError {
    #[error("No image found at {0}")]
    NotFound(String),
    #[error("Image request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
    #[error("No object storage is configured to read {0}")]
    NoObjectStorage(String),
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error(transparent)]
    TransportError(#[from] reqwest::Error),
    #[error(transparent)]
    ObjectStorageError(#[from] s3::error::S3Error),
}

impl std::fmt::Debug for ImageSourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
