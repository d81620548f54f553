use crate::{
    domain::entities::hydrated_result::ResourcePath,
    ports::image_source_port::{ImageSourceError, ImageSourcePort},
};
use async_trait::async_trait;
use reqwest::StatusCode;
use s3::{error::S3Error, Bucket};
use std::time::Duration;

/// Reads images from the local filesystem, over HTTP(S), or from an S3-compatible bucket
pub struct ImageRepository {
    http_client: reqwest::Client,
    // Only set when images live in an object storage
    bucket: Option<Bucket>,
}

impl ImageRepository {
    pub fn try_new(timeout: Duration, bucket: Option<Bucket>) -> Result<Self, reqwest::Error> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            bucket,
        })
    }

    async fn fetch_url(&self, url: &str) -> Result<Vec<u8>, ImageSourceError> {
        let response = self.http_client.get(url).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(ImageSourceError::NotFound(url.to_string())),
            status if !status.is_success() => Err(ImageSourceError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }),
            _ => Ok(response.bytes().await?.to_vec()),
        }
    }

    async fn fetch_object(&self, object_path: &str) -> Result<Vec<u8>, ImageSourceError> {
        let bucket = self
            .bucket
            .as_ref()
            .ok_or_else(|| ImageSourceError::NoObjectStorage(object_path.to_string()))?;

        let response = bucket
            .get_object(object_path)
            .await
            .map_err(|error| match error {
                S3Error::Http(404, _) => ImageSourceError::NotFound(object_path.to_string()),
                _ => ImageSourceError::ObjectStorageError(error),
            })?;

        if response.status_code() == 404 {
            return Err(ImageSourceError::NotFound(object_path.to_string()));
        }

        Ok(response.bytes().to_vec())
    }
}

#[async_trait]
impl ImageSourcePort for ImageRepository {
    #[tracing::instrument(name = "Fetching image", skip(self))]
    async fn fetch(&self, path: &ResourcePath) -> Result<Vec<u8>, ImageSourceError> {
        match path {
            ResourcePath::File(file_path) => {
                tokio::fs::read(file_path)
                    .await
                    .map_err(|error| match error.kind() {
                        std::io::ErrorKind::NotFound => ImageSourceError::NotFound(path.to_string()),
                        _ => ImageSourceError::IOError(error),
                    })
            }
            ResourcePath::Url(url) => self.fetch_url(url).await,
            ResourcePath::Object(object_path) => self.fetch_object(object_path).await,
        }
    }
}
