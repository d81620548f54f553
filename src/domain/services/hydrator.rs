use crate::{
    domain::entities::{
        hydrated_result::{HydratedResult, ResourcePath},
        vector_record::VectorRecord,
    },
    helper::error_chain_fmt,
    ports::image_source_port::{ImageSourceError, ImageSourcePort},
};
use futures::future::try_join_all;
use std::path::PathBuf;

/// Resolves a vector key to the location of its image.
///
/// Any `Fn(&str) -> ResourcePath` is a locator.
pub trait ImageLocator: Send + Sync {
    fn locate(&self, key: &str) -> ResourcePath;
}

impl<F> ImageLocator for F
where
    F: Fn(&str) -> ResourcePath + Send + Sync,
{
    fn locate(&self, key: &str) -> ResourcePath {
        self(key)
    }
}

/// Images stored as `<directory>/<key>` on the local filesystem
#[derive(Debug, Clone)]
pub struct LocalDirectoryLocator {
    directory: PathBuf,
}

impl LocalDirectoryLocator {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl ImageLocator for LocalDirectoryLocator {
    fn locate(&self, key: &str) -> ResourcePath {
        ResourcePath::File(self.directory.join(key))
    }
}

/// Images served over HTTP(S) as `<url_prefix>/<key>`, ex: from a CDN or a public bucket
#[derive(Debug, Clone)]
pub struct UrlPrefixLocator {
    url_prefix: String,
}

impl UrlPrefixLocator {
    pub fn new(url_prefix: &str) -> Self {
        Self {
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        }
    }
}

impl ImageLocator for UrlPrefixLocator {
    fn locate(&self, key: &str) -> ResourcePath {
        ResourcePath::Url(format!("{}/{}", self.url_prefix, key))
    }
}

/// Images stored as `<folder>/<key>` objects in the configured bucket
#[derive(Debug, Clone)]
pub struct ObjectStorageLocator {
    folder: String,
}

impl ObjectStorageLocator {
    pub fn new(folder: &str) -> Self {
        Self {
            folder: folder.trim_matches('/').to_string(),
        }
    }
}

impl ImageLocator for ObjectStorageLocator {
    fn locate(&self, key: &str) -> ResourcePath {
        if self.folder.is_empty() {
            return ResourcePath::Object(key.to_string());
        }
        ResourcePath::Object(format!("{}/{}", self.folder, key))
    }
}

/// Loads the image of every record and pairs it with the record caption.
///
/// Images are loaded concurrently, results keep the order of `records`.
/// The first image that cannot be loaded or decoded fails the whole hydration.
#[tracing::instrument(
    name = "Hydrating vector records",
    skip(records, locator, image_source),
    fields(nb_records = records.len())
)]
pub async fn hydrate(
    records: &[VectorRecord],
    locator: &dyn ImageLocator,
    image_source: &dyn ImageSourcePort,
) -> Result<Vec<HydratedResult>, HydrationError> {
    try_join_all(
        records
            .iter()
            .map(|record| hydrate_record(record, locator, image_source)),
    )
    .await
}

async fn hydrate_record(
    record: &VectorRecord,
    locator: &dyn ImageLocator,
    image_source: &dyn ImageSourcePort,
) -> Result<HydratedResult, HydrationError> {
    let path = locator.locate(&record.key);
    let unavailable = |source: ResourceError| HydrationError::ResourceUnavailable {
        key: record.key.clone(),
        path: path.to_string(),
        source,
    };

    let bytes = image_source
        .fetch(&path)
        .await
        .map_err(|e| unavailable(e.into()))?;
    let format = image::guess_format(&bytes).map_err(|e| unavailable(e.into()))?;
    let image = image::load_from_memory_with_format(&bytes, format)
        .map_err(|e| unavailable(e.into()))?;

    let caption = record
        .to_caption()
        .map_err(|e| HydrationError::CaptionError(record.key.clone(), e))?;

    Ok(HydratedResult {
        key: record.key.clone(),
        image,
        bytes,
        format,
        caption,
    })
}

#[derive(thiserror::Error)]
pub enum HydrationError {
    #[error("Image of key {key} is unavailable at {path}")]
    ResourceUnavailable {
        key: String,
        path: String,
        #[source]
        source: ResourceError,
    },
    #[error("Caption of key {0} could not be serialized")]
    CaptionError(String, #[source] serde_json::Error),
}

impl std::fmt::Debug for HydrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(thiserror::Error)]
pub enum ResourceError {
    #[error("Image could not be read: {0}")]
    FetchError(#[from] ImageSourceError),
    #[error("Image could not be decoded: {0}")]
    DecodeError(#[from] image::ImageError),
}

impl std::fmt::Debug for ResourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
