use base64::{engine::general_purpose::STANDARD, Engine};
use image::{DynamicImage, ImageFormat};
use std::path::PathBuf;

/// Location of the image associated with a vector key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourcePath {
    /// A file on the local filesystem
    File(PathBuf),
    /// An HTTP(S) URL
    Url(String),
    /// An object path in the configured S3-compatible bucket
    Object(String),
}

impl std::fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourcePath::File(path) => write!(f, "file://{}", path.display()),
            ResourcePath::Url(url) => write!(f, "{}", url),
            ResourcePath::Object(path) => write!(f, "s3://{}", path),
        }
    }
}

/// A vector record turned into something displayable: its decoded image and its caption
#[derive(Debug, Clone)]
pub struct HydratedResult {
    pub key: String,
    pub image: DynamicImage,
    /// Encoded image, as loaded from the resource
    pub bytes: Vec<u8>,
    pub format: ImageFormat,
    /// JSON serialization of the whole vector record
    pub caption: String,
}

impl HydratedResult {
    /// Encoded image as a `data:` URL, directly usable by a browser
    pub fn to_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            mime_type(self.format),
            STANDARD.encode(&self.bytes)
        )
    }
}

fn mime_type(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Png => "image/png",
        ImageFormat::Jpeg => "image/jpeg",
        ImageFormat::Gif => "image/gif",
        ImageFormat::WebP => "image/webp",
        ImageFormat::Bmp => "image/bmp",
        _ => "application/octet-stream",
    }
}
