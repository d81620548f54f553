use crate::{
    domain::services::detail_formatter::{format_detail, DetailFormatError},
    helper::error_chain_fmt,
};
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use serde::{Deserialize, Serialize};

/// Formats the caption of a selected result into displayable details
#[tracing::instrument(name = "Image detail handler", skip(body))]
pub async fn image_detail(body: web::Json<BodyData>) -> Result<HttpResponse, ImageDetailError> {
    let detail = format_detail(&body.caption)?;

    Ok(HttpResponse::Ok().json(ImageDetailResponse { detail }))
}

#[derive(Debug, Deserialize)]
pub struct BodyData {
    caption: String,
}

#[derive(Debug, Serialize)]
pub struct ImageDetailResponse {
    pub detail: String,
}

#[derive(thiserror::Error)]
pub enum ImageDetailError {
    #[error("Invalid caption: {0}")]
    DetailFormatError(#[from] DetailFormatError),
}

impl std::fmt::Debug for ImageDetailError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for ImageDetailError {
    fn status_code(&self) -> StatusCode {
        match self {
            ImageDetailError::DetailFormatError(_) => StatusCode::BAD_REQUEST,
        }
    }
}
