use crate::{
    domain::entities::search_request::{SearchRequest, SearchRequestData, SearchRequestError},
    helper::error_chain_fmt,
    ports::vector_index_port::VectorQueryError,
    use_cases::search_images::{SearchImages, SearchImagesError},
};
use actix_web::{http::StatusCode, web, HttpResponse, ResponseError};
use serde::Serialize;
use tokio::sync::{AcquireError, Semaphore};

/// Searches the images closest to a text query.
///
/// Waits for a free search slot first: results of concurrent searches should not interleave
/// on a single display.
#[tracing::instrument(name = "Search images handler", skip(search_images, search_slots, body))]
pub async fn search_images(
    search_images: web::Data<SearchImages>,
    search_slots: web::Data<Semaphore>,
    body: web::Json<SearchRequestData>,
) -> Result<HttpResponse, SearchImagesHandlerError> {
    // Validates before any call to the external services
    let request = SearchRequest::try_from(body.into_inner())?;

    let _slot = search_slots.acquire().await?;
    let results = search_images.execute(&request).await?;

    let response = SearchImagesResponse {
        results: results
            .iter()
            .map(|result| SearchImagesResult {
                key: result.key.clone(),
                image: result.to_data_url(),
                caption: result.caption.clone(),
            })
            .collect(),
    };

    Ok(HttpResponse::Ok().json(response))
}

#[derive(Debug, Serialize)]
pub struct SearchImagesResponse {
    pub results: Vec<SearchImagesResult>,
}

#[derive(Debug, Serialize)]
pub struct SearchImagesResult {
    pub key: String,
    /// `data:` URL of the image
    pub image: String,
    pub caption: String,
}

#[derive(thiserror::Error)]
pub enum SearchImagesHandlerError {
    #[error("Invalid search request: {0}")]
    ValidationError(#[from] SearchRequestError),
    #[error("Search slots are closed: {0}")]
    SearchSlotsError(#[from] AcquireError),
    #[error("Search failed: {0}")]
    SearchImagesError(#[from] SearchImagesError),
}

impl std::fmt::Debug for SearchImagesHandlerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl ResponseError for SearchImagesHandlerError {
    fn status_code(&self) -> StatusCode {
        match self {
            SearchImagesHandlerError::ValidationError(_) => StatusCode::BAD_REQUEST,
            SearchImagesHandlerError::SearchImagesError(SearchImagesError::VectorQueryError(
                VectorQueryError::DimensionMismatch { .. },
            ))
            | SearchImagesHandlerError::SearchSlotsError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SearchImagesHandlerError::SearchImagesError(_) => StatusCode::BAD_GATEWAY,
        }
    }
}
