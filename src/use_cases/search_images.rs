use crate::{
    domain::{
        entities::{hydrated_result::HydratedResult, search_request::SearchRequest},
        services::{
            filter_builder::build_filter,
            hydrator::{hydrate, HydrationError, ImageLocator},
        },
    },
    helper::error_chain_fmt,
    ports::{
        embedding_port::{EmbeddingError, EmbeddingPort},
        image_source_port::ImageSourcePort,
        vector_index_port::{VectorIndexPort, VectorQuery, VectorQueryError},
    },
};
use std::sync::Arc;
use tracing::info;

/// The query pipeline: embeds the query text, searches the nearest vectors, and loads their images.
///
/// Each stage needs the output of the previous one, so they run one after the other.
/// Any error stops the pipeline: no partial results are returned.
#[derive(Clone)]
pub struct SearchImages {
    embedding: Arc<dyn EmbeddingPort>,
    vector_index: Arc<dyn VectorIndexPort>,
    image_locator: Arc<dyn ImageLocator>,
    image_source: Arc<dyn ImageSourcePort>,
}

impl SearchImages {
    pub fn new(
        embedding: Arc<dyn EmbeddingPort>,
        vector_index: Arc<dyn VectorIndexPort>,
        image_locator: Arc<dyn ImageLocator>,
        image_source: Arc<dyn ImageSourcePort>,
    ) -> Self {
        Self {
            embedding,
            vector_index,
            image_locator,
            image_source,
        }
    }

    #[tracing::instrument(
        name = "Searching images",
        skip(self, request),
        fields(text = %request.text, top_k = request.top_k.get())
    )]
    pub async fn execute(
        &self,
        request: &SearchRequest,
    ) -> Result<Vec<HydratedResult>, SearchImagesError> {
        info!(facets = ?request.facets, "Searching images");

        let filter = build_filter(&request.facets);
        let vector = self.embedding.embed_text(request.text.as_ref()).await?;

        let query = VectorQuery::builder()
            .vector(vector)
            .filter(filter)
            .top_k(request.top_k)
            .return_distance(request.return_distance)
            .return_metadata(request.return_metadata)
            .build();
        let response = self.vector_index.query(&query).await?;

        let results = hydrate(
            &response.vectors,
            self.image_locator.as_ref(),
            self.image_source.as_ref(),
        )
        .await?;

        info!(
            request_id = ?response.request_id,
            nb_results = results.len(),
            "Found images"
        );
        Ok(results)
    }
}

#[derive(thiserror::Error)]
pub enum SearchImagesError {
    #[error(transparent)]
    EmbeddingError(#[from] EmbeddingError),
    #[error(transparent)]
    VectorQueryError(#[from] VectorQueryError),
    #[error(transparent)]
    HydrationError(#[from] HydrationError),
}

impl std::fmt::Debug for SearchImagesError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
