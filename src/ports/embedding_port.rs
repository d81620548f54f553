use crate::{
    domain::entities::embedding::{Embedding, EmbeddingInput},
    helper::error_chain_fmt,
};
use async_trait::async_trait;

/// Turns a text or an image into a vector, through an external embedding provider.
///
/// One call per input, no caching and no retry.
#[async_trait]
pub trait EmbeddingPort: Send + Sync {
    async fn embed(&self, input: &EmbeddingInput) -> Result<Embedding, EmbeddingError>;

    async fn embed_text(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed(&EmbeddingInput::Text(text.to_string())).await
    }

    async fn embed_image(&self, image_url: &str) -> Result<Embedding, EmbeddingError> {
        self.embed(&EmbeddingInput::Image(image_url.to_string()))
            .await
    }
}

#[derive(thiserror::Error)]
pub enum EmbeddingError {
    #[error("The input to embed should not be empty")]
    EmptyInput,
    #[error("Embedding provider responded with status {status}: {message}")]
    ProviderError { status: u16, message: String },
    #[error("Embedding provider responded without any embedding")]
    EmptyResponse,
    #[error("Error while calling the embedding provider: {0}")]
    TransportError(#[from] reqwest::Error),
}

impl std::fmt::Debug for EmbeddingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
