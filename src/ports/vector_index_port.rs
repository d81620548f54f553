use crate::{
    domain::entities::{
        embedding::Embedding, predicate::Predicate, search_request::TopK,
        vector_record::VectorRecord,
    },
    helper::error_chain_fmt,
};
use async_trait::async_trait;
use typed_builder::TypedBuilder;

/// A "query nearest vectors" request
#[derive(Debug, Clone, TypedBuilder)]
pub struct VectorQuery {
    pub vector: Embedding,
    #[builder(default)]
    pub filter: Option<Predicate>,
    pub top_k: TopK,
    #[builder(default = true)]
    pub return_distance: bool,
    #[builder(default = true)]
    pub return_metadata: bool,
}

#[derive(Debug, Clone)]
pub struct VectorQueryResponse {
    pub request_id: Option<String>,
    /// Ordered by the index: closest first
    pub vectors: Vec<VectorRecord>,
}

#[async_trait]
pub trait VectorIndexPort: Send + Sync {
    /// Dimension the index was created with
    fn dimension(&self) -> usize;

    async fn query(&self, query: &VectorQuery) -> Result<VectorQueryResponse, VectorQueryError>;
}

#[derive(thiserror::Error)]
pub enum VectorQueryError {
    #[error("Query vector has {actual} dimensions, the index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("Vector index responded with status {status} (request id: {request_id:?}): {message}")]
    QueryError {
        status: u16,
        message: String,
        request_id: Option<String>,
    },
    #[error("Error while calling the vector index: {0}")]
    TransportError(#[from] reqwest::Error),
}

impl std::fmt::Debug for VectorQueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
