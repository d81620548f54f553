/// Dense vector produced by the embedding provider
pub type Embedding = Vec<f32>;

/// A single item sent to the multimodal embedding provider
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddingInput {
    Text(String),
    /// Publicly reachable URL of an image
    Image(String),
}
