pub mod embedding_port;
pub mod image_source_port;
pub mod vector_index_port;
