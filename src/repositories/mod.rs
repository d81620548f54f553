pub mod embedding_dashscope_repository;
pub mod image_repository;
pub mod vector_index_oss_repository;
