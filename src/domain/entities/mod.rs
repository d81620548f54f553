pub mod embedding;
pub mod hydrated_result;
pub mod predicate;
pub mod search_request;
pub mod vector_record;
