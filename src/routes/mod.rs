pub mod health_check;
pub mod image_detail;
pub mod search_images;
