pub mod search_images;
