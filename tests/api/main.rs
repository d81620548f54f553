mod image_detail;
mod search_images;
mod startup;
