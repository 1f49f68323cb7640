pub mod image_loader;

pub use image_loader::{is_supported_image, load_all_images, load_image};
