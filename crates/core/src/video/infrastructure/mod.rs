pub mod image_source;
pub mod synthetic_source;
