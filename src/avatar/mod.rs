// src/avatar/mod.rs
pub mod resolver;
pub mod source;

pub use resolver::{to_data_uri, AvatarResolver};
pub use source::{ImageError, ImageSource, TemplateImageSource};
