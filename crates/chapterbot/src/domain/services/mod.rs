pub mod chapter;
pub mod document;
pub mod image;
