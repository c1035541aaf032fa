pub mod chapter;
pub mod document;
