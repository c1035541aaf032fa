pub mod feed;
pub mod image;
pub mod sync_state;
