use async_trait::async_trait;
use bytes::Bytes;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ImageRepositoryError {
    #[error("error request image: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("image responded with status {0}")]
    StatusError(reqwest::StatusCode),
    #[error("other error: {0}")]
    Other(String),
}

#[async_trait]
pub trait ImageRepository: Send + Sync {
    async fn fetch_image_from_url(&self, url: &str) -> Result<Bytes, ImageRepositoryError>;
}
