use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::repositories::image::{ImageRepository, ImageRepositoryError};

#[derive(Clone)]
pub struct ImageRepositoryImpl {
    client: reqwest::Client,
}

impl ImageRepositoryImpl {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageRepository for ImageRepositoryImpl {
    async fn fetch_image_from_url(&self, url: &str) -> Result<Bytes, ImageRepositoryError> {
        if url.is_empty() {
            return Err(ImageRepositoryError::Other(
                "url cannot be empty".to_string(),
            ));
        }

        let res = self.client.get(url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(ImageRepositoryError::StatusError(status));
        }

        let bytes = res.bytes().await?;
        debug!("fetched image from url={url}, size={} bytes", bytes.len());

        Ok(bytes)
    }
}
