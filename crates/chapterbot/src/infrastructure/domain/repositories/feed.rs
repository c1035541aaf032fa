use async_trait::async_trait;

use crate::domain::{
    entities::chapter::Feed,
    repositories::feed::{FeedRepository, FeedRepositoryError},
};

#[derive(Clone)]
pub struct FeedRepositoryImpl {
    client: reqwest::Client,
    url: String,
}

impl FeedRepositoryImpl {
    pub fn new(client: reqwest::Client, url: String) -> Self {
        Self { client, url }
    }
}

pub fn parse_feed(body: &[u8]) -> Result<Feed, serde_json::Error> {
    serde_json::from_slice(body)
}

#[async_trait]
impl FeedRepository for FeedRepositoryImpl {
    async fn fetch_feed(&self) -> Result<Feed, FeedRepositoryError> {
        let res = self.client.get(&self.url).send().await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FeedRepositoryError::StatusError(status));
        }

        let body = res.bytes().await?;
        let feed = parse_feed(&body)?;

        debug!(
            "fetched feed {} from {} with {} chapters",
            feed.title.as_deref().unwrap_or("(untitled)"),
            self.url,
            feed.chapters.len()
        );

        Ok(feed)
    }
}
