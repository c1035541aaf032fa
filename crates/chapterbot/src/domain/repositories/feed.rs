use async_trait::async_trait;

use thiserror::Error;

use crate::domain::entities::chapter::Feed;

#[derive(Debug, Error)]
pub enum FeedRepositoryError {
    #[error("error request feed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("feed responded with status {0}")]
    StatusError(reqwest::StatusCode),
    #[error("malformed feed: {0}")]
    ParseError(#[from] serde_json::Error),
}

#[async_trait]
pub trait FeedRepository: Send + Sync {
    /// Fetches a fresh snapshot of the feed, nothing is cached.
    async fn fetch_feed(&self) -> Result<Feed, FeedRepositoryError>;
}
