use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncStateRepositoryError {
    #[error("io error: {0}")]
    FileError(#[from] std::io::Error),
}

/// Single-slot store holding the id of the last delivered chapter.
#[async_trait]
pub trait SyncStateRepository: Send + Sync {
    async fn load(&self) -> Result<Option<String>, SyncStateRepositoryError>;

    async fn save(&self, chapter_id: &str) -> Result<(), SyncStateRepositoryError>;
}
