use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::domain::repositories::sync_state::{SyncStateRepository, SyncStateRepositoryError};

/// Keeps the last delivered chapter id as the whole content of one file.
#[derive(Clone)]
pub struct SyncStateRepositoryImpl {
    path: PathBuf,
}

impl SyncStateRepositoryImpl {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: PathBuf::new().join(path),
        }
    }
}

#[async_trait]
impl SyncStateRepository for SyncStateRepositoryImpl {
    async fn load(&self) -> Result<Option<String>, SyncStateRepositoryError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => {
                let chapter_id = content.trim();
                Ok((!chapter_id.is_empty()).then(|| chapter_id.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, chapter_id: &str) -> Result<(), SyncStateRepositoryError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&self.path, chapter_id).await?;

        Ok(())
    }
}
