use crate::domain::{
    entities::chapter::{self, Chapter, ChapterPage, SortMode},
    repositories::feed::{FeedRepository, FeedRepositoryError},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChapterError {
    #[error("repository error: {0}")]
    RepositoryError(#[from] FeedRepositoryError),
}

#[derive(Clone)]
pub struct ChapterService<R>
where
    R: FeedRepository,
{
    repo: R,
    group: String,
}

impl<R> ChapterService<R>
where
    R: FeedRepository,
{
    /// `group` selects which source's page list is used for every chapter.
    pub fn new(repo: R, group: String) -> Self {
        Self { repo, group }
    }

    pub async fn fetch_chapters(&self) -> Result<Vec<Chapter>, ChapterError> {
        let feed = self.repo.fetch_feed().await?;

        Ok(feed.chapters(&self.group))
    }

    pub async fn fetch_latest_chapter(&self) -> Result<Option<Chapter>, ChapterError> {
        let chapters = self.fetch_chapters().await?;

        Ok(chapter::latest_chapter(&chapters).cloned())
    }

    pub async fn fetch_chapter_page(
        &self,
        sort: SortMode,
        page: usize,
        per_page: usize,
    ) -> Result<ChapterPage, ChapterError> {
        let mut chapters = self.fetch_chapters().await?;
        chapter::sort_chapters(&mut chapters, sort);

        Ok(chapter::paginate(chapters, page, per_page, sort))
    }
}
