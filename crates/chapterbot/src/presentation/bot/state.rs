use std::collections::HashMap;

use teloxide::utils::html;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::domain::{
    entities::chapter::{Chapter, ChapterPage, SortMode},
    repositories::{feed::FeedRepository, image::ImageRepository},
    services::{
        chapter::{ChapterError, ChapterService},
        document::DocumentService,
    },
};

/// Rejected `/get` argument, displayed verbatim to the user.
#[derive(Debug, Error, PartialEq)]
pub enum SelectError {
    #[error("Please run /list first to load chapters.")]
    NoList,
    #[error("Usage: /get <chapter number from list>")]
    Usage,
    #[error("Invalid chapter number.")]
    OutOfRange,
}

/// What `/get` answers with.
#[derive(Debug, PartialEq)]
pub enum GetReply {
    /// An HTML message, sent instead of a document.
    Text(String),
    Document {
        title: String,
        filename: String,
        data: Vec<u8>,
    },
}

pub struct BotState<F, I>
where
    F: FeedRepository,
    I: ImageRepository,
{
    chapter_svc: ChapterService<F>,
    document_svc: DocumentService<I>,
    per_page: usize,
    /// The window each user saw last, `/get` indexes into it.
    sessions: RwLock<HashMap<u64, Vec<Chapter>>>,
}

impl<F, I> BotState<F, I>
where
    F: FeedRepository,
    I: ImageRepository,
{
    pub fn new(
        chapter_svc: ChapterService<F>,
        document_svc: DocumentService<I>,
        per_page: usize,
    ) -> Self {
        Self {
            chapter_svc,
            document_svc,
            per_page: per_page.max(1),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Fetches a fresh page and remembers it for `user_id` when it has entries.
    pub async fn list_page(
        &self,
        user_id: u64,
        sort: SortMode,
        page: usize,
    ) -> Result<ChapterPage, ChapterError> {
        let page = self
            .chapter_svc
            .fetch_chapter_page(sort, page, self.per_page)
            .await?;

        if !page.chapters.is_empty() {
            debug!(
                "user {user_id} is on page {}/{} sorted by {}",
                page.page, page.total_pages, page.sort
            );
            self.sessions
                .write()
                .await
                .insert(user_id, page.chapters.clone());
        }

        Ok(page)
    }

    /// Resolves the 1-based `/get` argument against the user's last list.
    pub async fn select(&self, user_id: u64, arg: &str) -> Result<Chapter, SelectError> {
        let sessions = self.sessions.read().await;
        let chapters = sessions
            .get(&user_id)
            .filter(|chapters| !chapters.is_empty())
            .ok_or(SelectError::NoList)?;

        let arg = arg.split_whitespace().next().unwrap_or_default();
        if arg.is_empty() || !arg.chars().all(|c| c.is_ascii_digit()) {
            return Err(SelectError::Usage);
        }

        arg.parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| chapters.get(idx))
            .cloned()
            .ok_or(SelectError::OutOfRange)
    }

    /// Selects, builds or reuses, and reads the requested chapter. Every
    /// failure turns into a message for the user.
    pub async fn prepare_chapter(&self, user_id: u64, arg: &str) -> GetReply {
        let chapter = match self.select(user_id, arg).await {
            Ok(chapter) => chapter,
            Err(e) => return GetReply::Text(html::escape(&e.to_string())),
        };

        info!("user {user_id} requested chapter {}: {}", chapter.id, chapter.title);

        let document = match self.document_svc.get_or_build(&chapter).await {
            Ok(document) => document,
            Err(e) => {
                error!("failed to build chapter {}: {e}", chapter.id);
                return GetReply::Text(prepare_failed_message(&chapter.title));
            }
        };

        match document.read().await {
            Ok(data) => {
                debug!(
                    "serving {} ({} bytes, cached: {})",
                    document.path.display(),
                    data.len(),
                    document.cached
                );
                GetReply::Document {
                    title: chapter.title,
                    filename: document.filename,
                    data,
                }
            }
            Err(e) => {
                error!("failed to read {}: {e}", document.path.display());
                GetReply::Text(prepare_failed_message(&chapter.title))
            }
        }
    }
}

fn prepare_failed_message(title: &str) -> String {
    format!(
        "Failed to prepare {}. Please try again later.",
        html::escape(title)
    )
}
