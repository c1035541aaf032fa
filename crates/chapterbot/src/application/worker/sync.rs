use std::time::Duration;

use chapterbot_notifier::Notifier;
use thiserror::Error;
use tokio::{
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};

use crate::{
    domain::{
        entities::chapter,
        repositories::{
            feed::{FeedRepository, FeedRepositoryError},
            image::ImageRepository,
            sync_state::{SyncStateRepository, SyncStateRepositoryError},
        },
        services::{
            chapter::{ChapterError, ChapterService},
            document::{DocumentError, DocumentService},
            image::ImageError,
        },
    },
    infrastructure::notification::Notification,
};

type Source = Box<dyn std::error::Error + Send + Sync>;

/// Failure of one sync cycle, by category.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport error: {0}")]
    Transport(#[source] Source),
    #[error("parse error: {0}")]
    Parse(#[source] Source),
    #[error("encoding error: {0}")]
    Encoding(#[source] Source),
    #[error("delivery error: {0}")]
    Delivery(#[source] Source),
    #[error("storage error: {0}")]
    Storage(#[source] Source),
}

impl SyncError {
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Transport(_) => "TransportError",
            SyncError::Parse(_) => "ParseError",
            SyncError::Encoding(_) => "EncodingError",
            SyncError::Delivery(_) => "DeliveryError",
            SyncError::Storage(_) => "StorageError",
        }
    }
}

impl From<ChapterError> for SyncError {
    fn from(e: ChapterError) -> Self {
        match e {
            ChapterError::RepositoryError(e) => {
                if matches!(e, FeedRepositoryError::ParseError(_)) {
                    Self::Parse(Box::new(e))
                } else {
                    Self::Transport(Box::new(e))
                }
            }
        }
    }
}

impl From<ImageError> for SyncError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::RepositoryError(_) => Self::Transport(Box::new(e)),
            ImageError::FileError(_) => Self::Storage(Box::new(e)),
            ImageError::DecodeError(_)
            | ImageError::EncodeError(_)
            | ImageError::TooLarge { .. }
            | ImageError::Other(_) => Self::Encoding(Box::new(e)),
        }
    }
}

impl From<DocumentError> for SyncError {
    fn from(e: DocumentError) -> Self {
        match e {
            DocumentError::ImageError(e) => e.into(),
            DocumentError::FileError(_) => Self::Storage(Box::new(e)),
            DocumentError::NoPages(_) | DocumentError::PdfError(_) | DocumentError::Other(_) => {
                Self::Encoding(Box::new(e))
            }
        }
    }
}

impl From<SyncStateRepositoryError> for SyncError {
    fn from(e: SyncStateRepositoryError) -> Self {
        Self::Storage(Box::new(e))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncOutcome {
    NoChapters,
    Unchanged(String),
    Delivered(String),
}

pub struct SyncWorker<F, I, S, N>
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
    S: SyncStateRepository + 'static,
    N: Notifier + 'static,
{
    period: Duration,
    chapter_svc: ChapterService<F>,
    document_svc: DocumentService<I>,
    state_repo: S,
    notification: Notification<N>,
}

impl<F, I, S, N> SyncWorker<F, I, S, N>
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
    S: SyncStateRepository + 'static,
    N: Notifier + 'static,
{
    pub fn new(
        period: Duration,
        chapter_svc: ChapterService<F>,
        document_svc: DocumentService<I>,
        state_repo: S,
        notification: Notification<N>,
    ) -> Self {
        info!("periodic chapter sync every {} seconds", period.as_secs());

        Self {
            period,
            chapter_svc,
            document_svc,
            state_repo,
            notification,
        }
    }

    /// Runs one cycle. The marker only moves after the document was delivered,
    /// so a failed cycle is retried from scratch on the next one.
    pub async fn sync(&self) -> Result<SyncOutcome, SyncError> {
        let chapters = self.chapter_svc.fetch_chapters().await?;

        let Some(latest) = chapter::latest_chapter(&chapters) else {
            warn!("No chapters found in feed.");
            return Ok(SyncOutcome::NoChapters);
        };

        let last_seen = self.state_repo.load().await?;
        if last_seen.as_deref() == Some(latest.id.as_str()) {
            info!("No new chapter.");
            return Ok(SyncOutcome::Unchanged(latest.id.clone()));
        }

        info!("New chapter detected: {} ({})", latest.title, latest.id);

        let document = self.document_svc.get_or_build(latest).await?;
        let data = document
            .read()
            .await
            .map_err(|e| SyncError::Storage(Box::new(e)))?;

        self.notification
            .send_document(
                &document.filename,
                data,
                &format!("New chapter released: {}", latest.title),
            )
            .await
            .map_err(|e| SyncError::Delivery(e.into()))?;

        info!(
            "Sent PDF to Telegram: {}{}",
            document.path.display(),
            if document.cached { " (cached)" } else { "" }
        );

        self.state_repo.save(&latest.id).await?;

        Ok(SyncOutcome::Delivered(latest.id.clone()))
    }

    async fn run(self) {
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let start = interval.tick().await;

            match self.sync().await {
                Ok(outcome) => debug!("chapter sync outcome: {outcome:?}"),
                Err(e) => error!("An error occurred during chapter sync: {}: {e}", e.kind()),
            }

            info!("chapter sync done in {:?}", Instant::now() - start);
        }
    }
}

pub fn start<F, I, S, N>(
    period: Duration,
    chapter_svc: ChapterService<F>,
    document_svc: DocumentService<I>,
    state_repo: S,
    notification: Notification<N>,
) -> JoinHandle<()>
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
    S: SyncStateRepository + 'static,
    N: Notifier + 'static,
{
    let worker = SyncWorker::new(period, chapter_svc, document_svc, state_repo, notification);

    tokio::spawn(worker.run())
}
