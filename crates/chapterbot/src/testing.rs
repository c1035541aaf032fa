//! Test doubles shared by the unit tests of every layer.

use std::{
    collections::{BTreeMap, HashMap},
    io::Cursor,
    path::{Path, PathBuf},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
};

use async_trait::async_trait;
use bytes::Bytes;
use chapterbot_notifier::Notifier;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::domain::{
    entities::chapter::{Feed, FeedChapter, GroupPages},
    repositories::{
        feed::{FeedRepository, FeedRepositoryError},
        image::{ImageRepository, ImageRepositoryError},
        sync_state::{SyncStateRepository, SyncStateRepositoryError},
    },
    services::image::encode_page,
};

pub const GROUP: &str = "/r/OnePunchMan";

pub fn feed_chapter(title: &str, last_updated: Option<f64>, pages: &[&str]) -> FeedChapter {
    let mut groups = BTreeMap::new();
    groups.insert(
        GROUP.to_string(),
        GroupPages::Urls(pages.iter().map(|p| p.to_string()).collect()),
    );

    FeedChapter {
        title: Some(title.to_string()),
        volume: None,
        last_updated,
        groups,
    }
}

#[derive(Clone)]
enum FeedMode {
    Serve(Feed),
    Unavailable,
    Malformed,
}

#[derive(Clone)]
pub struct FakeFeedRepository {
    mode: FeedMode,
}

impl FakeFeedRepository {
    pub fn with_chapters(chapters: Vec<(&str, FeedChapter)>) -> Self {
        let feed = Feed {
            title: Some("One Punch Man".to_string()),
            chapters: chapters
                .into_iter()
                .map(|(id, chapter)| (id.to_string(), chapter))
                .collect(),
        };

        Self {
            mode: FeedMode::Serve(feed),
        }
    }

    pub fn failing() -> Self {
        Self {
            mode: FeedMode::Unavailable,
        }
    }

    pub fn malformed() -> Self {
        Self {
            mode: FeedMode::Malformed,
        }
    }
}

#[async_trait]
impl FeedRepository for FakeFeedRepository {
    async fn fetch_feed(&self) -> Result<Feed, FeedRepositoryError> {
        match &self.mode {
            FeedMode::Serve(feed) => Ok(feed.clone()),
            FeedMode::Unavailable => Err(FeedRepositoryError::StatusError(
                reqwest::StatusCode::BAD_GATEWAY,
            )),
            FeedMode::Malformed => Err(serde_json::from_str::<Feed>("<html>").unwrap_err().into()),
        }
    }
}

/// Serves images from memory and records every requested url.
#[derive(Clone, Default)]
pub struct FakeImageRepository {
    images: Arc<Mutex<HashMap<String, Bytes>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FakeImageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(self, url: &str, data: Vec<u8>) -> Self {
        self.images
            .lock()
            .unwrap()
            .insert(url.to_string(), Bytes::from(data));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageRepository for FakeImageRepository {
    async fn fetch_image_from_url(&self, url: &str) -> Result<Bytes, ImageRepositoryError> {
        self.requests.lock().unwrap().push(url.to_string());

        self.images
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| ImageRepositoryError::Other(format!("no image at {url}")))
    }
}

#[derive(Clone, Default)]
pub struct FakeSyncStateRepository {
    marker: Arc<Mutex<Option<String>>>,
    fail_save: Arc<AtomicBool>,
}

impl FakeSyncStateRepository {
    pub fn new(marker: Option<&str>) -> Self {
        Self {
            marker: Arc::new(Mutex::new(marker.map(str::to_string))),
            fail_save: Arc::default(),
        }
    }

    pub fn current(&self) -> Option<String> {
        self.marker.lock().unwrap().clone()
    }

    pub fn fail_save(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SyncStateRepository for FakeSyncStateRepository {
    async fn load(&self) -> Result<Option<String>, SyncStateRepositoryError> {
        Ok(self.current())
    }

    async fn save(&self, chapter_id: &str) -> Result<(), SyncStateRepositoryError> {
        if self.fail_save.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("read-only filesystem").into());
        }

        *self.marker.lock().unwrap() = Some(chapter_id.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct SentDocument {
    pub chat_id: i64,
    pub filename: String,
    pub data: Vec<u8>,
    pub caption: String,
}

#[derive(Clone, Default)]
pub struct FakeNotifier {
    sent: Arc<Mutex<Vec<SentDocument>>>,
    fail: Arc<AtomicBool>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentDocument> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<(), anyhow::Error> {
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("telegram unreachable");
        }

        self.sent.lock().unwrap().push(SentDocument {
            chat_id,
            filename: filename.to_string(),
            data,
            caption: caption.to_string(),
        });
        Ok(())
    }
}

pub fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(pixel));

    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}

/// Writes an encoded page as `page_{index}.jpg` into `dir`.
pub fn jpeg_page(dir: &Path, index: usize, width: u32, height: u32) -> PathBuf {
    let page = encode_page(&png_bytes(width, height, [90, 120, 150, 255])).unwrap();
    let path = dir.join(format!("page_{index}.jpg"));
    std::fs::write(&path, page.data).unwrap();
    path
}

/// Answers exactly one http request with `status` and `body`, returns the url.
pub async fn serve_once(status: &str, body: Vec<u8>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/resource", listener.local_addr().unwrap());
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
        }

        socket.write_all(head.as_bytes()).await.unwrap();
        socket.write_all(&body).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    url
}
