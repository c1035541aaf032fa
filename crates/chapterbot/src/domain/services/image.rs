use std::path::{Path, PathBuf};

use image::{
    ColorType, ImageDecoder,
    codecs::jpeg::JpegDecoder,
};
use thiserror::Error;

use crate::domain::repositories::image::{ImageRepository, ImageRepositoryError};

pub const JPEG_QUALITY: u8 = 85;
pub const PAGE_EXTENSION: &str = "jpg";

#[derive(Debug, Error)]
pub enum ImageError {
    #[error("repository error: {0}")]
    RepositoryError(#[from] ImageRepositoryError),
    #[error("error decode image: {0}")]
    DecodeError(#[from] image::ImageError),
    #[error("error encode image: {0}")]
    EncodeError(#[from] jpeg_encoder::EncodingError),
    #[error("image of {width}x{height} is too large for jpeg")]
    TooLarge { width: u32, height: u32 },
    #[error("io error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// A page re-encoded as baseline RGB jpeg.
#[derive(Debug, Clone)]
pub struct EncodedPage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// Decodes any supported raster format, drops alpha and palette, and
/// re-encodes as jpeg with optimized huffman tables.
pub fn encode_page(data: &[u8]) -> Result<EncodedPage, ImageError> {
    let rgb = image::load_from_memory(data)?.to_rgb8();
    let (width, height) = rgb.dimensions();

    let (w, h) = match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => (w, h),
        _ => return Err(ImageError::TooLarge { width, height }),
    };

    let mut buf = Vec::new();
    let mut encoder = jpeg_encoder::Encoder::new(&mut buf, JPEG_QUALITY);
    encoder.set_optimized_huffman_tables(true);
    encoder.encode(rgb.as_raw(), w, h, jpeg_encoder::ColorType::Rgb)?;

    Ok(EncodedPage {
        width,
        height,
        data: buf,
    })
}

/// Dimensions of `data` when it is already an RGB jpeg that can be embedded
/// as-is, `None` for anything that needs re-encoding first.
pub fn rgb_jpeg_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    let decoder = JpegDecoder::new(std::io::Cursor::new(data)).ok()?;
    (decoder.color_type() == ColorType::Rgb8).then(|| decoder.dimensions())
}

#[derive(Clone)]
pub struct ImageService<R>
where
    R: ImageRepository,
{
    repo: R,
}

impl<R> ImageService<R>
where
    R: ImageRepository,
{
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Downloads every url in order and writes it as `page_{n}.jpg` into
    /// `destination`. The first failure aborts the whole batch.
    pub async fn fetch_and_encode<P: AsRef<Path>>(
        &self,
        urls: &[String],
        destination: P,
    ) -> Result<Vec<PathBuf>, ImageError> {
        let destination = destination.as_ref();
        tokio::fs::create_dir_all(destination).await?;

        let mut paths = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let data = self.repo.fetch_image_from_url(url).await?;

            let page = tokio::task::spawn_blocking(move || encode_page(&data))
                .await
                .map_err(|e| ImageError::Other(anyhow::anyhow!("{e}")))??;

            let path = destination.join(format!("page_{}.{PAGE_EXTENSION}", index + 1));
            tokio::fs::write(&path, &page.data).await?;

            info!("Downloaded and compressed image {}/{}", index + 1, urls.len());
            paths.push(path);
        }

        Ok(paths)
    }
}
