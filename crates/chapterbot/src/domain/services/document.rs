use std::{
    io::Write,
    path::{Path, PathBuf},
};

use lopdf::{
    Object, Stream,
    content::{Content, Operation},
    dictionary,
};
use thiserror::Error;

use crate::domain::{
    entities::{
        chapter::Chapter,
        document::{self, Document},
    },
    repositories::image::ImageRepository,
    services::image::{self as image_svc, ImageError, ImageService},
};

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no pages available for {0}")]
    NoPages(String),
    #[error("image error: {0}")]
    ImageError(#[from] ImageError),
    #[error("pdf error: {0}")]
    PdfError(#[from] lopdf::Error),
    #[error("io error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Writes one page per image, each page as large as the image itself, in the
/// given order. Rgb jpegs are embedded untouched.
pub fn write_pdf(pages: &[PathBuf], output: &Path) -> Result<(), DocumentError> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for page in pages {
        let data = std::fs::read(page)?;
        let (width, height, data) = match image_svc::rgb_jpeg_dimensions(&data) {
            Some((width, height)) => (width, height, data),
            None => {
                let encoded = image_svc::encode_page(&data)?;
                (encoded.width, encoded.height, encoded.data)
            }
        };
        let (width, height) = (width as i64, height as i64);

        let image_id = doc.add_object(
            Stream::new(
                dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                },
                data,
            )
            .with_compression(false),
        );

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), 0.into(), 0.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let media_box: Vec<Object> = vec![0.into(), 0.into(), width.into(), height.into()];

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Im0" => image_id,
                },
            },
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut file = std::io::BufWriter::new(std::fs::File::create(output)?);
    doc.save_to(&mut file)?;
    file.flush()?;

    Ok(())
}

/// Assembles `pages` into a pdf at `output` and removes the source images.
///
/// An existing `output` is treated as already assembled and left untouched.
pub async fn assemble(pages: Vec<PathBuf>, output: &Path) -> Result<PathBuf, DocumentError> {
    let output = output.to_path_buf();

    if output.exists() {
        debug!("{} already assembled", output.display());
    } else {
        if pages.is_empty() {
            return Err(DocumentError::NoPages(output.display().to_string()));
        }

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        tokio::fs::create_dir_all(&dir).await?;

        // a truncated file must never be visible under the cached name
        let partial = tempfile::Builder::new()
            .suffix(".part")
            .tempfile_in(&dir)?
            .into_temp_path();
        let (sources, target) = (pages.clone(), partial.to_path_buf());
        tokio::task::spawn_blocking(move || write_pdf(&sources, &target))
            .await
            .map_err(|e| DocumentError::Other(anyhow::anyhow!("{e}")))??;
        partial.persist(&output).map_err(|e| e.error)?;

        info!("PDF generated: {}", output.display());
    }

    for page in &pages {
        if let Err(e) = tokio::fs::remove_file(page).await {
            warn!("Failed to delete image {}: {e}", page.display());
        }
    }

    if !pages.is_empty() {
        info!("Images deleted.");
    }

    Ok(output)
}

#[derive(Clone)]
pub struct DocumentService<R>
where
    R: ImageRepository,
{
    image_svc: ImageService<R>,
    download_path: PathBuf,
    image_path: PathBuf,
}

impl<R> DocumentService<R>
where
    R: ImageRepository,
{
    pub fn new<P: AsRef<Path>>(image_svc: ImageService<R>, download_path: P, image_path: P) -> Self {
        Self {
            image_svc,
            download_path: PathBuf::new().join(download_path),
            image_path: PathBuf::new().join(image_path),
        }
    }

    /// Cache location of a chapter's document, keyed by chapter id.
    pub fn document_path(&self, chapter: &Chapter) -> PathBuf {
        self.download_path
            .join(document::chapter_dir_name(&chapter.id))
            .join(document::document_filename(&chapter.title))
    }

    /// Returns the cached document of `chapter`, building it first if needed.
    ///
    /// Page images go to a fresh scratch directory per call, so overlapping
    /// builds of one chapter do not share files.
    pub async fn get_or_build(&self, chapter: &Chapter) -> Result<Document, DocumentError> {
        let path = self.document_path(chapter);
        let filename = document::document_filename(&chapter.title);

        if path.exists() {
            info!("Reusing cached PDF: {}", path.display());
            return Ok(Document {
                filename,
                path,
                cached: true,
            });
        }

        if chapter.pages.is_empty() {
            return Err(DocumentError::NoPages(chapter.id.clone()));
        }

        info!("Downloading chapter {}: {}", chapter.id, chapter.title);

        tokio::fs::create_dir_all(&self.image_path).await?;
        let scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", document::chapter_dir_name(&chapter.id)))
            .tempdir_in(&self.image_path)?;

        let pages = self
            .image_svc
            .fetch_and_encode(&chapter.pages, scratch.path())
            .await?;
        let path = assemble(pages, &path).await?;

        if let Err(e) = scratch.close() {
            debug!("failed to remove scratch directory: {e}");
        }

        Ok(Document {
            filename,
            path,
            cached: false,
        })
    }
}
