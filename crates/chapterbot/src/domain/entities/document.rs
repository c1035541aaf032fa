use std::path::PathBuf;

const RESERVED_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '\"', '<', '>', '|'];

pub const DOCUMENT_EXTENSION: &str = "pdf";

/// Removes characters that are not allowed in file names on common platforms.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace(&RESERVED_CHARS[..], "").trim().to_string()
}

/// Directory name keying everything stored for one chapter. The prefix keeps
/// ids such as `..` from escaping the parent directory.
pub fn chapter_dir_name(chapter_id: &str) -> String {
    let key: String = chapter_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    format!("chapter-{key}")
}

/// Delivered file name of a chapter document: spaces become underscores.
pub fn document_filename(title: &str) -> String {
    let stem = sanitize_file_name(title).replace(' ', "_");
    let stem = if stem.is_empty() { "chapter".to_string() } else { stem };

    format!("{stem}.{DOCUMENT_EXTENSION}")
}

/// An assembled chapter document on disk.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub filename: String,
    pub path: PathBuf,
    pub cached: bool,
}

impl Document {
    pub async fn read(&self) -> Result<Vec<u8>, std::io::Error> {
        tokio::fs::read(&self.path).await
    }
}
