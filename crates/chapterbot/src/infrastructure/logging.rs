use std::{
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
};

use env_logger::{Builder, Target};

const DEFAULT_LEVEL: &str = "info";

/// Filter directives: `RUST_LOG` wins, otherwise `CHAPTERBOT_LOG` sets the
/// level of our own crates.
pub fn filters(rust_log: Option<String>, level: Option<String>) -> String {
    if let Some(rust_log) = rust_log.filter(|v| !v.trim().is_empty()) {
        return rust_log;
    }

    let level = level
        .map(|v| v.trim().to_lowercase())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_LEVEL.to_string());

    format!("chapterbot={level},chapterbot_notifier={level}")
}

/// Writes every record to stderr and a log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        std::io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        std::io::stderr().flush()?;
        self.file.flush()
    }
}

pub fn init(log_file: Option<&str>) -> Result<(), anyhow::Error> {
    let mut builder = Builder::new();
    builder.parse_filters(&filters(
        std::env::var("RUST_LOG").ok(),
        std::env::var("CHAPTERBOT_LOG").ok(),
    ));

    if let Some(path) = log_file.filter(|p| !p.is_empty()) {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(Tee { file })));
    }

    builder.try_init()?;

    Ok(())
}
