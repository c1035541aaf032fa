use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub token: String,
    /// Chat receiving newly released chapters.
    pub chat_id: i64,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    #[serde(skip)]
    path: PathBuf,
    #[serde(default = "default_feed_url")]
    pub feed_url: String,
    #[serde(default = "default_source_group")]
    pub source_group: String,
    #[serde(default = "default_update_interval")]
    pub update_interval: u64,
    #[serde(default = "default_chapters_per_page")]
    pub chapters_per_page: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_state_path")]
    pub state_path: String,
    #[serde(default = "default_download_path")]
    pub download_path: String,
    #[serde(default = "default_image_path")]
    pub image_path: String,
    #[serde(default)]
    pub log_file: Option<String>,
    #[serde(default = "default_enable_commands")]
    pub enable_commands: bool,
    pub telegram: Option<TelegramConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: chapterbot_home().join("config.yml"),
            feed_url: default_feed_url(),
            source_group: default_source_group(),
            update_interval: default_update_interval(),
            chapters_per_page: default_chapters_per_page(),
            request_timeout: default_request_timeout(),
            state_path: default_state_path(),
            download_path: default_download_path(),
            image_path: default_image_path(),
            log_file: None,
            enable_commands: default_enable_commands(),
            telegram: None,
        }
    }
}

fn chapterbot_home() -> PathBuf {
    match std::env::var("CHAPTERBOT_HOME") {
        Ok(path) => PathBuf::from(path),
        Err(_) => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".chapterbot"),
    }
}

fn default_feed_url() -> String {
    "https://gist.githubusercontent.com/funkyhippo/1d40bd5dae11e03a6af20e5a9a030d81/raw".to_string()
}

fn default_source_group() -> String {
    "/r/OnePunchMan".to_string()
}

fn default_update_interval() -> u64 {
    1800
}

fn default_chapters_per_page() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    60
}

fn default_enable_commands() -> bool {
    true
}

fn default_state_path() -> String {
    chapterbot_home()
        .join("last_seen_chapter.txt")
        .display()
        .to_string()
}

fn default_download_path() -> String {
    let path = chapterbot_home().join("chapters");
    if !path.exists() {
        let _ = std::fs::create_dir_all(&path);
    }
    path.display().to_string()
}

fn default_image_path() -> String {
    let path = chapterbot_home().join("images");
    if !path.exists() {
        let _ = std::fs::create_dir_all(&path);
    }
    path.display().to_string()
}

impl Config {
    pub fn open<P: AsRef<Path>>(path: Option<P>) -> Result<Config, anyhow::Error> {
        let config_path = match path {
            Some(p) => PathBuf::new().join(p),
            None => chapterbot_home().join("config.yml"),
        };

        let mut cfg = match std::fs::File::open(&config_path) {
            Ok(file) => {
                info!("Open config from {:?}", config_path);
                let mut cfg: Self = serde_yml::from_reader(file)?;
                cfg.path = config_path;
                cfg
            }
            Err(_) => {
                let cfg = Config {
                    path: config_path,
                    ..Default::default()
                };
                if let Some(parent) = cfg.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                cfg.save()?;
                info!("Write default config at {:?}", cfg.path);
                cfg
            }
        };

        cfg.apply_env(|key| std::env::var(key).ok())?;

        Ok(cfg)
    }

    /// Overrides file values with `JSON_URL`, `BOT_TOKEN` and `CHAT_ID`.
    pub fn apply_env<F>(&mut self, var: F) -> Result<(), anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(feed_url) = var("JSON_URL").filter(|v| !v.is_empty()) {
            self.feed_url = feed_url;
        }

        let token = var("BOT_TOKEN").filter(|v| !v.is_empty());
        let chat_id = match var("CHAT_ID").filter(|v| !v.is_empty()) {
            Some(chat_id) => Some(
                chat_id
                    .trim()
                    .parse::<i64>()
                    .map_err(|e| anyhow::anyhow!("invalid CHAT_ID {chat_id}: {e}"))?,
            ),
            None => None,
        };

        match (self.telegram.as_mut(), token, chat_id) {
            (Some(telegram), token, chat_id) => {
                if let Some(token) = token {
                    telegram.token = token;
                }
                if let Some(chat_id) = chat_id {
                    telegram.chat_id = chat_id;
                }
            }
            (None, Some(token), Some(chat_id)) => {
                self.telegram = Some(TelegramConfig { token, chat_id });
            }
            (None, Some(_), None) | (None, None, Some(_)) => {
                anyhow::bail!("BOT_TOKEN and CHAT_ID must be set together");
            }
            (None, None, None) => {}
        }

        Ok(())
    }

    /// Polling period, 0 falls back to the default.
    pub fn update_interval(&self) -> std::time::Duration {
        let secs = if self.update_interval == 0 {
            default_update_interval()
        } else {
            self.update_interval
        };
        std::time::Duration::from_secs(secs)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn save(&self) -> Result<(), anyhow::Error> {
        std::fs::write(&self.path, serde_yml::to_string(&self)?)?;

        Ok(())
    }
}
