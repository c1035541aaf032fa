use anyhow::Result;
use async_trait::async_trait;
use teloxide::{
    adaptors::DefaultParseMode,
    prelude::*,
    types::{InputFile, ParseMode},
    utils::html,
};

use crate::Notifier;

/// Telegram rejects document captions longer than this many characters.
pub const MAX_CAPTION_LENGTH: usize = 1024;

pub type TelegramBot = DefaultParseMode<Bot>;

#[derive(Debug, Clone)]
pub struct Telegram(TelegramBot);

impl Telegram {
    pub fn new(token: String) -> Self {
        let bot = teloxide::Bot::new(token).parse_mode(ParseMode::Html);
        Self(bot)
    }

    /// Underlying bot, used to drive the command dispatcher.
    pub fn bot(&self) -> TelegramBot {
        self.0.clone()
    }
}

impl From<TelegramBot> for Telegram {
    fn from(bot: TelegramBot) -> Self {
        Self(bot)
    }
}

#[async_trait]
impl Notifier for Telegram {
    async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        debug!("sending {filename} ({} bytes) to {chat_id}", data.len());

        let document = InputFile::memory(data).file_name(filename.to_owned());
        self.0
            .send_document(ChatId(chat_id), document)
            .caption(format_caption(caption))
            .await?;

        info!("sent {filename} to {chat_id}");

        Ok(())
    }
}

/// Escapes a plain caption for the HTML parse mode and clips it to the
/// length Telegram accepts.
pub fn format_caption(caption: &str) -> String {
    let clipped: String = caption.chars().take(MAX_CAPTION_LENGTH).collect();
    html::escape(&clipped)
}
