#[macro_use]
extern crate log;

pub mod telegram;

use async_trait::async_trait;

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_document(
        &self,
        chat_id: i64,
        filename: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<(), anyhow::Error>;
}
