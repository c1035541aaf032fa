use chapterbot_notifier::Notifier;

/// Delivery channel of the sync pipeline: everything goes to one chat.
#[derive(Clone)]
pub struct Notification<N>
where
    N: Notifier,
{
    notifier: N,
    chat_id: i64,
}

impl<N> Notification<N>
where
    N: Notifier,
{
    pub fn new(notifier: N, chat_id: i64) -> Self {
        Self { notifier, chat_id }
    }

    pub async fn send_document(
        &self,
        filename: &str,
        data: Vec<u8>,
        caption: &str,
    ) -> Result<(), anyhow::Error> {
        self.notifier
            .send_document(self.chat_id, filename, data, caption)
            .await
    }
}
