//! Interactive Telegram commands: `/help`, `/list`, `/get` and list paging.
//!
//! Shares the feed and document services with the sync worker but never
//! touches the sync marker.

pub mod format;
pub mod handlers;
pub mod state;

use std::sync::Arc;

use chapterbot_notifier::telegram::TelegramBot;
use teloxide::{prelude::*, utils::command::BotCommands};

use crate::domain::repositories::{feed::FeedRepository, image::ImageRepository};

pub use handlers::Command;
pub use state::BotState;

pub async fn run<F, I>(bot: TelegramBot, state: Arc<BotState<F, I>>)
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
{
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!("failed to register bot commands: {e}");
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handlers::handle_command::<F, I>),
        )
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback::<F, I>));

    info!("telegram commands enabled");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}
