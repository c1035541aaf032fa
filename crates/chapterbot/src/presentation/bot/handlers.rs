use std::sync::Arc;

use chapterbot_notifier::{
    Notifier,
    telegram::{Telegram, TelegramBot},
};
use chrono::Local;
use teloxide::{
    prelude::*,
    utils::{command::BotCommands, html},
};

use super::{
    format::{self, ERROR_MESSAGE, HELP_MESSAGE},
    state::{BotState, GetReply},
};
use crate::domain::repositories::{feed::FeedRepository, image::ImageRepository};

pub type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show available commands")]
    Help,
    #[command(description = "list chapters: /list [sort=chapter|updated]")]
    List(String),
    #[command(description = "download a chapter from the last list: /get <number>")]
    Get(String),
}

/// Key of the per-user list session; chats without a sender share one.
fn user_id(msg: &Message) -> u64 {
    msg.from
        .as_ref()
        .map(|user| user.id.0)
        .unwrap_or(msg.chat.id.0.unsigned_abs())
}

pub async fn handle_command<F, I>(
    bot: TelegramBot,
    msg: Message,
    cmd: Command,
    state: Arc<BotState<F, I>>,
) -> HandlerResult
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
{
    debug!("command {cmd:?} from chat {}", msg.chat.id);

    match cmd {
        Command::Help => {
            bot.send_message(msg.chat.id, HELP_MESSAGE).await?;
        }
        Command::List(args) => handle_list(bot, msg, &args, state).await?,
        Command::Get(arg) => handle_get(bot, msg, &arg, state).await?,
    }

    Ok(())
}

async fn handle_list<F, I>(
    bot: TelegramBot,
    msg: Message,
    args: &str,
    state: Arc<BotState<F, I>>,
) -> HandlerResult
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
{
    let sort = format::parse_list_args(args);

    match state.list_page(user_id(&msg), sort, 1).await {
        Ok(page) => {
            let mut req = bot.send_message(msg.chat.id, format::format_page(&page, &Local));
            if let Some(markup) = format::keyboard(&page) {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Err(e) => {
            error!("failed to list chapters: {e}");
            bot.send_message(msg.chat.id, ERROR_MESSAGE).await?;
        }
    }

    Ok(())
}

async fn handle_get<F, I>(
    bot: TelegramBot,
    msg: Message,
    arg: &str,
    state: Arc<BotState<F, I>>,
) -> HandlerResult
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
{
    match state.prepare_chapter(user_id(&msg), arg).await {
        GetReply::Text(text) => {
            bot.send_message(msg.chat.id, text).await?;
        }
        GetReply::Document {
            title,
            filename,
            data,
        } => {
            let telegram = Telegram::from(bot.clone());
            if let Some(text) = send_chapter(&telegram, msg.chat.id.0, &title, &filename, data).await {
                bot.send_message(msg.chat.id, text).await?;
            }
        }
    }

    Ok(())
}

/// Sends a prepared chapter, returning the message to show instead when
/// delivery fails.
pub async fn send_chapter<N: Notifier>(
    notifier: &N,
    chat_id: i64,
    title: &str,
    filename: &str,
    data: Vec<u8>,
) -> Option<String> {
    let caption = format!("Here's your chapter: {title}");

    match notifier.send_document(chat_id, filename, data, &caption).await {
        Ok(()) => None,
        Err(e) => {
            error!("failed to send {filename} to {chat_id}: {e}");
            Some(format!(
                "Failed to send {}. Please try again later.",
                html::escape(title)
            ))
        }
    }
}

pub async fn handle_callback<F, I>(
    bot: TelegramBot,
    q: CallbackQuery,
    state: Arc<BotState<F, I>>,
) -> HandlerResult
where
    F: FeedRepository + 'static,
    I: ImageRepository + 'static,
{
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.regular_message() else {
        return Ok(());
    };
    let (chat_id, message_id) = (message.chat.id, message.id);

    let res = match q.data.as_deref().and_then(format::parse_callback_data) {
        Some((page, sort)) => state
            .list_page(q.from.id.0, sort, page)
            .await
            .map_err(anyhow::Error::from),
        None => Err(anyhow::anyhow!("unrecognized callback data {:?}", q.data)),
    };

    match res {
        Ok(page) => {
            let mut req = bot.edit_message_text(chat_id, message_id, format::format_page(&page, &Local));
            if let Some(markup) = format::keyboard(&page) {
                req = req.reply_markup(markup);
            }
            req.await?;
        }
        Err(e) => {
            error!("Error during pagination: {e}");
            bot.edit_message_text(chat_id, message_id, ERROR_MESSAGE)
                .await?;
        }
    }

    Ok(())
}
