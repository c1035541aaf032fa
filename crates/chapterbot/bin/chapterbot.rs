#[macro_use]
extern crate log;

use std::sync::Arc;

use chapterbot::{
    application::worker,
    domain::services::{chapter::ChapterService, document::DocumentService, image::ImageService},
    infrastructure::{
        config::Config,
        domain::repositories::{
            feed::FeedRepositoryImpl, image::ImageRepositoryImpl,
            sync_state::SyncStateRepositoryImpl,
        },
        logging,
        notification::Notification,
        utils::http_client,
    },
    presentation::bot::{self, BotState},
};
use chapterbot_notifier::telegram::Telegram;
use clap::Parser;
use futures::future::OptionFuture;

#[derive(Parser)]
struct Opts {
    /// Path to config file
    #[clap(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let dotenv = dotenvy::dotenv();

    let opts: Opts = Opts::parse();
    let config = Config::open(opts.config).expect("failed to init config");

    logging::init(config.log_file.as_deref())?;

    if let Ok(path) = dotenv {
        info!("loaded environment from {}", path.display());
    }
    debug!(
        "feed: {} ({}), interval: {:?}, downloads: {}",
        config.feed_url,
        config.source_group,
        config.update_interval(),
        config.download_path
    );

    let Some(telegram_config) = config.telegram.clone() else {
        anyhow::bail!("telegram is not configured, set BOT_TOKEN and CHAT_ID or the telegram section of the config");
    };

    let client = http_client(config.request_timeout())?;

    let feed_repo = FeedRepositoryImpl::new(client.clone(), config.feed_url.clone());
    let chapter_svc = ChapterService::new(feed_repo, config.source_group.clone());

    let image_repo = ImageRepositoryImpl::new(client);
    let document_svc = DocumentService::new(
        ImageService::new(image_repo),
        &config.download_path,
        &config.image_path,
    );

    let state_repo = SyncStateRepositoryImpl::new(&config.state_path);

    let telegram = Telegram::new(telegram_config.token);
    let notification = Notification::new(telegram.clone(), telegram_config.chat_id);

    let sync_worker_handle = worker::sync::start(
        config.update_interval(),
        chapter_svc.clone(),
        document_svc.clone(),
        state_repo,
        notification,
    );

    let mut telegram_bot_fut: OptionFuture<_> = None.into();
    if config.enable_commands {
        let state = Arc::new(BotState::new(
            chapter_svc,
            document_svc,
            config.chapters_per_page,
        ));
        telegram_bot_fut = Some(bot::run(telegram.bot(), state)).into();
    }

    info!("chapterbot started, watching {}", config.feed_url);

    tokio::select! {
        _ = sync_worker_handle => {
            info!("sync worker quit");
        }
        Some(_) = telegram_bot_fut => {
            info!("telegram bot shutdown");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl+c signal");
        }
    }

    Ok(())
}
