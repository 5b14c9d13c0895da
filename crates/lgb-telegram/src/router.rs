use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tracing::info;

use lgb_core::{config::Config, moderation::Moderation, port::ChatPort, store::BanStore};

use crate::handlers;
use crate::TelegramModerator;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub store: Arc<BanStore>,
    pub moderation: Arc<Moderation>,
    pub port: Arc<dyn ChatPort>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    store: Arc<BanStore>,
    moderation: Arc<Moderation>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.bot_token.clone());

    if let Ok(me) = bot.get_me().await {
        info!("lgb started: @{}", me.username());
    }
    if cfg.allowed_chat_ids.is_empty() {
        info!("moderating every chat the bot is in");
    } else {
        info!("moderating {} scoped chat(s)", cfg.allowed_chat_ids.len());
    }
    info!("owner id: {}", cfg.owner_id);

    let port: Arc<dyn ChatPort> = Arc::new(TelegramModerator::new(bot.clone()));

    let state = Arc::new(AppState {
        cfg,
        store,
        moderation,
        port,
    });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
