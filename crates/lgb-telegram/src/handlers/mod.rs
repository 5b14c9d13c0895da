//! Telegram update handlers.
//!
//! Each handler lifts the teloxide update into the core's event types,
//! asks the moderation engine for a decision, and dispatches the resulting
//! side effects best-effort. Engine errors are logged and dropped so one
//! bad update never stops the stream.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use tracing::warn;

use lgb_core::domain::UserId;

use crate::router::AppState;

mod commands;
mod join;
mod text;

pub async fn handle_message(bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    // Opportunistic handle directory: any interaction refreshes the mapping
    // that `@handle` command references resolve against.
    if let Some(user) = msg.from() {
        if let Some(handle) = &user.username {
            if let Err(e) = state.store.remember_handle(handle, UserId(user.id.0 as i64)) {
                warn!("recording member handle failed: {e}");
            }
        }
    }

    if msg.new_chat_members().is_some() {
        return join::handle_join(bot, msg, state).await;
    }

    if let Some(text) = msg.text() {
        if text.trim_start().starts_with('/') {
            return commands::handle_command(bot, msg, state).await;
        }
    }

    if msg.text().is_some() || msg.caption().is_some() {
        return text::handle_text(bot, msg, state).await;
    }

    Ok(())
}
