use std::sync::Arc;

use teloxide::prelude::*;

use tracing::warn;

use lgb_core::{
    domain::{ChatId, ChatKind, MessageId, Sender, UserId},
    effects::dispatch,
    engine::{evaluate_message, message_effects, MessageEvent},
};

use crate::router::AppState;

pub(crate) fn sender_from(user: &teloxide::types::User) -> Sender {
    let name = user.full_name();
    Sender {
        id: UserId(user.id.0 as i64),
        handle: user.username.clone(),
        display: if name.trim().is_empty() {
            "User".to_string()
        } else {
            name
        },
    }
}

/// Channels and other non-conversation chats are out of scope.
pub(crate) fn chat_kind(chat: &teloxide::types::Chat) -> Option<ChatKind> {
    if chat.is_private() {
        Some(ChatKind::Private)
    } else if chat.is_group() || chat.is_supergroup() {
        Some(ChatKind::Group)
    } else {
        None
    }
}

pub async fn handle_text(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(kind) = chat_kind(&msg.chat) else {
        return Ok(());
    };

    let event = MessageEvent {
        chat: ChatId(msg.chat.id.0),
        kind,
        chat_title: msg.chat.title().map(|s| s.to_string()),
        message_id: MessageId(msg.id.0),
        sender: sender_from(user),
        text: msg.text().map(|s| s.to_string()),
        caption: msg.caption().map(|s| s.to_string()),
    };

    let decision = match evaluate_message(&state.moderation, &state.store, &event) {
        Ok(d) => d,
        Err(e) => {
            warn!("moderation evaluation failed: {e}");
            return Ok(());
        }
    };

    dispatch(
        message_effects(&decision, &event),
        state.port.as_ref(),
        &state.store,
    )
    .await;

    Ok(())
}
