use std::sync::Arc;

use teloxide::prelude::*;

use tracing::warn;

use lgb_core::{
    domain::{ChatId, MessageId, UserId},
    effects::dispatch,
    engine::{evaluate_join, join_effects, JoinEvent},
};

use crate::router::AppState;

use super::text::{chat_kind, sender_from};

/// New-member admission: a ban persists across leave/rejoin cycles, so a
/// banned member is removed again before they post anything.
pub async fn handle_join(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(members) = msg.new_chat_members() else {
        return Ok(());
    };
    if chat_kind(&msg.chat) != Some(lgb_core::domain::ChatKind::Group) {
        return Ok(());
    }

    for member in members {
        if let Some(handle) = &member.username {
            if let Err(e) = state
                .store
                .remember_handle(handle, UserId(member.id.0 as i64))
            {
                warn!("recording member handle failed: {e}");
            }
        }

        let join = JoinEvent {
            chat: ChatId(msg.chat.id.0),
            chat_title: msg.chat.title().map(|s| s.to_string()),
            message_id: MessageId(msg.id.0),
            member: sender_from(member),
        };

        match evaluate_join(&state.moderation, &state.store, &join) {
            Ok(decision) => {
                dispatch(
                    join_effects(&decision, &join),
                    state.port.as_ref(),
                    &state.store,
                )
                .await;
            }
            Err(e) => warn!("join evaluation failed: {e}"),
        }
    }

    Ok(())
}
