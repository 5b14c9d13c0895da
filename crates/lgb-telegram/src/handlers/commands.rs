use std::sync::Arc;

use teloxide::prelude::*;

use tracing::warn;

use lgb_core::{
    command::Command,
    domain::{ChatId, ChatKind, UserId},
    extractor::normalize_domain,
};

use crate::router::AppState;

use super::text::chat_kind;

async fn reply(state: &AppState, chat: ChatId, text: &str) {
    if let Err(e) = state.port.send_message(chat, text).await {
        warn!("command reply failed: {e}");
    }
}

/// Resolve a command reference (numeric id, `@handle`, or bare handle) to a
/// member id. Tries the opportunistic directory first, then the platform.
async fn resolve_ref(state: &AppState, chat: ChatId, reference: &str) -> Option<UserId> {
    if let Ok(id) = reference.parse::<i64>() {
        return Some(UserId(id));
    }

    let handle = reference.trim_start_matches('@');
    match state.store.lookup_handle(handle) {
        Ok(Some(id)) => return Some(id),
        Ok(None) => {}
        Err(e) => warn!("handle directory lookup failed: {e}"),
    }

    match state.port.resolve_handle(chat, handle).await {
        Ok(found) => found,
        Err(e) => {
            warn!("platform handle lookup failed: {e}");
            None
        }
    }
}

pub async fn handle_command(_bot: Bot, msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let Some(raw) = msg.text() else {
        return Ok(());
    };
    let Some(cmd) = Command::parse(raw) else {
        return Ok(());
    };

    let actor = UserId(user.id.0 as i64);
    let chat = ChatId(msg.chat.id.0);
    let is_owner = state.moderation.is_owner(actor);

    // Any owner command counts as owner activity.
    if is_owner {
        state.moderation.presence().mark_online();
    }

    if cmd == Command::Start {
        if is_owner {
            reply(&state, chat, "✅ Owner activity noted. The bot is running.").await;
        } else if chat_kind(&msg.chat) == Some(ChatKind::Group) {
            reply(&state, chat, "I'm watching links in this group ✅").await;
        }
        // Non-owner private /start stays silent.
        return Ok(());
    }

    if !is_owner {
        // Silent no-op for non-owners; only the chat-id probe answers.
        if cmd == Command::GetChatId {
            reply(&state, chat, "You are not the owner.").await;
        }
        return Ok(());
    }

    match cmd {
        Command::Start => {}

        Command::GetChatId => {
            reply(&state, chat, &format!("Chat ID for this chat:\n{}", chat.0)).await;
        }

        Command::ListDomains => {
            let listing = state.moderation.list_domains().join("\n");
            reply(&state, chat, &format!("Allowed domains:\n{listing}")).await;
        }

        Command::AddDomain(None) => {
            reply(&state, chat, "Usage: /add_domain example.com").await;
        }
        Command::AddDomain(Some(d)) => {
            let added = state.moderation.add_domain(&d);
            let current = state.moderation.list_domains().join(", ");
            reply(&state, chat, &format!("✅ {added} added. Current: {current}")).await;
        }

        Command::RemoveDomain(None) => {
            reply(&state, chat, "Usage: /remove_domain example.com").await;
        }
        Command::RemoveDomain(Some(d)) => {
            let domain = normalize_domain(&d);
            if state.moderation.remove_domain(&d) {
                let current = state.moderation.list_domains().join(", ");
                reply(&state, chat, &format!("✅ {domain} removed. Current: {current}")).await;
            } else {
                reply(&state, chat, &format!("{domain} is not in the list.")).await;
            }
        }

        Command::Ban(None) => {
            reply(&state, chat, "Usage: /ban <user id or @handle>").await;
        }
        Command::Ban(Some(r)) => {
            let Some(target) = resolve_ref(&state, chat, &r).await else {
                reply(&state, chat, "Member not found.").await;
                return Ok(());
            };
            match state.store.ban(target, "manual by owner") {
                Ok(()) => {
                    // Also remove from the chat the command was issued in.
                    if let Err(e) = state.port.remove_member(chat, target).await {
                        warn!("removing banned member from chat failed: {e}");
                    }
                    reply(&state, chat, &format!("✅ User {} banned.", target.0)).await;
                }
                Err(e) => {
                    warn!("recording ban failed: {e}");
                    reply(&state, chat, "Failed to record the ban.").await;
                }
            }
        }

        Command::Unban(None) => {
            reply(&state, chat, "Usage: /unban <user id or @handle>").await;
        }
        Command::Unban(Some(r)) => {
            let Some(target) = resolve_ref(&state, chat, &r).await else {
                reply(&state, chat, "Member not found.").await;
                return Ok(());
            };
            match state.store.unban(target) {
                Ok(()) => reply(&state, chat, &format!("✅ User {} unbanned.", target.0)).await,
                Err(e) => {
                    warn!("clearing ban failed: {e}");
                    reply(&state, chat, "Failed to clear the ban.").await;
                }
            }
        }

        Command::Kick(None) => {
            reply(&state, chat, "Usage: /kick <user id or @handle>").await;
        }
        Command::Kick(Some(r)) => {
            let Some(target) = resolve_ref(&state, chat, &r).await else {
                reply(&state, chat, "Member not found.").await;
                return Ok(());
            };
            // Kick is transient: remove from the chat, no ban record, so the
            // member may rejoin without owner pre-clearance.
            if let Err(e) = state.port.remove_member(chat, target).await {
                warn!("kick removal failed: {e}");
            }
            let title = msg.chat.title().unwrap_or("this group");
            let notice = format!(
                "⚠️ You were kicked from '{title}'.\nContact the admin to be re-invited."
            );
            if let Err(e) = state.port.send_message(ChatId(target.0), &notice).await {
                warn!("kick notice undeliverable: {e}");
            }
            reply(&state, chat, &format!("✅ User {} kicked.", target.0)).await;
        }

        Command::Add(None) => {
            reply(&state, chat, "Usage: /add <user id or @handle>").await;
        }
        Command::Add(Some(r)) => {
            let Some(target) = resolve_ref(&state, chat, &r).await else {
                reply(&state, chat, "Member not found.").await;
                return Ok(());
            };
            // Pre-clearance for a manual re-invite by the owner.
            match state.store.unban(target) {
                Ok(()) => {
                    reply(
                        &state,
                        chat,
                        &format!("✅ User {} can now be re-added to the group.", target.0),
                    )
                    .await;
                }
                Err(e) => {
                    warn!("clearing ban failed: {e}");
                    reply(&state, chat, "Failed to clear the ban.").await;
                }
            }
        }

        Command::SetOwner(None) => {
            reply(&state, chat, "Usage: /set_owner <numeric user id>").await;
        }
        Command::SetOwner(Some(arg)) => match arg.parse::<i64>() {
            Ok(id) if id != 0 => {
                state.moderation.set_owner(UserId(id));
                reply(&state, chat, &format!("✅ New owner set: {id}")).await;
            }
            _ => {
                reply(&state, chat, "Please provide a numeric user id.").await;
            }
        },
    }

    Ok(())
}
