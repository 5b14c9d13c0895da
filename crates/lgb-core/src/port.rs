use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    Result,
};

/// Hexagonal port for the chat platform.
///
/// Telegram is the first implementation; every call is fallible and
/// fire-and-forget from the moderation engine's perspective. The effect
/// dispatcher logs failures and moves on.
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    /// Remove a member from a chat without a permanent platform ban, so a
    /// later re-invite by the owner works.
    async fn remove_member(&self, chat: ChatId, user: UserId) -> Result<()>;

    async fn send_message(&self, target: ChatId, text: &str) -> Result<()>;

    /// Best-effort handle lookup on the platform; `Ok(None)` means the handle
    /// could not be resolved, which callers report as "member not found".
    async fn resolve_handle(&self, chat: ChatId, handle: &str) -> Result<Option<UserId>>;
}
