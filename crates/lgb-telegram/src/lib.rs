//! Telegram adapter (teloxide).
//!
//! This crate implements the `lgb-core` ChatPort over the Telegram Bot API.

use async_trait::async_trait;

use teloxide::{prelude::*, types::Recipient};

use tokio::time::sleep;

pub mod handlers;
pub mod router;

use lgb_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    port::ChatPort,
    Result,
};

#[derive(Clone)]
pub struct TelegramModerator {
    bot: Bot,
}

impl TelegramModerator {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> Bot {
        self.bot.clone()
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_user(user_id: UserId) -> teloxide::types::UserId {
        teloxide::types::UserId(user_id.0 as u64)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn map_err(e: teloxide::RequestError) -> Error {
        Error::External(format!("telegram error: {e}"))
    }

    async fn with_retry<T, Fut>(&self, mut op: impl FnMut() -> Fut) -> Result<T>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, teloxide::RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(e) => match e {
                    teloxide::RequestError::RetryAfter(d) if attempts < MAX_RETRIES => {
                        attempts += 1;
                        sleep(d).await;
                        continue;
                    }
                    other => return Err(Self::map_err(other)),
                },
            }
        }
    }
}

#[async_trait]
impl ChatPort for TelegramModerator {
    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.with_retry(|| {
            self.bot
                .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
        })
        .await?;
        Ok(())
    }

    async fn remove_member(&self, chat: ChatId, user: UserId) -> Result<()> {
        // Ban then immediately unban: the member is kicked out but may be
        // re-invited later, there is no permanent platform ban. Rejoin
        // blocking is the ban store's job, not Telegram's.
        self.with_retry(|| self.bot.ban_chat_member(Self::tg_chat(chat), Self::tg_user(user)))
            .await?;
        self.with_retry(|| {
            self.bot
                .unban_chat_member(Self::tg_chat(chat), Self::tg_user(user))
        })
        .await?;
        Ok(())
    }

    async fn send_message(&self, target: ChatId, text: &str) -> Result<()> {
        self.with_retry(|| self.bot.send_message(Self::tg_chat(target), text.to_string()))
            .await?;
        Ok(())
    }

    async fn resolve_handle(&self, _chat: ChatId, handle: &str) -> Result<Option<UserId>> {
        let target = format!("@{}", handle.trim_start_matches('@'));
        match self.bot.get_chat(Recipient::ChannelUsername(target)).await {
            Ok(chat) => Ok(Some(UserId(chat.id.0))),
            // Unresolvable handles are "member not found", not an error.
            Err(_) => Ok(None),
        }
    }
}
