use tracing::warn;

use crate::{engine::Effect, port::ChatPort, store::BanStore};

/// Execute a decision's side effects, each one best-effort.
///
/// A failed transport call (permission denied, member already gone, target
/// blocked the bot) is logged and must not stop the remaining effects; no
/// rollback, no retry. Ban-store writes get the same treatment so a storage
/// hiccup cannot take down the event loop.
pub async fn dispatch(effects: Vec<Effect>, port: &dyn ChatPort, store: &BanStore) {
    for effect in effects {
        match effect {
            Effect::DeleteMessage(msg) => {
                if let Err(e) = port.delete_message(msg).await {
                    warn!("delete_message failed for {msg:?}: {e}");
                }
            }
            Effect::RemoveMember { chat, user } => {
                if let Err(e) = port.remove_member(chat, user).await {
                    warn!("remove_member failed for {user:?} in {chat:?}: {e}");
                }
            }
            Effect::RecordBan { user, reason } => {
                if let Err(e) = store.ban(user, &reason) {
                    warn!("recording ban for {user:?} failed: {e}");
                }
            }
            Effect::Notify { target, text } => {
                if let Err(e) = port.send_message(target, &text).await {
                    warn!("notify to {target:?} failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatId, MessageId, MessageRef, UserId},
        errors::Error,
        Result,
    };
    use async_trait::async_trait;
    use std::{
        path::PathBuf,
        sync::Mutex,
    };

    /// Records every call; any call whose label is in `failing` errors out.
    #[derive(Default)]
    struct FlakyPort {
        calls: Mutex<Vec<String>>,
        failing: Vec<&'static str>,
    }

    impl FlakyPort {
        fn record(&self, label: &str) -> Result<()> {
            self.calls.lock().unwrap().push(label.to_string());
            if self.failing.contains(&label) {
                return Err(Error::External(format!("{label} rejected")));
            }
            Ok(())
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatPort for FlakyPort {
        async fn delete_message(&self, _msg: MessageRef) -> Result<()> {
            self.record("delete")
        }

        async fn remove_member(&self, _chat: ChatId, _user: UserId) -> Result<()> {
            self.record("remove")
        }

        async fn send_message(&self, _target: ChatId, _text: &str) -> Result<()> {
            self.record("send")
        }

        async fn resolve_handle(&self, _chat: ChatId, _handle: &str) -> Result<Option<UserId>> {
            Ok(None)
        }
    }

    fn tmp_store(prefix: &str) -> BanStore {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = PathBuf::from(format!("/tmp/{prefix}-{}-{ts}.sqlite3", std::process::id()));
        BanStore::open(path).unwrap()
    }

    fn violation_effects() -> Vec<Effect> {
        let msg = MessageRef {
            chat_id: ChatId(-100),
            message_id: MessageId(10),
        };
        vec![
            Effect::DeleteMessage(msg),
            Effect::RemoveMember {
                chat: ChatId(-100),
                user: UserId(42),
            },
            Effect::RecordBan {
                user: UserId(42),
                reason: "shared disallowed domain: evil.com".to_string(),
            },
            Effect::Notify {
                target: ChatId(-100),
                text: "group notice".to_string(),
            },
            Effect::Notify {
                target: ChatId(42),
                text: "private notice".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn all_effects_run_in_order() {
        let port = FlakyPort::default();
        let store = tmp_store("lgb-fx-ok");

        dispatch(violation_effects(), &port, &store).await;

        assert_eq!(port.calls(), vec!["delete", "remove", "send", "send"]);
        assert!(store.is_banned(UserId(42)).unwrap());
    }

    #[tokio::test]
    async fn one_failing_effect_does_not_block_the_rest() {
        // The member blocked the bot: the private notice is undeliverable,
        // but the delete/remove/ban/group-notice must all still happen.
        let port = FlakyPort {
            failing: vec!["delete", "send"],
            ..Default::default()
        };
        let store = tmp_store("lgb-fx-flaky");

        dispatch(violation_effects(), &port, &store).await;

        assert_eq!(port.calls(), vec!["delete", "remove", "send", "send"]);
        assert!(store.is_banned(UserId(42)).unwrap());
    }
}
