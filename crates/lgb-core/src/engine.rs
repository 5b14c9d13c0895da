use crate::{
    domain::{ChatId, ChatKind, MessageId, MessageRef, Sender, UserId},
    extractor::extract_domains,
    moderation::Moderation,
    store::BanStore,
    Result,
};

/// An inbound text-bearing message, already lifted out of the transport's
/// update type.
#[derive(Clone, Debug)]
pub struct MessageEvent {
    pub chat: ChatId,
    pub kind: ChatKind,
    pub chat_title: Option<String>,
    pub message_id: MessageId,
    pub sender: Sender,
    pub text: Option<String>,
    pub caption: Option<String>,
}

impl MessageEvent {
    pub fn message_ref(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat,
            message_id: self.message_id,
        }
    }
}

/// A member joining a group, carried by the platform's join system message.
#[derive(Clone, Debug)]
pub struct JoinEvent {
    pub chat: ChatId,
    pub chat_title: Option<String>,
    pub message_id: MessageId,
    pub member: Sender,
}

/// What the engine decided for one event. Pure data; the side effects are
/// expanded separately so tests can assert them without a transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// No action; the message stands.
    Ignore,
    /// The sender is the current owner: presence was refreshed, nothing to
    /// moderate.
    OwnerSeen,
    /// An already-banned member posted (race with removal, or rejoined):
    /// remove again, no new record, no notice.
    RemoveSilently,
    /// Private message while the owner is unreachable: warn the sender,
    /// then delete.
    WarnAndDelete,
    /// First disallowed domain found in the message.
    Violation { domain: String },
    /// A banned member tried to rejoin a moderated group.
    RemoveAndAnnounce,
}

/// One side effect to perform against the chat platform or the ban store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    DeleteMessage(MessageRef),
    RemoveMember { chat: ChatId, user: UserId },
    RecordBan { user: UserId, reason: String },
    Notify { target: ChatId, text: String },
}

/// Classify one inbound message. Consults the ban store and the shared
/// moderation state, touches nothing else; the only mutation is refreshing
/// owner presence when the owner is the actor.
pub fn evaluate_message(
    mods: &Moderation,
    store: &BanStore,
    event: &MessageEvent,
) -> Result<Decision> {
    match event.kind {
        ChatKind::Private => {
            if mods.is_owner(event.sender.id) {
                mods.presence().mark_online();
                return Ok(Decision::OwnerSeen);
            }
            if mods.presence().is_online() {
                Ok(Decision::Ignore)
            } else {
                Ok(Decision::WarnAndDelete)
            }
        }
        ChatKind::Group => {
            if !mods.is_chat_moderated(event.chat) {
                return Ok(Decision::Ignore);
            }
            if store.is_banned(event.sender.id)? {
                return Ok(Decision::RemoveSilently);
            }
            if mods.is_owner(event.sender.id) {
                mods.presence().mark_online();
                return Ok(Decision::OwnerSeen);
            }

            // One action per message: the first offending domain wins and the
            // rest are not evaluated.
            for part in [event.text.as_deref(), event.caption.as_deref()] {
                let Some(part) = part else { continue };
                for domain in extract_domains(part) {
                    if !mods.is_domain_allowed(&domain) {
                        return Ok(Decision::Violation { domain });
                    }
                }
            }

            Ok(Decision::Ignore)
        }
    }
}

/// Classify one newly joined member. Enforces that a ban persists across
/// leave/rejoin cycles without requiring the member to post first.
pub fn evaluate_join(mods: &Moderation, store: &BanStore, join: &JoinEvent) -> Result<Decision> {
    if !mods.is_chat_moderated(join.chat) {
        return Ok(Decision::Ignore);
    }
    if store.is_banned(join.member.id)? {
        return Ok(Decision::RemoveAndAnnounce);
    }
    Ok(Decision::Ignore)
}

/// Expand a message decision into its ordered side-effect list.
pub fn message_effects(decision: &Decision, event: &MessageEvent) -> Vec<Effect> {
    let title = group_title(event.chat_title.as_deref());
    match decision {
        Decision::Ignore | Decision::OwnerSeen => Vec::new(),

        Decision::RemoveSilently => vec![Effect::RemoveMember {
            chat: event.chat,
            user: event.sender.id,
        }],

        Decision::WarnAndDelete => vec![
            Effect::Notify {
                target: event.chat,
                text: "⚠️ The owner is offline right now. Your message will not be seen, \
                       please try again later."
                    .to_string(),
            },
            Effect::DeleteMessage(event.message_ref()),
        ],

        Decision::Violation { domain } => vec![
            Effect::DeleteMessage(event.message_ref()),
            Effect::RemoveMember {
                chat: event.chat,
                user: event.sender.id,
            },
            Effect::RecordBan {
                user: event.sender.id,
                reason: format!("shared disallowed domain: {domain}"),
            },
            Effect::Notify {
                target: event.chat,
                text: format!(
                    "🚫 {} was removed from '{title}' for sharing a disallowed link.",
                    event.sender.mention()
                ),
            },
            // Telegram private chats share the user's numeric id. May be
            // undeliverable (privacy settings); dispatch treats that as
            // any other transport failure.
            Effect::Notify {
                target: ChatId(event.sender.id.0),
                text: format!(
                    "⚠️ You were removed from '{title}' for sharing a link that is not \
                     allowed there.\nContact a group admin to be re-invited."
                ),
            },
        ],

        // Join-only decision; no message counterpart.
        Decision::RemoveAndAnnounce => Vec::new(),
    }
}

/// Expand a join decision into its ordered side-effect list.
pub fn join_effects(decision: &Decision, join: &JoinEvent) -> Vec<Effect> {
    match decision {
        Decision::RemoveAndAnnounce => vec![
            Effect::DeleteMessage(MessageRef {
                chat_id: join.chat,
                message_id: join.message_id,
            }),
            Effect::RemoveMember {
                chat: join.chat,
                user: join.member.id,
            },
            Effect::Notify {
                target: join.chat,
                text: format!(
                    "🚫 {} is banned from this group and cannot join.",
                    join.member.mention()
                ),
            },
        ],
        _ => Vec::new(),
    }
}

fn group_title(title: Option<&str>) -> String {
    title.unwrap_or("this group").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, time::Duration};

    fn tmp_store(prefix: &str) -> BanStore {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        let path = PathBuf::from(format!("/tmp/{prefix}-{}-{ts}.sqlite3", std::process::id()));
        BanStore::open(path).unwrap()
    }

    fn mods_with(scope: &[i64], domains: &[&str]) -> Moderation {
        Moderation::new(
            scope.iter().map(|&id| ChatId(id)).collect(),
            domains.iter().map(|s| s.to_string()).collect(),
            UserId(1),
            Duration::from_secs(300),
        )
    }

    fn sender(id: i64) -> Sender {
        Sender {
            id: UserId(id),
            handle: Some(format!("user{id}")),
            display: format!("User {id}"),
        }
    }

    fn group_msg(chat: i64, from: i64, text: &str) -> MessageEvent {
        MessageEvent {
            chat: ChatId(chat),
            kind: ChatKind::Group,
            chat_title: Some("Test Group".to_string()),
            message_id: MessageId(10),
            sender: sender(from),
            text: Some(text.to_string()),
            caption: None,
        }
    }

    fn private_msg(from: i64, text: &str) -> MessageEvent {
        MessageEvent {
            chat: ChatId(from),
            kind: ChatKind::Private,
            chat_title: None,
            message_id: MessageId(10),
            sender: sender(from),
            text: Some(text.to_string()),
            caption: None,
        }
    }

    #[test]
    fn disallowed_domain_is_a_violation_with_full_effect_list() {
        let mods = mods_with(&[-100], &["julfikar.me"]);
        let store = tmp_store("lgb-engine-violation");
        let event = group_msg(-100, 42, "check https://evil.com/x now");

        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(
            decision,
            Decision::Violation {
                domain: "evil.com".to_string()
            }
        );

        let effects = message_effects(&decision, &event);
        assert_eq!(effects.len(), 5);
        assert_eq!(effects[0], Effect::DeleteMessage(event.message_ref()));
        assert_eq!(
            effects[1],
            Effect::RemoveMember {
                chat: ChatId(-100),
                user: UserId(42)
            }
        );
        match &effects[2] {
            Effect::RecordBan { user, reason } => {
                assert_eq!(*user, UserId(42));
                assert!(reason.contains("evil.com"));
            }
            other => panic!("expected RecordBan, got {other:?}"),
        }
        match &effects[3] {
            Effect::Notify { target, text } => {
                assert_eq!(*target, ChatId(-100));
                assert!(text.contains("@user42"));
                assert!(text.contains("Test Group"));
            }
            other => panic!("expected group Notify, got {other:?}"),
        }
        match &effects[4] {
            Effect::Notify { target, .. } => assert_eq!(*target, ChatId(42)),
            other => panic!("expected private Notify, got {other:?}"),
        }
    }

    #[test]
    fn allowed_domains_pass_regardless_of_count_or_case() {
        let mods = mods_with(&[-100], &["julfikar.me"]);
        let store = tmp_store("lgb-engine-allowed");
        let event = group_msg(
            -100,
            42,
            "see https://julfikar.me/page and https://WWW.Julfikar.ME/other",
        );

        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(decision, Decision::Ignore);
        assert!(message_effects(&decision, &event).is_empty());
    }

    #[test]
    fn first_offending_domain_wins() {
        let mods = mods_with(&[], &["ok.org"]);
        let store = tmp_store("lgb-engine-first");
        let event = group_msg(-100, 42, "https://ok.org https://bad1.com https://bad2.com");

        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(
            decision,
            Decision::Violation {
                domain: "bad1.com".to_string()
            }
        );
    }

    #[test]
    fn lookalike_domains_do_not_bypass_the_allow_list() {
        let mods = mods_with(&[], &["julfikar.me"]);
        let store = tmp_store("lgb-engine-lookalike");

        for url in ["https://julfikar.me.evil.com/x", "https://notjulfikar.me/x"] {
            let event = group_msg(-100, 42, url);
            let decision = evaluate_message(&mods, &store, &event).unwrap();
            assert!(
                matches!(decision, Decision::Violation { .. }),
                "{url} should violate"
            );
        }
    }

    #[test]
    fn captions_are_scanned_too() {
        let mods = mods_with(&[], &["ok.org"]);
        let store = tmp_store("lgb-engine-caption");
        let mut event = group_msg(-100, 42, "no links in the text");
        event.caption = Some("but https://evil.com in the caption".to_string());

        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(
            decision,
            Decision::Violation {
                domain: "evil.com".to_string()
            }
        );
    }

    #[test]
    fn no_links_no_action() {
        let mods = mods_with(&[], &[]);
        let store = tmp_store("lgb-engine-nolinks");
        let event = group_msg(-100, 42, "perfectly ordinary chatter");
        assert_eq!(
            evaluate_message(&mods, &store, &event).unwrap(),
            Decision::Ignore
        );
    }

    #[test]
    fn banned_sender_is_removed_silently() {
        let mods = mods_with(&[], &["julfikar.me"]);
        let store = tmp_store("lgb-engine-banned");
        store.ban(UserId(42), "earlier violation").unwrap();

        // Even a clean message gets the sender removed, with no new record
        // and no notification.
        let event = group_msg(-100, 42, "hello again");
        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(decision, Decision::RemoveSilently);

        let effects = message_effects(&decision, &event);
        assert_eq!(
            effects,
            vec![Effect::RemoveMember {
                chat: ChatId(-100),
                user: UserId(42)
            }]
        );
    }

    #[test]
    fn out_of_scope_groups_are_ignored_entirely() {
        let mods = mods_with(&[-100], &[]);
        let store = tmp_store("lgb-engine-scope");
        store.ban(UserId(42), "banned elsewhere").unwrap();

        let event = group_msg(-999, 42, "https://evil.com");
        assert_eq!(
            evaluate_message(&mods, &store, &event).unwrap(),
            Decision::Ignore
        );
    }

    #[test]
    fn owner_is_exempt_and_marks_presence() {
        let mods = mods_with(&[], &[]);
        let store = tmp_store("lgb-engine-owner");
        assert!(!mods.presence().is_online());

        let event = group_msg(-100, 1, "https://anything.example/x");
        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(decision, Decision::OwnerSeen);
        assert!(message_effects(&decision, &event).is_empty());
        assert!(mods.presence().is_online());
    }

    #[test]
    fn private_gating_follows_owner_presence() {
        let mods = mods_with(&[], &[]);
        let store = tmp_store("lgb-engine-private");

        // Owner offline: warn and delete, in that order.
        let event = private_msg(42, "anyone there?");
        let decision = evaluate_message(&mods, &store, &event).unwrap();
        assert_eq!(decision, Decision::WarnAndDelete);
        let effects = message_effects(&decision, &event);
        assert_eq!(effects.len(), 2);
        assert!(matches!(&effects[0], Effect::Notify { target, .. } if *target == ChatId(42)));
        assert_eq!(effects[1], Effect::DeleteMessage(event.message_ref()));

        // Any owner activity flips presence; the same message now stands.
        let owner_event = private_msg(1, "I'm here");
        assert_eq!(
            evaluate_message(&mods, &store, &owner_event).unwrap(),
            Decision::OwnerSeen
        );
        assert_eq!(
            evaluate_message(&mods, &store, &event).unwrap(),
            Decision::Ignore
        );
    }

    #[test]
    fn banned_member_rejoining_is_removed_and_announced() {
        let mods = mods_with(&[-100], &[]);
        let store = tmp_store("lgb-engine-join");
        store.ban(UserId(7), "shared disallowed domain: evil.com").unwrap();

        let join = JoinEvent {
            chat: ChatId(-100),
            chat_title: Some("Test Group".to_string()),
            message_id: MessageId(77),
            member: sender(7),
        };

        let decision = evaluate_join(&mods, &store, &join).unwrap();
        assert_eq!(decision, Decision::RemoveAndAnnounce);

        let effects = join_effects(&decision, &join);
        assert_eq!(effects.len(), 3);
        assert!(matches!(effects[0], Effect::DeleteMessage(_)));
        assert_eq!(
            effects[1],
            Effect::RemoveMember {
                chat: ChatId(-100),
                user: UserId(7)
            }
        );
        assert!(matches!(&effects[2], Effect::Notify { target, .. } if *target == ChatId(-100)));
    }

    #[test]
    fn clean_member_joins_freely() {
        let mods = mods_with(&[], &[]);
        let store = tmp_store("lgb-engine-join-clean");
        let join = JoinEvent {
            chat: ChatId(-100),
            chat_title: None,
            message_id: MessageId(77),
            member: sender(8),
        };
        assert_eq!(evaluate_join(&mods, &store, &join).unwrap(), Decision::Ignore);
    }

    #[test]
    fn join_outside_scope_is_ignored() {
        let mods = mods_with(&[-100], &[]);
        let store = tmp_store("lgb-engine-join-scope");
        store.ban(UserId(7), "x").unwrap();

        let join = JoinEvent {
            chat: ChatId(-500),
            chat_title: None,
            message_id: MessageId(77),
            member: sender(7),
        };
        assert_eq!(evaluate_join(&mods, &store, &join).unwrap(), Decision::Ignore);
    }
}
