/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// Whether an update arrived in a one-to-one chat or a (super)group.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
}

/// The author of an inbound message or the subject of a join event.
#[derive(Clone, Debug)]
pub struct Sender {
    pub id: UserId,
    pub handle: Option<String>,
    pub display: String,
}

impl Sender {
    /// How the member is named in group notices: `@handle` when known,
    /// otherwise the display name.
    pub fn mention(&self) -> String {
        match &self.handle {
            Some(h) => format!("@{h}"),
            None => self.display.clone(),
        }
    }
}
