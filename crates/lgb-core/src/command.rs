/// An owner command, parsed from message text.
///
/// Parsing is pure; authorization and execution happen at the handler layer,
/// which must check the actor against the *current* owner identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Start,
    GetChatId,
    ListDomains,
    AddDomain(Option<String>),
    RemoveDomain(Option<String>),
    Ban(Option<String>),
    Unban(Option<String>),
    Kick(Option<String>),
    Add(Option<String>),
    SetOwner(Option<String>),
}

impl Command {
    /// Parse `/cmd@botname arg ...` message text. Unknown commands and
    /// non-command text return `None` and are left to other handlers.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if !trimmed.starts_with('/') {
            return None;
        }

        let mut parts = trimmed.splitn(2, char::is_whitespace);
        let first = parts.next().unwrap_or("").trim();
        let rest = parts.next().unwrap_or("").trim();

        // Telegram may send `/cmd@botname arg1 ...`
        let cmd = first
            .trim_start_matches('/')
            .split('@')
            .next()
            .unwrap_or("")
            .to_lowercase();

        // Every current command takes at most one argument.
        let arg = rest.split_whitespace().next().map(|s| s.to_string());

        let parsed = match cmd.as_str() {
            "start" => Self::Start,
            "get_chat_id" => Self::GetChatId,
            "list_domains" => Self::ListDomains,
            "add_domain" => Self::AddDomain(arg),
            "remove_domain" => Self::RemoveDomain(arg),
            "ban" => Self::Ban(arg),
            "unban" => Self::Unban(arg),
            "kick" => Self::Kick(arg),
            "add" => Self::Add(arg),
            "set_owner" => Self::SetOwner(arg),
            _ => return None,
        };
        Some(parsed)
    }
}
