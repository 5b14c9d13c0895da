use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

#[derive(Debug, Default)]
struct PresenceState {
    online: bool,
    last_seen: Option<Instant>,
}

/// Liveness heuristic for the owner, used only to branch private-chat
/// behavior.
///
/// `mark_online` fires on any observed owner activity; `is_online` lazily
/// expires the flag once the last activity falls outside the timeout window.
/// There is no background timer since the state is only read at
/// message-handling time.
pub struct OwnerPresence {
    timeout: Duration,
    state: Mutex<PresenceState>,
}

impl OwnerPresence {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            state: Mutex::new(PresenceState::default()),
        }
    }

    pub fn mark_online(&self) {
        self.mark_online_at(Instant::now());
    }

    pub fn mark_online_at(&self, now: Instant) {
        let mut st = self.state.lock().expect("presence lock poisoned");
        st.online = true;
        st.last_seen = Some(now);
    }

    pub fn is_online(&self) -> bool {
        self.is_online_at(Instant::now())
    }

    pub fn is_online_at(&self, now: Instant) -> bool {
        let mut st = self.state.lock().expect("presence lock poisoned");
        if !st.online {
            return false;
        }
        match st.last_seen {
            Some(seen) if now.duration_since(seen) > self.timeout => {
                st.online = false;
                false
            }
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_offline() {
        let presence = OwnerPresence::new(Duration::from_secs(300));
        assert!(!presence.is_online());
    }

    #[test]
    fn online_until_timeout_then_expires() {
        let start = Instant::now();
        let timeout = Duration::from_secs(300);
        let presence = OwnerPresence::new(timeout);

        presence.mark_online_at(start);
        assert!(presence.is_online_at(start + timeout - Duration::from_secs(1)));
        assert!(!presence.is_online_at(start + timeout + Duration::from_secs(1)));

        // Expiry is sticky until the next activity.
        assert!(!presence.is_online_at(start + timeout - Duration::from_secs(1)));
    }

    #[test]
    fn activity_resets_the_window() {
        let start = Instant::now();
        let timeout = Duration::from_secs(300);
        let presence = OwnerPresence::new(timeout);

        presence.mark_online_at(start);
        presence.mark_online_at(start + Duration::from_secs(299));
        assert!(presence.is_online_at(start + Duration::from_secs(500)));
    }
}
