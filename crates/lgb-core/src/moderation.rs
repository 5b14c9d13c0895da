use std::{
    collections::{BTreeSet, HashSet},
    sync::RwLock,
    time::Duration,
};

use crate::{
    config::Config,
    domain::{ChatId, UserId},
    extractor::normalize_domain,
    presence::OwnerPresence,
};

/// Shared runtime state of the moderation core: the allow-list, the current
/// owner identity, and owner presence.
///
/// The chat scope is fixed at startup; the allow-list and owner id are
/// mutable only through the owner command surface, which is why the locks
/// live here rather than in ambient globals. No lock is held across an
/// await point; every critical section is a read or a single write.
pub struct Moderation {
    scope: HashSet<ChatId>,
    domains: RwLock<BTreeSet<String>>,
    owner: RwLock<UserId>,
    presence: OwnerPresence,
}

impl Moderation {
    pub fn new(
        scope: HashSet<ChatId>,
        domains: BTreeSet<String>,
        owner: UserId,
        owner_timeout: Duration,
    ) -> Self {
        Self {
            scope,
            domains: RwLock::new(domains),
            owner: RwLock::new(owner),
            presence: OwnerPresence::new(owner_timeout),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.allowed_chat_ids.iter().map(|&id| ChatId(id)).collect(),
            cfg.allowed_domains.clone(),
            UserId(cfg.owner_id),
            cfg.owner_timeout,
        )
    }

    /// Empty scope means every chat is moderated.
    pub fn is_chat_moderated(&self, chat: ChatId) -> bool {
        self.scope.is_empty() || self.scope.contains(&chat)
    }

    /// Authorization always reads the current owner, never a cached one.
    pub fn is_owner(&self, user: UserId) -> bool {
        *self.owner.read().expect("owner lock poisoned") == user
    }

    pub fn owner(&self) -> UserId {
        *self.owner.read().expect("owner lock poisoned")
    }

    /// Self-referential authority transfer; callers enforce that only the
    /// current owner reaches this.
    pub fn set_owner(&self, new_owner: UserId) {
        *self.owner.write().expect("owner lock poisoned") = new_owner;
    }

    /// Exact-hostname membership. `sub.example.com` is not `example.com`.
    pub fn is_domain_allowed(&self, domain: &str) -> bool {
        self.domains
            .read()
            .expect("allow-list lock poisoned")
            .contains(domain)
    }

    /// Returns the normalized form that was inserted.
    pub fn add_domain(&self, raw: &str) -> String {
        let domain = normalize_domain(raw);
        self.domains
            .write()
            .expect("allow-list lock poisoned")
            .insert(domain.clone());
        domain
    }

    /// Returns false when the domain was not in the list.
    pub fn remove_domain(&self, raw: &str) -> bool {
        let domain = normalize_domain(raw);
        self.domains
            .write()
            .expect("allow-list lock poisoned")
            .remove(&domain)
    }

    /// Sorted, for listing back to the owner.
    pub fn list_domains(&self) -> Vec<String> {
        self.domains
            .read()
            .expect("allow-list lock poisoned")
            .iter()
            .cloned()
            .collect()
    }

    pub fn presence(&self) -> &OwnerPresence {
        &self.presence
    }
}
