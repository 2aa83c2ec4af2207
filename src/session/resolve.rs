//! Identity resolution: turning nicks and channel names into the canonical
//! shared records.

use super::Connection;
use crate::casemap::CaseMapping;
use crate::error::{Result, SessionError};
use crate::model::{Channel, User, UserUpdate};
use crate::protocol::UserDescriptor;

pub(super) const INITIAL_PRUNE_AT: usize = 64;

impl Connection {
    /// Find the record for `nick`, or create a detached one.
    ///
    /// As long as any handle to a user is alive (a channel membership or a
    /// clone held by the application), resolving its nick again returns the
    /// same record.
    pub fn resolve_user(&mut self, nick: &str) -> Result<User> {
        if nick.is_empty() {
            return Err(SessionError::InvalidArgument { what: "nick" });
        }
        if let Some(user) = self.find_user(nick) {
            return Ok(user);
        }
        let user = User::new(nick);
        self.index_user(&user);
        Ok(user)
    }

    /// Like [`resolve_user`](Self::resolve_user), then merge the username and
    /// host from the descriptor.
    pub fn resolve_user_descriptor(&mut self, descriptor: &UserDescriptor) -> Result<User> {
        let user = self.resolve_user(&descriptor.nick)?;
        user.merge(UserUpdate {
            username: descriptor.username.clone(),
            hostname: descriptor.host.clone(),
            ..UserUpdate::default()
        });
        Ok(user)
    }

    /// The joined channel named `name`, or an untracked empty placeholder.
    pub fn resolve_channel(&self, name: &str) -> Result<Channel> {
        if name.is_empty() {
            return Err(SessionError::InvalidArgument { what: "channel name" });
        }
        Ok(self
            .channel(name)
            .unwrap_or_else(|| Channel::with_case_mapping(name, self.case_mapping)))
    }

    /// The joined channel named `name`.
    pub fn channel(&self, name: &str) -> Option<Channel> {
        self.channels.get(&self.case_mapping.fold(name)).cloned()
    }

    pub fn is_joined(&self, name: &str) -> bool {
        self.channels.contains_key(&self.case_mapping.fold(name))
    }

    pub(super) fn find_user(&self, nick: &str) -> Option<User> {
        let key = self.case_mapping.fold(nick);
        if let Some(user) = self.users.get(&key).and_then(|weak| weak.upgrade()) {
            return Some(user);
        }
        self.channels.values().find_map(|channel| channel.member(nick))
    }

    pub(super) fn is_local(&self, nick: &str) -> bool {
        self.case_mapping.equals(nick, &self.nickname)
    }

    /// Track a newly joined channel. Returns `None` if it was already joined.
    pub(super) fn insert_channel(&mut self, name: &str) -> Option<Channel> {
        let key = self.case_mapping.fold(name);
        if self.channels.contains_key(&key) {
            return None;
        }
        let channel = Channel::with_case_mapping(name, self.case_mapping);
        self.channels.insert(key, channel.clone());
        Some(channel)
    }

    pub(super) fn remove_channel(&mut self, name: &str) -> Option<Channel> {
        self.channels.remove(&self.case_mapping.fold(name))
    }

    /// Rename a user everywhere. The record itself is renamed, so every
    /// handle sees the new nick.
    pub(super) fn rename_user(&mut self, old_nick: &str, new_nick: &str) {
        if self.is_local(old_nick) {
            self.nickname = new_nick.to_string();
        }
        let Some(user) = self.find_user(old_nick) else {
            return;
        };
        user.rename(new_nick);
        for channel in self.channels.values() {
            channel.rename_member(old_nick, new_nick);
        }
        self.users.remove(&self.case_mapping.fold(old_nick));
        self.index_user(&user);
    }

    /// Drop a user from every channel and from the nick index. Handles still
    /// held elsewhere keep the old record, but the nick no longer resolves
    /// to it.
    pub(super) fn forget_user(&mut self, nick: &str) {
        for channel in self.channels.values() {
            channel.remove_member(nick);
        }
        self.users.remove(&self.case_mapping.fold(nick));
    }

    pub(super) fn set_case_mapping(&mut self, mapping: CaseMapping) {
        if mapping == self.case_mapping {
            return;
        }
        tracing::debug!(from = %self.case_mapping, to = %mapping, "switching case mapping");
        self.case_mapping = mapping;

        let channels = std::mem::take(&mut self.channels);
        self.channels = channels
            .into_values()
            .map(|channel| {
                channel.set_case_mapping(mapping);
                (mapping.fold(&channel.name()), channel)
            })
            .collect();

        let users = std::mem::take(&mut self.users);
        self.users = users
            .into_values()
            .filter_map(|weak| weak.upgrade())
            .map(|user| (mapping.fold(&user.nick()), user.downgrade()))
            .collect();
    }

    fn index_user(&mut self, user: &User) {
        if self.users.len() >= self.prune_at {
            self.users.retain(|_, weak| weak.is_alive());
            self.prune_at = (self.users.len() * 2).max(INITIAL_PRUNE_AT);
        }
        self.users.insert(self.case_mapping.fold(&user.nick()), user.downgrade());
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::connection;
    use super::*;

    #[test]
    fn test_resolve_same_nick_twice_is_same_instance() {
        let mut conn = connection("me");
        let a = conn.resolve_user("alice").unwrap();
        let b = conn.resolve_user("Alice").unwrap();
        assert!(a.same(&b));
    }

    #[test]
    fn test_resolve_finds_channel_member() {
        let mut conn = connection("me");
        let channel = conn.insert_channel("#rust").unwrap();
        let member = User::new("bob");
        channel.add_member(member.clone());
        let resolved = conn.resolve_user("BOB").unwrap();
        assert!(resolved.same(&member));
    }

    #[test]
    fn test_dropped_user_is_recreated() {
        let mut conn = connection("me");
        let first = conn.resolve_user("carol").unwrap();
        first.merge(UserUpdate {
            username: Some("c".into()),
            ..UserUpdate::default()
        });
        drop(first);
        let second = conn.resolve_user("carol").unwrap();
        assert_eq!(second.username(), None);
    }

    #[test]
    fn test_descriptor_merge_keeps_existing_username() {
        let mut conn = connection("me");
        let user = conn
            .resolve_user_descriptor(&UserDescriptor::parse("dave!dv@old.host"))
            .unwrap();
        let again = conn
            .resolve_user_descriptor(&UserDescriptor {
                nick: "dave".into(),
                username: None,
                host: Some("new.host".into()),
            })
            .unwrap();
        assert!(user.same(&again));
        assert_eq!(user.username().as_deref(), Some("dv"));
        assert_eq!(user.hostname().as_deref(), Some("new.host"));
    }

    #[test]
    fn test_empty_identifiers_rejected() {
        let mut conn = connection("me");
        assert_eq!(
            conn.resolve_user("").unwrap_err(),
            SessionError::InvalidArgument { what: "nick" }
        );
        assert!(matches!(
            conn.resolve_channel(""),
            Err(SessionError::InvalidArgument { .. })
        ));
        assert!(conn.users.is_empty());
    }

    #[test]
    fn test_placeholder_channel_not_tracked() {
        let mut conn = connection("me");
        let placeholder = conn.resolve_channel("#elsewhere").unwrap();
        assert!(placeholder.is_empty());
        assert!(conn.channels().is_empty());
        assert!(conn.channel("#elsewhere").is_none());

        let joined = conn.insert_channel("#Here").unwrap();
        assert!(conn.resolve_channel("#here").unwrap().same(&joined));
        assert!(conn.insert_channel("#HERE").is_none());
    }

    #[test]
    fn test_rename_keeps_identity() {
        let mut conn = connection("me");
        let channel = conn.insert_channel("#rust").unwrap();
        let user = conn.resolve_user("old").unwrap();
        channel.add_member(user.clone());

        conn.rename_user("old", "new");
        assert_eq!(user.nick(), "new");
        assert!(channel.member("new").is_some_and(|u| u.same(&user)));
        assert!(conn.resolve_user("new").unwrap().same(&user));
        assert!(!conn.resolve_user("old").unwrap().same(&user));
    }

    #[test]
    fn test_forget_detaches_held_handle() {
        let mut conn = connection("me");
        let channel = conn.insert_channel("#rust").unwrap();
        let held = conn.resolve_user("Eve").unwrap();
        channel.add_member(held.clone());

        conn.forget_user("eve");
        assert!(!channel.has_member("eve"));
        assert!(!conn.resolve_user("EVE").unwrap().same(&held));
    }

    #[test]
    fn test_rename_local_nick() {
        let mut conn = connection("me");
        conn.rename_user("ME", "myself");
        assert_eq!(conn.nickname(), "myself");
    }

    #[test]
    fn test_index_is_pruned() {
        let mut conn = connection("me");
        for i in 0..INITIAL_PRUNE_AT * 3 {
            conn.resolve_user(&format!("ghost{}", i)).unwrap();
        }
        assert!(conn.users.len() <= INITIAL_PRUNE_AT);
    }

    #[test]
    fn test_case_mapping_switch_rekeys_everything() {
        let mut conn = connection("me");
        let channel = conn.insert_channel("#a[b]").unwrap();
        let user = conn.resolve_user("x[y]").unwrap();
        channel.add_member(user.clone());
        assert!(conn.is_joined("#A{B}"));

        conn.set_case_mapping(CaseMapping::Ascii);
        assert!(!conn.is_joined("#A{B}"));
        assert!(conn.is_joined("#A[B]"));
        assert!(conn.resolve_user("X[Y]").unwrap().same(&user));
        assert!(!conn.resolve_user("x{y}").unwrap().same(&user));
    }
}
