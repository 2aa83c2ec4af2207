use super::user::User;
use crate::casemap::CaseMapping;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Modes that carry a list entry or a member status rather than a channel
/// setting; they never show up in the channel's mode string.
const LIST_AND_STATUS_MODES: &str = "beIovhqa";

#[derive(Debug)]
struct ChannelInfo {
    name: String,
    topic: Option<String>,
    modes: String,
    mapping: CaseMapping,
    /// Keyed by folded nick, which also gives the name ordering.
    members: BTreeMap<String, User>,
}

/// Shared handle to a channel.
///
/// A channel the connection has joined is tracked by the
/// [`Connection`](crate::session::Connection). Resolving a channel that was
/// never joined yields an empty placeholder that is not tracked anywhere.
#[derive(Clone)]
pub struct Channel {
    inner: Arc<RwLock<ChannelInfo>>,
}

impl Channel {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_case_mapping(name, CaseMapping::default())
    }

    pub fn with_case_mapping(name: impl Into<String>, mapping: CaseMapping) -> Self {
        Self {
            inner: Arc::new(RwLock::new(ChannelInfo {
                name: name.into(),
                topic: None,
                modes: String::new(),
                mapping,
                members: BTreeMap::new(),
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.read().name.clone()
    }

    pub fn topic(&self) -> Option<String> {
        self.inner.read().topic.clone()
    }

    pub fn set_topic(&self, topic: Option<String>) {
        self.inner.write().topic = topic.filter(|t| !t.is_empty());
    }

    /// Channel setting modes, e.g. `+nt`. Empty until the server reports them.
    pub fn modes(&self) -> String {
        self.inner.read().modes.clone()
    }

    pub fn set_modes(&self, modes: &str) {
        let mut letters = String::new();
        for c in modes.chars().filter(|c| c.is_ascii_alphabetic()) {
            if !LIST_AND_STATUS_MODES.contains(c) && !letters.contains(c) {
                letters.push(c);
            }
        }
        self.inner.write().modes = if letters.is_empty() {
            String::new()
        } else {
            format!("+{}", letters)
        };
    }

    /// Apply a MODE change such as `+k-s` to the mode string.
    pub fn apply_mode_change(&self, change: &str) {
        let current = self.modes();
        let mut letters: Vec<char> = current.chars().filter(|c| *c != '+').collect();
        let mut adding = true;
        for c in change.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                c if LIST_AND_STATUS_MODES.contains(c) => {}
                c if c.is_ascii_alphabetic() => {
                    letters.retain(|l| *l != c);
                    if adding {
                        letters.push(c);
                    }
                }
                _ => {}
            }
        }
        let letters: String = letters.into_iter().collect();
        self.set_modes(&letters);
    }

    /// Members ordered by folded nick.
    pub fn members(&self) -> Vec<User> {
        self.inner.read().members.values().cloned().collect()
    }

    pub fn member(&self, nick: &str) -> Option<User> {
        let info = self.inner.read();
        info.members.get(&info.mapping.fold(nick)).cloned()
    }

    pub fn has_member(&self, nick: &str) -> bool {
        self.member(nick).is_some()
    }

    pub fn member_count(&self) -> usize {
        self.inner.read().members.len()
    }

    /// True for placeholders and for channels whose NAMES list hasn't
    /// arrived yet.
    pub fn is_empty(&self) -> bool {
        self.inner.read().members.is_empty()
    }

    pub fn same(&self, other: &Channel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Insert `user` unless a member with that nick is already present.
    /// Returns true if the user was added.
    pub(crate) fn add_member(&self, user: User) -> bool {
        let mut info = self.inner.write();
        let key = info.mapping.fold(&user.nick());
        if info.members.contains_key(&key) {
            return false;
        }
        info.members.insert(key, user);
        true
    }

    pub(crate) fn remove_member(&self, nick: &str) -> Option<User> {
        let mut info = self.inner.write();
        let key = info.mapping.fold(nick);
        info.members.remove(&key)
    }

    /// Re-key a member after a nick change. The user record has already been
    /// renamed by the caller.
    pub(crate) fn rename_member(&self, old_nick: &str, new_nick: &str) -> bool {
        let mut info = self.inner.write();
        let old_key = info.mapping.fold(old_nick);
        match info.members.remove(&old_key) {
            Some(user) => {
                let new_key = info.mapping.fold(new_nick);
                info.members.insert(new_key, user);
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_case_mapping(&self, mapping: CaseMapping) {
        let mut info = self.inner.write();
        if info.mapping == mapping {
            return;
        }
        info.mapping = mapping;
        let members = std::mem::take(&mut info.members);
        info.members = members
            .into_values()
            .map(|user| (mapping.fold(&user.nick()), user))
            .collect();
    }
}

impl fmt::Debug for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.inner.read();
        f.debug_struct("Channel")
            .field("name", &info.name)
            .field("topic", &info.topic)
            .field("modes", &info.modes)
            .field("members", &info.members.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner.read().name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_members_sorted_by_nick() {
        let channel = Channel::new("#rust");
        channel.add_member(User::new("zed"));
        channel.add_member(User::new("Amy"));
        channel.add_member(User::new("mike"));
        let nicks: Vec<String> = channel.members().iter().map(User::nick).collect();
        assert_eq!(nicks, vec!["Amy", "mike", "zed"]);
    }

    #[test]
    fn test_add_member_rejects_duplicate_nick() {
        let channel = Channel::new("#rust");
        let first = User::new("amy");
        assert!(channel.add_member(first.clone()));
        assert!(!channel.add_member(User::new("AMY")));
        assert!(channel.member("Amy").is_some_and(|u| u.same(&first)));
    }

    #[test]
    fn test_rename_member() {
        let channel = Channel::new("#rust");
        let user = User::new("old");
        channel.add_member(user.clone());
        user.rename("new");
        assert!(channel.rename_member("old", "new"));
        assert!(channel.member("old").is_none());
        assert!(channel.member("NEW").is_some_and(|u| u.same(&user)));
    }

    #[test]
    fn test_modes() {
        let channel = Channel::new("#rust");
        channel.set_modes("+ntk");
        assert_eq!(channel.modes(), "+ntk");
        channel.apply_mode_change("-k+s+o");
        assert_eq!(channel.modes(), "+nts");
        channel.apply_mode_change("-nts");
        assert_eq!(channel.modes(), "");
    }

    #[test]
    fn test_empty_topic_clears() {
        let channel = Channel::new("#rust");
        channel.set_topic(Some("hello".into()));
        assert_eq!(channel.topic().as_deref(), Some("hello"));
        channel.set_topic(Some(String::new()));
        assert_eq!(channel.topic(), None);
    }

    #[test]
    fn test_case_mapping_rekeys() {
        let channel = Channel::new("#rust");
        channel.add_member(User::new("a[b]"));
        assert!(channel.has_member("A{B}"));
        channel.set_case_mapping(CaseMapping::Ascii);
        assert!(!channel.has_member("A{B}"));
        assert!(channel.has_member("A[B]"));
    }
}
