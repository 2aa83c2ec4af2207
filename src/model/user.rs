use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, Weak};

/// What is currently known about a user.
///
/// Every field except the nick is optional and filled in as WHOIS, WHO and
/// message prefixes trickle in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserInfo {
    pub nick: String,
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub away: Option<bool>,
    pub away_message: Option<String>,
    pub operator: Option<bool>,
}

/// Partial update merged into a [`User`]. `None` means "unknown" and never
/// clears a known value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub hostname: Option<String>,
    pub away: Option<bool>,
    pub away_message: Option<String>,
    pub operator: Option<bool>,
}

/// Shared handle to a user record.
///
/// Clones point at the same record, so a handle obtained from a JOIN sees
/// the username a later WHOIS reply fills in.
#[derive(Clone)]
pub struct User {
    inner: Arc<RwLock<UserInfo>>,
}

impl User {
    pub fn new(nick: impl Into<String>) -> Self {
        Self::from_info(UserInfo {
            nick: nick.into(),
            ..UserInfo::default()
        })
    }

    pub fn from_info(info: UserInfo) -> Self {
        Self {
            inner: Arc::new(RwLock::new(info)),
        }
    }

    pub fn nick(&self) -> String {
        self.inner.read().nick.clone()
    }

    pub fn username(&self) -> Option<String> {
        self.inner.read().username.clone()
    }

    pub fn hostname(&self) -> Option<String> {
        self.inner.read().hostname.clone()
    }

    pub fn is_away(&self) -> Option<bool> {
        self.inner.read().away
    }

    pub fn away_message(&self) -> Option<String> {
        self.inner.read().away_message.clone()
    }

    pub fn is_operator(&self) -> Option<bool> {
        self.inner.read().operator
    }

    /// Copy of the current record.
    pub fn info(&self) -> UserInfo {
        self.inner.read().clone()
    }

    /// True when both handles refer to the same record.
    pub fn same(&self, other: &User) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Merge known values from `update`; unknown values are left alone.
    pub fn merge(&self, update: UserUpdate) {
        let mut info = self.inner.write();
        if update.username.is_some() {
            info.username = update.username;
        }
        if update.hostname.is_some() {
            info.hostname = update.hostname;
        }
        if let Some(away) = update.away {
            info.away = Some(away);
            if !away {
                info.away_message = None;
            }
        }
        if update.away_message.is_some() {
            info.away_message = update.away_message;
        }
        if update.operator.is_some() {
            info.operator = update.operator;
        }
    }

    pub(crate) fn rename(&self, nick: &str) {
        self.inner.write().nick = nick.to_string();
    }

    pub(crate) fn downgrade(&self) -> WeakUser {
        WeakUser(Arc::downgrade(&self.inner))
    }
}

impl fmt::Debug for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner.read(), f)
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let info = self.inner.read();
        match (&info.username, &info.hostname) {
            (Some(user), Some(host)) => write!(f, "{}!{}@{}", info.nick, user, host),
            _ => f.write_str(&info.nick),
        }
    }
}

/// Non-owning handle kept by the nick index.
#[derive(Clone, Debug)]
pub(crate) struct WeakUser(Weak<RwLock<UserInfo>>);

impl WeakUser {
    pub(crate) fn upgrade(&self) -> Option<User> {
        self.0.upgrade().map(|inner| User { inner })
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_keeps_known_username() {
        let user = User::new("alice");
        user.merge(UserUpdate {
            username: Some("ali".into()),
            ..UserUpdate::default()
        });
        user.merge(UserUpdate {
            hostname: Some("example.org".into()),
            ..UserUpdate::default()
        });
        assert_eq!(user.username().as_deref(), Some("ali"));
        assert_eq!(user.hostname().as_deref(), Some("example.org"));
    }

    #[test]
    fn test_clones_share_updates() {
        let user = User::new("bob");
        let other = user.clone();
        other.merge(UserUpdate {
            operator: Some(true),
            ..UserUpdate::default()
        });
        assert_eq!(user.is_operator(), Some(true));
        assert!(user.same(&other));
        assert!(!user.same(&User::new("bob")));
    }

    #[test]
    fn test_back_from_away_clears_message() {
        let user = User::new("carol");
        user.merge(UserUpdate {
            away: Some(true),
            away_message: Some("lunch".into()),
            ..UserUpdate::default()
        });
        assert_eq!(user.away_message().as_deref(), Some("lunch"));
        user.merge(UserUpdate {
            away: Some(false),
            ..UserUpdate::default()
        });
        assert_eq!(user.is_away(), Some(false));
        assert_eq!(user.away_message(), None);
    }

    #[test]
    fn test_display() {
        let user = User::new("dave");
        assert_eq!(user.to_string(), "dave");
        user.merge(UserUpdate {
            username: Some("d".into()),
            hostname: Some("host".into()),
            ..UserUpdate::default()
        });
        assert_eq!(user.to_string(), "dave!d@host");
    }

    #[test]
    fn test_weak_handle_dies_with_last_strong() {
        let user = User::new("erin");
        let weak = user.downgrade();
        assert!(weak.upgrade().is_some_and(|u| u.same(&user)));
        drop(user);
        assert!(!weak.is_alive());
        assert!(weak.upgrade().is_none());
    }
}
