//! The session aggregate.
//!
//! A [`Connection`] owns everything known about one IRC session: the joined
//! channels and their members, the local nick, and the listener registries.
//! The transport feeds it one message at a time through
//! [`Connection::handle_message`]; the connection updates its model and
//! publishes typed events.

mod ctcp;
mod resolve;
mod translate;

pub use ctcp::{parse_ctcp, split_reply};

use crate::action::Action;
use crate::casemap::CaseMapping;
use crate::config::SessionConfig;
use crate::dispatch::{Dispatcher, ListenerId, ListenerResult};
use crate::event::{ConnectionEvent, CtcpEvent, PrivateMessageEvent, UnexpectedEvent};
use crate::model::user::WeakUser;
use crate::model::{Channel, User};
use crate::protocol::InboundMessage;
use crate::reply::ReplyRegistry;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Lifecycle of a connection. `Disconnected` is terminal; reconnecting means
/// building a new `Connection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Connected,
    Disconnected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        })
    }
}

pub struct Connection {
    nickname: String,
    state: ConnectionState,
    request_modes: bool,
    case_mapping: CaseMapping,
    /// Joined channels keyed by folded name.
    channels: BTreeMap<String, Channel>,
    /// Every user record still referenced somewhere, keyed by folded nick.
    users: HashMap<String, WeakUser>,
    prune_at: usize,
    /// MOTD lines collected between 375 and 376.
    motd: Option<Vec<String>>,
    registry: Arc<ReplyRegistry>,
    dispatcher: Dispatcher,
}

impl Connection {
    pub fn new(nickname: impl Into<String>, registry: Arc<ReplyRegistry>) -> Self {
        Self {
            nickname: nickname.into(),
            state: ConnectionState::Idle,
            request_modes: true,
            case_mapping: CaseMapping::default(),
            channels: BTreeMap::new(),
            users: HashMap::new(),
            prune_at: resolve::INITIAL_PRUNE_AT,
            motd: None,
            registry,
            dispatcher: Dispatcher::new(),
        }
    }

    pub fn from_config(nickname: impl Into<String>, config: &SessionConfig, registry: Arc<ReplyRegistry>) -> Self {
        let mut conn = Self::new(nickname, registry);
        conn.request_modes = config.request_modes;
        conn.case_mapping = config.case_mapping;
        conn
    }

    /// Our current nick, as confirmed by the server once registered.
    pub fn nickname(&self) -> &str {
        &self.nickname
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn case_mapping(&self) -> CaseMapping {
        self.case_mapping
    }

    /// Whether a `MODE <channel>` request is issued right after joining.
    pub fn request_modes(&self) -> bool {
        self.request_modes
    }

    pub fn set_request_modes(&mut self, request_modes: bool) {
        self.request_modes = request_modes;
    }

    /// Joined channels, ordered by folded name.
    pub fn channels(&self) -> Vec<Channel> {
        self.channels.values().cloned().collect()
    }

    /// Members of a joined channel, or `None` if we are not in it.
    pub fn channel_members(&self, name: &str) -> Option<Vec<User>> {
        self.channel(name).map(|c| c.members())
    }

    pub fn registry(&self) -> &ReplyRegistry {
        &self.registry
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn on_connection<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ConnectionEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.dispatcher.connection().subscribe(listener)
    }

    pub fn on_private_message<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&PrivateMessageEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.dispatcher.private_message().subscribe(listener)
    }

    pub fn on_ctcp<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&CtcpEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.dispatcher.ctcp().subscribe(listener)
    }

    pub fn on_unexpected<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&UnexpectedEvent) -> ListenerResult + Send + Sync + 'static,
    {
        self.dispatcher.unexpected().subscribe(listener)
    }

    /// The transport has started connecting. Only valid from `Idle`.
    pub fn mark_connecting(&mut self) -> bool {
        if self.state != ConnectionState::Idle {
            tracing::warn!(state = %self.state, "mark_connecting ignored");
            return false;
        }
        self.state = ConnectionState::Connecting;
        true
    }

    /// The transport is gone. Publishes [`ConnectionEvent::Lost`] the first
    /// time and moves to the terminal state.
    pub fn handle_disconnect(&mut self, reason: &str) {
        if self.state == ConnectionState::Disconnected {
            return;
        }
        tracing::info!(nick = %self.nickname, reason, "connection lost");
        self.state = ConnectionState::Disconnected;
        self.motd = None;
        self.dispatcher.connection().publish(&ConnectionEvent::Lost {
            reason: reason.to_string(),
        });
    }

    /// Translate one inbound message. Returns the requests the host should
    /// send back to the server.
    pub fn handle_message(&mut self, msg: &InboundMessage) -> Vec<Action> {
        if self.state == ConnectionState::Disconnected {
            tracing::warn!(command = %msg.command, "message after disconnect ignored");
            return Vec::new();
        }
        let mut actions = Vec::new();
        self.translate(msg, &mut actions);
        actions
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("nickname", &self.nickname)
            .field("state", &self.state)
            .field("case_mapping", &self.case_mapping)
            .field("channels", &self.channels.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::reply::build_reply_registry;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub(crate) fn connection(nick: &str) -> Connection {
        Connection::new(nick, Arc::new(build_reply_registry().unwrap()))
    }

    #[test]
    fn test_lifecycle_states() {
        let mut conn = connection("me");
        assert_eq!(conn.state(), ConnectionState::Idle);
        assert!(conn.mark_connecting());
        assert!(!conn.mark_connecting());
        assert_eq!(conn.state(), ConnectionState::Connecting);
    }

    #[test]
    fn test_disconnect_fires_once() {
        let mut conn = connection("me");
        let lost = Arc::new(AtomicUsize::new(0));
        let l = Arc::clone(&lost);
        conn.on_connection(move |event| {
            if matches!(event, ConnectionEvent::Lost { .. }) {
                l.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        });
        conn.handle_disconnect("eof");
        conn.handle_disconnect("eof again");
        assert_eq!(lost.load(Ordering::SeqCst), 1);
        assert_eq!(conn.state(), ConnectionState::Disconnected);

        let msg = InboundMessage::parse(":me!u@h JOIN #late").unwrap();
        assert!(conn.handle_message(&msg).is_empty());
        assert!(conn.channels().is_empty());
    }

    #[test]
    fn test_from_config() {
        let config = SessionConfig {
            request_modes: false,
            case_mapping: CaseMapping::Ascii,
        };
        let conn = Connection::from_config("me", &config, Arc::new(build_reply_registry().unwrap()));
        assert!(!conn.request_modes());
        assert_eq!(conn.case_mapping(), CaseMapping::Ascii);
    }
}
