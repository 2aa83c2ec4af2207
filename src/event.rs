//! Typed notifications published by a [`Connection`](crate::session::Connection).
//!
//! Each category has its own payload type and its own listener registry, so a
//! private-message listener never sees CTCP or lifecycle traffic.

use crate::model::{Channel, Message, User};
use crate::reply::ReplyKind;
use std::fmt;

/// The four independent listener categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Connection,
    PrivateMessage,
    Ctcp,
    Unexpected,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Connection => "connection",
            Category::PrivateMessage => "private-message",
            Category::Ctcp => "ctcp",
            Category::Unexpected => "unexpected",
        })
    }
}

/// Connection lifecycle notifications.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// The server accepted registration (`RPL_WELCOME`).
    Established,
    /// The transport went away. Fired once; the connection is finished.
    Lost { reason: String },
    /// The server sent `ERROR`.
    Error(Message),
    /// The complete message of the day. The lines are in
    /// [`Message::lines`], empty when the server has no MOTD.
    Motd(Message),
    Ping(Message),
    ChannelJoined(Channel),
    ChannelLeft(Channel),
    Invited { channel: Channel, user: User },
}

/// Where a message was addressed: us directly, or a channel.
#[derive(Debug, Clone)]
pub enum Destination {
    User(User),
    Channel(Channel),
}

impl Destination {
    pub fn user(&self) -> Option<&User> {
        match self {
            Destination::User(user) => Some(user),
            Destination::Channel(_) => None,
        }
    }

    pub fn channel(&self) -> Option<&Channel> {
        match self {
            Destination::Channel(channel) => Some(channel),
            Destination::User(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Privmsg,
    Notice,
}

#[derive(Debug, Clone)]
pub struct PrivateMessageEvent {
    pub kind: MessageKind,
    pub sender: User,
    pub destination: Destination,
    pub message: Message,
}

/// Parsed CTCP reply arguments.
///
/// Replies conventionally look like `ERRMSG xyz :bla`, where `xyz` echoes
/// the query and `bla` is the answer. When the ` :` delimiter is missing
/// neither part is set and only `arguments` carries the text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CtcpReply {
    pub command: String,
    pub arguments: String,
    pub query: Option<String>,
    pub answer: Option<String>,
}

#[derive(Debug, Clone)]
pub enum CtcpEvent {
    /// A CTCP request arrived in a PRIVMSG.
    Request {
        sender: User,
        destination: Destination,
        command: String,
        arguments: String,
    },
    /// A CTCP reply arrived in a NOTICE.
    Reply {
        sender: User,
        destination: Destination,
        reply: CtcpReply,
    },
}

/// Anything the translator did not recognize, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnexpectedEvent {
    pub command: String,
    /// Set when `command` is a three-digit numeric.
    pub numeric: Option<u16>,
    /// Set when the numeric is known to the reply registry.
    pub reply: Option<ReplyKind>,
    pub args: Vec<String>,
}
