//! Session state and typed event dispatch for IRC clients.
//!
//! A [`Connection`] consumes the raw message stream of one server connection,
//! keeps a model of joined channels and known users, and republishes the
//! stream as four independently subscribable categories of events.

pub mod action;
pub mod casemap;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod logging;
pub mod model;
pub mod protocol;
pub mod reply;
pub mod session;
pub mod transport;

pub use action::Action;
pub use casemap::CaseMapping;
pub use dispatch::{Dispatcher, ListenerId, ListenerResult};
pub use error::{RegistryError, SessionError};
pub use event::{Category, ConnectionEvent, CtcpEvent, CtcpReply, Destination, MessageKind, PrivateMessageEvent, UnexpectedEvent};
pub use model::{Channel, Message, User};
pub use protocol::InboundMessage;
pub use reply::{build_reply_registry, ReplyKind, ReplyRegistry};
pub use session::{Connection, ConnectionState};
