//! Socket side of the host: a live server connection built on the `irc` crate.

pub mod connection;

pub use connection::{spawn_connection, Transport, TransportEvent};
