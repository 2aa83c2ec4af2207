//! Error types for the session layer.

use thiserror::Error;

/// Errors raised by the session model and its resolvers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// A resolver was handed an empty identifier. Nothing was mutated.
    #[error("invalid argument: {what} must not be empty")]
    InvalidArgument { what: &'static str },

    /// An inbound message lacked something its command requires.
    #[error("malformed {command} message: {reason}")]
    MalformedProtocolData { command: String, reason: String },
}

impl SessionError {
    pub(crate) fn malformed(command: &str, reason: impl Into<String>) -> Self {
        Self::MalformedProtocolData {
            command: command.to_string(),
            reason: reason.into(),
        }
    }
}

/// Errors raised while building a [`ReplyRegistry`](crate::reply::ReplyRegistry).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("reply code {code} is already registered as {existing}")]
    DuplicateCode { code: u16, existing: &'static str },

    #[error("{name} has code {expected}, cannot register it under {code}")]
    CodeMismatch {
        code: u16,
        name: &'static str,
        expected: u16,
    },

    #[error("reply registry has no entries")]
    Empty,
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
