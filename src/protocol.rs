//! Inbound message boundary.
//!
//! The transport hands the session one [`InboundMessage`] per protocol line:
//! who sent it, the command (or three-digit numeric) and the parameters, with
//! the trailing parameter kept whole.

use crate::error::{Result, SessionError};

/// `nick!user@host` as seen in a message prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDescriptor {
    pub nick: String,
    pub username: Option<String>,
    pub host: Option<String>,
}

impl UserDescriptor {
    pub fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            username: None,
            host: None,
        }
    }

    /// Parse `nick`, `nick@host` or `nick!user@host`.
    pub fn parse(raw: &str) -> Self {
        let (nick_user, host) = match raw.split_once('@') {
            Some((left, host)) => (left, non_empty(host)),
            None => (raw, None),
        };
        let (nick, username) = match nick_user.split_once('!') {
            Some((nick, user)) => (nick, non_empty(user)),
            None => (nick_user, None),
        };
        Self {
            nick: nick.to_string(),
            username,
            host,
        }
    }
}

/// Origin of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    User(UserDescriptor),
    Server(String),
}

impl Source {
    /// Classify a raw prefix. A bare name containing a dot is a server.
    pub fn parse(raw: &str) -> Self {
        if !raw.contains('!') && !raw.contains('@') && raw.contains('.') {
            Source::Server(raw.to_string())
        } else {
            Source::User(UserDescriptor::parse(raw))
        }
    }

    pub fn nick(&self) -> Option<&str> {
        match self {
            Source::User(user) => Some(&user.nick),
            Source::Server(_) => None,
        }
    }
}

/// One protocol message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub source: Option<Source>,
    pub command: String,
    pub params: Vec<String>,
}

impl InboundMessage {
    pub fn new<S: Into<String>>(source: Option<Source>, command: &str, params: impl IntoIterator<Item = S>) -> Self {
        Self {
            source,
            command: command.to_ascii_uppercase(),
            params: params.into_iter().map(Into::into).collect(),
        }
    }

    /// Tokenize a raw protocol line (without the trailing CRLF).
    ///
    /// Message tags are skipped. Everything after the first ` :` that follows
    /// the command is a single trailing parameter.
    pub fn parse(line: &str) -> Result<Self> {
        let mut rest = line.trim_end_matches(['\r', '\n']);

        if let Some(tagged) = rest.strip_prefix('@') {
            rest = tagged.split_once(' ').map(|(_, r)| r).unwrap_or("");
        }
        rest = rest.trim_start_matches(' ');

        let mut source = None;
        if let Some(prefixed) = rest.strip_prefix(':') {
            let (prefix, r) = prefixed.split_once(' ').unwrap_or((prefixed, ""));
            if prefix.is_empty() {
                return Err(SessionError::malformed("<line>", "empty prefix"));
            }
            source = Some(Source::parse(prefix));
            rest = r.trim_start_matches(' ');
        }

        let (command, params) = split_command(rest);
        if command.is_empty() {
            return Err(SessionError::malformed("<line>", "missing command"));
        }

        Ok(Self {
            source,
            command: command.to_ascii_uppercase(),
            params,
        })
    }

    /// Convert a message produced by the `irc` crate's transport.
    pub fn from_irc(message: &irc::proto::Message) -> Self {
        use irc::proto::Prefix;

        let source = message.prefix.as_ref().map(|prefix| match prefix {
            Prefix::ServerName(name) => Source::Server(name.clone()),
            Prefix::Nickname(nick, user, host) => Source::User(UserDescriptor {
                nick: nick.clone(),
                username: non_empty(user),
                host: non_empty(host),
            }),
        });

        let line = String::from(&message.command);
        let (command, params) = split_command(&line);

        Self {
            source,
            command: command.to_ascii_uppercase(),
            params,
        }
    }

    /// Nick of the sender, if it was a user.
    pub fn source_nick(&self) -> Option<&str> {
        self.source.as_ref().and_then(Source::nick)
    }

    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Numeric code, if the command is a three-digit reply.
    pub fn numeric(&self) -> Option<u16> {
        crate::reply::parse_numeric(&self.command)
    }
}

fn split_command(line: &str) -> (String, Vec<String>) {
    let (command, mut rest) = line.split_once(' ').unwrap_or((line, ""));
    let mut params = Vec::new();
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            break;
        }
        if let Some(trailing) = rest.strip_prefix(':') {
            params.push(trailing.to_string());
            break;
        }
        match rest.split_once(' ') {
            Some((middle, r)) => {
                params.push(middle.to_string());
                rest = r;
            }
            None => {
                params.push(rest.to_string());
                break;
            }
        }
    }
    (command.to_string(), params)
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}
