//! Interpretation of inbound messages.
//!
//! A recognized message updates the model and may publish a typed event.
//! Anything else, including recognized but malformed messages, is published
//! to the unexpected category. Nothing here stops the stream.

use super::ctcp::{parse_ctcp, split_reply};
use super::{Connection, ConnectionState};
use crate::action::Action;
use crate::casemap::{casemapping_from_isupport, CaseMapping};
use crate::error::{Result, SessionError};
use crate::event::{ConnectionEvent, CtcpEvent, Destination, MessageKind, PrivateMessageEvent, UnexpectedEvent};
use crate::model::{Message, User, UserUpdate};
use crate::protocol::{InboundMessage, Source, UserDescriptor};
use crate::reply::ReplyKind;

/// Membership prefixes that may precede a nick in a NAMES reply.
const STATUS_PREFIXES: &[char] = &['~', '&', '@', '%', '+'];

enum Outcome {
    Consumed,
    Unrecognized,
}

fn required<'a>(msg: &'a InboundMessage, index: usize) -> Result<&'a str> {
    msg.param(index)
        .ok_or_else(|| SessionError::malformed(&msg.command, format!("missing parameter {}", index)))
}

fn is_channel_name(name: &str) -> bool {
    name.starts_with(['#', '&', '+', '!'])
}

fn strip_motd_prefix(line: &str) -> &str {
    line.strip_prefix("- ").or_else(|| line.strip_prefix('-')).unwrap_or(line)
}

impl Connection {
    pub(super) fn translate(&mut self, msg: &InboundMessage, actions: &mut Vec<Action>) {
        let outcome = match msg.numeric() {
            Some(code) => self.translate_numeric(code, msg),
            None => self.translate_command(msg, actions),
        };
        match outcome {
            Ok(Outcome::Consumed) => {}
            Ok(Outcome::Unrecognized) => self.publish_unexpected(msg),
            Err(e) => {
                tracing::debug!(error = %e, "degrading to unexpected");
                self.publish_unexpected(msg);
            }
        }
    }

    fn translate_command(&mut self, msg: &InboundMessage, actions: &mut Vec<Action>) -> Result<Outcome> {
        match msg.command.as_str() {
            "PING" => {
                self.dispatcher
                    .connection()
                    .publish(&ConnectionEvent::Ping(Message::from_params(&msg.params)));
                Ok(Outcome::Consumed)
            }
            "ERROR" => {
                let message = Message::from_params(&msg.params);
                tracing::warn!(reason = message.text(), "server error");
                self.dispatcher.connection().publish(&ConnectionEvent::Error(message));
                Ok(Outcome::Consumed)
            }
            "JOIN" => self.on_join(msg, actions),
            "PART" => {
                let channel = required(msg, 0)?;
                let nick = self.sender_nick(msg)?;
                Ok(self.on_leave(channel, &nick))
            }
            "KICK" => {
                let channel = required(msg, 0)?;
                let victim = required(msg, 1)?;
                Ok(self.on_leave(channel, victim))
            }
            "QUIT" => {
                let nick = self.sender_nick(msg)?;
                self.forget_user(&nick);
                Ok(Outcome::Consumed)
            }
            "NICK" => {
                let new_nick = required(msg, 0)?;
                let user = self.sender(msg)?;
                let old_nick = user.nick();
                self.rename_user(&old_nick, new_nick);
                Ok(Outcome::Consumed)
            }
            "INVITE" => {
                let channel = self.resolve_channel(required(msg, 1)?)?;
                let user = self.sender(msg)?;
                self.dispatcher
                    .connection()
                    .publish(&ConnectionEvent::Invited { channel, user });
                Ok(Outcome::Consumed)
            }
            "TOPIC" => {
                let Some(channel) = self.channel(required(msg, 0)?) else {
                    return Ok(Outcome::Unrecognized);
                };
                channel.set_topic(msg.param(1).map(str::to_string));
                Ok(Outcome::Consumed)
            }
            "MODE" => {
                let Some(channel) = self.channel(required(msg, 0)?) else {
                    return Ok(Outcome::Unrecognized);
                };
                channel.apply_mode_change(required(msg, 1)?);
                Ok(Outcome::Consumed)
            }
            "PRIVMSG" => self.on_message(MessageKind::Privmsg, msg),
            "NOTICE" => self.on_message(MessageKind::Notice, msg),
            _ => Ok(Outcome::Unrecognized),
        }
    }

    fn translate_numeric(&mut self, code: u16, msg: &InboundMessage) -> Result<Outcome> {
        let Some(kind) = self.registry.lookup(code) else {
            return Ok(Outcome::Unrecognized);
        };
        match kind {
            ReplyKind::RplWelcome => {
                self.nickname = required(msg, 0)?.to_string();
                self.state = ConnectionState::Connected;
                tracing::info!(nick = %self.nickname, "registered");
                self.dispatcher.connection().publish(&ConnectionEvent::Established);
            }
            ReplyKind::RplIsupport => {
                if let Some(value) = casemapping_from_isupport(&msg.params) {
                    match value.parse::<CaseMapping>() {
                        Ok(mapping) => self.set_case_mapping(mapping),
                        Err(e) => tracing::debug!(error = %e, "keeping current case mapping"),
                    }
                }
            }
            ReplyKind::RplMotdstart => self.motd = Some(Vec::new()),
            ReplyKind::RplMotd => {
                let line = strip_motd_prefix(required(msg, 1)?).to_string();
                self.motd.get_or_insert_with(Vec::new).push(line);
            }
            ReplyKind::RplEndofmotd => {
                let lines = self.motd.take().unwrap_or_default();
                let message = Message::from_params(&msg.params).with_lines(lines);
                self.dispatcher.connection().publish(&ConnectionEvent::Motd(message));
            }
            ReplyKind::ErrNomotd => {
                self.motd = None;
                self.dispatcher
                    .connection()
                    .publish(&ConnectionEvent::Motd(Message::from_params(&msg.params)));
            }
            ReplyKind::RplTopic | ReplyKind::RplNotopic => {
                let Some(channel) = self.channel(required(msg, 1)?) else {
                    return Ok(Outcome::Unrecognized);
                };
                let topic = match kind {
                    ReplyKind::RplTopic => Some(required(msg, 2)?.to_string()),
                    _ => None,
                };
                channel.set_topic(topic);
            }
            ReplyKind::RplChannelmodeis => {
                let Some(channel) = self.channel(required(msg, 1)?) else {
                    return Ok(Outcome::Unrecognized);
                };
                channel.set_modes(required(msg, 2)?);
            }
            ReplyKind::RplNamreply => return self.on_names(msg),
            ReplyKind::RplEndofnames | ReplyKind::RplEndofwho | ReplyKind::RplEndofwhois => {}
            ReplyKind::RplWhoisuser => {
                let user = self.resolve_user(required(msg, 1)?)?;
                user.merge(UserUpdate {
                    username: Some(required(msg, 2)?.to_string()),
                    hostname: Some(required(msg, 3)?.to_string()),
                    ..UserUpdate::default()
                });
            }
            ReplyKind::RplWhoisoperator => {
                let user = self.resolve_user(required(msg, 1)?)?;
                user.merge(UserUpdate {
                    operator: Some(true),
                    ..UserUpdate::default()
                });
            }
            ReplyKind::RplAway => {
                let user = self.resolve_user(required(msg, 1)?)?;
                user.merge(UserUpdate {
                    away: Some(true),
                    away_message: msg.param(2).map(str::to_string),
                    ..UserUpdate::default()
                });
            }
            ReplyKind::RplUnaway | ReplyKind::RplNowaway => {
                let nick = self.nickname.clone();
                let user = self.resolve_user(&nick)?;
                user.merge(UserUpdate {
                    away: Some(kind == ReplyKind::RplNowaway),
                    ..UserUpdate::default()
                });
            }
            ReplyKind::RplWhoreply => self.on_who_reply(msg)?,
            _ => return Ok(Outcome::Unrecognized),
        }
        Ok(Outcome::Consumed)
    }

    fn on_join(&mut self, msg: &InboundMessage, actions: &mut Vec<Action>) -> Result<Outcome> {
        let name = required(msg, 0)?;
        let user = self.sender(msg)?;

        if self.is_local(&user.nick()) {
            let Some(channel) = self.insert_channel(name) else {
                tracing::debug!(channel = name, "duplicate join ignored");
                return Ok(Outcome::Consumed);
            };
            tracing::info!(channel = name, "joined");
            self.dispatcher
                .connection()
                .publish(&ConnectionEvent::ChannelJoined(channel));
            if self.request_modes {
                actions.push(Action::RequestModes {
                    channel: name.to_string(),
                });
            }
            return Ok(Outcome::Consumed);
        }

        match self.channel(name) {
            Some(channel) => {
                channel.add_member(user);
                Ok(Outcome::Consumed)
            }
            None => Ok(Outcome::Unrecognized),
        }
    }

    /// PART or KICK of `nick` from `name`.
    fn on_leave(&mut self, name: &str, nick: &str) -> Outcome {
        if self.is_local(nick) {
            match self.remove_channel(name) {
                Some(channel) => {
                    tracing::info!(channel = name, "left");
                    self.dispatcher
                        .connection()
                        .publish(&ConnectionEvent::ChannelLeft(channel));
                }
                None => tracing::debug!(channel = name, "leave for channel not joined"),
            }
            return Outcome::Consumed;
        }
        match self.channel(name) {
            Some(channel) => {
                channel.remove_member(nick);
                Outcome::Consumed
            }
            None => Outcome::Unrecognized,
        }
    }

    fn on_names(&mut self, msg: &InboundMessage) -> Result<Outcome> {
        if msg.params.len() < 3 {
            return Err(SessionError::malformed(&msg.command, "too few parameters"));
        }
        let name = &msg.params[msg.params.len() - 2];
        let Some(channel) = self.channel(name) else {
            return Ok(Outcome::Unrecognized);
        };
        for entry in msg.params[msg.params.len() - 1].split_whitespace() {
            let entry = entry.trim_start_matches(STATUS_PREFIXES);
            if entry.is_empty() {
                continue;
            }
            let user = self.resolve_user_descriptor(&UserDescriptor::parse(entry))?;
            channel.add_member(user);
        }
        Ok(Outcome::Consumed)
    }

    /// `<me> <channel> <user> <host> <server> <nick> <flags> :<hops> <realname>`
    fn on_who_reply(&mut self, msg: &InboundMessage) -> Result<()> {
        let flags = required(msg, 6)?;
        let user = self.resolve_user(required(msg, 5)?)?;
        user.merge(UserUpdate {
            username: Some(required(msg, 2)?.to_string()),
            hostname: Some(required(msg, 3)?.to_string()),
            away: Some(flags.starts_with('G')),
            operator: Some(flags.contains('*')),
            ..UserUpdate::default()
        });
        if let Some(channel) = self.channel(required(msg, 1)?) {
            channel.add_member(user);
        }
        Ok(())
    }

    fn on_message(&mut self, kind: MessageKind, msg: &InboundMessage) -> Result<Outcome> {
        let target = required(msg, 0)?;
        let text = required(msg, 1)?;
        let sender = self.sender(msg)?;

        if let Some((command, arguments)) = parse_ctcp(text) {
            let destination = self.ctcp_destination(target)?;
            let event = match kind {
                MessageKind::Privmsg => CtcpEvent::Request {
                    sender,
                    destination,
                    command,
                    arguments,
                },
                MessageKind::Notice => CtcpEvent::Reply {
                    sender,
                    destination,
                    reply: split_reply(&command, &arguments),
                },
            };
            self.dispatcher.ctcp().publish(&event);
            return Ok(Outcome::Consumed);
        }

        let Some(destination) = self.private_destination(target)? else {
            return Ok(Outcome::Unrecognized);
        };
        self.dispatcher.private_message().publish(&PrivateMessageEvent {
            kind,
            sender,
            destination,
            message: Message::new(text, msg.params.clone()),
        });
        Ok(Outcome::Consumed)
    }

    /// Us or a joined channel; anything else is not a private message.
    fn private_destination(&mut self, target: &str) -> Result<Option<Destination>> {
        if self.is_local(target) {
            return Ok(Some(Destination::User(self.resolve_user(target)?)));
        }
        Ok(self.channel(target).map(Destination::Channel))
    }

    fn ctcp_destination(&mut self, target: &str) -> Result<Destination> {
        if let Some(destination) = self.private_destination(target)? {
            return Ok(destination);
        }
        if is_channel_name(target) {
            Ok(Destination::Channel(self.resolve_channel(target)?))
        } else {
            Ok(Destination::User(self.resolve_user(target)?))
        }
    }

    /// Resolve the message source. A server source is treated as a user named
    /// after the server.
    fn sender(&mut self, msg: &InboundMessage) -> Result<User> {
        match &msg.source {
            Some(Source::User(descriptor)) => self.resolve_user_descriptor(descriptor),
            Some(Source::Server(name)) => self.resolve_user(name),
            None => Err(SessionError::malformed(&msg.command, "missing source")),
        }
    }

    fn sender_nick(&self, msg: &InboundMessage) -> Result<String> {
        match &msg.source {
            Some(Source::User(descriptor)) => Ok(descriptor.nick.clone()),
            Some(Source::Server(name)) => Ok(name.clone()),
            None => Err(SessionError::malformed(&msg.command, "missing source")),
        }
    }

    fn publish_unexpected(&self, msg: &InboundMessage) {
        let numeric = msg.numeric();
        self.dispatcher.unexpected().publish(&UnexpectedEvent {
            command: msg.command.clone(),
            numeric,
            reply: numeric.and_then(|code| self.registry.lookup(code)),
            args: msg.params.clone(),
        });
    }
}
