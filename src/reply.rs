//! Numeric reply registry.
//!
//! Maps the three-digit numeric codes a server sends in place of a command
//! name to a symbolic [`ReplyKind`]. Codes are sparse (001-005, 200-502), so
//! the registry stores them in a dense table indexed by `code - min` and
//! answers lookups in constant time. Codes outside the table are simply not
//! found.

use crate::error::RegistryError;
use std::fmt;

macro_rules! replies {
    ($($variant:ident = $code:literal => $name:literal,)+) => {
        /// A numeric reply known to the registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum ReplyKind {
            $($variant,)+
        }

        impl ReplyKind {
            /// Every known reply, one canonical name per code.
            pub const ALL: &'static [ReplyKind] = &[$(ReplyKind::$variant,)+];

            pub const fn code(self) -> u16 {
                match self {
                    $(ReplyKind::$variant => $code,)+
                }
            }

            /// Symbolic protocol name, e.g. `RPL_WELCOME`.
            pub const fn name(self) -> &'static str {
                match self {
                    $(ReplyKind::$variant => $name,)+
                }
            }
        }
    };
}

replies! {
    // Registration burst.
    RplWelcome = 1 => "RPL_WELCOME",
    RplYourhost = 2 => "RPL_YOURHOST",
    RplCreated = 3 => "RPL_CREATED",
    RplMyinfo = 4 => "RPL_MYINFO",
    RplIsupport = 5 => "RPL_ISUPPORT",
    // Trace, stats and server information.
    RplTracelink = 200 => "RPL_TRACELINK",
    RplTraceconnecting = 201 => "RPL_TRACECONNECTING",
    RplTracehandshake = 202 => "RPL_TRACEHANDSHAKE",
    RplTraceunknown = 203 => "RPL_TRACEUNKNOWN",
    RplTraceoperator = 204 => "RPL_TRACEOPERATOR",
    RplTraceuser = 205 => "RPL_TRACEUSER",
    RplTraceserver = 206 => "RPL_TRACESERVER",
    RplTracenewtype = 208 => "RPL_TRACENEWTYPE",
    RplTraceclass = 209 => "RPL_TRACECLASS",
    RplStatslinkinfo = 211 => "RPL_STATSLINKINFO",
    RplStatscommands = 212 => "RPL_STATSCOMMANDS",
    RplStatscline = 213 => "RPL_STATSCLINE",
    RplStatsnline = 214 => "RPL_STATSNLINE",
    RplStatsiline = 215 => "RPL_STATSILINE",
    RplStatskline = 216 => "RPL_STATSKLINE",
    RplStatsqline = 217 => "RPL_STATSQLINE",
    RplStatsyline = 218 => "RPL_STATSYLINE",
    RplEndofstats = 219 => "RPL_ENDOFSTATS",
    RplUmodeis = 221 => "RPL_UMODEIS",
    RplServiceinfo = 231 => "RPL_SERVICEINFO",
    RplEndofservices = 232 => "RPL_ENDOFSERVICES",
    RplService = 233 => "RPL_SERVICE",
    RplServlist = 234 => "RPL_SERVLIST",
    RplServlistend = 235 => "RPL_SERVLISTEND",
    RplStatslline = 241 => "RPL_STATSLLINE",
    RplStatsuptime = 242 => "RPL_STATSUPTIME",
    RplStatsoline = 243 => "RPL_STATSOLINE",
    RplStatshline = 244 => "RPL_STATSHLINE",
    RplLuserclient = 251 => "RPL_LUSERCLIENT",
    RplLuserop = 252 => "RPL_LUSEROP",
    RplLuserunknown = 253 => "RPL_LUSERUNKNOWN",
    RplLuserchannels = 254 => "RPL_LUSERCHANNELS",
    RplLuserme = 255 => "RPL_LUSERME",
    RplAdminme = 256 => "RPL_ADMINME",
    RplAdminemail = 259 => "RPL_ADMINEMAIL",
    RplTracelog = 261 => "RPL_TRACELOG",
    // Command replies.
    RplNone = 300 => "RPL_NONE",
    RplAway = 301 => "RPL_AWAY",
    RplUserhost = 302 => "RPL_USERHOST",
    RplIson = 303 => "RPL_ISON",
    RplUnaway = 305 => "RPL_UNAWAY",
    RplNowaway = 306 => "RPL_NOWAWAY",
    RplWhoisuser = 311 => "RPL_WHOISUSER",
    RplWhoisserver = 312 => "RPL_WHOISSERVER",
    RplWhoisoperator = 313 => "RPL_WHOISOPERATOR",
    RplWhowasuser = 314 => "RPL_WHOWASUSER",
    RplEndofwho = 315 => "RPL_ENDOFWHO",
    RplWhoischanop = 316 => "RPL_WHOISCHANOP",
    RplWhoisidle = 317 => "RPL_WHOISIDLE",
    RplEndofwhois = 318 => "RPL_ENDOFWHOIS",
    RplWhoischannels = 319 => "RPL_WHOISCHANNELS",
    RplListstart = 321 => "RPL_LISTSTART",
    RplList = 322 => "RPL_LIST",
    RplListend = 323 => "RPL_LISTEND",
    RplChannelmodeis = 324 => "RPL_CHANNELMODEIS",
    RplWhoisauthname = 330 => "RPL_WHOISAUTHNAME",
    RplNotopic = 331 => "RPL_NOTOPIC",
    RplTopic = 332 => "RPL_TOPIC",
    RplTopicinfo = 333 => "RPL_TOPICINFO",
    RplInviting = 341 => "RPL_INVITING",
    RplSummoning = 342 => "RPL_SUMMONING",
    RplVersion = 351 => "RPL_VERSION",
    RplWhoreply = 352 => "RPL_WHOREPLY",
    RplNamreply = 353 => "RPL_NAMREPLY",
    RplKilldone = 361 => "RPL_KILLDONE",
    RplClosing = 362 => "RPL_CLOSING",
    RplCloseend = 363 => "RPL_CLOSEEND",
    RplLinks = 364 => "RPL_LINKS",
    RplEndoflinks = 365 => "RPL_ENDOFLINKS",
    RplEndofnames = 366 => "RPL_ENDOFNAMES",
    RplBanlist = 367 => "RPL_BANLIST",
    RplEndofbanlist = 368 => "RPL_ENDOFBANLIST",
    RplEndofwhowas = 369 => "RPL_ENDOFWHOWAS",
    RplInfo = 371 => "RPL_INFO",
    RplMotd = 372 => "RPL_MOTD",
    RplInfostart = 373 => "RPL_INFOSTART",
    RplEndofinfo = 374 => "RPL_ENDOFINFO",
    RplMotdstart = 375 => "RPL_MOTDSTART",
    RplEndofmotd = 376 => "RPL_ENDOFMOTD",
    RplYoureoper = 381 => "RPL_YOUREOPER",
    RplRehashing = 382 => "RPL_REHASHING",
    RplMyportis = 384 => "RPL_MYPORTIS",
    RplTime = 391 => "RPL_TIME",
    RplUsersstart = 392 => "RPL_USERSSTART",
    RplUsers = 393 => "RPL_USERS",
    RplEndofusers = 394 => "RPL_ENDOFUSERS",
    RplNousers = 395 => "RPL_NOUSERS",
    // Errors.
    ErrNosuchnick = 401 => "ERR_NOSUCHNICK",
    ErrNosuchserver = 402 => "ERR_NOSUCHSERVER",
    ErrNosuchchannel = 403 => "ERR_NOSUCHCHANNEL",
    ErrCannotsendtochan = 404 => "ERR_CANNOTSENDTOCHAN",
    ErrToomanychannels = 405 => "ERR_TOOMANYCHANNELS",
    ErrWasnosuchnick = 406 => "ERR_WASNOSUCHNICK",
    ErrToomanytargets = 407 => "ERR_TOOMANYTARGETS",
    ErrNoorigin = 409 => "ERR_NOORIGIN",
    ErrNorecipient = 411 => "ERR_NORECIPIENT",
    ErrNotexttosend = 412 => "ERR_NOTEXTTOSEND",
    ErrNotoplevel = 413 => "ERR_NOTOPLEVEL",
    ErrWildtoplevel = 414 => "ERR_WILDTOPLEVEL",
    ErrUnknowncommand = 421 => "ERR_UNKNOWNCOMMAND",
    ErrNomotd = 422 => "ERR_NOMOTD",
    ErrNoadmininfo = 423 => "ERR_NOADMININFO",
    ErrFileerror = 424 => "ERR_FILEERROR",
    ErrNonicknamegiven = 431 => "ERR_NONICKNAMEGIVEN",
    ErrErroneusnickname = 432 => "ERR_ERRONEUSNICKNAME",
    ErrNicknameinuse = 433 => "ERR_NICKNAMEINUSE",
    ErrNickcollision = 436 => "ERR_NICKCOLLISION",
    ErrUsernotinchannel = 441 => "ERR_USERNOTINCHANNEL",
    ErrNotonchannel = 442 => "ERR_NOTONCHANNEL",
    ErrUseronchannel = 443 => "ERR_USERONCHANNEL",
    ErrNologin = 444 => "ERR_NOLOGIN",
    ErrSummondisabled = 445 => "ERR_SUMMONDISABLED",
    ErrUsersdisabled = 446 => "ERR_USERSDISABLED",
    ErrNotregistered = 451 => "ERR_NOTREGISTERED",
    ErrNeedmoreparams = 461 => "ERR_NEEDMOREPARAMS",
    ErrAlreadyregistred = 462 => "ERR_ALREADYREGISTRED",
    ErrNopermforhost = 463 => "ERR_NOPERMFORHOST",
    ErrPasswdmismatch = 464 => "ERR_PASSWDMISMATCH",
    ErrYourebannedcreep = 465 => "ERR_YOUREBANNEDCREEP",
    ErrYouwillbebanned = 466 => "ERR_YOUWILLBEBANNED",
    ErrKeyset = 467 => "ERR_KEYSET",
    ErrChannelisfull = 471 => "ERR_CHANNELISFULL",
    ErrUnknownmode = 472 => "ERR_UNKNOWNMODE",
    ErrInviteonlychan = 473 => "ERR_INVITEONLYCHAN",
    ErrBannedfromchan = 474 => "ERR_BANNEDFROMCHAN",
    ErrBadchannelkey = 475 => "ERR_BADCHANNELKEY",
    ErrBadchanmask = 476 => "ERR_BADCHANMASK",
    ErrNoprivileges = 481 => "ERR_NOPRIVILEGES",
    ErrChanoprivsneeded = 482 => "ERR_CHANOPRIVSNEEDED",
    ErrCantkillserver = 483 => "ERR_CANTKILLSERVER",
    ErrNooperhost = 491 => "ERR_NOOPERHOST",
    ErrNoservicehost = 492 => "ERR_NOSERVICEHOST",
    ErrUmodeunknownflag = 501 => "ERR_UMODEUNKNOWNFLAG",
    ErrUsersdontmatch = 502 => "ERR_USERSDONTMATCH",
}

impl ReplyKind {
    /// Error replies live in the 400-599 range.
    pub const fn is_error(self) -> bool {
        self.code() >= 400
    }
}

impl fmt::Display for ReplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:03})", self.name(), self.code())
    }
}

/// Collects `(code, kind)` pairs before the lookup table is allocated.
#[derive(Debug, Default)]
pub struct ReplyRegistryBuilder {
    entries: Vec<(u16, ReplyKind)>,
}

impl ReplyRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `kind` under `code`.
    ///
    /// Each code may carry exactly one symbolic name, and the kind must agree
    /// with the code it is registered under.
    pub fn register(&mut self, code: u16, kind: ReplyKind) -> Result<&mut Self, RegistryError> {
        if kind.code() != code {
            return Err(RegistryError::CodeMismatch {
                code,
                name: kind.name(),
                expected: kind.code(),
            });
        }
        if let Some((_, existing)) = self.entries.iter().find(|(c, _)| *c == code) {
            return Err(RegistryError::DuplicateCode {
                code,
                existing: existing.name(),
            });
        }
        self.entries.push((code, kind));
        Ok(self)
    }

    /// Allocate the dense table spanning `[min, max]`.
    pub fn build(self) -> Result<ReplyRegistry, RegistryError> {
        let min = self.entries.iter().map(|(c, _)| *c).min().ok_or(RegistryError::Empty)?;
        let max = self.entries.iter().map(|(c, _)| *c).max().ok_or(RegistryError::Empty)?;

        let mut table = vec![None; usize::from(max - min) + 1];
        for (code, kind) in self.entries {
            table[usize::from(code - min)] = Some(kind);
        }

        Ok(ReplyRegistry { min, max, table })
    }
}

/// Immutable code-to-kind table. Build once, share behind an `Arc`.
#[derive(Debug, Clone)]
pub struct ReplyRegistry {
    min: u16,
    max: u16,
    table: Vec<Option<ReplyKind>>,
}

impl ReplyRegistry {
    pub fn builder() -> ReplyRegistryBuilder {
        ReplyRegistryBuilder::new()
    }

    pub fn lookup(&self, code: u16) -> Option<ReplyKind> {
        if code < self.min || code > self.max {
            return None;
        }
        self.table.get(usize::from(code - self.min)).copied().flatten()
    }

    /// Look up a numeric command string such as `"372"`.
    ///
    /// Anything that is not exactly three ASCII digits is not a numeric.
    pub fn lookup_command(&self, command: &str) -> Option<ReplyKind> {
        parse_numeric(command).and_then(|code| self.lookup(code))
    }

    /// Lowest and highest registered code.
    pub fn bounds(&self) -> (u16, u16) {
        (self.min, self.max)
    }

    pub fn len(&self) -> usize {
        self.table.iter().filter(|slot| slot.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Parse a three-digit numeric command.
pub fn parse_numeric(command: &str) -> Option<u16> {
    if command.len() != 3 || !command.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    command.parse().ok()
}

/// Build the registry of every standard reply.
pub fn build_reply_registry() -> Result<ReplyRegistry, RegistryError> {
    let mut builder = ReplyRegistry::builder();
    for kind in ReplyKind::ALL {
        builder.register(kind.code(), *kind)?;
    }
    builder.build()
}
