//! Configuration data model.
//!
//! All structs derive `Serialize`/`Deserialize` for TOML persistence.
//! Every field has a default so a missing or partial file still works.

use serde::{Deserialize, Serialize};

use super::nickname::generate_nickname;
use crate::casemap::CaseMapping;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// The server to connect to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub tls: bool,
    #[serde(default = "default_nickname")]
    pub nickname: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub realname: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub accept_invalid_certs: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: true,
            nickname: default_nickname(),
            username: None,
            realname: None,
            password: None,
            channels: Vec::new(),
            accept_invalid_certs: false,
        }
    }
}

/// Session-layer behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Send `MODE <channel>` right after joining.
    #[serde(default = "default_true")]
    pub request_modes: bool,
    /// Folding rule until the server announces its own.
    #[serde(default)]
    pub case_mapping: CaseMapping,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_modes: true,
            case_mapping: CaseMapping::default(),
        }
    }
}

/// Diagnostics and message transcripts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub transcripts: bool,
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    #[serde(default = "default_true")]
    pub log_channels: bool,
    #[serde(default)]
    pub log_queries: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            transcripts: false,
            log_dir: default_log_dir(),
            log_channels: true,
            log_queries: false,
        }
    }
}

fn default_host() -> String {
    "irc.libera.chat".to_string()
}
fn default_nickname() -> String {
    generate_nickname()
}
fn default_port() -> u16 {
    6697
}
fn default_true() -> bool {
    true
}
fn default_level() -> String {
    "info".to_string()
}
fn default_log_dir() -> String {
    "~/.local/share/crabsession/logs".to_string()
}
