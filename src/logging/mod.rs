//! Diagnostics and message transcripts.
//!
//! `init_tracing` installs the process-wide subscriber. [`TranscriptLogger`]
//! appends private and channel messages to daily files named
//! `<target>_<date>.log` under the configured directory (default
//! `~/.local/share/crabsession/logs/`).

use crate::config::LoggingConfig;
use crate::event::{Destination, MessageKind, PrivateMessageEvent};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber. `RUST_LOG` wins over `default_level`.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Expand a leading `~/` to the home directory.
fn expand_home(dir: &str) -> PathBuf {
    match dir.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(dir)),
        None => PathBuf::from(dir),
    }
}

/// Keep filenames to a safe character set.
fn sanitize(target: &str) -> String {
    target
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '_' })
        .collect()
}

/// Writes messages to per-channel/query daily log files.
///
/// File handles are cached for the lifetime of the logger.
pub struct TranscriptLogger {
    enabled: bool,
    log_dir: PathBuf,
    log_channels: bool,
    log_queries: bool,
    file_handles: HashMap<String, fs::File>,
}

impl TranscriptLogger {
    pub fn new(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.transcripts,
            log_dir: expand_home(&config.log_dir),
            log_channels: config.log_channels,
            log_queries: config.log_queries,
            file_handles: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Append one message. No-op when disabled or when the destination type
    /// is not configured for logging.
    pub fn log(&mut self, event: &PrivateMessageEvent) -> io::Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let target = match &event.destination {
            Destination::Channel(channel) if self.log_channels => channel.name(),
            Destination::User(_) if self.log_queries => event.sender.nick(),
            _ => return Ok(()),
        };

        let timestamp = event
            .message
            .received_at()
            .with_timezone(&chrono::Local)
            .format("%H:%M:%S");
        let line = match event.kind {
            MessageKind::Privmsg => format!("[{}] <{}> {}", timestamp, event.sender.nick(), event.message.text()),
            MessageKind::Notice => format!("[{}] -{}- {}", timestamp, event.sender.nick(), event.message.text()),
        };

        let date = chrono::Local::now().format("%Y-%m-%d");
        let filename = format!("{}_{}.log", sanitize(&target), date);
        self.write_line(&filename, &line)
    }

    fn write_line(&mut self, filename: &str, line: &str) -> io::Result<()> {
        if !self.file_handles.contains_key(filename) {
            fs::create_dir_all(&self.log_dir)?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.log_dir.join(filename))?;
            self.file_handles.insert(filename.to_string(), file);
        }
        match self.file_handles.get_mut(filename) {
            Some(handle) => writeln!(handle, "{}", line),
            None => Ok(()),
        }
    }
}
