use crate::action::Action;
use crate::config::ServerConfig;
use anyhow::Result;
use futures::StreamExt;
use irc::client::prelude::*;
use tokio::sync::mpsc;

/// What the reader task forwards to the host loop.
#[derive(Debug)]
pub enum TransportEvent {
    Message(irc::proto::Message),
    /// Always the last event. Sent once the stream ends or fails.
    Closed { reason: String },
}

pub struct Transport {
    sender: irc::client::Sender,
}

impl Transport {
    /// Send a request produced by the session.
    pub fn execute(&self, action: &Action) -> Result<()> {
        let line = action.to_line();
        tracing::debug!(%line, "sending");
        self.sender.send(Command::Raw(line, vec![]))?;
        Ok(())
    }

    pub fn quit(&self, message: &str) -> Result<()> {
        self.sender.send_quit(message)?;
        Ok(())
    }
}

/// Connect, register, and spawn a task forwarding every inbound message to
/// `event_tx`.
pub async fn spawn_connection(
    server: &ServerConfig,
    event_tx: mpsc::UnboundedSender<TransportEvent>,
) -> Result<Transport> {
    let config = Config {
        server: Some(server.host.clone()),
        port: Some(server.port),
        use_tls: Some(server.tls),
        nickname: Some(server.nickname.clone()),
        username: server.username.clone(),
        realname: server.realname.clone(),
        password: server.password.clone(),
        channels: server.channels.clone(),
        dangerously_accept_invalid_certs: Some(server.accept_invalid_certs),
        ..Config::default()
    };

    let mut client = Client::from_config(config).await?;
    client.identify()?;

    let sender = client.sender();
    let mut stream = client.stream()?;
    tracing::info!(host = %server.host, port = server.port, tls = server.tls, "connected");

    tokio::spawn(async move {
        let mut reason = "Connection closed".to_string();
        while let Some(result) = stream.next().await {
            match result {
                Ok(message) => {
                    if event_tx.send(TransportEvent::Message(message)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    reason = e.to_string();
                    break;
                }
            }
        }
        let _ = event_tx.send(TransportEvent::Closed { reason });
    });

    Ok(Transport { sender })
}
