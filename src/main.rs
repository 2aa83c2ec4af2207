use anyhow::{Context, Result};
use crabsession::config::{self, AppConfig};
use crabsession::logging::{init_tracing, TranscriptLogger};
use crabsession::transport::{spawn_connection, Transport, TransportEvent};
use crabsession::{build_reply_registry, Connection, ConnectionEvent, CtcpEvent, InboundMessage};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = config::load_config(config_path.as_deref())?;

    init_tracing(&cfg.logging.level);

    let registry = Arc::new(build_reply_registry().context("Failed to build reply registry")?);
    let mut conn = Connection::from_config(cfg.server.nickname.clone(), &cfg.session, registry);
    register_listeners(&conn, &cfg);

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<TransportEvent>();
    conn.mark_connecting();
    let transport = match spawn_connection(&cfg.server, event_tx).await {
        Ok(transport) => transport,
        Err(e) => {
            conn.handle_disconnect(&e.to_string());
            return Err(e).with_context(|| format!("Failed to connect to {}:{}", cfg.server.host, cfg.server.port));
        }
    };

    loop {
        tokio::select! {
            event = event_rx.recv() => {
                let Some(event) = event else { break };
                if !handle_transport_event(&mut conn, &transport, event) {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, quitting");
                transport.quit("crabsession")?;
            }
        }
    }

    conn.handle_disconnect("transport gone");
    Ok(())
}

/// Returns false once the transport has closed.
fn handle_transport_event(conn: &mut Connection, transport: &Transport, event: TransportEvent) -> bool {
    match event {
        TransportEvent::Message(message) => {
            let actions = conn.handle_message(&InboundMessage::from_irc(&message));
            for action in actions {
                if let Err(e) = transport.execute(&action) {
                    tracing::warn!(error = %e, ?action, "failed to send");
                }
            }
            true
        }
        TransportEvent::Closed { reason } => {
            conn.handle_disconnect(&reason);
            false
        }
    }
}

fn register_listeners(conn: &Connection, cfg: &AppConfig) {
    conn.on_connection(|event| {
        match event {
            ConnectionEvent::Established => tracing::info!("session established"),
            ConnectionEvent::Lost { reason } => tracing::info!(%reason, "session lost"),
            ConnectionEvent::Error(message) => tracing::warn!(text = message.text(), "server error"),
            ConnectionEvent::Motd(motd) => {
                for line in motd.lines() {
                    tracing::info!(target: "motd", "{}", line);
                }
            }
            ConnectionEvent::Ping(_) => {}
            ConnectionEvent::ChannelJoined(channel) => tracing::info!(%channel, "joined"),
            ConnectionEvent::ChannelLeft(channel) => tracing::info!(%channel, "left"),
            ConnectionEvent::Invited { channel, user } => tracing::info!(%channel, %user, "invited"),
        }
        Ok(())
    });

    let transcripts = Arc::new(Mutex::new(TranscriptLogger::new(&cfg.logging)));
    conn.on_private_message(move |event| {
        tracing::info!(
            kind = ?event.kind,
            from = %event.sender.nick(),
            text = event.message.text(),
            "message"
        );
        transcripts.lock().log(event)?;
        Ok(())
    });

    conn.on_ctcp(|event| {
        match event {
            CtcpEvent::Request { sender, command, arguments, .. } => {
                tracing::info!(from = %sender.nick(), %command, %arguments, "ctcp request")
            }
            CtcpEvent::Reply { sender, reply, .. } => {
                tracing::info!(from = %sender.nick(), command = %reply.command, arguments = %reply.arguments, "ctcp reply")
            }
        }
        Ok(())
    });

    conn.on_unexpected(|event| {
        tracing::debug!(command = %event.command, reply = ?event.reply, args = ?event.args, "unhandled");
        Ok(())
    });
}
