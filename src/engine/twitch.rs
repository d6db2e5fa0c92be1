// Chat Relay: Twitch Connector
//
// Connects to one Twitch channel via IRC-over-WebSocket.
// Uses Twitch's standard chat interface: wss://irc-ws.chat.twitch.tv
//
// Setup: use https://twitchapps.com/tmi/ (or a dev.twitch.tv app) to get an
//        OAuth token for the bot account. The bot should be a moderator in
//        the channel so its replies are not throttled.
//
// The connector never touches the session. It reports Ready/Message events
// over the link's channel and writes the relay's outbound lines to the socket.

use chatrelay_core::relay::single_line;
use chatrelay_core::{
    ChatConnector, ChatEvent, ConnectorLink, EngineError, EngineResult, InboundMessage,
};
use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

pub const TWITCH_IRC_URL: &str = "wss://irc-ws.chat.twitch.tv:443";

// Reads allowed while waiting for the welcome numerics, each with its own timeout.
const AUTH_MAX_READS: usize = 30;
const AUTH_READ_TIMEOUT: Duration = Duration::from_secs(10);
const KEEPALIVE_AFTER: Duration = Duration::from_secs(300);

fn channel_err(e: impl std::fmt::Display) -> EngineError {
    EngineError::channel("twitch", e.to_string())
}

// ── Connector ──────────────────────────────────────────────────────────

pub struct TwitchConnector {
    url: String,
}

impl Default for TwitchConnector {
    fn default() -> Self {
        TwitchConnector { url: TWITCH_IRC_URL.to_string() }
    }
}

impl TwitchConnector {
    /// Connector for a non-default IRC-over-WebSocket endpoint.
    pub fn with_url(url: impl Into<String>) -> Self {
        TwitchConnector { url: url.into() }
    }
}

#[async_trait]
impl ChatConnector for TwitchConnector {
    async fn run(&self, link: ConnectorLink) -> EngineResult<()> {
        run_ws_loop(&self.url, link).await
    }
}

// ── IRC-over-WebSocket Loop ────────────────────────────────────────────

async fn run_ws_loop(url: &str, link: ConnectorLink) -> EngineResult<()> {
    let ConnectorLink { config, events, mut outbound, mut stop } = link;

    let (ws_stream, _) = connect_async(url).await.map_err(channel_err)?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    let nick = config.bot_login();
    let channel = config.irc_channel();

    // Authenticate
    ws_tx.send(WsMessage::Text(format!("PASS {}", config.irc_token()))).await.map_err(channel_err)?;
    ws_tx.send(WsMessage::Text(format!("NICK {}", nick))).await.map_err(channel_err)?;
    // Request tags capability for user display names etc
    ws_tx
        .send(WsMessage::Text("CAP REQ :twitch.tv/tags twitch.tv/commands".into()))
        .await
        .map_err(channel_err)?;

    // Wait for successful auth (001/376)
    let mut authed = false;
    for _ in 0..AUTH_MAX_READS {
        let msg = tokio::select! {
            msg = tokio::time::timeout(AUTH_READ_TIMEOUT, ws_rx.next()) => msg,
            _ = stop.changed() => return Ok(()),
        };

        match msg {
            Ok(Some(Ok(WsMessage::Text(t)))) => {
                for line in t.lines() {
                    match parse_irc_line(line, &nick) {
                        IrcLine::Welcome => authed = true,
                        IrcLine::AuthFailed(notice) => {
                            return Err(channel_err(format!("Twitch auth failed ({}), check the OAuth token", notice)));
                        }
                        IrcLine::Ping(payload) => {
                            let _ = ws_tx.send(WsMessage::Text(format!("PONG {}", payload))).await;
                        }
                        _ => {}
                    }
                }
                if authed { break; }
            }
            Ok(Some(Ok(WsMessage::Close(_)))) | Ok(None) => {
                return Err(channel_err("connection closed during login"));
            }
            Ok(Some(Err(e))) => return Err(channel_err(e)),
            _ => continue,
        }
    }

    if !authed {
        return Err(channel_err("Twitch auth timeout"));
    }
    info!("[twitch] Authenticated as {}", nick);

    ws_tx.send(WsMessage::Text(format!("JOIN {}", channel))).await.map_err(channel_err)?;
    info!("[twitch] Joined {}", channel);

    if events.send(ChatEvent::Ready { nick: nick.clone() }).await.is_err() {
        return Ok(());
    }

    let mut outbound_open = true;

    // Message loop
    loop {
        let text = tokio::select! {
            msg = ws_rx.next() => match msg {
                Some(Ok(WsMessage::Text(t))) => t,
                Some(Ok(WsMessage::Ping(data))) => {
                    let _ = ws_tx.send(WsMessage::Pong(data)).await;
                    continue;
                }
                Some(Ok(WsMessage::Close(_))) | None => break,
                Some(Err(e)) => {
                    warn!("[twitch] WS error: {}", e);
                    return Err(channel_err(e));
                }
                _ => continue,
            },
            out = outbound.recv(), if outbound_open => {
                match out {
                    Some(out) => {
                        let line = format!("PRIVMSG {} :{}", out.channel, single_line(&out.text));
                        ws_tx.send(WsMessage::Text(line)).await.map_err(channel_err)?;
                    }
                    None => outbound_open = false,
                }
                continue;
            }
            _ = stop.changed() => {
                let _ = ws_tx.send(WsMessage::Text(format!("PART {}", channel))).await;
                let _ = ws_tx.close().await;
                info!("[twitch] Stop signal received, leaving {}", channel);
                return Ok(());
            }
            _ = tokio::time::sleep(KEEPALIVE_AFTER) => {
                let _ = ws_tx.send(WsMessage::Text("PING :tmi.twitch.tv".into())).await;
                continue;
            }
        };

        for line in text.lines() {
            match parse_irc_line(line, &nick) {
                IrcLine::Ping(payload) => {
                    let _ = ws_tx.send(WsMessage::Text(format!("PONG {}", payload))).await;
                }
                IrcLine::Privmsg(msg) => {
                    debug!("[twitch] {} in {}: {}", msg.author, msg.channel, msg.text);
                    if events.send(ChatEvent::Message(msg)).await.is_err() {
                        // Relay worker is gone; nothing left to deliver to
                        return Ok(());
                    }
                }
                IrcLine::Reconnect => {
                    return Err(channel_err("server requested reconnect"));
                }
                _ => {}
            }
        }
    }

    Ok(())
}

// ── Line Parsing ───────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub(crate) enum IrcLine {
    /// PING with the payload to echo back.
    Ping(String),
    /// 001 or 376: login accepted.
    Welcome,
    AuthFailed(String),
    Privmsg(InboundMessage),
    Reconnect,
    Other,
}

/// Classify one raw IRC line. `nick` is the bot's lowercase login, used to
/// flag the bot's own lines as echoes.
pub(crate) fn parse_irc_line(line: &str, nick: &str) -> IrcLine {
    let line = line.trim_end_matches('\r');
    if let Some(payload) = line.strip_prefix("PING") {
        return IrcLine::Ping(payload.trim().to_string());
    }

    // @tags :nick!user@host COMMAND params
    let (tags, rest) = match line.strip_prefix('@') {
        Some(tagged) => match tagged.split_once(' ') {
            Some((t, r)) => (t, r),
            None => return IrcLine::Other,
        },
        None => ("", line),
    };
    let (prefix, rest) = match rest.strip_prefix(':') {
        Some(p) => p.split_once(' ').unwrap_or((p, "")),
        None => ("", rest),
    };
    let (command, params) = rest.split_once(' ').unwrap_or((rest, ""));

    match command {
        "001" | "376" => IrcLine::Welcome,
        "RECONNECT" => IrcLine::Reconnect,
        "NOTICE" => {
            let notice = params.split_once(" :").map(|(_, m)| m).unwrap_or("");
            if notice.contains("Login authentication failed") || notice.contains("Improperly formatted auth") {
                IrcLine::AuthFailed(notice.to_string())
            } else {
                IrcLine::Other
            }
        }
        "PRIVMSG" => {
            // Extract sender nick from nick!user@host
            let sender = prefix.split('!').next().unwrap_or("");
            let Some((channel, text)) = params.split_once(" :") else {
                return IrcLine::Other;
            };
            if sender.is_empty() || text.is_empty() {
                return IrcLine::Other;
            }
            let author = parse_tag(tags, "display-name")
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| sender.to_string());
            IrcLine::Privmsg(InboundMessage {
                author,
                text: text.to_string(),
                channel: channel.trim().to_string(),
                is_echo: sender.eq_ignore_ascii_case(nick),
            })
        }
        _ => IrcLine::Other,
    }
}

/// Parse a single IRC tag value from the tags string (key1=val1;key2=val2;...)
fn parse_tag(tags: &str, key: &str) -> Option<String> {
    for pair in tags.split(';') {
        let mut kv = pair.splitn(2, '=');
        if kv.next() == Some(key) {
            return kv.next().map(|v| v.to_string());
        }
    }
    None
}
