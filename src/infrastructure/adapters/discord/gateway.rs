//! Gateway WebSocket: handshake, event decoding and the connection driver

use chrono::{DateTime, Utc};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use super::http::WireUser;
use crate::application::errors::{BotError, SessionError};
use crate::domain::entities::{Content, GatewayEvent, Message, SessionSpec, User};

pub const GATEWAY_URL: &str = "wss://gateway.discord.gg/?v=10&encoding=json";

/// Reconnect attempts before the session is given up.
const MAX_RECONNECT_ATTEMPTS: u32 = 8;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

mod op {
    pub const DISPATCH: u8 = 0;
    pub const HEARTBEAT: u8 = 1;
    pub const IDENTIFY: u8 = 2;
    pub const PRESENCE_UPDATE: u8 = 3;
    pub const RESUME: u8 = 6;
    pub const RECONNECT: u8 = 7;
    pub const INVALID_SESSION: u8 = 9;
    pub const HELLO: u8 = 10;
    pub const HEARTBEAT_ACK: u8 = 11;
}

#[derive(Debug, Deserialize)]
pub struct Payload {
    pub op: u8,
    #[serde(default)]
    pub d: Value,
    pub s: Option<u64>,
    pub t: Option<String>,
}

/// Requests from the session handle to the driver
#[derive(Debug)]
pub enum Outbound {
    Presence(Value),
    Close,
}

/// Resume state carried across reconnects
#[derive(Debug, Clone, Default)]
pub struct ResumeState {
    pub session_id: Option<String>,
    pub resume_url: Option<String>,
    pub sequence: Option<u64>,
}

/// What the driver learns from the first READY
pub struct Handshake {
    pub write: WsSink,
    pub read: WsStream,
    pub heartbeat_interval: Duration,
    pub ready: Value,
    pub resume: ResumeState,
}

// Wire shapes of the dispatches we decode.

#[derive(Deserialize)]
struct WireMessage {
    id: String,
    channel_id: String,
    guild_id: Option<String>,
    author: Option<WireUser>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    attachments: Vec<WireAttachment>,
    timestamp: Option<String>,
}

#[derive(Deserialize)]
struct WireAttachment {
    url: String,
}

#[derive(Deserialize)]
struct WireDelete {
    id: String,
    channel_id: String,
    guild_id: Option<String>,
}

#[derive(Deserialize)]
struct WireBulkDelete {
    ids: Vec<String>,
    channel_id: String,
    guild_id: Option<String>,
}

#[derive(Deserialize)]
struct WireEmoji {
    id: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct WireReaction {
    user_id: String,
    channel_id: String,
    message_id: String,
    emoji: WireEmoji,
}

#[derive(Deserialize)]
struct WireGuild {
    id: String,
    name: Option<String>,
    #[serde(default)]
    unavailable: bool,
}

#[derive(Deserialize)]
struct WireVoiceState {
    guild_id: Option<String>,
    user_id: String,
    channel_id: Option<String>,
}

#[derive(Deserialize)]
struct WireReady {
    user: WireUser,
    #[serde(default)]
    guilds: Vec<WireGuild>,
    session_id: String,
    resume_gateway_url: Option<String>,
}

fn parse<T: for<'de> Deserialize<'de>>(name: &str, d: &Value) -> Option<T> {
    match T::deserialize(d) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Failed to decode {}: {}", name, e);
            None
        }
    }
}

/// Turn one dispatch into listener events. With `split_bulk` a bulk delete
/// becomes one `MessageDelete` per id.
pub fn decode_dispatch(name: &str, d: &Value, split_bulk: bool) -> Vec<GatewayEvent> {
    let event = match name {
        "READY" => parse::<WireReady>(name, d).map(|ready| GatewayEvent::Ready {
            user: ready.user.into(),
            guild_ids: ready.guilds.into_iter().map(|g| g.id).collect(),
        }),
        "MESSAGE_CREATE" => parse::<WireMessage>(name, d).map(|m| {
            let content = if m.content.is_empty() {
                Content::Empty
            } else {
                Content::Text(m.content)
            };
            let mut message = Message::new(m.channel_id, content).with_id(m.id).with_raw(d.clone());
            message.guild_id = m.guild_id;
            message.sender = m.author.map(User::from);
            message.attachments = m.attachments.into_iter().map(|a| a.url).collect();
            if let Some(ts) = m.timestamp.and_then(|t| DateTime::parse_from_rfc3339(&t).ok()) {
                message.timestamp = ts.with_timezone(&Utc);
            }
            GatewayEvent::MessageCreate(message)
        }),
        "MESSAGE_DELETE" => parse::<WireDelete>(name, d).map(|m| GatewayEvent::MessageDelete {
            channel_id: m.channel_id,
            message_id: m.id,
            guild_id: m.guild_id,
        }),
        "MESSAGE_DELETE_BULK" => {
            let Some(bulk) = parse::<WireBulkDelete>(name, d) else {
                return Vec::new();
            };
            if split_bulk {
                return bulk
                    .ids
                    .into_iter()
                    .map(|id| GatewayEvent::MessageDelete {
                        channel_id: bulk.channel_id.clone(),
                        message_id: id,
                        guild_id: bulk.guild_id.clone(),
                    })
                    .collect();
            }
            Some(GatewayEvent::MessageDeleteBulk {
                channel_id: bulk.channel_id,
                message_ids: bulk.ids,
                guild_id: bulk.guild_id,
            })
        }
        "MESSAGE_REACTION_ADD" => parse::<WireReaction>(name, d).map(|r| GatewayEvent::ReactionAdd {
            channel_id: r.channel_id,
            message_id: r.message_id,
            user_id: r.user_id,
            emoji: r.emoji.name.or(r.emoji.id).unwrap_or_default(),
        }),
        "GUILD_CREATE" => parse::<WireGuild>(name, d).map(|g| GatewayEvent::GuildCreate {
            guild_id: g.id,
            name: g.name,
        }),
        "GUILD_DELETE" => parse::<WireGuild>(name, d).map(|g| GatewayEvent::GuildDelete {
            guild_id: g.id,
            unavailable: g.unavailable,
        }),
        "VOICE_STATE_UPDATE" => parse::<WireVoiceState>(name, d).map(|v| GatewayEvent::VoiceStateUpdate {
            guild_id: v.guild_id,
            user_id: v.user_id,
            channel_id: v.channel_id,
        }),
        other => Some(GatewayEvent::Other(other.to_string())),
    };
    event.into_iter().collect()
}

/// Classify a close code received while connecting.
pub fn close_error(code: u16, reason: &str) -> SessionError {
    match code {
        4004 => SessionError::Authentication(format!("gateway closed with {} {}", code, reason)),
        4013 | 4014 => SessionError::InvalidArgument(format!("gateway rejected intents ({}): {}", code, reason)),
        _ => SessionError::Other(BotError::Gateway(format!("gateway closed with {} {}", code, reason))),
    }
}

/// Close codes after which reconnecting cannot help.
pub fn is_fatal_close(code: u16) -> bool {
    matches!(code, 4004 | 4010 | 4011 | 4012 | 4013 | 4014)
}

pub fn identify(spec: &SessionSpec) -> Value {
    json!({
        "op": op::IDENTIFY,
        "d": {
            "token": spec.token,
            "properties": {
                "os": std::env::consts::OS,
                "browser": env!("CARGO_PKG_NAME"),
                "device": env!("CARGO_PKG_NAME"),
            },
            "intents": spec.intents.bits(),
            "presence": spec.presence.to_json(),
        }
    })
}

pub fn presence_update(presence: &Value) -> Value {
    json!({ "op": op::PRESENCE_UPDATE, "d": presence })
}

fn heartbeat(sequence: Option<u64>) -> Value {
    json!({ "op": op::HEARTBEAT, "d": sequence })
}

fn gateway_url(resume: &ResumeState) -> String {
    match &resume.resume_url {
        Some(url) if url.contains('?') => format!("{}&v=10&encoding=json", url),
        Some(url) => format!("{}/?v=10&encoding=json", url.trim_end_matches('/')),
        None => GATEWAY_URL.to_string(),
    }
}

async fn send_json(write: &mut WsSink, payload: &Value) -> Result<(), BotError> {
    write
        .send(WsMessage::Text(payload.to_string().into()))
        .await
        .map_err(|e| BotError::Gateway(e.to_string()))
}

/// Next payload from the socket, classifying a close frame.
async fn next_payload(read: &mut WsStream) -> Result<Payload, SessionError> {
    loop {
        let msg = match read.next().await {
            Some(Ok(msg)) => msg,
            Some(Err(e)) => return Err(BotError::Gateway(e.to_string()).into()),
            None => return Err(BotError::Gateway("connection ended during handshake".to_string()).into()),
        };
        match msg {
            WsMessage::Text(text) => {
                return serde_json::from_str(text.as_str()).map_err(|e| BotError::Parse(e.to_string()).into())
            }
            WsMessage::Close(Some(frame)) => return Err(close_error(frame.code.into(), frame.reason.as_str())),
            WsMessage::Close(None) => {
                return Err(BotError::Gateway("connection closed during handshake".to_string()).into())
            }
            _ => continue,
        }
    }
}

/// Connect, identify (or resume) and wait for READY / RESUMED.
pub async fn handshake(spec: &SessionSpec, mut resume: ResumeState) -> Result<Handshake, SessionError> {
    let url = gateway_url(&resume);
    tracing::debug!("Connecting to {}", url);
    let (socket, _) = tokio_tungstenite::connect_async(url.as_str())
        .await
        .map_err(|e| BotError::Network(e.to_string()))?;
    let (mut write, mut read) = socket.split();

    let hello = next_payload(&mut read).await?;
    if hello.op != op::HELLO {
        return Err(BotError::Gateway(format!("expected HELLO, got op {}", hello.op)).into());
    }
    let interval = hello
        .d
        .get("heartbeat_interval")
        .and_then(Value::as_u64)
        .ok_or_else(|| BotError::Parse("HELLO without heartbeat_interval".to_string()))?;

    let resuming = match (&resume.session_id, resume.sequence) {
        (Some(session_id), Some(seq)) => {
            let payload = json!({
                "op": op::RESUME,
                "d": { "token": spec.token, "session_id": session_id, "seq": seq }
            });
            send_json(&mut write, &payload).await?;
            true
        }
        _ => {
            send_json(&mut write, &identify(spec)).await?;
            false
        }
    };

    loop {
        let payload = next_payload(&mut read).await?;
        if payload.s.is_some() {
            resume.sequence = payload.s;
        }
        match (payload.op, payload.t.as_deref()) {
            (op::DISPATCH, Some("READY")) => {
                if let Some(ready) = parse::<WireReady>("READY", &payload.d) {
                    resume.session_id = Some(ready.session_id);
                    resume.resume_url = ready.resume_gateway_url;
                }
                return Ok(Handshake {
                    write,
                    read,
                    heartbeat_interval: Duration::from_millis(interval),
                    ready: payload.d,
                    resume,
                });
            }
            (op::DISPATCH, Some("RESUMED")) if resuming => {
                return Ok(Handshake {
                    write,
                    read,
                    heartbeat_interval: Duration::from_millis(interval),
                    ready: Value::Null,
                    resume,
                });
            }
            (op::HEARTBEAT, _) => send_json(&mut write, &heartbeat(resume.sequence)).await?,
            (op::INVALID_SESSION, _) => {
                return Err(BotError::Gateway("session invalidated during handshake".to_string()).into())
            }
            _ => {}
        }
    }
}

enum Disconnect {
    Resume,
    Reidentify,
    Closed,
}

/// Owns the socket after the first READY: heartbeats, forwards dispatches,
/// reconnects on drops and stops on `Outbound::Close` or a fatal close.
pub struct Driver {
    pub spec: SessionSpec,
    pub outbound: mpsc::UnboundedReceiver<Outbound>,
    pub events: mpsc::UnboundedSender<GatewayEvent>,
}

impl Driver {
    pub async fn run(self, first: Handshake) {
        let Driver {
            spec,
            mut outbound,
            events,
        } = self;
        let mut resume = first.resume.clone();
        let mut connection = Some(first);
        let mut attempts: u32 = 0;

        loop {
            let current = match connection.take() {
                Some(handshake) => handshake,
                None => match handshake(&spec, resume.clone()).await {
                    Ok(fresh) => {
                        attempts = 0;
                        if !fresh.ready.is_null() {
                            forward(&events, &spec, "READY", &fresh.ready);
                        }
                        fresh
                    }
                    Err(SessionError::Other(e)) => {
                        tracing::warn!("Reconnect failed: {}", e);
                        attempts += 1;
                        if attempts > MAX_RECONNECT_ATTEMPTS {
                            tracing::error!("Giving up after {} reconnect attempts", MAX_RECONNECT_ATTEMPTS);
                            return;
                        }
                        if pause(&mut outbound, backoff_delay(attempts)).await {
                            return;
                        }
                        continue;
                    }
                    Err(e) => {
                        tracing::error!("Gateway refused the session: {}", e);
                        return;
                    }
                },
            };
            resume = current.resume.clone();

            match serve(&spec, &mut outbound, &events, current, &mut resume).await {
                Disconnect::Closed => return,
                Disconnect::Reidentify => {
                    resume.session_id = None;
                    resume.sequence = None;
                }
                Disconnect::Resume => {}
            }

            attempts += 1;
            if attempts > MAX_RECONNECT_ATTEMPTS {
                tracing::error!("Giving up after {} reconnect attempts", MAX_RECONNECT_ATTEMPTS);
                return;
            }
            let delay = backoff_delay(attempts);
            tracing::warn!("Gateway disconnected, reconnecting in {}ms", delay.as_millis());
            if pause(&mut outbound, delay).await {
                return;
            }
        }
    }
}

/// Sleep between reconnects. Returns true if a close was requested meanwhile.
async fn pause(outbound: &mut mpsc::UnboundedReceiver<Outbound>, delay: Duration) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);
    loop {
        tokio::select! {
            _ = &mut sleep => return false,
            request = outbound.recv() => match request {
                Some(Outbound::Presence(_)) => tracing::debug!("Dropping presence update while disconnected"),
                Some(Outbound::Close) | None => return true,
            },
        }
    }
}

fn forward(events: &mpsc::UnboundedSender<GatewayEvent>, spec: &SessionSpec, name: &str, d: &Value) {
    for event in decode_dispatch(name, d, spec.split_bulk_deletes) {
        if events.send(event).is_err() {
            tracing::debug!("Event receiver dropped");
        }
    }
}

async fn serve(
    spec: &SessionSpec,
    outbound: &mut mpsc::UnboundedReceiver<Outbound>,
    events: &mpsc::UnboundedSender<GatewayEvent>,
    connection: Handshake,
    resume: &mut ResumeState,
) -> Disconnect {
    let Handshake {
        mut write,
        mut read,
        heartbeat_interval,
        ..
    } = connection;

    let first_beat = heartbeat_interval.mul_f64(rand::random::<f64>());
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + first_beat, heartbeat_interval);
    let mut acked = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !acked {
                    tracing::warn!("Heartbeat not acknowledged, reconnecting");
                    return Disconnect::Resume;
                }
                acked = false;
                if let Err(e) = send_json(&mut write, &heartbeat(resume.sequence)).await {
                    tracing::warn!("Heartbeat failed: {}", e);
                    return Disconnect::Resume;
                }
            }
            request = outbound.recv() => match request {
                Some(Outbound::Presence(presence)) => {
                    if let Err(e) = send_json(&mut write, &presence_update(&presence)).await {
                        tracing::warn!("Presence update failed: {}", e);
                    }
                }
                Some(Outbound::Close) | None => {
                    let _ = write.send(WsMessage::Close(None)).await;
                    tracing::info!("Gateway connection closed");
                    return Disconnect::Closed;
                }
            },
            msg = read.next() => {
                let text = match msg {
                    Some(Ok(WsMessage::Text(text))) => text,
                    Some(Ok(WsMessage::Close(frame))) => {
                        let code = frame.as_ref().map(|f| u16::from(f.code)).unwrap_or(1000);
                        if is_fatal_close(code) {
                            tracing::error!("Gateway closed the session with code {}", code);
                            return Disconnect::Closed;
                        }
                        tracing::warn!("Gateway closed with code {}", code);
                        return if matches!(code, 4007 | 4009) { Disconnect::Reidentify } else { Disconnect::Resume };
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::warn!("Gateway read error: {}", e);
                        return Disconnect::Resume;
                    }
                    None => return Disconnect::Resume,
                };

                let payload: Payload = match serde_json::from_str(text.as_str()) {
                    Ok(payload) => payload,
                    Err(e) => {
                        tracing::warn!("Failed to parse gateway payload: {}", e);
                        continue;
                    }
                };
                if payload.s.is_some() {
                    resume.sequence = payload.s;
                }

                match payload.op {
                    op::DISPATCH => {
                        if let Some(name) = payload.t.as_deref() {
                            forward(events, spec, name, &payload.d);
                        }
                    }
                    op::HEARTBEAT => {
                        if let Err(e) = send_json(&mut write, &heartbeat(resume.sequence)).await {
                            tracing::warn!("Heartbeat failed: {}", e);
                            return Disconnect::Resume;
                        }
                    }
                    op::HEARTBEAT_ACK => acked = true,
                    op::RECONNECT => return Disconnect::Resume,
                    op::INVALID_SESSION => {
                        let resumable = payload.d.as_bool().unwrap_or(false);
                        tracing::warn!("Session invalidated (resumable: {})", resumable);
                        return if resumable { Disconnect::Resume } else { Disconnect::Reidentify };
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Exponential backoff with jitter, capped at a minute.
fn backoff_delay(attempt: u32) -> Duration {
    let base_ms = 1000u64 * 2u64.saturating_pow(attempt.min(6));
    let jittered = (rand::random::<f64>() * 0.5 + 0.75) * base_ms as f64;
    Duration::from_millis(jittered.min(60_000.0) as u64)
}
