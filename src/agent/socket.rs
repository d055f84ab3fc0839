//! WebSocket event channel (Socket.IO over Engine.IO v3).

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, timeout, Instant};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderName, HeaderValue};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::agent::events::{EventChannel, EventHandlers};
use crate::agent::frame::{self, Handshake, Packet};
use crate::agent::types::Signal;
use crate::agent::{AgentError, SESSION_HEADER};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(25);
const DEFAULT_PING_TIMEOUT: Duration = Duration::from_secs(60);

/// Event channel over the agent's Socket.IO endpoint.
///
/// A background task owns the socket once it is open; it answers
/// heartbeats and feeds every decoded signal to the handlers. Whatever ends
/// the connection is reported as a single disconnection, including an agent
/// that stays silent past the handshake's ping timeout.
pub struct WebSocketEventChannel {
    url: Url,
    reader: Option<JoinHandle<()>>,
}

impl WebSocketEventChannel {
    pub fn new(agent_url: &Url) -> Result<Self, AgentError> {
        Ok(Self {
            url: socket_url(agent_url)?,
            reader: None,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn connect(&self, session_id: Option<&str>) -> Result<WsStream, AgentError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|e| AgentError::EventChannel(e.to_string()))?;
        if let Some(sid) = session_id {
            let name = HeaderName::from_bytes(SESSION_HEADER.as_bytes())
                .map_err(|e| AgentError::EventChannel(e.to_string()))?;
            let value = HeaderValue::from_str(sid)
                .map_err(|e| AgentError::EventChannel(format!("invalid session id: {}", e)))?;
            request.headers_mut().insert(name, value);
        }

        let (ws, _) = timeout(HANDSHAKE_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| AgentError::EventChannel("timed out connecting".to_string()))?
            .map_err(|e| AgentError::EventChannel(e.to_string()))?;
        Ok(ws)
    }
}

#[async_trait]
impl EventChannel for WebSocketEventChannel {
    async fn open(
        &mut self,
        session_id: Option<&str>,
        handlers: EventHandlers,
    ) -> Result<(), AgentError> {
        debug!(url = %self.url, "Opening event channel");
        let mut ws = self.connect(session_id).await?;

        let handshake = timeout(HANDSHAKE_TIMEOUT, await_connected(&mut ws))
            .await
            .map_err(|_| AgentError::EventChannel("timed out waiting for handshake".to_string()))??;
        info!(sid = %handshake.sid, "Event channel connected");

        let heartbeat = Heartbeat::from_handshake(&handshake);
        debug!(?heartbeat, "Heartbeat negotiated");
        self.reader = Some(tokio::spawn(pump(ws, handlers, heartbeat)));
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
            debug!("Event channel closed");
        }
    }
}

impl Drop for WebSocketEventChannel {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

/// Ping cadence and how long the agent may stay silent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Heartbeat {
    period: Duration,
    timeout: Duration,
}

impl Heartbeat {
    fn from_handshake(handshake: &Handshake) -> Self {
        let millis_or = |ms: u64, fallback: Duration| {
            if ms == 0 {
                fallback
            } else {
                Duration::from_millis(ms)
            }
        };
        Self {
            period: millis_or(handshake.ping_interval, DEFAULT_PING_INTERVAL),
            timeout: millis_or(handshake.ping_timeout, DEFAULT_PING_TIMEOUT),
        }
    }

    /// Silence allowed after the last received frame.
    fn allowed_silence(&self) -> Duration {
        self.period + self.timeout
    }
}

/// `http://host:port/base` → `ws://host:port/base/socket.io/?EIO=3&transport=websocket`.
fn socket_url(agent_url: &Url) -> Result<Url, AgentError> {
    let scheme = match agent_url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(AgentError::EventChannel(format!(
                "unsupported scheme '{}'",
                other
            )))
        }
    };

    let mut base = agent_url.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    let mut url = base
        .join("socket.io/")
        .map_err(|e| AgentError::EventChannel(e.to_string()))?;
    url.set_scheme(scheme)
        .map_err(|_| AgentError::EventChannel(format!("cannot use scheme '{}'", scheme)))?;
    url.set_query(Some("EIO=3&transport=websocket"));
    Ok(url)
}

/// Read frames until the server has sent both the open handshake and the
/// namespace connect.
async fn await_connected(ws: &mut WsStream) -> Result<Handshake, AgentError> {
    let mut handshake = None;
    while let Some(message) = ws.next().await {
        let message = message.map_err(|e| AgentError::EventChannel(e.to_string()))?;
        let Message::Text(text) = message else {
            continue;
        };
        match frame::decode(&text) {
            Ok(Packet::Open(h)) => handshake = Some(h),
            Ok(Packet::Connect) => return Ok(handshake.unwrap_or_default()),
            Ok(Packet::Error(reason)) => return Err(AgentError::EventChannel(reason)),
            Ok(Packet::Disconnect) | Ok(Packet::Close) => {
                return Err(AgentError::EventChannel(
                    "server closed the connection during handshake".to_string(),
                ))
            }
            Ok(other) => trace!(?other, "Ignoring packet during handshake"),
            Err(e) => warn!(error = %e, "Undecodable packet during handshake"),
        }
    }
    Err(AgentError::EventChannel(
        "connection closed during handshake".to_string(),
    ))
}

async fn pump(ws: WsStream, handlers: EventHandlers, heartbeat: Heartbeat) {
    let (mut write, mut read) = ws.split();
    let mut pings = interval_at(Instant::now() + heartbeat.period, heartbeat.period);
    let mut last_seen = Instant::now();

    let reason = loop {
        tokio::select! {
            _ = pings.tick() => {
                if let Err(e) = write.send(Message::Text(frame::PING.to_string())).await {
                    break format!("heartbeat failed: {}", e);
                }
            }
            _ = sleep_until(last_seen + heartbeat.allowed_silence()) => {
                warn!(silence = ?heartbeat.allowed_silence(), "Agent stopped answering");
                break "ping timeout".to_string();
            }
            message = read.next() => {
                last_seen = Instant::now();
                match message {
                    None => break "connection closed".to_string(),
                    Some(Err(e)) => break e.to_string(),
                    Some(Ok(Message::Close(close))) => {
                        break match close {
                            Some(frame) if !frame.reason.is_empty() => frame.reason.to_string(),
                            _ => "connection closed by agent".to_string(),
                        };
                    }
                    Some(Ok(Message::Text(text))) => match frame::decode(&text) {
                        Ok(Packet::Ping(payload)) => {
                            if let Err(e) = write.send(Message::Text(frame::encode_pong(&payload))).await {
                                break format!("heartbeat failed: {}", e);
                            }
                        }
                        Ok(Packet::Event { name, payload }) => match Signal::from_event(&name, payload) {
                            Some(signal) => handlers.dispatch(signal),
                            None => trace!(event = %name, "Ignoring event"),
                        },
                        Ok(Packet::Error(reason)) => handlers.dispatch(Signal::Error(reason)),
                        Ok(Packet::Disconnect) => break "agent disconnected the session".to_string(),
                        Ok(Packet::Close) => break "agent closed the transport".to_string(),
                        Ok(_) => {}
                        Err(e) => handlers.dispatch(Signal::Error(e.to_string())),
                    },
                    Some(Ok(_)) => {}
                }
            }
        }
    };

    debug!(%reason, "Event channel reader stopped");
    handlers.dispatch(Signal::Disconnection(reason));
}
