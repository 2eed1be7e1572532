//! Minimal socket.io (Engine.IO v4) client over WebSocket.
//!
//! Enough protocol to hold a presence connection open: namespace connect,
//! answering engine pings, and emitting argument-less events such as `ping`.

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Namespace connect for `/`.
const CONNECT_PACKET: &str = "40";
/// Namespace disconnect for `/`.
const DISCONNECT_PACKET: &str = "41";
const PONG_PACKET: &str = "3";

#[derive(Debug, Error)]
pub enum WsError {
    #[error("invalid socket.io host {0:?}")]
    InvalidHost(String),

    #[error("tls setup failed: {0}")]
    Tls(#[from] native_tls::Error),

    #[error("websocket error: {0}")]
    Transport(#[from] tungstenite::Error),

    /// The server answered the namespace connect with an error packet.
    #[error("connect rejected: {0}")]
    Rejected(String),

    #[error("timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,
}

/// Decoded text frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    Open,
    Ping,
    Pong,
    Connected,
    ConnectError(String),
    Disconnect,
    /// Event payload as sent, e.g. `["pong"]`.
    Event(String),
    Other(String),
}

pub fn parse_packet(text: &str) -> Packet {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some('0'), _) => Packet::Open,
        (Some('1'), _) => Packet::Disconnect,
        (Some('2'), _) => Packet::Ping,
        (Some('3'), _) => Packet::Pong,
        (Some('4'), Some('0')) => Packet::Connected,
        (Some('4'), Some('1')) => Packet::Disconnect,
        (Some('4'), Some('2')) => Packet::Event(text[2..].to_string()),
        (Some('4'), Some('4')) => Packet::ConnectError(text[2..].to_string()),
        _ => Packet::Other(text.to_string()),
    }
}

/// `42["name"]`
pub fn encode_event(name: &str) -> String {
    format!("42{}", serde_json::json!([name]))
}

/// WebSocket endpoint for an `http(s)://` or `ws(s)://` host.
pub fn socketio_url(host: &str) -> Result<String, WsError> {
    let trimmed = host.trim().trim_end_matches('/');
    let (scheme, rest) = trimmed
        .split_once("://")
        .ok_or_else(|| WsError::InvalidHost(host.to_string()))?;
    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        _ => return Err(WsError::InvalidHost(host.to_string())),
    };
    if rest.is_empty() {
        return Err(WsError::InvalidHost(host.to_string()));
    }
    Ok(format!("{ws_scheme}://{rest}/socket.io/?EIO=4&transport=websocket"))
}

struct Inner {
    sink: Arc<Mutex<WsSink>>,
    connected: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// A connected socket.io client. Clones share the connection.
#[derive(Clone)]
pub struct SocketIoClient {
    inner: Arc<Inner>,
}

impl SocketIoClient {
    /// Open the WebSocket and join the default namespace.
    ///
    /// Self-signed certificates are accepted, as for the HTTP side.
    pub async fn connect(host: &str, timeout: Duration) -> Result<Self, WsError> {
        let url = socketio_url(host)?;
        let connector = tokio_tungstenite::Connector::NativeTls(
            native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(true)
                .build()?,
        );

        let (mut stream, _) = tokio::time::timeout(
            timeout,
            tokio_tungstenite::connect_async_tls_with_config(
                url.as_str(),
                None,
                false,
                Some(connector),
            ),
        )
        .await
        .map_err(|_| WsError::Timeout)??;

        tokio::time::timeout(timeout, handshake(&mut stream))
            .await
            .map_err(|_| WsError::Timeout)??;

        let (sink, stream) = stream.split();
        let sink = Arc::new(Mutex::new(sink));
        let connected = Arc::new(AtomicBool::new(true));
        let reader = tokio::spawn(pump(stream, Arc::clone(&sink), Arc::clone(&connected)));

        Ok(Self {
            inner: Arc::new(Inner {
                sink,
                connected,
                reader,
            }),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Relaxed)
    }

    /// Emit an event without arguments.
    pub async fn emit(&self, event: &str) -> Result<(), WsError> {
        if !self.is_connected() {
            return Err(WsError::Closed);
        }
        self.inner
            .sink
            .lock()
            .await
            .send(Message::Text(encode_event(event)))
            .await?;
        Ok(())
    }

    /// Leave the namespace and close the socket. Errors are ignored; the
    /// server may already be gone.
    pub async fn disconnect(&self) {
        self.inner.connected.store(false, Ordering::Relaxed);
        let mut sink = self.inner.sink.lock().await;
        let _ = sink.send(Message::Text(DISCONNECT_PACKET.to_string())).await;
        let _ = sink.close().await;
        self.inner.reader.abort();
    }
}

/// Wait for the engine open packet, join `/`, wait for the ack.
async fn handshake(stream: &mut WsStream) -> Result<(), WsError> {
    let mut opened = false;
    while let Some(frame) = stream.next().await {
        let Message::Text(text) = frame? else {
            continue;
        };
        match parse_packet(&text) {
            Packet::Open => {
                opened = true;
                stream.send(Message::Text(CONNECT_PACKET.to_string())).await?;
            }
            Packet::Ping => stream.send(Message::Text(PONG_PACKET.to_string())).await?,
            Packet::Connected if opened => return Ok(()),
            Packet::ConnectError(detail) => return Err(WsError::Rejected(detail)),
            Packet::Disconnect => return Err(WsError::Closed),
            _ => {}
        }
    }
    Err(WsError::Closed)
}

/// Answer engine pings until the server goes away.
async fn pump(mut stream: SplitStream<WsStream>, sink: Arc<Mutex<WsSink>>, connected: Arc<AtomicBool>) {
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => match parse_packet(&text) {
                Packet::Ping => {
                    let pong = Message::Text(PONG_PACKET.to_string());
                    if sink.lock().await.send(pong).await.is_err() {
                        break;
                    }
                }
                Packet::Disconnect => break,
                _ => {}
            },
            Ok(Message::Close(_)) | Err(_) => break,
            Ok(_) => {}
        }
    }
    connected.store(false, Ordering::Relaxed);
}
