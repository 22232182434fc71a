//! Events emitted by `TransportSocket`.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use wsbridge_core::error::{Result, TransportError, WsBridgeError};

/// Close code used when the native layer reports none (1005, "No Status Rcvd").
pub const DEFAULT_CLOSE_CODE: u16 = 1005;

/// Close code for connections lost without a close frame.
pub const ABNORMAL_CLOSE_CODE: u16 = 1006;

/// A received message, fully materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Bytes),
}

impl Payload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Binary(_) => None,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Payload::Text(s) => s.as_bytes(),
            Payload::Binary(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Payload::Binary(_))
    }

    /// Decode the payload as JSON, whichever frame type carried it.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(self.as_bytes())
            .map_err(|e| WsBridgeError::Decode(format!("invalid json payload: {e}")))
    }
}

/// Event kinds, for per-kind listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Message,
    Error,
    Close,
}

/// Socket event. `Open` comes first and once, `Close` last and once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketEvent {
    Open,
    Message(Payload),
    Error(TransportError),
    Close { code: u16, reason: String },
}

impl SocketEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            SocketEvent::Open => EventKind::Open,
            SocketEvent::Message(_) => EventKind::Message,
            SocketEvent::Error(_) => EventKind::Error,
            SocketEvent::Close {
                ..
            } => EventKind::Close,
        }
    }
}

/// Handle returned by `TransportSocket::on`, used to remove the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// Every event after subscription. Ends after `Close`.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<SocketEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::UnboundedReceiver<SocketEvent>) -> Self {
        Self { rx }
    }

    pub async fn recv(&mut self) -> Option<SocketEvent> {
        self.rx.recv().await
    }

    /// Next already-delivered event, without waiting.
    pub fn try_recv(&mut self) -> Option<SocketEvent> {
        self.rx.try_recv().ok()
    }
}
