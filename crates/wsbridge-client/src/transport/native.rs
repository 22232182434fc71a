//! Native socket capability.
//!
//! A [`SocketFactory`] produces one [`NativeSocket`] per URL. The native side
//! reports what happens on the wire by firing the callback slots in
//! [`NativeCallbacks`]; `TransportSocket` turns those into ordered events.
//! Factories are chosen at composition time and probed, never assumed.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use tokio::sync::mpsc;

use wsbridge_core::error::{Result, TransportError};

/// Lifecycle stage of a socket, with fixed numeric codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(ReadyState::Connecting),
            1 => Some(ReadyState::Open),
            2 => Some(ReadyState::Closing),
            3 => Some(ReadyState::Closed),
            _ => None,
        }
    }
}

/// Outbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Bytes),
}

impl From<String> for Frame {
    fn from(s: String) -> Self {
        Frame::Text(s)
    }
}

impl From<&str> for Frame {
    fn from(s: &str) -> Self {
        Frame::Text(s.to_owned())
    }
}

impl From<Bytes> for Frame {
    fn from(b: Bytes) -> Self {
        Frame::Binary(b)
    }
}

impl From<Vec<u8>> for Frame {
    fn from(b: Vec<u8>) -> Self {
        Frame::Binary(Bytes::from(b))
    }
}

impl From<&[u8]> for Frame {
    fn from(b: &[u8]) -> Self {
        Frame::Binary(Bytes::copy_from_slice(b))
    }
}

/// Future resolving a lazy blob into bytes.
pub type BlobFuture =
    Pin<Box<dyn Future<Output = std::result::Result<Bytes, TransportError>> + Send>>;

/// Binary data the native layer hands over before it is fully read.
pub trait LazyBlob: Send {
    fn materialize(self: Box<Self>) -> BlobFuture;
}

/// Inbound data as the native layer represents it.
pub enum NativeData {
    Text(String),
    Binary(Bytes),
    Blob(Box<dyn LazyBlob>),
}

impl fmt::Debug for NativeData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeData::Text(s) => f.debug_tuple("Text").field(&s.len()).finish(),
            NativeData::Binary(b) => f.debug_tuple("Binary").field(&b.len()).finish(),
            NativeData::Blob(_) => f.write_str("Blob"),
        }
    }
}

/// What a native socket reports, in wire order.
#[derive(Debug)]
pub enum NativeEvent {
    Open,
    Message(NativeData),
    Error(TransportError),
    /// `None` when the native layer has no code/reason to report.
    Close {
        code: Option<u16>,
        reason: Option<String>,
    },
}

/// Callback slots a native socket fires.
///
/// Firing after the owning `TransportSocket` is gone is a no-op.
#[derive(Clone)]
pub struct NativeCallbacks {
    tx: mpsc::UnboundedSender<NativeEvent>,
}

impl NativeCallbacks {
    pub(crate) fn new(tx: mpsc::UnboundedSender<NativeEvent>) -> Self {
        Self { tx }
    }

    pub fn on_open(&self) {
        let _ = self.tx.send(NativeEvent::Open);
    }

    pub fn on_message(&self, data: NativeData) {
        let _ = self.tx.send(NativeEvent::Message(data));
    }

    pub fn on_error(&self, err: TransportError) {
        let _ = self.tx.send(NativeEvent::Error(err));
    }

    pub fn on_close(&self, code: Option<u16>, reason: Option<String>) {
        let _ = self.tx.send(NativeEvent::Close { code, reason });
    }
}

/// One native realtime socket bound to a URL.
pub trait NativeSocket: Send + Sync {
    fn ready_state(&self) -> ReadyState;

    /// Queue a frame. Dropped when the socket is not open.
    fn send(&self, frame: Frame);

    /// Start a graceful close.
    fn close(&self, code: Option<u16>, reason: Option<String>);

    /// Drop the connection without a close handshake.
    fn terminate(&self) {
        self.close(None, None);
    }
}

/// Platform capability producing native sockets.
pub trait SocketFactory: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Check the capability exists here. Errors with
    /// `WsBridgeError::EnvironmentUnavailable` otherwise.
    fn probe(&self) -> Result<()>;

    fn open(&self, url: &str, callbacks: NativeCallbacks) -> Result<Box<dyn NativeSocket>>;
}
