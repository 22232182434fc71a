//! In-process native socket.
//!
//! `LoopbackFactory` hands every opened socket's far end to a
//! [`LoopbackAcceptor`] as a [`LoopbackRemote`], which plays the server:
//! it completes the handshake, pushes messages (optionally as lazy blobs),
//! raises errors, closes, and reads what the client sent.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::mpsc;

use wsbridge_core::error::{Result, TransportError};

use crate::transport::native::{
    BlobFuture, Frame, LazyBlob, NativeCallbacks, NativeData, NativeSocket, ReadyState,
    SocketFactory,
};

/// Close handshake data recorded when the client closes.
pub type CloseRecord = (Option<u16>, Option<String>);

struct Link {
    state: AtomicU8,
    closed_with: Mutex<Option<CloseRecord>>,
}

impl Link {
    fn state(&self) -> ReadyState {
        ReadyState::from_code(self.state.load(Ordering::Acquire)).unwrap_or(ReadyState::Closed)
    }

    fn set(&self, s: ReadyState) {
        self.state.store(s.code(), Ordering::Release);
    }

    /// Move to `Closed` once. Returns `false` if already closed.
    fn close_once(&self) -> bool {
        self.state.swap(ReadyState::Closed.code(), Ordering::AcqRel) != ReadyState::Closed.code()
    }
}

/// Factory for in-process sockets.
#[derive(Debug, Clone)]
pub struct LoopbackFactory {
    remotes: mpsc::UnboundedSender<LoopbackRemote>,
    binary_as_blob: bool,
}

/// Receives the far end of every socket the factory opens.
#[derive(Debug)]
pub struct LoopbackAcceptor {
    rx: mpsc::UnboundedReceiver<LoopbackRemote>,
}

impl LoopbackAcceptor {
    pub async fn accept(&mut self) -> Option<LoopbackRemote> {
        self.rx.recv().await
    }
}

impl LoopbackFactory {
    pub fn new() -> (Self, LoopbackAcceptor) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                remotes: tx,
                binary_as_blob: false,
            },
            LoopbackAcceptor { rx },
        )
    }

    /// Deliver binary frames as lazy blobs, like a browser does.
    pub fn binary_as_blob(mut self, on: bool) -> Self {
        self.binary_as_blob = on;
        self
    }
}

impl SocketFactory for LoopbackFactory {
    fn name(&self) -> &'static str {
        "loopback"
    }

    fn probe(&self) -> Result<()> {
        Ok(())
    }

    fn open(&self, url: &str, callbacks: NativeCallbacks) -> Result<Box<dyn NativeSocket>> {
        let link = Arc::new(Link {
            state: AtomicU8::new(ReadyState::Connecting.code()),
            closed_with: Mutex::new(None),
        });
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let remote = LoopbackRemote {
            url: url.to_owned(),
            link: link.clone(),
            callbacks: callbacks.clone(),
            inbound: out_rx,
            binary_as_blob: self.binary_as_blob,
        };
        // Nobody accepting just means the socket never opens.
        let _ = self.remotes.send(remote);

        Ok(Box::new(LoopbackSocket {
            link,
            outbound: out_tx,
            callbacks,
        }))
    }
}

struct LoopbackSocket {
    link: Arc<Link>,
    outbound: mpsc::UnboundedSender<Frame>,
    callbacks: NativeCallbacks,
}

impl NativeSocket for LoopbackSocket {
    fn ready_state(&self) -> ReadyState {
        self.link.state()
    }

    fn send(&self, frame: Frame) {
        if self.link.state() != ReadyState::Open {
            return;
        }
        let _ = self.outbound.send(frame);
    }

    /// The far end acknowledges immediately, echoing code and reason.
    fn close(&self, code: Option<u16>, reason: Option<String>) {
        if self.link.state() != ReadyState::Open && self.link.state() != ReadyState::Connecting {
            return;
        }
        self.link.set(ReadyState::Closing);
        if let Ok(mut g) = self.link.closed_with.lock() {
            *g = Some((code, reason.clone()));
        }
        if self.link.close_once() {
            self.callbacks.on_close(code, reason);
        }
    }

    fn terminate(&self) {
        if self.link.close_once() {
            self.callbacks.on_close(None, None);
        }
    }
}

/// Blob that resolves after a delay.
struct DeferredBlob {
    bytes: Bytes,
    delay: Duration,
}

impl LazyBlob for DeferredBlob {
    fn materialize(self: Box<Self>) -> BlobFuture {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(self.bytes)
        })
    }
}

/// Blob whose read fails.
struct BrokenBlob(String);

impl LazyBlob for BrokenBlob {
    fn materialize(self: Box<Self>) -> BlobFuture {
        Box::pin(async move { Err(TransportError::new(self.0)) })
    }
}

/// Server side of a loopback socket.
pub struct LoopbackRemote {
    url: String,
    link: Arc<Link>,
    callbacks: NativeCallbacks,
    inbound: mpsc::UnboundedReceiver<Frame>,
    binary_as_blob: bool,
}

impl std::fmt::Debug for LoopbackRemote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopbackRemote")
            .field("url", &self.url)
            .field("state", &self.link.state())
            .finish_non_exhaustive()
    }
}

impl LoopbackRemote {
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn ready_state(&self) -> ReadyState {
        self.link.state()
    }

    /// Complete the handshake.
    pub fn accept(&self) {
        if self.link.state() == ReadyState::Connecting {
            self.link.set(ReadyState::Open);
            self.callbacks.on_open();
        }
    }

    pub fn send_text(&self, text: impl Into<String>) {
        if self.is_open() {
            self.callbacks.on_message(NativeData::Text(text.into()));
        }
    }

    /// Binary frame; a lazy blob when the factory is in blob mode.
    pub fn send_binary(&self, bytes: impl Into<Bytes>) {
        if !self.is_open() {
            return;
        }
        let bytes = bytes.into();
        let data = if self.binary_as_blob {
            NativeData::Blob(Box::new(DeferredBlob {
                bytes,
                delay: Duration::ZERO,
            }))
        } else {
            NativeData::Binary(bytes)
        };
        self.callbacks.on_message(data);
    }

    /// Lazy blob that takes `delay` to materialize.
    pub fn send_slow_blob(&self, bytes: impl Into<Bytes>, delay: Duration) {
        if self.is_open() {
            self.callbacks.on_message(NativeData::Blob(Box::new(DeferredBlob {
                bytes: bytes.into(),
                delay,
            })));
        }
    }

    /// Lazy blob whose read fails with `message`.
    pub fn send_broken_blob(&self, message: impl Into<String>) {
        if self.is_open() {
            self.callbacks
                .on_message(NativeData::Blob(Box::new(BrokenBlob(message.into()))));
        }
    }

    /// Raise a native error. Does not close the socket.
    pub fn fail(&self, message: impl Into<String>) {
        if self.link.state() != ReadyState::Closed {
            self.callbacks.on_error(TransportError::new(message));
        }
    }

    /// Close from the server side.
    pub fn close(&self, code: Option<u16>, reason: Option<String>) {
        if self.link.close_once() {
            self.callbacks.on_close(code, reason);
        }
    }

    /// Next frame the client sent.
    pub async fn recv(&mut self) -> Option<Frame> {
        self.inbound.recv().await
    }

    /// Code and reason the client closed with, if it closed gracefully.
    pub fn closed_with(&self) -> Option<CloseRecord> {
        self.link.closed_with.lock().ok().and_then(|g| g.clone())
    }

    fn is_open(&self) -> bool {
        self.link.state() == ReadyState::Open
    }
}
