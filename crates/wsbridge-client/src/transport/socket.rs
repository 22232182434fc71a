//! TransportSocket: one event contract over any native socket.
//!
//! Ordering rules enforced by the pump:
//! - `Open` at most once; messages seen before it are dropped.
//! - Lazy blobs are materialized inline, so later messages wait for them.
//! - `Close` exactly once and last; listeners are released after it.
//! - If the native side goes away without a close, an abnormal `Close` (1006)
//!   is synthesized.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;

use wsbridge_core::error::{Result, WsBridgeError};
use wsbridge_core::inspect::{self, Fields, Inspect};

use crate::transport::events::{
    EventKind, EventStream, ListenerId, Payload, SocketEvent, ABNORMAL_CLOSE_CODE,
    DEFAULT_CLOSE_CODE,
};
use crate::transport::native::{
    Frame, NativeCallbacks, NativeData, NativeEvent, NativeSocket, ReadyState, SocketFactory,
};

type Handler = Arc<dyn Fn(&SocketEvent) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    handlers: Vec<(ListenerId, EventKind, Handler)>,
    streams: Vec<mpsc::UnboundedSender<SocketEvent>>,
}

/// Listener registry shared with the pump task.
#[derive(Default)]
struct Dispatch {
    listeners: Mutex<Listeners>,
    closed: AtomicBool,
}

impl Dispatch {
    fn lock(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    // `closed` is only set while the listeners lock is held, so checking it
    // under the same lock cannot race `finish`.
    fn subscribe(&self) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut l = self.lock();
        if !self.is_closed() {
            l.streams.push(tx);
        }
        EventStream::new(rx)
    }

    fn on(&self, kind: EventKind, handler: Handler) -> ListenerId {
        let mut l = self.lock();
        l.next_id += 1;
        let id = ListenerId(l.next_id);
        if !self.is_closed() {
            l.handlers.push((id, kind, handler));
        }
        id
    }

    fn off(&self, id: ListenerId) -> bool {
        let mut l = self.lock();
        let before = l.handlers.len();
        l.handlers.retain(|(hid, _, _)| *hid != id);
        l.handlers.len() != before
    }

    fn emit(&self, event: SocketEvent) {
        // Snapshot so handlers may call on/off without deadlocking.
        let handlers: Vec<Handler> = {
            let mut l = self.lock();
            l.streams.retain(|tx| tx.send(event.clone()).is_ok());
            l.handlers
                .iter()
                .filter(|(_, kind, _)| *kind == event.kind())
                .map(|(_, _, h)| h.clone())
                .collect()
        };
        for h in handlers {
            h(&event);
        }
    }

    fn finish(&self, code: u16, reason: String) {
        let event = SocketEvent::Close { code, reason };
        let (handlers, streams) = {
            let mut l = self.lock();
            if self.closed.swap(true, Ordering::AcqRel) {
                return;
            }
            let handlers: Vec<Handler> = l
                .handlers
                .drain(..)
                .filter(|(_, kind, _)| *kind == EventKind::Close)
                .map(|(_, _, h)| h)
                .collect();
            (handlers, std::mem::take(&mut l.streams))
        };
        for tx in streams {
            let _ = tx.send(event.clone());
        }
        for h in handlers {
            h(&event);
        }
    }
}

async fn pump(
    mut native_rx: mpsc::UnboundedReceiver<NativeEvent>,
    dispatch: Arc<Dispatch>,
    url: String,
) {
    let mut opened = false;

    while let Some(event) = native_rx.recv().await {
        match event {
            NativeEvent::Open => {
                if opened {
                    tracing::debug!(%url, "duplicate native open ignored");
                    continue;
                }
                opened = true;
                dispatch.emit(SocketEvent::Open);
            }
            NativeEvent::Message(data) => {
                if !opened {
                    tracing::debug!(%url, ?data, "native message before open dropped");
                    continue;
                }
                let payload = match data {
                    NativeData::Text(s) => Payload::Text(s),
                    NativeData::Binary(b) => Payload::Binary(b),
                    NativeData::Blob(blob) => match blob.materialize().await {
                        Ok(b) => Payload::Binary(b),
                        Err(e) => {
                            tracing::warn!(%url, error = %e, "blob materialization failed");
                            dispatch.emit(SocketEvent::Error(e));
                            continue;
                        }
                    },
                };
                dispatch.emit(SocketEvent::Message(payload));
            }
            NativeEvent::Error(e) => {
                tracing::warn!(%url, error = %e, "native socket error");
                dispatch.emit(SocketEvent::Error(e));
            }
            NativeEvent::Close { code, reason } => {
                let code = code.unwrap_or(DEFAULT_CLOSE_CODE);
                let reason = reason.unwrap_or_default();
                tracing::debug!(%url, code, %reason, "socket closed");
                dispatch.finish(code, reason);
                return;
            }
        }
    }

    tracing::debug!(%url, "native socket dropped without close");
    dispatch.finish(ABNORMAL_CLOSE_CODE, String::new());
}

/// Event-driven wrapper owning exactly one native socket.
///
/// Events are delivered by a tokio task; register listeners right after
/// [`TransportSocket::connect`] (the returned [`EventStream`] is subscribed
/// before any event can fire).
pub struct TransportSocket {
    url: String,
    native: Box<dyn NativeSocket>,
    dispatch: Arc<Dispatch>,
}

impl TransportSocket {
    pub const CONNECTING: u8 = ReadyState::Connecting as u8;
    pub const OPEN: u8 = ReadyState::Open as u8;
    pub const CLOSING: u8 = ReadyState::Closing as u8;
    pub const CLOSED: u8 = ReadyState::Closed as u8;

    /// Open a socket to `url` through `factory`.
    ///
    /// Fails with `EnvironmentUnavailable` when there is no tokio runtime or
    /// the factory's probe fails.
    pub fn connect(
        url: impl Into<String>,
        factory: &dyn SocketFactory,
    ) -> Result<(Self, EventStream)> {
        let url = url.into();
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            WsBridgeError::EnvironmentUnavailable(format!("no async runtime: {e}"))
        })?;
        factory.probe()?;

        let (native_tx, native_rx) = mpsc::unbounded_channel();
        let dispatch = Arc::new(Dispatch::default());
        let events = dispatch.subscribe();

        let native = factory.open(&url, NativeCallbacks::new(native_tx))?;
        runtime.spawn(pump(native_rx, dispatch.clone(), url.clone()));

        tracing::debug!(%url, factory = factory.name(), "socket created");
        Ok((
            Self {
                url,
                native,
                dispatch,
            },
            events,
        ))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Current stage of the native socket. Reports `Closing` until the
    /// `Close` event has been delivered.
    pub fn ready_state(&self) -> ReadyState {
        if self.dispatch.is_closed() {
            return ReadyState::Closed;
        }
        match self.native.ready_state() {
            ReadyState::Closed => ReadyState::Closing,
            other => other,
        }
    }

    /// Receive every event from now on.
    pub fn subscribe(&self) -> EventStream {
        self.dispatch.subscribe()
    }

    /// Call `handler` for each event of `kind`.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> ListenerId
    where
        F: Fn(&SocketEvent) + Send + Sync + 'static,
    {
        self.dispatch.on(kind, Arc::new(handler))
    }

    /// Remove a listener. Returns `false` if it was already gone.
    pub fn off(&self, id: ListenerId) -> bool {
        self.dispatch.off(id)
    }

    /// Queue a frame. Dropped unless the socket is open.
    pub fn send(&self, frame: impl Into<Frame>) {
        let state = self.ready_state();
        if state != ReadyState::Open {
            tracing::debug!(url = %self.url, ?state, "send dropped: socket not open");
            return;
        }
        self.native.send(frame.into());
    }

    /// Start a graceful close. No-op once closing or closed.
    pub fn close(&self, code: Option<u16>, reason: Option<String>) {
        if self.is_terminal() {
            return;
        }
        self.native.close(code, reason);
    }

    /// Drop the connection without a close handshake. No-op once closed.
    pub fn terminate(&self) {
        if self.dispatch.is_closed() || self.native.ready_state() == ReadyState::Closed {
            return;
        }
        self.native.terminate();
    }

    fn is_terminal(&self) -> bool {
        self.dispatch.is_closed()
            || matches!(
                self.native.ready_state(),
                ReadyState::Closing | ReadyState::Closed
            )
    }
}

impl Inspect for TransportSocket {
    const NAME: &'static str = "TransportSocket";

    fn inspect_fields(&self, fields: &mut Fields<'_, '_>) {
        fields
            .field("url", &self.url)
            .field("ready_state", &self.ready_state());
    }
}

impl fmt::Debug for TransportSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        inspect::fmt(self, f)
    }
}
