//! Network-backed native socket (`tokio-tungstenite`).
//!
//! Each socket runs one task that owns the stream. Commands (send, close,
//! terminate) reach it over a channel; the task reports back through the
//! native callback slots.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::{CloseFrame, WebSocketConfig};
use tokio_tungstenite::tungstenite::{self, Message};

use wsbridge_core::error::{Result, TransportError, WsBridgeError};

use crate::config::SocketSection;
use crate::transport::events::ABNORMAL_CLOSE_CODE;
use crate::transport::native::{
    Frame, NativeCallbacks, NativeData, NativeSocket, ReadyState, SocketFactory,
};

#[derive(Debug)]
enum Command {
    Send(Frame),
    Close {
        code: Option<u16>,
        reason: Option<String>,
    },
    Terminate,
}

/// Factory for network sockets. Needs a tokio runtime.
#[derive(Debug, Clone)]
pub struct TungsteniteFactory {
    config: WebSocketConfig,
}

impl Default for TungsteniteFactory {
    fn default() -> Self {
        Self::with_config(&SocketSection::default())
    }
}

impl TungsteniteFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(section: &SocketSection) -> Self {
        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(section.max_message_bytes);
        config.max_frame_size = Some(section.max_frame_bytes);
        Self { config }
    }
}

impl SocketFactory for TungsteniteFactory {
    fn name(&self) -> &'static str {
        "tungstenite"
    }

    fn probe(&self) -> Result<()> {
        current_runtime().map(|_| ())
    }

    fn open(&self, url: &str, callbacks: NativeCallbacks) -> Result<Box<dyn NativeSocket>> {
        let request = url
            .into_client_request()
            .map_err(|e| TransportError::new(format!("invalid websocket url {url}: {e}")))?;

        let runtime = current_runtime()?;
        let state = Arc::new(AtomicU8::new(ReadyState::Connecting.code()));
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        runtime.spawn(run(request, self.config, state.clone(), callbacks, cmd_rx));

        Ok(Box::new(TungsteniteSocket { state, cmds: cmd_tx }))
    }
}

fn current_runtime() -> Result<tokio::runtime::Handle> {
    tokio::runtime::Handle::try_current().map_err(|e| {
        WsBridgeError::EnvironmentUnavailable(format!("tungstenite needs a tokio runtime: {e}"))
    })
}

struct TungsteniteSocket {
    state: Arc<AtomicU8>,
    cmds: mpsc::UnboundedSender<Command>,
}

impl NativeSocket for TungsteniteSocket {
    fn ready_state(&self) -> ReadyState {
        load(&self.state)
    }

    fn send(&self, frame: Frame) {
        if self.ready_state() != ReadyState::Open {
            return;
        }
        let _ = self.cmds.send(Command::Send(frame));
    }

    fn close(&self, code: Option<u16>, reason: Option<String>) {
        let _ = self.cmds.send(Command::Close { code, reason });
    }

    fn terminate(&self) {
        let _ = self.cmds.send(Command::Terminate);
    }
}

fn load(state: &AtomicU8) -> ReadyState {
    ReadyState::from_code(state.load(Ordering::Acquire)).unwrap_or(ReadyState::Closed)
}

fn store(state: &AtomicU8, s: ReadyState) {
    state.store(s.code(), Ordering::Release);
}

fn to_message(frame: Frame) -> Message {
    match frame {
        Frame::Text(s) => Message::Text(s),
        Frame::Binary(b) => Message::Binary(b.to_vec()),
    }
}

async fn run(
    request: Request,
    config: WebSocketConfig,
    state: Arc<AtomicU8>,
    callbacks: NativeCallbacks,
    mut cmds: mpsc::UnboundedReceiver<Command>,
) {
    let connect = tokio_tungstenite::connect_async_with_config(request, Some(config), false);
    tokio::pin!(connect);

    // ---- handshake (close/terminate while connecting aborts it)
    let ws = loop {
        tokio::select! {
            res = &mut connect => match res {
                Ok((ws, _response)) => break ws,
                Err(e) => {
                    store(&state, ReadyState::Closed);
                    callbacks.on_error(TransportError::from_native(&e));
                    callbacks.on_close(Some(ABNORMAL_CLOSE_CODE), None);
                    return;
                }
            },
            cmd = cmds.recv() => match cmd {
                Some(Command::Send(_)) => continue,
                Some(Command::Close { .. }) | Some(Command::Terminate) | None => {
                    store(&state, ReadyState::Closed);
                    callbacks.on_close(Some(ABNORMAL_CLOSE_CODE), None);
                    return;
                }
            },
        }
    };

    store(&state, ReadyState::Open);
    callbacks.on_open();

    let (mut sink, mut stream) = ws.split();
    let mut close_code: Option<u16> = None;
    let mut close_reason: Option<String> = None;

    loop {
        tokio::select! {
            cmd = cmds.recv() => match cmd {
                Some(Command::Send(frame)) => {
                    if let Err(e) = sink.send(to_message(frame)).await {
                        callbacks.on_error(TransportError::from_native(&e));
                    }
                }
                Some(Command::Close { code, reason }) => {
                    if load(&state) != ReadyState::Open {
                        continue;
                    }
                    store(&state, ReadyState::Closing);
                    let frame = code.map(|c| CloseFrame {
                        code: CloseCode::from(c),
                        reason: reason.unwrap_or_default().into(),
                    });
                    if let Err(e) = sink.send(Message::Close(frame)).await {
                        callbacks.on_error(TransportError::from_native(&e));
                        close_code = Some(ABNORMAL_CLOSE_CODE);
                        break;
                    }
                }
                Some(Command::Terminate) | None => {
                    break;
                }
            },

            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(s))) => callbacks.on_message(NativeData::Text(s)),
                Some(Ok(Message::Binary(b))) => {
                    callbacks.on_message(NativeData::Binary(Bytes::from(b)))
                }
                Some(Ok(Message::Close(frame))) => {
                    // tungstenite answers the close itself; wait for the stream to end
                    store(&state, ReadyState::Closing);
                    if let Some(f) = frame {
                        close_code = Some(f.code.into());
                        close_reason = Some(f.reason.into_owned());
                    }
                }
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Err(tungstenite::Error::ConnectionClosed)) | None => break,
                Some(Err(e)) => {
                    callbacks.on_error(TransportError::from_native(&e));
                    if close_code.is_none() {
                        close_code = Some(ABNORMAL_CLOSE_CODE);
                    }
                    break;
                }
            },
        }
    }

    store(&state, ReadyState::Closed);
    callbacks.on_close(close_code, close_reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_without_runtime_is_unavailable() {
        let err = TungsteniteFactory::new().probe().unwrap_err();
        assert_eq!(err.code().as_str(), "ENVIRONMENT_UNAVAILABLE");
    }

    #[test]
    fn config_limits_are_applied() {
        let section = SocketSection {
            max_message_bytes: 2048,
            max_frame_bytes: 1024,
            ..SocketSection::default()
        };
        let f = TungsteniteFactory::with_config(&section);
        assert_eq!(f.config.max_message_size, Some(2048));
        assert_eq!(f.config.max_frame_size, Some(1024));
    }

    #[tokio::test]
    async fn invalid_url_fails_at_open() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let res = TungsteniteFactory::new().open("not a url", NativeCallbacks::new(tx));
        assert_eq!(res.err().map(|e| e.code().as_str()), Some("TRANSPORT"));
    }
}
