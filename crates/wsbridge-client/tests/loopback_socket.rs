//! TransportSocket behavior against the in-process native socket.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use wsbridge_client::transport::native::NativeCallbacks;
use wsbridge_client::transport::{
    EventKind, EventStream, Frame, LoopbackFactory, Payload, ReadyState, SocketEvent,
    SocketFactory, TransportSocket,
};
use wsbridge_core::error::{Result, TransportError, WsBridgeError};

const URL: &str = "ws://loopback/gateway";

async fn next(events: &mut EventStream) -> SocketEvent {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event stream ended")
}

async fn ended(events: &mut EventStream) -> bool {
    tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("timed out waiting for end of stream")
        .is_none()
}

fn text(s: &str) -> SocketEvent {
    SocketEvent::Message(Payload::Text(s.into()))
}

fn binary(b: &'static [u8]) -> SocketEvent {
    SocketEvent::Message(Payload::Binary(Bytes::from_static(b)))
}

fn counter(socket: &TransportSocket, kind: EventKind) -> Arc<AtomicUsize> {
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    socket.on(kind, move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    hits
}

#[tokio::test]
async fn open_precedes_messages() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();

    assert_eq!(socket.ready_state(), ReadyState::Connecting);
    assert_eq!(socket.ready_state().code(), TransportSocket::CONNECTING);

    let remote = acceptor.accept().await.unwrap();
    assert_eq!(remote.url(), URL);

    remote.send_text("too early");
    remote.accept();
    remote.send_text("hello");

    assert_eq!(next(&mut events).await, SocketEvent::Open);
    assert_eq!(next(&mut events).await, text("hello"));
    assert_eq!(socket.ready_state(), ReadyState::Open);
    assert_eq!(socket.ready_state().code(), TransportSocket::OPEN);
}

#[tokio::test]
async fn send_before_open_is_dropped() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let mut remote = acceptor.accept().await.unwrap();

    socket.send("lost");
    remote.accept();
    assert_eq!(next(&mut events).await, SocketEvent::Open);

    socket.send(r#"{"op":1,"d":null}"#);
    socket.send(vec![1u8, 2, 3]);

    assert_eq!(remote.recv().await, Some(Frame::Text(r#"{"op":1,"d":null}"#.into())));
    assert_eq!(
        remote.recv().await,
        Some(Frame::Binary(Bytes::from_static(&[1, 2, 3])))
    );
}

#[tokio::test]
async fn lazy_blobs_are_materialized_in_order() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let factory = factory.binary_as_blob(true);
    let (_socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    remote.accept();
    remote.send_slow_blob(&b"\x01\x02\x03"[..], Duration::from_millis(50));
    remote.send_text("after");
    remote.send_binary(&b"\x09"[..]);

    assert_eq!(next(&mut events).await, SocketEvent::Open);
    assert_eq!(next(&mut events).await, binary(b"\x01\x02\x03"));
    assert_eq!(next(&mut events).await, text("after"));
    assert_eq!(next(&mut events).await, binary(b"\x09"));
}

#[tokio::test]
async fn broken_blob_is_an_error_not_a_close() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    remote.accept();
    remote.send_broken_blob("blob read failed");
    remote.send_text("still here");

    assert_eq!(next(&mut events).await, SocketEvent::Open);
    assert_eq!(
        next(&mut events).await,
        SocketEvent::Error(TransportError::new("blob read failed"))
    );
    assert_eq!(next(&mut events).await, text("still here"));
    assert_eq!(socket.ready_state(), ReadyState::Open);
}

#[tokio::test]
async fn native_error_does_not_close() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    remote.accept();
    remote.fail("ECONNRESET");
    remote.send_text("ok");

    assert_eq!(next(&mut events).await, SocketEvent::Open);
    match next(&mut events).await {
        SocketEvent::Error(e) => assert_eq!(e.message(), "ECONNRESET"),
        other => panic!("expected error, got {other:?}"),
    }
    assert_eq!(next(&mut events).await, text("ok"));
    assert_eq!(socket.ready_state(), ReadyState::Open);
}

#[tokio::test]
async fn close_fires_once_and_last() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();
    let closes = counter(&socket, EventKind::Close);
    let messages = counter(&socket, EventKind::Message);

    remote.accept();
    assert_eq!(next(&mut events).await, SocketEvent::Open);

    socket.close(Some(1000), Some("bye".into()));
    assert_eq!(socket.ready_state(), ReadyState::Closing);
    socket.close(Some(4000), Some("again".into()));

    assert_eq!(
        next(&mut events).await,
        SocketEvent::Close {
            code: 1000,
            reason: "bye".into(),
        }
    );
    assert!(ended(&mut events).await);
    assert_eq!(socket.ready_state(), ReadyState::Closed);
    assert_eq!(socket.ready_state().code(), TransportSocket::CLOSED);
    assert_eq!(remote.closed_with(), Some((Some(1000), Some("bye".into()))));

    // everything after close is inert
    remote.send_text("late");
    remote.fail("late");
    socket.close(None, None);
    socket.terminate();
    socket.send("late");
    tokio::task::yield_now().await;

    assert_eq!(closes.load(Ordering::SeqCst), 1);
    assert_eq!(messages.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn terminate_uses_default_code() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    remote.accept();
    assert_eq!(next(&mut events).await, SocketEvent::Open);

    socket.terminate();
    assert_eq!(
        next(&mut events).await,
        SocketEvent::Close {
            code: 1005,
            reason: String::new(),
        }
    );
    assert!(ended(&mut events).await);
    assert_eq!(remote.closed_with(), None);
}

#[tokio::test]
async fn remote_close_carries_code_and_reason() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    remote.accept();
    remote.send_text("last words");
    remote.close(Some(4004), Some("Authentication failed.".into()));
    remote.close(Some(1000), None);

    assert_eq!(next(&mut events).await, SocketEvent::Open);
    assert_eq!(next(&mut events).await, text("last words"));
    assert_eq!(
        next(&mut events).await,
        SocketEvent::Close {
            code: 4004,
            reason: "Authentication failed.".into(),
        }
    );
    assert!(ended(&mut events).await);
    assert_eq!(socket.ready_state(), ReadyState::Closed);
}

#[tokio::test]
async fn listeners_are_multicast_without_replay() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();
    let opens = counter(&socket, EventKind::Open);

    remote.accept();
    assert_eq!(next(&mut events).await, SocketEvent::Open);

    let mut late = socket.subscribe();
    remote.send_text("both");

    assert_eq!(next(&mut events).await, text("both"));
    assert_eq!(next(&mut late).await, text("both"));
    assert_eq!(opens.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn off_stops_delivery() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    let id = socket.on(EventKind::Message, move |ev| {
        if let SocketEvent::Message(p) = ev {
            assert_eq!(p.as_text(), Some("a"));
        }
        h.fetch_add(1, Ordering::SeqCst);
    });

    remote.accept();
    remote.send_text("a");
    assert_eq!(next(&mut events).await, SocketEvent::Open);
    assert_eq!(next(&mut events).await, text("a"));

    assert!(socket.off(id));
    assert!(!socket.off(id));

    remote.send_text("b");
    assert_eq!(next(&mut events).await, text("b"));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_native_side_yields_abnormal_close() {
    let (factory, mut acceptor) = LoopbackFactory::new();
    let (socket, mut events) = TransportSocket::connect(URL, &factory).unwrap();
    let remote = acceptor.accept().await.unwrap();

    remote.accept();
    assert_eq!(next(&mut events).await, SocketEvent::Open);

    drop(socket);
    drop(remote);

    assert_eq!(
        next(&mut events).await,
        SocketEvent::Close {
            code: 1006,
            reason: String::new(),
        }
    );
    assert!(ended(&mut events).await);
}

#[tokio::test]
async fn debug_shows_url_and_state() {
    let (factory, _acceptor) = LoopbackFactory::new();
    let (socket, _events) = TransportSocket::connect(URL, &factory).unwrap();
    assert_eq!(socket.url(), URL);
    assert_eq!(
        format!("{socket:?}"),
        r#"TransportSocket { url: "ws://loopback/gateway", ready_state: Connecting, .. }"#
    );
}

#[test]
fn no_runtime_is_environment_unavailable() {
    let (factory, _acceptor) = LoopbackFactory::new();
    let err = TransportSocket::connect(URL, &factory).unwrap_err();
    assert_eq!(err.code().as_str(), "ENVIRONMENT_UNAVAILABLE");
}

struct NoSockets;

impl SocketFactory for NoSockets {
    fn name(&self) -> &'static str {
        "none"
    }

    fn probe(&self) -> Result<()> {
        Err(WsBridgeError::EnvironmentUnavailable(
            "host exposes no realtime socket".into(),
        ))
    }

    fn open(
        &self,
        _url: &str,
        _callbacks: NativeCallbacks,
    ) -> Result<Box<dyn wsbridge_client::transport::native::NativeSocket>> {
        Err(WsBridgeError::Internal("open must not be reached".into()))
    }
}

#[tokio::test]
async fn failed_probe_is_environment_unavailable() {
    let err = TransportSocket::connect(URL, &NoSockets).unwrap_err();
    assert!(matches!(err, WsBridgeError::EnvironmentUnavailable(_)));
}
