//! wsbridge-tail
//!
//! Connects one TransportSocket to `socket.url` and logs every event.
//! - Config: first argument, default `wsbridge.yaml`
//! - Ctrl-C starts a graceful close (1000); the process exits on `Close`

use tracing_subscriber::{fmt, EnvFilter};

use wsbridge_client::config;
use wsbridge_client::transport::{SocketEvent, TransportSocket, TungsteniteFactory};
use wsbridge_core::deprecation::Deprecations;

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "wsbridge.yaml".into());
    let cfg = config::load_from_file(&path).expect("config load failed");
    cfg.deprecations.apply(&Deprecations::global());

    let url = cfg.socket.url.clone().expect("socket.url is required");
    let factory = TungsteniteFactory::with_config(&cfg.socket);
    let (socket, mut events) = TransportSocket::connect(url, &factory).expect("connect failed");

    tracing::info!(?socket, "wsbridge-tail connecting");

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interrupted = false;

    loop {
        tokio::select! {
            ev = events.recv() => match ev {
                Some(SocketEvent::Open) => tracing::info!("open"),
                Some(SocketEvent::Message(p)) => {
                    tracing::info!(
                        len = p.len(),
                        binary = p.is_binary(),
                        text = p.as_text(),
                        "message"
                    );
                }
                Some(SocketEvent::Error(e)) => tracing::warn!(error = %e, "error"),
                Some(SocketEvent::Close { code, reason }) => {
                    tracing::info!(code, %reason, "close");
                    break;
                }
                None => break,
            },

            _ = &mut ctrl_c, if !interrupted => {
                interrupted = true;
                tracing::info!("interrupt: closing");
                socket.close(Some(1000), Some("interrupted".into()));
            }
        }
    }
}
