//! Transport layer: one event contract over platform sockets.
//!
//! - `native`: the capability a platform supplies (factory + socket + callback slots)
//! - `socket`: `TransportSocket`, the ordered event wrapper
//! - `events`: event, payload, and listener types
//! - `loopback`: in-process native socket
//! - `tungstenite`: network native socket (feature `tungstenite`)

pub mod events;
pub mod loopback;
pub mod native;
pub mod socket;
#[cfg(feature = "tungstenite")]
pub mod tungstenite;

pub use events::{EventKind, EventStream, ListenerId, Payload, SocketEvent};
pub use loopback::{LoopbackAcceptor, LoopbackFactory, LoopbackRemote};
pub use native::{Frame, ReadyState, SocketFactory};
pub use socket::TransportSocket;
#[cfg(feature = "tungstenite")]
pub use tungstenite::TungsteniteFactory;
