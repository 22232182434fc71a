//! Top-level facade crate for wsBridge.
//!
//! Re-exports core types and the client library so users can depend on a single crate.

pub mod core {
    pub use wsbridge_core::*;
}

pub mod client {
    pub use wsbridge_client::*;
}
