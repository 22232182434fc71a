//! wsBridge client library entry.
//!
//! This crate carries the runtime half of wsBridge: the uniform
//! `TransportSocket` over pluggable native sockets, and the YAML config that
//! tunes it. It is consumed by the `wsbridge-tail` binary and by integration
//! tests.

pub mod config;
pub mod transport;
