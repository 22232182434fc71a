//! wsBridge core: resource views, error types, and shared diagnostics.
//!
//! This crate defines the error surface, the deprecation port, the inspection
//! helper, and the wire-to-view resource layer shared by the client runtime and
//! by consumers that only need the resource types. It carries no transport or
//! runtime dependencies.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Legacy accessors never fail; every fallible path surfaces as
//! `WsBridgeError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod deprecation;
pub mod error;
pub mod inspect;
pub mod resource;
pub mod snowflake;

/// Shared result type.
pub use error::{Result, WsBridgeError};
