//! modelserve core: error taxonomy, the model capability, the forest artifact
//! format, and the `/predict` wire types.
//!
//! This crate carries no transport or runtime dependencies. The serving
//! runtime (`modelserve-server`) wires it into HTTP.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed artifacts and payloads surface as `ServeError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod model;
pub mod protocol;

/// Shared result type.
pub use error::{Result, ServeError};
pub use model::{ForestModel, Model};
