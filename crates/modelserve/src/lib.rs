//! Top-level facade crate for modelserve.
//!
//! Re-exports core types and the server library so users can depend on a single crate.

pub mod core {
    pub use modelserve_core::*;
}

pub mod server {
    pub use modelserve_server::*;
}
