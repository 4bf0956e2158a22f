//! modelserve server library entry.
//!
//! Wires the config, metrics registry, prediction handler and ops endpoints
//! into an axum router. Consumed by the binary (`main.rs`) and by
//! integration tests.

pub mod app_state;
pub mod config;
pub mod obs;
pub mod ops;
pub mod predict;
pub mod router;
pub mod server;
