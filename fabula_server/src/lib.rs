//! HTTP and WebSocket transport for fabula rooms.
//!
//! The binary in `main.rs` wires these modules together; they are exposed as
//! a library so the router can be driven directly from tests.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
