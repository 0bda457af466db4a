//! Prometheus metrics for monitoring room server health.
//!
//! Metrics are exposed in Prometheus text format on a separate listener when
//! a metrics address is configured. Without an installed recorder every
//! helper here is a no-op.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts by method, path and status
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Room Metrics**: Rooms created/destroyed, active rooms, actions, rounds scored
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use fabula_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::room_action("vote", "ok");
//! metrics::active_rooms(3);
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Track a socket opening (`delta = 1.0`) or closing (`delta = -1.0`).
pub fn websocket_connections_active(delta: f64) {
    metrics::gauge!("websocket_connections_active").increment(delta);
}

pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Room Metrics
// ============================================================================

/// Set current active rooms count.
pub fn active_rooms(count: usize) {
    metrics::gauge!("active_rooms").set(count as f64);
}

pub fn rooms_created_total() {
    metrics::counter!("rooms_created_total").increment(1);
}

pub fn rooms_destroyed_total(count: usize) {
    metrics::counter!("rooms_destroyed_total").increment(count as u64);
}

/// Count a room action by kind (`join`, `vote`, ...) and outcome (`ok` or an error code).
pub fn room_action(kind: &str, outcome: &str) {
    metrics::counter!("room_actions_total",
        "kind" => kind.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn rounds_scored_total() {
    metrics::counter!("rounds_scored_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_without_recorder() {
        // No recorder is installed in tests; calls must still be safe.
        http_requests_total("GET", "/health", 200);
        websocket_connections_active(1.0);
        websocket_connections_active(-1.0);
        room_action("join", "ok");
        room_action("vote", "validation.own_card");
        active_rooms(0);
        rooms_destroyed_total(2);
    }
}
