//! Structured logging configuration.
//!
//! The library logs through the `log` facade; the subscriber installed here
//! picks those records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Levels come from `RUST_LOG`, falling back to `info` with the HTTP stack
/// quieted down.
///
/// # Example
///
/// ```no_run
/// use fabula_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hyper=warn,tower_http=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    // `init` also installs the `log` bridge, so library records come through.
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log the outcome of a room action
///
/// Rejections are expected traffic (wrong phase, duplicate vote) so they go
/// out at debug; only the code is recorded.
pub fn log_room_action(room_id: &str, action: &str, error_code: Option<&str>) {
    match error_code {
        None => tracing::info!(room_id = room_id, action = action, "Room action applied"),
        Some(code) => tracing::debug!(
            room_id = room_id,
            action = action,
            error_code = code,
            "Room action rejected"
        ),
    }
}

/// Log API request/response
///
/// # Arguments
///
/// * `method` - HTTP method
/// * `path` - Request path
/// * `status_code` - Response status code
/// * `duration_ms` - Request duration in milliseconds
pub fn log_api_request(method: &str, path: &str, status_code: u16, duration_ms: u64) {
    if duration_ms > 1000 {
        tracing::warn!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "Slow API request"
        );
    } else {
        tracing::info!(
            http_method = method,
            http_path = path,
            http_status = status_code,
            duration_ms = duration_ms,
            "API request completed"
        );
    }
}
