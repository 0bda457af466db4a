//! Request ID middleware for tracing and debugging.
//!
//! Every request is tagged with an `x-request-id`, either the caller's or a
//! fresh UUID, which is echoed back and attached to the request log lines.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::{logging, metrics};

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generate or extract request ID from headers
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Middleware to add request ID to all requests and responses
///
/// Also records the request in the HTTP metrics and the access log.
///
/// # Example
///
/// ```no_run
/// use axum::{Router, routing::get, middleware};
/// use fabula_server::api::request_id::request_id_middleware;
///
/// let app: Router = Router::new()
///     .route("/", get(|| async { "Hello" }))
///     .layer(middleware::from_fn(request_id_middleware));
/// ```
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = get_or_generate_request_id(request.headers());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let span = tracing::info_span!("request", request_id = %request_id);
    span.in_scope(|| tracing::debug!(method = %method, uri = %request.uri(), "Request started"));
    let response = next.run(request).instrument(span.clone()).await;

    let (mut parts, body) = response.into_parts();
    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        parts.headers.insert(REQUEST_ID_HEADER, header_value);
    }

    let status = parts.status.as_u16();
    span.in_scope(|| {
        logging::log_api_request(&method, &path, status, started.elapsed().as_millis() as u64)
    });
    metrics::http_requests_total(&method, &path, status);

    Response::from_parts(parts, body)
}

/// Request ID wrapper stored in request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}
