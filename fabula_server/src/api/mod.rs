//! HTTP/WebSocket API for the room server.
//!
//! Two ways to play the same rooms: REST endpoints for clients that poll,
//! and a WebSocket per player that pushes a fresh view on every change.
//! Both go through the same [`RoomRegistry`], so they can be mixed freely
//! within one room.
//!
//! # Modules
//!
//! - [`rooms`]: Room listing, views and actions
//! - [`websocket`]: Push channel for live room updates
//! - [`error`]: Registry errors as HTTP status codes and JSON bodies
//! - [`request_id`]: Request correlation IDs
//! - [`rate_limiter`]: Per-socket message throttling
//!
//! # Endpoints Overview
//!
//! ```text
//! GET  /health                               - Liveness and room count
//! GET  /api/v1/rooms                         - List rooms
//! GET  /api/v1/rooms/{id}?session_id=        - Room as one player sees it
//! POST /api/v1/rooms/{id}/join               - Join (creates the room)
//! POST /api/v1/rooms/{id}/start              - Start the game
//! POST /api/v1/rooms/{id}/hint               - Storyteller's card and hint
//! POST /api/v1/rooms/{id}/choose             - Put a decoy on the table
//! POST /api/v1/rooms/{id}/vote               - Vote for a card
//! POST /api/v1/rooms/{id}/next-round         - Rotate the storyteller
//! POST /api/v1/rooms/{id}/restart            - Back to the lobby
//! POST /api/v1/sessions/{session_id}/leave   - Leave every room
//! GET  /ws/{id}?name=                        - WebSocket session
//! ```
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use fabula::{CardPool, RoomConfig, RoomRegistry};
//! use fabula_server::api::{AppState, create_router};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = RoomRegistry::in_memory(RoomConfig::default(), CardPool::builtin())?;
//! let app = create_router(AppState {
//!     registry: Arc::new(registry),
//! });
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6969").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # CORS
//!
//! CORS is configured permissively for development. In production, configure
//! appropriate origins, methods, and headers.

pub mod error;
pub mod rate_limiter;
pub mod request_id;
pub mod rooms;
pub mod websocket;

use axum::{
    Router,
    extract::State,
    response::{IntoResponse, Json},
    routing::{get, post},
};
use fabula::RoomRegistry;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers and WebSocket connections.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

/// Create the complete API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let root_routes = Router::new()
        .route("/health", get(health_check))
        .route("/ws/{room_id}", get(websocket::websocket_handler));

    Router::new()
        .merge(root_routes)
        .nest("/api/v1", create_v1_router())
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/{room_id}", get(rooms::get_room))
        .route("/rooms/{room_id}/join", post(rooms::join_room))
        .route("/rooms/{room_id}/start", post(rooms::start_game))
        .route("/rooms/{room_id}/hint", post(rooms::give_hint))
        .route("/rooms/{room_id}/choose", post(rooms::choose_card))
        .route("/rooms/{room_id}/vote", post(rooms::vote))
        .route("/rooms/{room_id}/next-round", post(rooms::next_round))
        .route("/rooms/{room_id}/restart", post(rooms::restart))
        .route("/sessions/{session_id}/leave", post(rooms::leave))
}

/// Health check endpoint for monitoring and load balancers.
///
/// # Example
///
/// ```bash
/// curl http://localhost:6969/health
/// # {"status":"healthy","version":"0.1.0","rooms":{"active_count":2},"timestamp":"2026-10-16T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let room_count = state.registry.active_room_count().await;

    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "rooms": {
            "active_count": room_count
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
