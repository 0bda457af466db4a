//! Room API handlers.
//!
//! This module provides the HTTP REST endpoints for room operations:
//! - Listing rooms with their phase and player counts
//! - Reading a room as one player (or an onlooker) may see it
//! - Joining, which creates the room on first use
//! - The round actions: start, hint, choose, vote, next round, restart
//! - Leaving, which is keyed by session rather than room
//!
//! Every action answers with the room as the acting session sees it, so a
//! polling client never needs a second request to refresh its screen.
//!
//! # Examples
//!
//! Join a room:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms/den/join \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "ada"}'
//! ```
//!
//! Vote:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/rooms/den/vote \
//!   -H "Content-Type: application/json" \
//!   -d '{"session_id": "…", "card_id": 17}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
};
use fabula::{
    CardId, JoinOutcome, Phase, RegistryError, RoomId, RoomSnapshot, RoomSummary, RoomView,
    SessionId, registry::JoinReply,
};
use serde::{Deserialize, Serialize};

use super::{
    AppState,
    error::{ApiError, error_code},
};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct ViewQuery {
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    /// Reuse an existing session; a fresh one is issued when omitted
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct JoinResponse {
    pub session_id: SessionId,
    /// `seated`, `returned`, `reconnected` or `already_seated`
    pub outcome: String,
    pub view: RoomView,
}

#[derive(Debug, Deserialize)]
pub struct HintRequest {
    pub session_id: SessionId,
    pub card_id: CardId,
    pub hint: String,
}

/// Body of the choose and vote endpoints
#[derive(Debug, Deserialize)]
pub struct CardRequest {
    pub session_id: SessionId,
    pub card_id: CardId,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct LeaveResponse {
    pub rooms: Vec<RoomId>,
}

pub(crate) fn outcome_label(outcome: &JoinOutcome) -> &'static str {
    match outcome {
        JoinOutcome::Seated => "seated",
        JoinOutcome::Returned => "returned",
        JoinOutcome::Reconnected { .. } => "reconnected",
        JoinOutcome::AlreadySeated => "already_seated",
    }
}

/// Record an action's outcome in logs and metrics.
pub(crate) fn track<T>(room_id: &RoomId, kind: &str, result: &Result<T, RegistryError>) {
    match result {
        Ok(_) => {
            logging::log_room_action(room_id.as_str(), kind, None);
            metrics::room_action(kind, "ok");
        }
        Err(err) => {
            let code = error_code(err);
            logging::log_room_action(room_id.as_str(), kind, Some(&code));
            metrics::room_action(kind, &code);
        }
    }
}

/// The vote that completes a round is the only accepted vote leaving the
/// room outside the voting phase.
pub(crate) fn track_vote(snapshot: &RoomSnapshot) {
    if matches!(snapshot.phase, Phase::Reveal | Phase::GameEnd) {
        metrics::rounds_scored_total();
    }
}

pub(crate) async fn join_and_track(
    state: &AppState,
    room_id: &RoomId,
    name: &str,
    session: SessionId,
) -> Result<JoinReply, RegistryError> {
    let result = state.registry.join(room_id, name.into(), session).await;
    track(room_id, "join", &result);
    if let Ok(reply) = &result
        && reply.outcome == JoinOutcome::Seated
        && reply.snapshot.roster.len() == 1
    {
        metrics::rooms_created_total();
    }
    metrics::active_rooms(state.registry.active_room_count().await);
    result
}

pub(crate) async fn leave_and_track(
    state: &AppState,
    session: &SessionId,
) -> Result<Vec<RoomId>, RegistryError> {
    let before = state.registry.active_room_count().await;
    let result = state.registry.leave(session).await;
    let after = state.registry.active_room_count().await;
    if let Ok(rooms) = &result {
        for room_id in rooms {
            track(room_id, "leave", &result);
        }
    }
    metrics::rooms_destroyed_total(before.saturating_sub(after));
    metrics::active_rooms(after);
    result
}

/// List all active rooms.
///
/// # Response
///
/// Returns `200 OK` with an array of room summaries, ordered by id:
/// ```json
/// [
///   {
///     "id": "den",
///     "lifecycle": "Playing",
///     "phase": "Voting",
///     "round": 3,
///     "players": 5,
///     "max_players": 10
///   }
/// ]
/// ```
pub async fn list_rooms(State(state): State<AppState>) -> Json<Vec<RoomSummary>> {
    Json(state.registry.list_rooms().await)
}

/// Get a room as `session_id` sees it.
///
/// Without a session the response is the onlooker view: no hands, no
/// ownership before the reveal.
///
/// # Errors
///
/// - `404 Not Found`: Room doesn't exist
pub async fn get_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<RoomView>, ApiError> {
    let view = state
        .registry
        .view(&room_id, query.session_id.as_ref())
        .await?;
    Ok(Json(view))
}

/// Join a room, creating it if it doesn't exist.
///
/// Joining with a name already seated in a running game takes the seat over
/// with the new session, keeping its points and hand.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Empty or overlong name, name taken in the lobby, room full
pub async fn join_room(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<JoinRequest>,
) -> Result<Json<JoinResponse>, ApiError> {
    let session = request.session_id.unwrap_or_else(SessionId::generate);
    let reply = join_and_track(&state, &room_id, &request.name, session.clone()).await?;

    Ok(Json(JoinResponse {
        outcome: outcome_label(&reply.outcome).to_string(),
        view: reply.snapshot.view_for(Some(&session)),
        session_id: session,
    }))
}

/// Deal the first hands and pick the first storyteller.
///
/// # Errors
///
/// - `409 Conflict`: Too few players or too few cards
/// - `422 Unprocessable Entity`: Game already running
pub async fn start_game(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomView>, ApiError> {
    let result = state.registry.start_game(&room_id).await;
    track(&room_id, "start_game", &result);
    Ok(Json(result?.view_for(None)))
}

pub async fn give_hint(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<HintRequest>,
) -> Result<Json<RoomView>, ApiError> {
    let result = state
        .registry
        .give_hint(&room_id, &request.session_id, request.card_id, &request.hint)
        .await;
    track(&room_id, "give_hint", &result);
    Ok(Json(result?.view_for(Some(&request.session_id))))
}

pub async fn choose_card(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<CardRequest>,
) -> Result<Json<RoomView>, ApiError> {
    let result = state
        .registry
        .choose_card(&room_id, &request.session_id, request.card_id)
        .await;
    track(&room_id, "choose_card", &result);
    Ok(Json(result?.view_for(Some(&request.session_id))))
}

/// Vote for a card on the table.
///
/// The last vote scores the round; the response then carries the reveal.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Own card, storyteller voting, already voted, card not on table
pub async fn vote(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
    Json(request): Json<CardRequest>,
) -> Result<Json<RoomView>, ApiError> {
    let result = state
        .registry
        .vote(&room_id, &request.session_id, request.card_id)
        .await;
    track(&room_id, "vote", &result);
    let snapshot = result?;
    track_vote(&snapshot);
    Ok(Json(snapshot.view_for(Some(&request.session_id))))
}

pub async fn next_round(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomView>, ApiError> {
    let result = state.registry.next_round(&room_id).await;
    track(&room_id, "next_round", &result);
    Ok(Json(result?.view_for(None)))
}

/// Reset scores and hands and go back to the lobby. Allowed after the game
/// ends or while still waiting.
pub async fn restart(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<RoomView>, ApiError> {
    let result = state.registry.restart(&room_id).await;
    track(&room_id, "restart", &result);
    Ok(Json(result?.view_for(None)))
}

/// Remove a session from every room it sits in.
///
/// Rooms left empty are destroyed.
///
/// # Errors
///
/// - `404 Not Found`: The session isn't seated anywhere
pub async fn leave(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<LeaveResponse>, ApiError> {
    let rooms = leave_and_track(&state, &session_id).await?;
    Ok(Json(LeaveResponse { rooms }))
}
