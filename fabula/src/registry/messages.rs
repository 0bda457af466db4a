//! Room actor message types.

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    CardId, GameResult, JoinOutcome, PlayerName, RoomEvent, RoomSnapshot, SessionId,
};

/// Reply to a successful action: the room as it stands afterwards.
pub type ActionResponse = oneshot::Sender<GameResult<RoomSnapshot>>;

/// Messages that can be sent to a RoomActor
#[derive(Debug)]
pub enum RoomMessage {
    /// Seat or reconnect a player
    Join {
        name: PlayerName,
        session: SessionId,
        response: oneshot::Sender<JoinAttempt>,
    },

    /// Remove a session's player, if it has one here
    Leave {
        session: SessionId,
        response: oneshot::Sender<LeaveReply>,
    },

    StartGame {
        response: ActionResponse,
    },

    GiveHint {
        session: SessionId,
        card_id: CardId,
        hint: String,
        response: ActionResponse,
    },

    ChooseCard {
        session: SessionId,
        card_id: CardId,
        response: ActionResponse,
    },

    Vote {
        session: SessionId,
        card_id: CardId,
        response: ActionResponse,
    },

    NextRound {
        response: ActionResponse,
    },

    Restart {
        response: ActionResponse,
    },

    /// Read-only snapshot
    GetState {
        response: oneshot::Sender<RoomSnapshot>,
    },

    /// Subscribe to state change notifications
    Subscribe {
        session: SessionId,
        sender: mpsc::Sender<RoomNotification>,
    },

    /// Unsubscribe from state change notifications
    Unsubscribe { session: SessionId },
}

#[derive(Clone, Debug)]
pub struct JoinReply {
    pub outcome: JoinOutcome,
    pub snapshot: RoomSnapshot,
}

/// What the room made of a join request.
#[derive(Clone, Debug)]
pub struct JoinAttempt {
    pub result: GameResult<JoinReply>,
    /// The room was empty after the attempt and has shut down
    pub retired: bool,
}

#[derive(Clone, Debug)]
pub struct LeaveReply {
    /// Name of the removed player, or `None` if the session wasn't seated here
    pub left: Option<PlayerName>,
    /// Players still seated
    pub remaining: usize,
    /// The last player left and the room has shut down
    pub retired: bool,
}

/// Notification pushed to subscribers after the room changes
#[derive(Clone, Debug)]
pub enum RoomNotification {
    /// Something happened; carries what happened and the resulting room
    StateChanged {
        events: Vec<RoomEvent>,
        snapshot: Arc<RoomSnapshot>,
    },
    /// The room was destroyed
    Closed,
}
