//! Error types for room actions.
//!
//! Every rejected action carries a stable reason code so transports can
//! surface it without parsing messages. A rejected action never mutates the
//! room.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{CardId, Phase, RoomId, SessionId};

/// Result type for room actions
pub type GameResult<T> = Result<T, GameError>;

/// Errors returned by the room engine
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(tag = "kind", content = "reason", rename_all = "snake_case")]
pub enum GameError {
    /// Malformed input or an action the current phase does not allow
    #[error("invalid action: {0}")]
    Validation(#[from] ValidationReason),

    /// Unknown room, player or session
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundReason),

    /// The room cannot support the action in its current shape
    #[error("cannot proceed: {0}")]
    State(#[from] StateReason),
}

impl GameError {
    /// Stable code identifying the error, e.g. `validation.wrong_phase`.
    pub fn code(&self) -> String {
        match self {
            Self::Validation(reason) => format!("validation.{}", reason.code()),
            Self::NotFound(reason) => format!("not_found.{}", reason.code()),
            Self::State(reason) => format!("state.{}", reason.code()),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationReason {
    #[error("room id can't be empty")]
    EmptyRoomId,
    #[error("name can't be empty")]
    EmptyName,
    #[error("name is longer than {max} characters")]
    NameTooLong { max: usize },
    #[error("name is taken by another player")]
    NameTaken,
    #[error("room is full")]
    RoomFull,
    #[error("action not allowed during {phase}")]
    WrongPhase { phase: Phase },
    #[error("only the storyteller can do that")]
    NotStoryteller,
    #[error("the storyteller can't do that")]
    StorytellerForbidden,
    #[error("card {card_id} is not in your hand")]
    CardNotInHand { card_id: CardId },
    #[error("card {card_id} is not on the table")]
    CardNotOnTable { card_id: CardId },
    #[error("hint must be between {min} and {max} characters")]
    HintLength { min: usize, max: usize },
    #[error("already submitted a card this round")]
    AlreadySubmitted,
    #[error("already voted this round")]
    AlreadyVoted,
    #[error("can't vote for your own card")]
    OwnCard,
}

impl ValidationReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyRoomId => "empty_room_id",
            Self::EmptyName => "empty_name",
            Self::NameTooLong { .. } => "name_too_long",
            Self::NameTaken => "name_taken",
            Self::RoomFull => "room_full",
            Self::WrongPhase { .. } => "wrong_phase",
            Self::NotStoryteller => "not_storyteller",
            Self::StorytellerForbidden => "storyteller_forbidden",
            Self::CardNotInHand { .. } => "card_not_in_hand",
            Self::CardNotOnTable { .. } => "card_not_on_table",
            Self::HintLength { .. } => "hint_length",
            Self::AlreadySubmitted => "already_submitted",
            Self::AlreadyVoted => "already_voted",
            Self::OwnCard => "own_card",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundReason {
    #[error("room {0} does not exist")]
    UnknownRoom(RoomId),
    #[error("no player with session {0} in this room")]
    UnknownPlayer(SessionId),
    #[error("session {0} is not in any room")]
    UnknownSession(SessionId),
}

impl NotFoundReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownRoom(_) => "unknown_room",
            Self::UnknownPlayer(_) => "unknown_player",
            Self::UnknownSession(_) => "unknown_session",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateReason {
    #[error("need {required}+ players, have {present}")]
    NotEnoughPlayers { required: usize, present: usize },
    #[error("need {required} cards to deal, pool has {available}")]
    InsufficientCards { required: usize, available: usize },
}

impl StateReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotEnoughPlayers { .. } => "not_enough_players",
            Self::InsufficientCards { .. } => "insufficient_cards",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_namespaced() {
        let err = GameError::from(ValidationReason::WrongPhase {
            phase: Phase::Voting,
        });
        assert_eq!(err.code(), "validation.wrong_phase");
        assert!(err.is_validation());

        let err = GameError::from(StateReason::NotEnoughPlayers {
            required: 3,
            present: 1,
        });
        assert_eq!(err.code(), "state.not_enough_players");
        assert_eq!(err.to_string(), "cannot proceed: need 3+ players, have 1");
    }

    #[test]
    fn test_not_found_display() {
        let err = GameError::from(NotFoundReason::UnknownRoom(RoomId::new("attic")));
        assert_eq!(err.code(), "not_found.unknown_room");
        assert!(err.to_string().contains("attic"));
    }
}
