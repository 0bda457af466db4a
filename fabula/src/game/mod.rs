//! Room engine: the card pool, deck allocator, player directory, phase state
//! machine and scoring.
//!
//! Nothing in here knows about tasks, channels or transports. A [`Room`] is
//! a plain value mutated through `&mut self`; serializing access to it is
//! the job of [`crate::registry`].

pub mod catalog;
pub mod config;
pub mod constants;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod roster;
pub mod scoring;
pub mod state_machine;
pub mod views;

pub use catalog::{CardPool, CatalogError};
pub use config::{RoomConfig, ScoringRule};
pub use entities::{
    Card, CardId, Lifecycle, Phase, Player, PlayerName, RoomEvent, RoomId, SessionId,
};
pub use errors::{GameError, GameResult, NotFoundReason, StateReason, ValidationReason};
pub use roster::JoinOutcome;
pub use scoring::{RoundOutcome, ScoreDelta, ScoreReason};
pub use state_machine::Room;
pub use views::{RoomSnapshot, RoomSummary, RoomView};
