//! # Fabula
//!
//! An authoritative room engine for a storytelling party game: one player
//! picks a secret card and gives a hint, everyone else puts down a decoy, and
//! the table votes on which card was the storyteller's.
//!
//! ## Architecture
//!
//! A room moves through six phases:
//!
//! - **Waiting**: lobby, players join
//! - **Storytelling**: the storyteller picks a card and a hint
//! - **SelectCards**: everyone else puts down a decoy
//! - **Voting**: non-storytellers vote on the shuffled table
//! - **Reveal**: round scored, ownership shown
//! - **GameEnd**: somebody reached the winning score
//!
//! ## Core Modules
//!
//! - [`game`]: card pool, deck allocator, player directory, phase state
//!   machine, scoring and views
//! - [`registry`]: one actor per room and the registry that owns them
//! - [`store`]: where room snapshots are written
//!
//! ## Example
//!
//! ```
//! use fabula::{CardPool, Phase, Room, RoomConfig, RoomId};
//!
//! let mut room = Room::new(RoomId::new("den"), RoomConfig::default(), CardPool::builtin());
//! for (name, session) in [("ada", "s1"), ("bo", "s2"), ("cy", "s3")] {
//!     room.join(name.into(), session.into()).unwrap();
//! }
//! room.start_game().unwrap();
//! assert_eq!(room.phase(), Phase::Storytelling);
//! ```

/// Room engine, entities and scoring.
pub mod game;
pub use game::{
    Card, CardId, CardPool, CatalogError, GameError, GameResult, JoinOutcome, Lifecycle,
    NotFoundReason, Phase, Player, PlayerName, Room, RoomConfig, RoomEvent, RoomId,
    RoomSnapshot, RoomSummary, RoomView, RoundOutcome, ScoreDelta, ScoreReason, ScoringRule,
    SessionId, StateReason, ValidationReason,
    constants::{self, HAND_SIZE, WINNING_SCORE},
};

/// Per-room actors and the room registry.
pub mod registry;
pub use registry::{RegistryError, RegistryResult, RoomHandle, RoomNotification, RoomRegistry};

/// Room snapshot storage.
pub mod store;
pub use store::{MemoryRoomStore, RoomStore, StoreError};
