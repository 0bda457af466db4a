//! Player directory for one room.
//!
//! Players are looked up by name; the session attached to a name can be
//! swapped out when someone reconnects. Players who leave mid-game are parked
//! in a ledger under their name so they get their points and hand back if
//! they return before the room goes away.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    entities::{ParkedPlayer, Player, PlayerName, SessionId},
    errors::{GameResult, ValidationReason},
};

/// How a join was resolved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum JoinOutcome {
    /// Fresh seat with no points and no cards.
    Seated,
    /// Took their parked points and hand back.
    Returned,
    /// Same name, new session. Carries the session that was replaced.
    Reconnected { previous: SessionId },
    /// Same name and session as before; nothing changed.
    AlreadySeated,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Roster {
    /// Seated players, in turn order.
    players: Vec<Player>,
    /// Ledger of players who left mid-game, keyed by name.
    departed: BTreeMap<PlayerName, ParkedPlayer>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat `name` under `session`, or hand an existing seat to the new
    /// session.
    ///
    /// While the room is in the lobby, a name held by a different session is
    /// taken. Once a game is running the same situation is a reconnect and
    /// the seat moves to the new session with its hand and points intact.
    pub fn join(
        &mut self,
        name: PlayerName,
        session: SessionId,
        in_lobby: bool,
        max_players: usize,
    ) -> GameResult<JoinOutcome> {
        if name.is_empty() {
            return Err(ValidationReason::EmptyName.into());
        }
        if name.is_too_long() {
            return Err(ValidationReason::NameTooLong {
                max: super::constants::MAX_NAME_LENGTH,
            }
            .into());
        }

        if let Some(other) = self.by_session(&session)
            && other.name != name
        {
            return Err(ValidationReason::NameTaken.into());
        }

        if let Some(player) = self.players.iter_mut().find(|p| p.name == name) {
            if player.session == session {
                return Ok(JoinOutcome::AlreadySeated);
            }
            if in_lobby {
                return Err(ValidationReason::NameTaken.into());
            }
            let previous = std::mem::replace(&mut player.session, session);
            return Ok(JoinOutcome::Reconnected { previous });
        }

        if self.players.len() >= max_players {
            return Err(ValidationReason::RoomFull.into());
        }

        let mut player = Player::new(name, session);
        match self.departed.remove(&player.name) {
            Some(parked) => {
                player.points = parked.points;
                player.hand = parked.hand;
                self.players.push(player);
                Ok(JoinOutcome::Returned)
            }
            None => {
                self.players.push(player);
                Ok(JoinOutcome::Seated)
            }
        }
    }

    /// Remove the player seated under `session`, returning their turn-order
    /// index and record.
    pub fn remove(&mut self, session: &SessionId) -> Option<(usize, Player)> {
        let idx = self.index_of(session)?;
        Some((idx, self.players.remove(idx)))
    }

    /// Keep a departed player's points and hand for their return.
    pub fn park(&mut self, player: Player) {
        self.departed.insert(
            player.name,
            ParkedPlayer {
                points: player.points,
                hand: player.hand,
            },
        );
    }

    pub fn clear_departed(&mut self) {
        self.departed.clear();
    }

    pub fn departed(&self) -> &BTreeMap<PlayerName, ParkedPlayer> {
        &self.departed
    }

    pub fn index_of(&self, session: &SessionId) -> Option<usize> {
        self.players.iter().position(|p| &p.session == session)
    }

    pub fn by_session(&self, session: &SessionId) -> Option<&Player> {
        self.players.iter().find(|p| &p.session == session)
    }

    pub fn by_name(&self, name: &PlayerName) -> Option<&Player> {
        self.players.iter().find(|p| &p.name == name)
    }

    pub fn by_name_mut(&mut self, name: &PlayerName) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.name == name)
    }

    pub fn get(&self, idx: usize) -> Option<&Player> {
        self.players.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Player> {
        self.players.get_mut(idx)
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn names(&self) -> Vec<PlayerName> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}
