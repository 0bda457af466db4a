//! Snapshots and per-viewer projections of a room.
//!
//! A [`RoomSnapshot`] is the whole truth, every hand included, and is what
//! the store keeps. Anything sent to a player goes through
//! [`RoomSnapshot::view_for`] first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    config::RoomConfig,
    deck::Deck,
    entities::{Card, CardId, Lifecycle, Phase, PlayerName, RoomId, SelectedCard, SessionId, Vote},
    roster::Roster,
    scoring::RoundOutcome,
    state_machine::Room,
};

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub config: RoomConfig,
    pub lifecycle: Lifecycle,
    pub phase: Phase,
    pub round: u32,
    pub storyteller_index: usize,
    pub roster: Roster,
    pub deck: Deck,
    pub discard: Vec<Card>,
    pub hint: String,
    pub storyteller_card_id: Option<CardId>,
    pub selected_cards: Vec<SelectedCard>,
    pub mixed_cards: Vec<Card>,
    pub votes: Vec<Vote>,
    pub winner_name: Option<PlayerName>,
    pub last_outcome: Option<RoundOutcome>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.clone(),
            config: room.config.clone(),
            lifecycle: room.lifecycle,
            phase: room.phase,
            round: room.round,
            storyteller_index: room.storyteller_idx,
            roster: room.roster.clone(),
            deck: room.deck.clone(),
            discard: room.discard.clone(),
            hint: room.hint.clone(),
            storyteller_card_id: room.storyteller_card,
            selected_cards: room.selected.clone(),
            mixed_cards: room.mixed.clone(),
            votes: room.votes.clone(),
            winner_name: room.winner.clone(),
            last_outcome: room.last_outcome.clone(),
            created_at: room.created_at,
            updated_at: room.updated_at,
        }
    }
}

/// What other players can see about a seat.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SeatView {
    pub name: PlayerName,
    pub points: u32,
    pub hand_size: usize,
    pub is_storyteller: bool,
    pub submitted: bool,
    pub voted: bool,
}

/// A room as one viewer is allowed to see it.
///
/// Hands other than the viewer's are reduced to a count. Until the reveal,
/// the table shows only card faces (in shuffled order, once voting opens) and
/// nobody learns which card belongs to whom or who voted for what.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomView {
    pub id: RoomId,
    pub lifecycle: Lifecycle,
    pub phase: Phase,
    pub round: u32,
    pub storyteller: Option<PlayerName>,
    pub seats: Vec<SeatView>,
    pub deck_size: usize,
    pub hint: Option<String>,
    /// The viewer's seat name, if they are seated.
    pub me: Option<PlayerName>,
    pub hand: Vec<Card>,
    /// The card the viewer put on the table this round.
    pub my_card: Option<CardId>,
    pub my_vote: Option<CardId>,
    pub cards_on_table: usize,
    pub table: Vec<Card>,
    /// Only filled at the reveal and after the game ends.
    pub storyteller_card_id: Option<CardId>,
    pub ownership: Vec<SelectedCard>,
    pub votes: Vec<Vote>,
    pub last_outcome: Option<RoundOutcome>,
    pub winner: Option<PlayerName>,
}

impl RoomSnapshot {
    pub fn storyteller(&self) -> Option<&PlayerName> {
        self.roster
            .get(self.storyteller_index)
            .map(|p| &p.name)
    }

    /// Project the snapshot for `viewer`. `None` gives the spectator view.
    pub fn view_for(&self, viewer: Option<&SessionId>) -> RoomView {
        let me = viewer.and_then(|s| self.roster.by_session(s));
        let revealed = matches!(self.phase, Phase::Reveal | Phase::GameEnd);

        let seats = self
            .roster
            .players()
            .iter()
            .enumerate()
            .map(|(idx, p)| SeatView {
                name: p.name.clone(),
                points: p.points,
                hand_size: p.hand.len(),
                is_storyteller: self.lifecycle == Lifecycle::Playing
                    && idx == self.storyteller_index,
                submitted: self.selected_cards.iter().any(|s| s.player == p.name),
                voted: self.votes.iter().any(|v| v.player == p.name),
            })
            .collect();

        let table = match self.phase {
            Phase::Voting | Phase::Reveal | Phase::GameEnd => self.mixed_cards.clone(),
            _ => Vec::new(),
        };

        RoomView {
            id: self.id.clone(),
            lifecycle: self.lifecycle,
            phase: self.phase,
            round: self.round,
            storyteller: match self.lifecycle {
                Lifecycle::Playing => self.storyteller().cloned(),
                Lifecycle::Lobby => None,
            },
            seats,
            deck_size: self.deck.len(),
            hint: (!self.hint.is_empty()).then(|| self.hint.clone()),
            me: me.map(|p| p.name.clone()),
            hand: me.map(|p| p.hand.clone()).unwrap_or_default(),
            my_card: me.and_then(|p| {
                self.selected_cards
                    .iter()
                    .find(|s| s.player == p.name)
                    .map(|s| s.card.id)
            }),
            my_vote: me.and_then(|p| {
                self.votes
                    .iter()
                    .find(|v| v.player == p.name)
                    .map(|v| v.card_id)
            }),
            cards_on_table: self.selected_cards.len(),
            table,
            storyteller_card_id: if revealed {
                self.storyteller_card_id
            } else {
                None
            },
            ownership: if revealed {
                self.selected_cards.clone()
            } else {
                Vec::new()
            },
            votes: if revealed { self.votes.clone() } else { Vec::new() },
            last_outcome: if revealed {
                self.last_outcome.clone()
            } else {
                None
            },
            winner: self.winner_name.clone(),
        }
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            lifecycle: self.lifecycle,
            phase: self.phase,
            round: self.round,
            players: self.roster.len(),
            max_players: self.config.max_players,
        }
    }
}

/// One line in a room listing.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomSummary {
    pub id: RoomId,
    pub lifecycle: Lifecycle,
    pub phase: Phase,
    pub round: u32,
    pub players: usize,
    pub max_players: usize,
}
