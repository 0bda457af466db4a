//! Room state machine.
//!
//! A `Room` owns everything about one game room and is the only thing that
//! mutates it. Each action checks every guard before touching state, so a
//! rejected action leaves the room exactly as it was.
//!
//! ```text
//! waiting -> storytelling -> select cards -> voting -> reveal -> storytelling ...
//!                                                   \-> game end -> waiting
//! ```

use chrono::{DateTime, Utc};
use log::{debug, error, info};
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use std::collections::VecDeque;

use super::{
    catalog::CardPool,
    config::RoomConfig,
    deck::{self, Deck},
    entities::{
        Card, CardId, Lifecycle, Phase, Player, PlayerName, RoomEvent, RoomId, SelectedCard,
        SessionId, Vote,
    },
    errors::{GameResult, NotFoundReason, StateReason, ValidationReason},
    roster::{JoinOutcome, Roster},
    scoring::{self, RoundOutcome, RoundTable},
    views::RoomSnapshot,
};

#[derive(Debug)]
pub struct Room {
    pub(super) id: RoomId,
    pub(super) config: RoomConfig,
    pool: CardPool,
    pub(super) lifecycle: Lifecycle,
    pub(super) phase: Phase,
    pub(super) round: u32,
    pub(super) storyteller_idx: usize,
    pub(super) roster: Roster,
    pub(super) deck: Deck,
    /// Cards played in finished rounds, shuffled back in when the deck runs dry.
    pub(super) discard: Vec<Card>,
    pub(super) hint: String,
    pub(super) storyteller_card: Option<CardId>,
    /// Ownership of the cards on the table, storyteller first.
    pub(super) selected: Vec<SelectedCard>,
    /// The same cards in the order voters see them.
    pub(super) mixed: Vec<Card>,
    pub(super) votes: Vec<Vote>,
    pub(super) winner: Option<PlayerName>,
    pub(super) last_outcome: Option<RoundOutcome>,
    pub(super) created_at: DateTime<Utc>,
    pub(super) updated_at: DateTime<Utc>,
    events: VecDeque<RoomEvent>,
    rng: StdRng,
}

impl Room {
    pub fn new(id: RoomId, config: RoomConfig, pool: CardPool) -> Self {
        Self::with_rng(id, config, pool, StdRng::from_os_rng())
    }

    /// A room whose shuffles are reproducible.
    pub fn with_seed(id: RoomId, config: RoomConfig, pool: CardPool, seed: u64) -> Self {
        Self::with_rng(id, config, pool, StdRng::seed_from_u64(seed))
    }

    fn with_rng(id: RoomId, config: RoomConfig, pool: CardPool, rng: StdRng) -> Self {
        let now = Utc::now();
        Self {
            id,
            config,
            pool,
            lifecycle: Lifecycle::Lobby,
            phase: Phase::Waiting,
            round: 0,
            storyteller_idx: 0,
            roster: Roster::new(),
            deck: Deck::default(),
            discard: Vec::new(),
            hint: String::new(),
            storyteller_card: None,
            selected: Vec::new(),
            mixed: Vec::new(),
            votes: Vec::new(),
            winner: None,
            last_outcome: None,
            created_at: now,
            updated_at: now,
            events: VecDeque::new(),
            rng,
        }
    }

    /// Rebuild a room from a stored snapshot.
    pub fn restore(snapshot: RoomSnapshot, pool: CardPool) -> Self {
        Self {
            id: snapshot.id,
            config: snapshot.config,
            pool,
            lifecycle: snapshot.lifecycle,
            phase: snapshot.phase,
            round: snapshot.round,
            storyteller_idx: snapshot.storyteller_index,
            roster: snapshot.roster,
            deck: snapshot.deck,
            discard: snapshot.discard,
            hint: snapshot.hint,
            storyteller_card: snapshot.storyteller_card_id,
            selected: snapshot.selected_cards,
            mixed: snapshot.mixed_cards,
            votes: snapshot.votes,
            winner: snapshot.winner_name,
            last_outcome: snapshot.last_outcome,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
            events: VecDeque::new(),
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn players(&self) -> &[Player] {
        self.roster.players()
    }

    pub fn player_count(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn contains_session(&self, session: &SessionId) -> bool {
        self.roster.index_of(session).is_some()
    }

    pub fn storyteller(&self) -> Option<&Player> {
        self.roster.get(self.storyteller_idx)
    }

    pub fn winner(&self) -> Option<&PlayerName> {
        self.winner.as_ref()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn drain_events(&mut self) -> VecDeque<RoomEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot::from(self)
    }

    /// Every card currently held anywhere in the room.
    pub fn live_cards(&self) -> impl Iterator<Item = &Card> {
        self.deck
            .iter()
            .chain(self.discard.iter())
            .chain(self.selected.iter().map(|s| &s.card))
            .chain(self.roster.players().iter().flat_map(|p| p.hand.iter()))
            .chain(self.roster.departed().values().flat_map(|p| p.hand.iter()))
    }

    /// First card id found in two places at once, if any.
    pub fn audit(&self) -> Option<CardId> {
        deck::audit(self.live_cards())
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
        debug_assert!(self.audit().is_none(), "card duplicated in room {}", self.id);
    }

    fn ensure_phase(&self, phase: Phase) -> GameResult<()> {
        if self.phase != phase {
            return Err(ValidationReason::WrongPhase { phase: self.phase }.into());
        }
        Ok(())
    }

    fn seat_of(&self, session: &SessionId) -> GameResult<usize> {
        self.roster
            .index_of(session)
            .ok_or_else(|| NotFoundReason::UnknownPlayer(session.clone()).into())
    }

    fn clear_round(&mut self) {
        self.hint.clear();
        self.storyteller_card = None;
        self.selected.clear();
        self.mixed.clear();
        self.votes.clear();
    }

    /// Seat a player or reconnect an existing one.
    pub fn join(&mut self, name: PlayerName, session: SessionId) -> GameResult<JoinOutcome> {
        let in_lobby = self.lifecycle == Lifecycle::Lobby;
        let outcome = self
            .roster
            .join(name.clone(), session, in_lobby, self.config.max_players)?;

        match outcome {
            JoinOutcome::AlreadySeated => return Ok(outcome),
            JoinOutcome::Reconnected { .. } => {
                self.events.push_back(RoomEvent::Reconnected(name));
            }
            JoinOutcome::Seated | JoinOutcome::Returned => {
                if self.lifecycle == Lifecycle::Playing
                    && let Some(player) = self.roster.by_name_mut(&name)
                {
                    deck::top_up(
                        &mut self.deck,
                        &mut self.discard,
                        player,
                        self.config.hand_size,
                        &mut self.rng,
                    );
                }
                self.events.push_back(RoomEvent::Joined(name));
            }
        }

        self.touch();
        Ok(outcome)
    }

    /// Remove the player seated under `session`.
    ///
    /// Leaving while cards are on the table voids the round: every card goes
    /// back to its owner and the room returns to storytelling. Mid-game the
    /// leaver's points and hand are parked for their return.
    pub fn leave(&mut self, session: &SessionId) -> GameResult<PlayerName> {
        let idx = self.seat_of(session)?;

        let voided = self.phase.is_mid_round();
        if voided {
            self.return_table_cards();
        }

        let Some((_, player)) = self.roster.remove(session) else {
            return Err(NotFoundReason::UnknownPlayer(session.clone()).into());
        };
        let name = player.name.clone();
        if self.lifecycle == Lifecycle::Playing {
            self.roster.park(player);
        }

        let len = self.roster.len();
        if len == 0 {
            self.storyteller_idx = 0;
        } else if idx < self.storyteller_idx {
            self.storyteller_idx -= 1;
        } else if idx == self.storyteller_idx {
            self.storyteller_idx = if self.phase == Phase::Reveal {
                // next_round advances by one; land on whoever slid into the seat.
                (idx + len - 1) % len
            } else {
                idx % len
            };
        }

        if voided {
            self.phase = Phase::Storytelling;
            self.events
                .push_back(RoomEvent::RoundVoided { round: self.round });
        }
        self.events.push_back(RoomEvent::Left(name.clone()));
        self.touch();
        Ok(name)
    }

    fn return_table_cards(&mut self) {
        for selected in std::mem::take(&mut self.selected) {
            match self.roster.by_name_mut(&selected.player) {
                Some(owner) => owner.hand.push(selected.card),
                None => self.discard.push(selected.card),
            }
        }
        self.clear_round();
    }

    /// Deal hands and open round one.
    pub fn start_game(&mut self) -> GameResult<()> {
        self.ensure_phase(Phase::Waiting)?;

        let present = self.roster.len();
        if present < self.config.min_players {
            return Err(StateReason::NotEnoughPlayers {
                required: self.config.min_players,
                present,
            }
            .into());
        }

        let required = self.config.cards_needed(present);
        if self.pool.len() < required {
            return Err(StateReason::InsufficientCards {
                required,
                available: self.pool.len(),
            }
            .into());
        }

        self.deck = Deck::shuffled(&self.pool, &mut self.rng);
        self.discard.clear();
        self.roster.clear_departed();
        for player in self.roster.players_mut() {
            player.hand.clear();
            player.points = 0;
        }
        deck::deal(&mut self.deck, self.roster.players_mut(), self.config.hand_size);

        self.clear_round();
        self.winner = None;
        self.last_outcome = None;
        self.round = 1;
        self.storyteller_idx = 0;
        self.lifecycle = Lifecycle::Playing;
        self.phase = Phase::Storytelling;

        info!("Room {} started a game with {} players", self.id, present);
        self.events
            .push_back(RoomEvent::GameStarted { players: present });
        self.touch();
        Ok(())
    }

    /// The storyteller puts down their card with a hint.
    pub fn give_hint(&mut self, session: &SessionId, card_id: CardId, hint: &str) -> GameResult<()> {
        self.ensure_phase(Phase::Storytelling)?;
        let idx = self.seat_of(session)?;

        let present = self.roster.len();
        if present < self.config.min_players {
            return Err(StateReason::NotEnoughPlayers {
                required: self.config.min_players,
                present,
            }
            .into());
        }

        if idx != self.storyteller_idx {
            return Err(ValidationReason::NotStoryteller.into());
        }

        let hint = hint.trim();
        let hint_len = hint.chars().count();
        if hint_len < self.config.min_hint_length || hint_len > self.config.max_hint_length {
            return Err(ValidationReason::HintLength {
                min: self.config.min_hint_length,
                max: self.config.max_hint_length,
            }
            .into());
        }

        let Some(player) = self.roster.get_mut(idx) else {
            return Err(NotFoundReason::UnknownPlayer(session.clone()).into());
        };
        let Some(card) = player.take_card(card_id) else {
            return Err(ValidationReason::CardNotInHand { card_id }.into());
        };
        let name = player.name.clone();

        self.hint = hint.to_string();
        self.storyteller_card = Some(card_id);
        self.selected = vec![SelectedCard {
            card,
            player: name.clone(),
        }];
        self.mixed.clear();
        self.votes.clear();
        self.phase = Phase::SelectCards;

        debug!("Room {}: {} gave hint '{}'", self.id, name, self.hint);
        self.events.push_back(RoomEvent::HintGiven(name));
        self.touch();
        Ok(())
    }

    /// A non-storyteller puts down a decoy.
    pub fn choose_card(&mut self, session: &SessionId, card_id: CardId) -> GameResult<()> {
        self.ensure_phase(Phase::SelectCards)?;
        let idx = self.seat_of(session)?;

        if idx == self.storyteller_idx {
            return Err(ValidationReason::StorytellerForbidden.into());
        }

        let Some(player) = self.roster.get_mut(idx) else {
            return Err(NotFoundReason::UnknownPlayer(session.clone()).into());
        };
        if self.selected.iter().any(|s| s.player == player.name) {
            return Err(ValidationReason::AlreadySubmitted.into());
        }
        let Some(card) = player.take_card(card_id) else {
            return Err(ValidationReason::CardNotInHand { card_id }.into());
        };
        let name = player.name.clone();

        self.selected.push(SelectedCard {
            card,
            player: name.clone(),
        });
        self.events.push_back(RoomEvent::CardChosen(name));

        if self.selected.len() == self.roster.len() {
            self.open_voting();
        }

        self.touch();
        Ok(())
    }

    fn open_voting(&mut self) {
        let mut mixed: Vec<Card> = self.selected.iter().map(|s| s.card.clone()).collect();
        mixed.shuffle(&mut self.rng);
        self.mixed = mixed;
        self.phase = Phase::Voting;
        self.events.push_back(RoomEvent::VotingOpened);
    }

    /// A non-storyteller votes for the card they think is the storyteller's.
    pub fn vote(&mut self, session: &SessionId, card_id: CardId) -> GameResult<()> {
        self.ensure_phase(Phase::Voting)?;
        let idx = self.seat_of(session)?;

        if idx == self.storyteller_idx {
            return Err(ValidationReason::StorytellerForbidden.into());
        }

        let Some(player) = self.roster.get(idx) else {
            return Err(NotFoundReason::UnknownPlayer(session.clone()).into());
        };
        let name = player.name.clone();

        if self.votes.iter().any(|v| v.player == name) {
            return Err(ValidationReason::AlreadyVoted.into());
        }

        let Some(target) = self.selected.iter().find(|s| s.card.id == card_id) else {
            return Err(ValidationReason::CardNotOnTable { card_id }.into());
        };
        if target.player == name {
            return Err(ValidationReason::OwnCard.into());
        }

        self.votes.push(Vote {
            card_id,
            player: name.clone(),
        });
        self.events.push_back(RoomEvent::VoteCast(name));

        if self.votes.len() + 1 == self.roster.len() {
            self.finish_round();
        }

        self.touch();
        Ok(())
    }

    fn finish_round(&mut self) {
        let (Some(storyteller), Some(storyteller_card)) =
            (self.storyteller().map(|p| p.name.clone()), self.storyteller_card)
        else {
            error!(
                "Room {}: round {} has no storyteller card to score, voiding it",
                self.id, self.round
            );
            self.return_table_cards();
            self.phase = Phase::Storytelling;
            self.events
                .push_back(RoomEvent::RoundVoided { round: self.round });
            return;
        };

        let names = self.roster.names();
        let deltas = scoring::score(
            self.config.scoring_rule,
            &RoundTable {
                storyteller: &storyteller,
                storyteller_card,
                selected: &self.selected,
                votes: &self.votes,
                players: &names,
            },
        );

        for d in &deltas {
            if let Some(player) = self.roster.by_name_mut(&d.player) {
                player.points += d.delta;
            }
        }

        info!(
            "Room {} scored round {} ({} entries)",
            self.id,
            self.round,
            deltas.len()
        );
        self.last_outcome = Some(RoundOutcome {
            round: self.round,
            storyteller,
            storyteller_card,
            hint: self.hint.clone(),
            selected: self.selected.clone(),
            votes: self.votes.clone(),
            deltas,
        });
        self.events
            .push_back(RoomEvent::RoundScored { round: self.round });

        // Highest score wins; ties go to whoever comes first in turn order.
        let leader = self
            .roster
            .players()
            .iter()
            .filter(|p| p.points >= self.config.winning_score)
            .fold(None::<&Player>, |best, p| match best {
                Some(b) if b.points >= p.points => Some(b),
                _ => Some(p),
            })
            .map(|p| p.name.clone());

        match leader {
            Some(name) => {
                info!("Room {}: {} won the game", self.id, name);
                self.winner = Some(name.clone());
                self.phase = Phase::GameEnd;
                self.events.push_back(RoomEvent::GameWon(name));
            }
            None => self.phase = Phase::Reveal,
        }
    }

    /// Move on from the reveal: rotate the storyteller and refill hands.
    pub fn next_round(&mut self) -> GameResult<()> {
        self.ensure_phase(Phase::Reveal)?;

        self.discard
            .extend(std::mem::take(&mut self.selected).into_iter().map(|s| s.card));
        self.clear_round();

        self.round += 1;
        let len = self.roster.len();
        self.storyteller_idx = if len == 0 {
            0
        } else {
            (self.storyteller_idx + 1) % len
        };
        deck::refill(
            &mut self.deck,
            &mut self.discard,
            self.roster.players_mut(),
            self.config.hand_size,
            &mut self.rng,
        );
        self.phase = Phase::Storytelling;

        let storyteller = self
            .storyteller()
            .map(|p| p.name.clone())
            .unwrap_or_else(|| PlayerName::new(""));
        self.events.push_back(RoomEvent::NextRound {
            round: self.round,
            storyteller,
        });
        self.touch();
        Ok(())
    }

    /// Back to the lobby with scores and hands wiped. Allowed after a game
    /// ends, and again from the lobby.
    pub fn restart(&mut self) -> GameResult<()> {
        if !matches!(self.phase, Phase::GameEnd | Phase::Waiting) {
            return Err(ValidationReason::WrongPhase { phase: self.phase }.into());
        }

        self.clear_round();
        self.deck.clear();
        self.discard.clear();
        self.winner = None;
        self.last_outcome = None;
        self.roster.clear_departed();
        for player in self.roster.players_mut() {
            player.points = 0;
            player.hand.clear();
        }
        self.round = 0;
        self.storyteller_idx = 0;
        self.lifecycle = Lifecycle::Lobby;
        self.phase = Phase::Waiting;

        self.events.push_back(RoomEvent::Restarted);
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::errors::GameError;

    fn room_with(n: usize) -> Room {
        let mut room = Room::with_seed(
            RoomId::new("test"),
            RoomConfig::default(),
            CardPool::numbered(84),
            42,
        );
        for i in 0..n {
            room.join(format!("p{i}").into(), session(i)).unwrap();
        }
        room
    }

    fn session(i: usize) -> SessionId {
        SessionId::new(&format!("s{i}"))
    }

    fn first_card(room: &Room, i: usize) -> CardId {
        room.players()[i].hand[0].id
    }

    #[test]
    fn test_start_requires_three_players() {
        let mut room = room_with(2);
        let err = room.start_game().unwrap_err();
        assert_eq!(
            err,
            GameError::State(StateReason::NotEnoughPlayers {
                required: 3,
                present: 2
            })
        );
        assert_eq!(room.phase(), Phase::Waiting);
        assert_eq!(room.lifecycle(), Lifecycle::Lobby);
    }

    #[test]
    fn test_start_requires_enough_cards() {
        let mut room = Room::new(
            RoomId::new("small"),
            RoomConfig::default(),
            CardPool::numbered(17),
        );
        for i in 0..3 {
            room.join(format!("p{i}").into(), session(i)).unwrap();
        }
        let err = room.start_game().unwrap_err();
        assert_eq!(err.code(), "state.insufficient_cards");
        assert!(room.players().iter().all(|p| p.hand.is_empty()));
        assert_eq!(room.deck_len(), 0);
    }

    #[test]
    fn test_start_deals_hands() {
        let mut room = room_with(4);
        room.start_game().unwrap();

        assert_eq!(room.phase(), Phase::Storytelling);
        assert_eq!(room.lifecycle(), Lifecycle::Playing);
        assert_eq!(room.round(), 1);
        assert!(room.players().iter().all(|p| p.hand.len() == 6));
        assert_eq!(room.deck_len(), 84 - 24);
        assert!(room.audit().is_none());
    }

    #[test]
    fn test_hint_guards() {
        let mut room = room_with(3);
        room.start_game().unwrap();
        let card = first_card(&room, 0);

        let err = room.give_hint(&session(1), first_card(&room, 1), "waves").unwrap_err();
        assert_eq!(err, GameError::Validation(ValidationReason::NotStoryteller));

        let err = room.give_hint(&session(0), card, " x ").unwrap_err();
        assert_eq!(err.code(), "validation.hint_length");

        let long = "a".repeat(101);
        assert!(room.give_hint(&session(0), card, &long).is_err());

        let foreign = first_card(&room, 2);
        let err = room.give_hint(&session(0), foreign, "waves").unwrap_err();
        assert_eq!(
            err,
            GameError::Validation(ValidationReason::CardNotInHand { card_id: foreign })
        );

        assert_eq!(room.phase(), Phase::Storytelling);
        assert_eq!(room.players()[0].hand.len(), 6);

        room.give_hint(&session(0), card, "  waves  ").unwrap();
        assert_eq!(room.phase(), Phase::SelectCards);
        assert_eq!(room.hint, "waves");
        assert_eq!(room.selected[0].player, PlayerName::new("p0"));
        assert_eq!(room.players()[0].hand.len(), 5);
    }

    #[test]
    fn test_select_cards_transitions_when_everyone_submitted() {
        let mut room = room_with(3);
        room.start_game().unwrap();
        room.give_hint(&session(0), first_card(&room, 0), "dusk").unwrap();

        let err = room.choose_card(&session(0), first_card(&room, 0)).unwrap_err();
        assert_eq!(err, GameError::Validation(ValidationReason::StorytellerForbidden));

        room.choose_card(&session(1), first_card(&room, 1)).unwrap();
        assert_eq!(room.phase(), Phase::SelectCards);

        let err = room.choose_card(&session(1), first_card(&room, 1)).unwrap_err();
        assert_eq!(err, GameError::Validation(ValidationReason::AlreadySubmitted));

        room.choose_card(&session(2), first_card(&room, 2)).unwrap();
        assert_eq!(room.phase(), Phase::Voting);
        assert_eq!(room.mixed.len(), 3);
        assert_eq!(room.selected[0].player, PlayerName::new("p0"));
    }

    #[test]
    fn test_vote_guards_and_completion() {
        let mut room = room_with(3);
        room.start_game().unwrap();
        let story = first_card(&room, 0);
        room.give_hint(&session(0), story, "dusk").unwrap();
        let c1 = first_card(&room, 1);
        let c2 = first_card(&room, 2);
        room.choose_card(&session(1), c1).unwrap();
        room.choose_card(&session(2), c2).unwrap();

        assert_eq!(
            room.vote(&session(0), story).unwrap_err(),
            GameError::Validation(ValidationReason::StorytellerForbidden)
        );
        assert_eq!(
            room.vote(&session(1), c1).unwrap_err(),
            GameError::Validation(ValidationReason::OwnCard)
        );
        assert_eq!(
            room.vote(&session(1), CardId(9999)).unwrap_err(),
            GameError::Validation(ValidationReason::CardNotOnTable {
                card_id: CardId(9999)
            })
        );

        room.vote(&session(1), story).unwrap();
        assert_eq!(room.phase(), Phase::Voting);
        assert_eq!(
            room.vote(&session(1), c2).unwrap_err(),
            GameError::Validation(ValidationReason::AlreadyVoted)
        );

        room.vote(&session(2), c1).unwrap();
        assert_eq!(room.phase(), Phase::Reveal);

        // Split vote: storyteller +3, p1 +3 guess +1 decoy.
        assert_eq!(room.players()[0].points, 3);
        assert_eq!(room.players()[1].points, 4);
        assert_eq!(room.players()[2].points, 0);
        assert!(room.last_outcome.is_some());
    }

    #[test]
    fn test_next_round_rotates_and_refills() {
        let mut room = room_with(3);
        room.start_game().unwrap();
        let story = first_card(&room, 0);
        room.give_hint(&session(0), story, "dusk").unwrap();
        let c1 = first_card(&room, 1);
        room.choose_card(&session(1), c1).unwrap();
        room.choose_card(&session(2), first_card(&room, 2)).unwrap();
        room.vote(&session(1), story).unwrap();
        room.vote(&session(2), story).unwrap();

        room.next_round().unwrap();

        assert_eq!(room.round(), 2);
        assert_eq!(room.phase(), Phase::Storytelling);
        assert_eq!(room.storyteller().unwrap().name, PlayerName::new("p1"));
        assert!(room.players().iter().all(|p| p.hand.len() == 6));
        assert!(room.selected.is_empty() && room.votes.is_empty() && room.hint.is_empty());
        assert_eq!(room.discard.len(), 3);
        assert!(room.audit().is_none());
    }

    #[test]
    fn test_unscorable_round_is_voided_not_stuck() {
        let mut room = room_with(3);
        room.start_game().unwrap();
        let story = first_card(&room, 0);
        room.give_hint(&session(0), story, "dusk").unwrap();
        let c1 = first_card(&room, 1);
        room.choose_card(&session(1), c1).unwrap();
        room.choose_card(&session(2), first_card(&room, 2)).unwrap();
        room.vote(&session(1), story).unwrap();

        room.storyteller_card = None;
        room.vote(&session(2), c1).unwrap();

        assert_eq!(room.phase(), Phase::Storytelling);
        assert!(room.selected.is_empty() && room.votes.is_empty());
        assert!(room.players().iter().all(|p| p.hand.len() == 6 && p.points == 0));
        assert!(room.audit().is_none());
    }

    #[test]
    fn test_restart_only_after_game_end() {
        let mut room = room_with(3);
        room.start_game().unwrap();
        assert_eq!(
            room.restart().unwrap_err(),
            GameError::Validation(ValidationReason::WrongPhase {
                phase: Phase::Storytelling
            })
        );
    }

    #[test]
    fn test_restart_is_idempotent() {
        let mut room = room_with(3);
        room.restart().unwrap();
        let mut first = room.snapshot();
        room.restart().unwrap();
        let second = room.snapshot();

        first.updated_at = second.updated_at;
        assert_eq!(first, second);
        assert_eq!(second.phase, Phase::Waiting);
    }

    #[test]
    fn test_leave_mid_round_voids_round() {
        let mut room = room_with(4);
        room.start_game().unwrap();
        room.give_hint(&session(0), first_card(&room, 0), "dusk").unwrap();
        room.choose_card(&session(1), first_card(&room, 1)).unwrap();

        room.leave(&session(2)).unwrap();

        assert_eq!(room.phase(), Phase::Storytelling);
        assert!(room.selected.is_empty());
        assert_eq!(room.players()[0].hand.len(), 6);
        assert_eq!(room.players()[1].hand.len(), 6);
        assert_eq!(room.storyteller().unwrap().name, PlayerName::new("p0"));
        assert!(room.audit().is_none());
    }

    #[test]
    fn test_storyteller_leaving_hands_turn_to_next_seat() {
        let mut room = room_with(4);
        room.start_game().unwrap();
        room.leave(&session(0)).unwrap();
        assert_eq!(room.storyteller().unwrap().name, PlayerName::new("p1"));
    }

    #[test]
    fn test_leave_unknown_session() {
        let mut room = room_with(3);
        let err = room.leave(&SessionId::new("ghost")).unwrap_err();
        assert_eq!(err.code(), "not_found.unknown_player");
    }
}
