//! Deck allocator.
//!
//! Moves cards from a shuffled copy of the pool into player hands. A card
//! only ever moves, it is never copied, so as long as every move goes
//! through here no card id can be live in two places.

use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use super::{
    catalog::CardPool,
    entities::{Card, CardId, Player},
};

/// Cards not currently held by anyone, drawn from the front.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// Fisher-Yates shuffle of a copy of the whole pool.
    pub fn shuffled<R: Rng + ?Sized>(pool: &CardPool, rng: &mut R) -> Self {
        let mut cards = pool.cards().to_vec();
        cards.shuffle(rng);
        Self {
            cards: cards.into(),
        }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    /// Shuffle the discard pile and put it under the remaining cards.
    pub fn recycle<R: Rng + ?Sized>(&mut self, discard: &mut Vec<Card>, rng: &mut R) {
        discard.shuffle(rng);
        self.cards.extend(discard.drain(..));
    }

    /// Draw a card, reshuffling the discard pile in first if the deck is dry.
    fn draw_or_recycle<R: Rng + ?Sized>(
        &mut self,
        discard: &mut Vec<Card>,
        rng: &mut R,
    ) -> Option<Card> {
        if self.cards.is_empty() && !discard.is_empty() {
            self.recycle(discard, rng);
        }
        self.draw()
    }
}

impl From<Vec<Card>> for Deck {
    fn from(cards: Vec<Card>) -> Self {
        Self {
            cards: cards.into(),
        }
    }
}

/// Deal up to `hand_size` cards to each player in turn order. A short deck
/// leaves the later players with short hands.
pub fn deal(deck: &mut Deck, players: &mut [Player], hand_size: usize) {
    for player in players.iter_mut() {
        for _ in 0..hand_size {
            match deck.draw() {
                Some(card) => player.hand.push(card),
                None => return,
            }
        }
    }
}

/// Top every hand back up to `hand_size`, in turn order. Full hands are left
/// alone. When the deck runs dry the discard pile is shuffled back in; only
/// when both are empty do hands stay short.
pub fn refill<R: Rng + ?Sized>(
    deck: &mut Deck,
    discard: &mut Vec<Card>,
    players: &mut [Player],
    hand_size: usize,
    rng: &mut R,
) {
    for player in players.iter_mut() {
        top_up(deck, discard, player, hand_size, rng);
    }
}

/// Top up a single hand.
pub fn top_up<R: Rng + ?Sized>(
    deck: &mut Deck,
    discard: &mut Vec<Card>,
    player: &mut Player,
    hand_size: usize,
    rng: &mut R,
) {
    while player.hand.len() < hand_size {
        match deck.draw_or_recycle(discard, rng) {
            Some(card) => player.hand.push(card),
            None => return,
        }
    }
}

/// First card id that occurs more than once across `cards`, if any.
pub fn audit<'a>(cards: impl IntoIterator<Item = &'a Card>) -> Option<CardId> {
    let mut seen = HashSet::new();
    cards.into_iter().map(|c| c.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(format!("p{i}").into(), format!("s{i}").as_str().into()))
            .collect()
    }

    fn all_cards<'a>(deck: &'a Deck, players: &'a [Player]) -> impl Iterator<Item = &'a Card> {
        deck.iter().chain(players.iter().flat_map(|p| p.hand.iter()))
    }

    #[test]
    fn test_shuffle_leaves_pool_untouched() {
        let pool = CardPool::numbered(20);
        let before: Vec<CardId> = pool.cards().iter().map(|c| c.id).collect();

        let mut rng = StdRng::seed_from_u64(7);
        let deck = Deck::shuffled(&pool, &mut rng);

        let after: Vec<CardId> = pool.cards().iter().map(|c| c.id).collect();
        assert_eq!(before, after);
        assert_eq!(deck.len(), 20);
        assert!(audit(deck.iter()).is_none());
    }

    #[test]
    fn test_deal_full_hands() {
        let pool = CardPool::numbered(30);
        let mut rng = StdRng::seed_from_u64(1);
        let mut deck = Deck::shuffled(&pool, &mut rng);
        let mut players = players(4);

        deal(&mut deck, &mut players, 6);

        assert!(players.iter().all(|p| p.hand.len() == 6));
        assert_eq!(deck.len(), 6);
        assert!(audit(all_cards(&deck, &players)).is_none());
    }

    #[test]
    fn test_deal_short_deck_gives_short_hands() {
        let mut deck = Deck::from(CardPool::numbered(8).cards().to_vec());
        let mut players = players(3);

        deal(&mut deck, &mut players, 6);

        assert_eq!(players[0].hand.len(), 6);
        assert_eq!(players[1].hand.len(), 2);
        assert_eq!(players[2].hand.len(), 0);
        assert!(deck.is_empty());
    }

    #[test]
    fn test_refill_tops_up_only_short_hands() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut deck = Deck::from(CardPool::numbered(24).cards().to_vec());
        let mut discard = Vec::new();
        let mut players = players(3);
        deal(&mut deck, &mut players, 6);

        players[0].hand.pop();
        players[2].hand.truncate(3);
        let remaining = deck.len();

        refill(&mut deck, &mut discard, &mut players, 6, &mut rng);

        assert!(players.iter().all(|p| p.hand.len() == 6));
        assert_eq!(deck.len(), remaining - 4);
    }

    #[test]
    fn test_refill_with_nothing_left_is_noop() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut deck = Deck::default();
        let mut discard = Vec::new();
        let mut players = players(2);
        players[0].hand.push(Card::new(1, "a", "a"));

        refill(&mut deck, &mut discard, &mut players, 6, &mut rng);

        assert_eq!(players[0].hand.len(), 1);
        assert!(players[1].hand.is_empty());
    }

    #[test]
    fn test_refill_reshuffles_discard_when_deck_runs_dry() {
        let mut rng = StdRng::seed_from_u64(9);
        let pool = CardPool::numbered(20);
        let mut deck = Deck::from(pool.cards()[..2].to_vec());
        let mut discard = pool.cards()[2..6].to_vec();
        let mut players = players(2);
        players[0].hand.extend(pool.cards()[8..11].iter().cloned());
        players[1].hand.extend(pool.cards()[11..14].iter().cloned());

        refill(&mut deck, &mut discard, &mut players, 6, &mut rng);

        assert!(players.iter().all(|p| p.hand.len() == 6));
        assert!(deck.is_empty());
        assert!(discard.is_empty());
        assert!(audit(all_cards(&deck, &players)).is_none());
    }

    #[test]
    fn test_audit_finds_duplicate() {
        let cards = vec![
            Card::new(1, "a", "a"),
            Card::new(2, "b", "b"),
            Card::new(1, "a", "a"),
        ];
        assert_eq!(audit(&cards), Some(CardId(1)));
    }
}
