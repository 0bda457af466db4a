/// Property-based tests for the room engine using proptest
///
/// Random action sequences, most of them invalid, are thrown at a room.
/// Whatever gets accepted, no card may ever be live in two places and the
/// table bookkeeping has to stay within its bounds.
use fabula::{CardId, CardPool, Lifecycle, Phase, Room, RoomConfig, RoomId, SessionId};
use proptest::prelude::*;

const POOL_SIZE: usize = 60;

#[derive(Clone, Debug)]
enum Op {
    Join { who: usize, fresh_session: bool },
    Leave { who: usize },
    Start,
    Hint { who: usize, pick: usize },
    Choose { who: usize, pick: usize },
    Vote { who: usize, pick: usize },
    NextRound,
    Restart,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..6, any::<bool>()).prop_map(|(who, fresh_session)| Op::Join { who, fresh_session }),
        (0usize..6).prop_map(|who| Op::Leave { who }),
        Just(Op::Start),
        (0usize..6, 0usize..8).prop_map(|(who, pick)| Op::Hint { who, pick }),
        (0usize..6, 0usize..8).prop_map(|(who, pick)| Op::Choose { who, pick }),
        (0usize..6, 0usize..8).prop_map(|(who, pick)| Op::Vote { who, pick }),
        Just(Op::NextRound),
        Just(Op::Restart),
    ]
}

// Sessions are named after the player plus a generation counter so a
// "fresh session" join exercises the reconnect path.
struct Driver {
    room: Room,
    generations: [u32; 6],
}

impl Driver {
    fn new(seed: u64) -> Self {
        let mut driver = Self {
            room: Room::with_seed(
                RoomId::new("prop"),
                RoomConfig::default(),
                CardPool::numbered(POOL_SIZE),
                seed,
            ),
            generations: [0; 6],
        };
        for who in 0..3 {
            let _ = driver.room.join(format!("p{who}").into(), driver.session(who));
        }
        driver
    }

    fn session(&self, who: usize) -> SessionId {
        SessionId::new(&format!("p{who}-{}", self.generations[who]))
    }

    fn hand_card(&self, who: usize, pick: usize) -> CardId {
        let session = self.session(who);
        self.room
            .players()
            .iter()
            .find(|p| p.session == session)
            .and_then(|p| p.hand.get(pick % p.hand.len().max(1)))
            .map(|c| c.id)
            .unwrap_or(CardId(pick as u32 + 1))
    }

    fn table_card(&self, pick: usize) -> CardId {
        let snap = self.room.snapshot();
        snap.mixed_cards
            .get(pick % snap.mixed_cards.len().max(1))
            .map(|c| c.id)
            .unwrap_or(CardId(pick as u32 + 1))
    }

    fn apply(&mut self, op: &Op) {
        let _ = match *op {
            Op::Join { who, fresh_session } => {
                if fresh_session {
                    self.generations[who] += 1;
                }
                self.room
                    .join(format!("p{who}").into(), self.session(who))
                    .map(|_| ())
            }
            Op::Leave { who } => self.room.leave(&self.session(who)).map(|_| ()),
            Op::Start => self.room.start_game(),
            Op::Hint { who, pick } => {
                let card = self.hand_card(who, pick);
                self.room.give_hint(&self.session(who), card, "a hint")
            }
            Op::Choose { who, pick } => {
                let card = self.hand_card(who, pick);
                self.room.choose_card(&self.session(who), card)
            }
            Op::Vote { who, pick } => {
                let card = self.table_card(pick);
                self.room.vote(&self.session(who), card)
            }
            Op::NextRound => self.room.next_round(),
            Op::Restart => self.room.restart(),
        };
    }

    fn check_invariants(&self) -> Result<(), TestCaseError> {
        let snap = self.room.snapshot();
        let players = snap.roster.players();

        prop_assert_eq!(self.room.audit(), None, "card live in two places");
        for p in players {
            prop_assert!(p.hand.len() <= snap.config.hand_size, "hand too large: {}", p.hand.len());
        }
        if !players.is_empty() {
            prop_assert!(snap.storyteller_index < players.len());
        }
        if snap.phase.is_mid_round() {
            prop_assert!(snap.selected_cards.len() <= players.len());
            prop_assert!(snap.votes.len() < players.len());
        }
        for vote in &snap.votes {
            let owner = snap
                .selected_cards
                .iter()
                .find(|s| s.card.id == vote.card_id)
                .map(|s| &s.player);
            prop_assert_ne!(owner, Some(&vote.player), "self-vote recorded");
        }

        if snap.lifecycle == Lifecycle::Playing {
            prop_assert_eq!(self.room.live_cards().count(), POOL_SIZE);
        }
        match snap.phase {
            Phase::SelectCards | Phase::Voting | Phase::Reveal => {
                prop_assert!(snap.storyteller_card_id.is_some());
                prop_assert_eq!(
                    snap.selected_cards.first().map(|s| s.card.id),
                    snap.storyteller_card_id
                );
            }
            _ => {}
        }
        prop_assert_eq!(
            snap.winner_name.is_some(),
            snap.phase == Phase::GameEnd
        );
        Ok(())
    }
}

proptest! {
    #[test]
    fn test_cards_are_never_duplicated(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut driver = Driver::new(seed);
        driver.check_invariants()?;
        for op in &ops {
            driver.apply(op);
            driver.check_invariants()?;
        }
    }

    #[test]
    fn test_rejected_ops_never_mutate(
        seed in any::<u64>(),
        ops in prop::collection::vec(op_strategy(), 1..120),
    ) {
        let mut driver = Driver::new(seed);
        for op in &ops {
            // Joins can change the session generation before they fail.
            if matches!(op, Op::Join { .. }) {
                driver.apply(op);
                continue;
            }
            let before = driver.room.snapshot();
            let accepted = match *op {
                Op::Leave { who } => driver.room.leave(&driver.session(who)).is_ok(),
                Op::Start => driver.room.start_game().is_ok(),
                Op::Hint { who, pick } => {
                    let card = driver.hand_card(who, pick);
                    driver.room.give_hint(&driver.session(who), card, "a hint").is_ok()
                }
                Op::Choose { who, pick } => {
                    let card = driver.hand_card(who, pick);
                    driver.room.choose_card(&driver.session(who), card).is_ok()
                }
                Op::Vote { who, pick } => {
                    let card = driver.table_card(pick);
                    driver.room.vote(&driver.session(who), card).is_ok()
                }
                Op::NextRound => driver.room.next_round().is_ok(),
                Op::Restart => driver.room.restart().is_ok(),
                Op::Join { .. } => true,
            };
            if !accepted {
                prop_assert_eq!(driver.room.snapshot(), before);
            }
        }
    }
}
