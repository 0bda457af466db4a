use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fabula::{
    Card, CardId, CardPool, PlayerName, Room, RoomConfig, RoomId, ScoringRule, SessionId,
    game::{
        deck::{self, Deck},
        entities::{Player, SelectedCard, Vote},
        scoring::{self, RoundTable},
    },
};
use rand::{SeedableRng, rngs::StdRng};
use std::hint::black_box;

/// Helper to create a room with N players in the lobby
fn setup_room(n_players: usize) -> Room {
    let mut room = Room::with_seed(
        RoomId::new("bench"),
        RoomConfig {
            max_players: n_players,
            ..RoomConfig::default()
        },
        CardPool::numbered(n_players * 12),
        7,
    );
    for i in 0..n_players {
        room.join(
            PlayerName::new(&format!("player{i}")),
            SessionId::new(&format!("s{i}")),
        )
        .unwrap();
    }
    room
}

/// Benchmark shuffling the pool and dealing full hands
fn bench_shuffle_and_deal(c: &mut Criterion) {
    let mut group = c.benchmark_group("shuffle_and_deal");

    for n_players in [3, 6, 10] {
        let pool = CardPool::numbered(84);
        group.bench_with_input(
            BenchmarkId::from_parameter(n_players),
            &n_players,
            |b, &n| {
                let mut rng = StdRng::seed_from_u64(1);
                b.iter(|| {
                    let mut deck = Deck::shuffled(&pool, &mut rng);
                    let mut players: Vec<Player> = (0..n)
                        .map(|i| {
                            Player::new(
                                PlayerName::new(&format!("p{i}")),
                                SessionId::new(&format!("s{i}")),
                            )
                        })
                        .collect();
                    deck::deal(&mut deck, &mut players, 6);
                    black_box(players)
                });
            },
        );
    }

    group.finish();
}

/// Benchmark scoring a full table under both rules
fn bench_scoring(c: &mut Criterion) {
    let names: Vec<PlayerName> = (0..10)
        .map(|i| PlayerName::new(&format!("p{i}")))
        .collect();
    let selected: Vec<SelectedCard> = names
        .iter()
        .enumerate()
        .map(|(i, name)| SelectedCard {
            card: Card::new(i as u32 + 1, "", ""),
            player: name.clone(),
        })
        .collect();
    // Half the voters find the storyteller, the rest spread over decoys.
    let votes: Vec<Vote> = names
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, name)| Vote {
            card_id: if i % 2 == 0 {
                CardId(1)
            } else {
                CardId((i as u32 % 9) + 2)
            },
            player: name.clone(),
        })
        .collect();
    let table = RoundTable {
        storyteller: &names[0],
        storyteller_card: CardId(1),
        selected: &selected,
        votes: &votes,
        players: &names,
    };

    let mut group = c.benchmark_group("scoring");
    for rule in [ScoringRule::Standard, ScoringRule::Classic] {
        group.bench_function(rule.to_string(), |b| {
            b.iter(|| black_box(scoring::score(rule, black_box(&table))));
        });
    }
    group.finish();
}

/// Benchmark a whole round through the room engine
fn bench_full_round(c: &mut Criterion) {
    c.bench_function("full_round_6_players", |b| {
        b.iter(|| {
            let mut room = setup_room(6);
            room.start_game().unwrap();
            let snap = room.snapshot();
            let players = snap.roster.players();
            let story = players[0].hand[0].id;
            room.give_hint(&players[0].session, story, "bench").unwrap();
            for p in &players[1..] {
                room.choose_card(&p.session, p.hand[0].id).unwrap();
            }
            for p in &players[1..] {
                room.vote(&p.session, story).unwrap();
            }
            room.next_round().unwrap();
            black_box(room)
        });
    });
}

criterion_group!(benches, bench_shuffle_and_deal, bench_scoring, bench_full_round);
criterion_main!(benches);
