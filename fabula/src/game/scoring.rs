//! Round scoring.
//!
//! Scoring is a pure function of one round's table: who told the story,
//! which card was theirs, who put down which card and who voted for what.
//! It returns point deltas with reason codes and leaves applying them to the
//! caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{
    config::ScoringRule,
    constants::{CONSOLATION_POINTS, CORRECT_GUESS_POINTS, DECOY_VOTE_POINTS, STORYTELLER_POINTS},
    entities::{CardId, PlayerName, SelectedCard, Vote},
};

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum ScoreReason {
    /// Storyteller's card was found by some, but not all, voters.
    StorytellerSuccess,
    /// Voter found the storyteller's card.
    CorrectGuess,
    /// One vote landed on this player's decoy.
    DecoyVote,
    /// All votes this player's decoy drew, as one entry.
    DecoyVotes { votes: usize },
    /// All or none of the voters found the storyteller's card.
    ConsolationBonus,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ScoreDelta {
    pub player: PlayerName,
    pub delta: u32,
    pub reason: ScoreReason,
}

impl ScoreDelta {
    fn new(player: &PlayerName, delta: u32, reason: ScoreReason) -> Self {
        Self {
            player: player.clone(),
            delta,
            reason,
        }
    }
}

/// One round's table, as seen by the scorer.
#[derive(Clone, Copy, Debug)]
pub struct RoundTable<'a> {
    pub storyteller: &'a PlayerName,
    pub storyteller_card: CardId,
    pub selected: &'a [SelectedCard],
    pub votes: &'a [Vote],
    /// Everyone seated when voting closed.
    pub players: &'a [PlayerName],
}

impl RoundTable<'_> {
    fn owner_of(&self, card_id: CardId) -> Option<&PlayerName> {
        self.selected
            .iter()
            .find(|s| s.card.id == card_id)
            .map(|s| &s.player)
    }
}

/// Score a finished round.
pub fn score(rule: ScoringRule, table: &RoundTable<'_>) -> Vec<ScoreDelta> {
    let correct_votes = table
        .votes
        .iter()
        .filter(|v| v.card_id == table.storyteller_card)
        .count();
    let all_correct = correct_votes == table.votes.len();
    let none_correct = correct_votes == 0;
    let split = !all_correct && !none_correct;

    let mut deltas = Vec::new();

    if split {
        deltas.push(ScoreDelta::new(
            table.storyteller,
            STORYTELLER_POINTS,
            ScoreReason::StorytellerSuccess,
        ));
    }

    let pays_correct_guess = match rule {
        ScoringRule::Standard => true,
        ScoringRule::Classic => split,
    };
    if pays_correct_guess {
        deltas.extend(
            table
                .votes
                .iter()
                .filter(|v| v.card_id == table.storyteller_card)
                .map(|v| ScoreDelta::new(&v.player, CORRECT_GUESS_POINTS, ScoreReason::CorrectGuess)),
        );
    }

    let decoy_owners = table
        .votes
        .iter()
        .filter(|v| v.card_id != table.storyteller_card)
        .filter_map(|v| table.owner_of(v.card_id))
        .filter(|owner| *owner != table.storyteller);

    match rule {
        ScoringRule::Standard => {
            deltas.extend(
                decoy_owners
                    .map(|owner| ScoreDelta::new(owner, DECOY_VOTE_POINTS, ScoreReason::DecoyVote)),
            );
        }
        ScoringRule::Classic => {
            // Lumped per owner, in the order owners first drew a vote.
            let mut order: Vec<&PlayerName> = Vec::new();
            let mut counts: HashMap<&PlayerName, usize> = HashMap::new();
            for owner in decoy_owners {
                let count = counts.entry(owner).or_insert(0);
                if *count == 0 {
                    order.push(owner);
                }
                *count += 1;
            }
            deltas.extend(order.into_iter().map(|owner| {
                let votes = counts.get(owner).copied().unwrap_or(0);
                ScoreDelta::new(
                    owner,
                    DECOY_VOTE_POINTS * votes as u32,
                    ScoreReason::DecoyVotes { votes },
                )
            }));
        }
    }

    if !split {
        deltas.extend(
            table
                .players
                .iter()
                .filter(|p| *p != table.storyteller)
                .map(|p| ScoreDelta::new(p, CONSOLATION_POINTS, ScoreReason::ConsolationBonus)),
        );
    }

    deltas
}

/// Sum the deltas per player.
pub fn totals(deltas: &[ScoreDelta]) -> HashMap<PlayerName, u32> {
    let mut totals = HashMap::new();
    for d in deltas {
        *totals.entry(d.player.clone()).or_insert(0) += d.delta;
    }
    totals
}

/// The scored result of a round, kept around for the reveal.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round: u32,
    pub storyteller: PlayerName,
    pub storyteller_card: CardId,
    pub hint: String,
    /// Ownership of every card on the table, storyteller first.
    pub selected: Vec<SelectedCard>,
    pub votes: Vec<Vote>,
    pub deltas: Vec<ScoreDelta>,
}
