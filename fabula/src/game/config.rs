//! Room configuration models.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::constants;

/// Which scoring formula a room uses.
///
/// Two formulas are in circulation for this game. `Standard` pays correct
/// voters +3 in every round and adds the +2 bonus on top when all or none of
/// the voters were right. `Classic` withholds the +3 in those rounds (the +2
/// bonus replaces it) and reports decoy votes as one lump entry per owner.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringRule {
    #[default]
    Standard,
    Classic,
}

impl std::fmt::Display for ScoringRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringRule::Standard => write!(f, "standard"),
            ScoringRule::Classic => write!(f, "classic"),
        }
    }
}

impl FromStr for ScoringRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(ScoringRule::Standard),
            "classic" => Ok(ScoringRule::Classic),
            other => Err(format!("unknown scoring rule '{other}'")),
        }
    }
}

/// Room configuration
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoomConfig {
    /// Cards per hand after a deal or refill (default: 6)
    pub hand_size: usize,

    /// Points that end the game (default: 30)
    pub winning_score: u32,

    /// Players needed to start (default: 3)
    pub min_players: usize,

    /// Roster cap (default: 10)
    pub max_players: usize,

    /// Shortest accepted hint, after trimming
    pub min_hint_length: usize,

    /// Longest accepted hint, after trimming
    pub max_hint_length: usize,

    pub scoring_rule: ScoringRule,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            hand_size: constants::HAND_SIZE,
            winning_score: constants::WINNING_SCORE,
            min_players: constants::MIN_PLAYERS,
            max_players: constants::DEFAULT_MAX_PLAYERS,
            min_hint_length: constants::MIN_HINT_LENGTH,
            max_hint_length: constants::MAX_HINT_LENGTH,
            scoring_rule: ScoringRule::Standard,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.hand_size == 0 {
            return Err("Hand size must be at least 1".to_string());
        }

        if self.winning_score == 0 {
            return Err("Winning score must be at least 1".to_string());
        }

        // A round needs a storyteller and at least one voter.
        if self.min_players < 2 {
            return Err("Min players must be at least 2".to_string());
        }

        if self.max_players < self.min_players {
            return Err("Max players can't be less than min players".to_string());
        }

        if self.min_hint_length == 0 || self.max_hint_length < self.min_hint_length {
            return Err("Hint bounds must satisfy 1 <= min <= max".to_string());
        }

        Ok(())
    }

    /// Cards needed to deal every seated player a full hand.
    pub fn cards_needed(&self, players: usize) -> usize {
        players * self.hand_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn test_min_players_below_two_rejected() {
        let config = RoomConfig {
            min_players: 1,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_below_min_rejected() {
        let config = RoomConfig {
            min_players: 4,
            max_players: 3,
            ..RoomConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scoring_rule_parse() {
        assert_eq!("Classic".parse::<ScoringRule>(), Ok(ScoringRule::Classic));
        assert_eq!(ScoringRule::Standard.to_string(), "standard");
        assert!("house".parse::<ScoringRule>().is_err());
    }
}
