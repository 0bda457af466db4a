use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use super::constants;

/// Identifier of a card in the pool.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct CardId(pub u32);

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A picture card. Cards are only ever compared by id.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub title: String,
    /// Where the picture lives. Serving it is someone else's job.
    pub image: String,
}

impl Card {
    pub fn new(id: u32, title: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            id: CardId(id),
            title: title.into(),
            image: image.into(),
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.id, self.title)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for RoomId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for RoomId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Connection identity. Sessions come and go; a player keeps their seat
/// across sessions through their name.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(s: &str) -> Self {
        Self(s.to_string())
    }

    /// A fresh random session id for transports that don't bring their own.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Display name, unique within a room. This is the durable identity key for
/// a player.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerName(String);

impl PlayerName {
    /// Surrounding whitespace is dropped; length rules are checked on join.
    pub fn new(s: &str) -> Self {
        Self(s.trim().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_too_long(&self) -> bool {
        self.0.chars().count() > constants::MAX_NAME_LENGTH
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for PlayerName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<&str> for PlayerName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PlayerName {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub session: SessionId,
    pub name: PlayerName,
    pub points: u32,
    pub hand: Vec<Card>,
}

impl Player {
    pub fn new(name: PlayerName, session: SessionId) -> Self {
        Self {
            session,
            name,
            points: 0,
            hand: Vec::with_capacity(constants::HAND_SIZE),
        }
    }

    pub fn holds(&self, card_id: CardId) -> bool {
        self.hand.iter().any(|c| c.id == card_id)
    }

    /// Take a card out of the hand, if held.
    pub fn take_card(&mut self, card_id: CardId) -> Option<Card> {
        let idx = self.hand.iter().position(|c| c.id == card_id)?;
        Some(self.hand.remove(idx))
    }
}

/// What a departed player leaves behind for when they return.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ParkedPlayer {
    pub points: u32,
    pub hand: Vec<Card>,
}

/// A card placed face-down on the table this round.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SelectedCard {
    pub card: Card,
    pub player: PlayerName,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Vote {
    pub card_id: CardId,
    pub player: PlayerName,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifecycle {
    Lobby,
    Playing,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Waiting,
    Storytelling,
    SelectCards,
    Voting,
    Reveal,
    GameEnd,
}

impl Phase {
    /// Phases in which a round is open on the table.
    pub fn is_mid_round(self) -> bool {
        matches!(self, Self::SelectCards | Self::Voting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Storytelling => "storytelling",
            Self::SelectCards => "select cards",
            Self::Voting => "voting",
            Self::Reveal => "reveal",
            Self::GameEnd => "game end",
        };
        write!(f, "{repr}")
    }
}

/// Things that happened in a room, in the order they happened. These give
/// more insight into what an action did than the snapshot diff alone.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum RoomEvent {
    Joined(PlayerName),
    Reconnected(PlayerName),
    Left(PlayerName),
    GameStarted { players: usize },
    HintGiven(PlayerName),
    CardChosen(PlayerName),
    VotingOpened,
    VoteCast(PlayerName),
    RoundScored { round: u32 },
    RoundVoided { round: u32 },
    GameWon(PlayerName),
    NextRound { round: u32, storyteller: PlayerName },
    Restarted,
}

impl fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Joined(name) => format!("{name} joined"),
            Self::Reconnected(name) => format!("{name} reconnected"),
            Self::Left(name) => format!("{name} left"),
            Self::GameStarted { players } => format!("game started with {players} players"),
            Self::HintGiven(name) => format!("{name} gave a hint"),
            Self::CardChosen(name) => format!("{name} chose a card"),
            Self::VotingOpened => "voting is open".to_string(),
            Self::VoteCast(name) => format!("{name} voted"),
            Self::RoundScored { round } => format!("round {round} scored"),
            Self::RoundVoided { round } => format!("round {round} voided"),
            Self::GameWon(name) => format!("{name} won the game"),
            Self::NextRound { round, storyteller } => {
                format!("round {round}, {storyteller} is the storyteller")
            }
            Self::Restarted => "game restarted".to_string(),
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_name_trims() {
        let name = PlayerName::new("  ada  ");
        assert_eq!(name.as_str(), "ada");
        assert!(PlayerName::new("   ").is_empty());
        assert!(PlayerName::new(&"x".repeat(33)).is_too_long());
        assert!(!PlayerName::new(&"x".repeat(32)).is_too_long());
    }

    #[test]
    fn test_player_name_deserialize_trims() {
        let name: PlayerName = serde_json::from_str("\" bo \"").unwrap();
        assert_eq!(name, PlayerName::new("bo"));
    }

    #[test]
    fn test_take_card() {
        let mut player = Player::new("ada".into(), "s1".into());
        player.hand.push(Card::new(1, "moon", "1.png"));
        player.hand.push(Card::new(2, "tide", "2.png"));

        assert!(player.holds(CardId(2)));
        let card = player.take_card(CardId(2)).unwrap();
        assert_eq!(card.id, CardId(2));
        assert!(!player.holds(CardId(2)));
        assert!(player.take_card(CardId(2)).is_none());
        assert_eq!(player.hand.len(), 1);
    }

    #[test]
    fn test_event_display() {
        let event = RoomEvent::NextRound {
            round: 2,
            storyteller: "bo".into(),
        };
        assert_eq!(event.to_string(), "round 2, bo is the storyteller");
    }
}
