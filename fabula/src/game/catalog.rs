//! Card pool: the immutable catalog every room deals from.
//!
//! The catalog is supplied from outside (a JSON file produced by whatever
//! import tooling the deployment uses). Rooms share one pool and copy it into
//! their own deck when a game starts, so the pool itself is never mutated.

use std::{collections::HashSet, path::Path, sync::Arc};
use thiserror::Error;

use super::{
    constants,
    entities::{Card, CardId},
};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog is empty")]
    Empty,

    #[error("catalog lists card {0} more than once")]
    DuplicateId(CardId),
}

#[derive(Clone, Debug)]
pub struct CardPool {
    cards: Arc<[Card]>,
}

impl CardPool {
    /// Build a pool, rejecting empty catalogs and repeated ids.
    pub fn new(cards: Vec<Card>) -> Result<Self, CatalogError> {
        if cards.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(cards.len());
        for card in &cards {
            if !seen.insert(card.id) {
                return Err(CatalogError::DuplicateId(card.id));
            }
        }

        Ok(Self {
            cards: cards.into(),
        })
    }

    /// Parse a JSON array of `{id, title, image}` objects.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let cards: Vec<Card> = serde_json::from_str(json)?;
        Self::new(cards)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Numbered placeholder cards, for running without a catalog.
    pub fn builtin() -> Self {
        Self::numbered(constants::BUILTIN_POOL_SIZE)
    }

    pub fn numbered(size: usize) -> Self {
        let cards: Vec<Card> = (1..=size as u32)
            .map(|i| Card::new(i, format!("Card {i}"), format!("cards/{i}.jpg")))
            .collect();
        Self {
            cards: cards.into(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for CardPool {
    fn default() -> Self {
        Self::builtin()
    }
}
