//! Card table and its JSON database file.
//!
//! The file holds one top-level object keyed by resource name:
//!
//! ```text
//! {
//!   "flash-cards": [ { "id": "...", "question": "...", ... } ]
//! }
//! ```
//!
//! Other top-level keys are kept untouched across load and save.

use crate::error::{ServerError, ServerResult};
use cardsync_protocol::{CardId, FlashCard};
use serde::de::Error as _;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Cards of one resource, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardTable {
    cards: Vec<FlashCard>,
    other: Map<String, Value>,
}

impl CardTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table holding `cards`.
    pub fn from_cards(cards: Vec<FlashCard>) -> Self {
        Self {
            cards,
            other: Map::new(),
        }
    }

    /// Parses a database document.
    ///
    /// A missing resource key yields an empty table.
    pub fn parse(text: &str, resource: &str) -> ServerResult<Self> {
        let document: Value = serde_json::from_str(text)?;
        let Value::Object(mut other) = document else {
            return Err(serde_json::Error::custom("database root must be an object").into());
        };

        let cards = match other.remove(resource) {
            Some(list) => serde_json::from_value(list)?,
            None => Vec::new(),
        };
        Ok(Self { cards, other })
    }

    /// Builds the database document.
    pub fn to_json(&self, resource: &str) -> ServerResult<Value> {
        let mut document = self.other.clone();
        document.insert(resource.to_string(), serde_json::to_value(&self.cards)?);
        Ok(Value::Object(document))
    }

    /// Loads a table from `path`. A missing file yields an empty table.
    pub fn load(path: &Path, resource: &str) -> ServerResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no database file, starting empty");
            return Ok(Self::new());
        }
        let text = fs::read_to_string(path)?;
        let table = Self::parse(&text, resource)?;
        info!(path = %path.display(), count = table.len(), "loaded database");
        Ok(table)
    }

    /// Writes the table to `path` as pretty-printed JSON.
    ///
    /// The document goes to a sibling temp file first and is then renamed
    /// over `path`.
    pub fn save(&self, path: &Path, resource: &str) -> ServerResult<()> {
        let text = serde_json::to_string_pretty(&self.to_json(resource)?)?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), count = self.len(), "saved database");
        Ok(())
    }

    /// All cards in insertion order.
    pub fn list(&self) -> &[FlashCard] {
        &self.cards
    }

    /// Returns a card.
    pub fn get(&self, id: &CardId) -> Option<&FlashCard> {
        self.cards.iter().find(|c| c.id == *id)
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns true if the table has no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    fn position(&self, id: &CardId) -> ServerResult<usize> {
        self.cards
            .iter()
            .position(|c| c.id == *id)
            .ok_or_else(|| ServerError::NotFound(id.to_string()))
    }

    /// Appends a card. Fails if the ID is taken.
    pub fn insert(&mut self, card: FlashCard) -> ServerResult<()> {
        if self.get(&card.id).is_some() {
            return Err(ServerError::DuplicateId(card.id));
        }
        self.cards.push(card);
        Ok(())
    }

    /// Replaces a card wholesale, keeping its position.
    pub fn replace(&mut self, card: FlashCard) -> ServerResult<()> {
        let index = self.position(&card.id)?;
        self.cards[index] = card;
        Ok(())
    }

    /// Merges `fields` into a card and returns the result.
    ///
    /// Fields not named keep their stored value. The ID cannot change.
    pub fn merge(&mut self, id: &CardId, fields: Map<String, Value>) -> ServerResult<FlashCard> {
        let index = self.position(id)?;
        let Value::Object(mut merged) = serde_json::to_value(&self.cards[index])? else {
            return Err(serde_json::Error::custom("card did not encode as an object").into());
        };
        merged.extend(fields);

        let card: FlashCard = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ServerError::InvalidRequest(e.to_string()))?;
        if card.id != *id {
            return Err(ServerError::InvalidRequest(format!(
                "id cannot change from {id} to {}",
                card.id
            )));
        }
        self.cards[index] = card.clone();
        Ok(card)
    }

    /// Removes a card and returns it.
    pub fn remove(&mut self, id: &CardId) -> ServerResult<FlashCard> {
        let index = self.position(id)?;
        Ok(self.cards.remove(index))
    }
}

/// Restores a database from a backup file.
///
/// The backup must parse as a database document. It is rewritten over
/// `target` pretty-printed. Returns the number of cards restored.
pub fn restore(backup: &Path, target: &Path, resource: &str) -> ServerResult<usize> {
    let text = fs::read_to_string(backup)?;
    let table = CardTable::parse(&text, resource)?;
    table.save(target, resource)?;
    info!(
        backup = %backup.display(),
        target = %target.display(),
        count = table.len(),
        "database restored"
    );
    Ok(table.len())
}
