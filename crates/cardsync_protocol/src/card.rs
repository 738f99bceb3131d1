//! Flash card records.

use crate::error::{ProtocolError, ProtocolResult};
use crate::id::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A flash card as stored by the `/flash-cards` resource.
///
/// # Fields
///
/// - `id`: client-generated identifier, never remapped
/// - `question` / `answer`: the card text
/// - `learned`: whether the user marked the card as learned
/// - `created_at`: set once when the card is created
/// - `updated_at`: refreshed by every mutation, never earlier than `created_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashCard {
    /// Card ID.
    pub id: CardId,
    /// Question text.
    pub question: String,
    /// Answer text.
    pub answer: String,
    /// Whether the card has been learned.
    #[serde(default, deserialize_with = "deserialize_learned")]
    pub learned: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl FlashCard {
    /// Creates an unlearned card with `created_at == updated_at == now`.
    pub fn new(
        id: CardId,
        question: impl Into<String>,
        answer: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            question: question.into(),
            answer: answer.into(),
            learned: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets `updated_at`, clamped so it never precedes `created_at`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now.max(self.created_at);
    }

    /// Returns true if the card already holds this question and answer.
    pub fn same_text(&self, question: &str, answer: &str) -> bool {
        self.question == question && self.answer == answer
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON bytes.
    pub fn decode(bytes: &[u8]) -> ProtocolResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decodes a JSON array of cards.
    pub fn decode_list(bytes: &[u8]) -> ProtocolResult<Vec<Self>> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Accepts `true`/`false` as booleans or as the strings older stores wrote.
fn deserialize_learned<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Learned {
        Bool(bool),
        Text(String),
    }

    match Learned::deserialize(deserializer)? {
        Learned::Bool(b) => Ok(b),
        Learned::Text(s) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!(
                "invalid learned value: {other:?}"
            ))),
        },
    }
}

/// A draft for a new card, before an ID is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCard {
    /// Question text.
    pub question: String,
    /// Answer text.
    pub answer: String,
}

impl NewCard {
    /// Creates a new draft.
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
        }
    }

    /// Trims both fields and rejects the draft if either is empty.
    pub fn validate(&self) -> ProtocolResult<NewCard> {
        let question = self.question.trim();
        let answer = self.answer.trim();

        if question.is_empty() {
            return Err(ProtocolError::EmptyField { field: "question" });
        }
        if answer.is_empty() {
            return Err(ProtocolError::EmptyField { field: "answer" });
        }

        Ok(NewCard::new(question, answer))
    }

    /// Turns the draft into a card with the given ID and timestamp.
    pub fn into_card(self, id: CardId, now: DateTime<Utc>) -> FlashCard {
        FlashCard::new(id, self.question, self.answer, now)
    }
}
