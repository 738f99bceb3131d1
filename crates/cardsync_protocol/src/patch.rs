//! Partial card updates.

use crate::card::FlashCard;
use crate::error::ProtocolResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A partial update to a flash card.
///
/// Only the fields that are `Some` are sent; the server merges them into
/// the stored record. `updated_at` travels with every patch so the server
/// keeps the same modification time the client shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    /// New question text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// New answer text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// New learned flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned: Option<bool>,
    /// Modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl CardPatch {
    /// Creates a patch that sets the learned flag.
    pub fn learned(learned: bool) -> Self {
        Self {
            learned: Some(learned),
            ..Self::default()
        }
    }

    /// Creates a patch that replaces question and answer.
    pub fn text(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: Some(question.into()),
            answer: Some(answer.into()),
            ..Self::default()
        }
    }

    /// Sets the modification timestamp.
    pub fn with_updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Returns true if the patch changes no content field.
    pub fn is_empty(&self) -> bool {
        self.question.is_none() && self.answer.is_none() && self.learned.is_none()
    }

    /// Merges the present fields into `card`.
    ///
    /// `updated_at` is clamped so it never precedes `created_at`.
    pub fn apply_to(&self, card: &mut FlashCard) {
        if let Some(ref question) = self.question {
            card.question.clone_from(question);
        }
        if let Some(ref answer) = self.answer {
            card.answer.clone_from(answer);
        }
        if let Some(learned) = self.learned {
            card.learned = learned;
        }
        if let Some(at) = self.updated_at {
            card.touch(at);
        }
    }

    /// Encodes to JSON bytes.
    pub fn encode(&self) -> ProtocolResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::CardId;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn only_present_fields_are_serialized() {
        let patch = CardPatch::learned(true).with_updated_at(ts(0));
        let json: serde_json::Value = serde_json::from_slice(&patch.encode().unwrap()).unwrap();

        assert_eq!(json["learned"], true);
        assert_eq!(json["updatedAt"], "1970-01-01T00:00:00Z");
        assert!(json.get("question").is_none());
        assert!(json.get("answer").is_none());
    }

    #[test]
    fn apply_merges_fields() {
        let mut card = FlashCard::new(CardId::new(), "Q", "A", ts(10));
        CardPatch::text("Q2", "A2")
            .with_updated_at(ts(20))
            .apply_to(&mut card);

        assert_eq!(card.question, "Q2");
        assert_eq!(card.answer, "A2");
        assert!(!card.learned);
        assert_eq!(card.updated_at, ts(20));
    }

    #[test]
    fn empty_patch() {
        assert!(CardPatch::default().is_empty());
        assert!(CardPatch::default().with_updated_at(ts(1)).is_empty());
        assert!(!CardPatch::learned(false).is_empty());
    }

    proptest! {
        #[test]
        fn updated_at_never_precedes_created_at(
            created in 0i64..4_000_000_000,
            updated in 0i64..4_000_000_000,
            learned in any::<bool>()
        ) {
            let mut card = FlashCard::new(CardId::new(), "Q", "A", ts(created));
            CardPatch::learned(learned)
                .with_updated_at(ts(updated))
                .apply_to(&mut card);

            prop_assert!(card.updated_at >= card.created_at);
            prop_assert_eq!(card.created_at, ts(created));
            prop_assert_eq!(card.learned, learned);
        }
    }
}
