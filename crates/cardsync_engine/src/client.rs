//! Typed operations on the `/flash-cards` resource.

use crate::error::{SyncError, SyncResult};
use crate::http::{HttpMethod, HttpRequest};
use crate::transport::Transport;
use cardsync_protocol::{CardId, CardPatch, FlashCard};
use serde_json::Value;
use tracing::{debug, warn};

/// Client for the flash card resource.
///
/// Builds the method/path/body of each request and propagates transport
/// errors unchanged. Updates are sent as `PATCH` with only the changed
/// fields, which the server merges into the stored card.
pub struct CardClient<T: Transport> {
    transport: T,
    collection_url: String,
}

impl<T: Transport> CardClient<T> {
    /// Creates a client for the collection at `collection_url`.
    pub fn new(transport: T, collection_url: impl Into<String>) -> Self {
        Self {
            transport,
            collection_url: collection_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the collection URL.
    pub fn collection_url(&self) -> &str {
        &self.collection_url
    }

    fn card_url(&self, id: &CardId) -> String {
        format!("{}/{}", self.collection_url, id)
    }

    /// Fetches every card.
    ///
    /// A body that is not a JSON array fails the whole call. Individual
    /// records that do not decode as cards are skipped with a warning.
    pub async fn list(&self) -> SyncResult<Vec<FlashCard>> {
        let request = HttpRequest::new(HttpMethod::Get, self.collection_url.as_str());
        let body = self
            .transport
            .send(request)
            .await?
            .ok_or_else(|| SyncError::transport_fatal("empty body for card list"))?;

        let records = match body {
            Value::Array(records) => records,
            other => {
                return Err(SyncError::transport_fatal(format!(
                    "malformed card list: expected an array, got {}",
                    json_kind(&other)
                )))
            }
        };

        let total = records.len();
        let cards: Vec<FlashCard> = records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(card) => Some(card),
                Err(e) => {
                    warn!(index, error = %e, "skipping malformed card record");
                    None
                }
            })
            .collect();
        debug!(count = cards.len(), skipped = total - cards.len(), "listed cards");
        Ok(cards)
    }

    /// Creates a card with its client-generated ID.
    pub async fn create(&self, card: &FlashCard) -> SyncResult<()> {
        let body = card.encode()?;
        let request = HttpRequest::new(HttpMethod::Post, self.collection_url.as_str())
            .with_json_body(body);
        self.transport.send(request).await?;
        Ok(())
    }

    /// Merges `patch` into the stored card.
    pub async fn update(&self, id: &CardId, patch: &CardPatch) -> SyncResult<()> {
        let body = patch.encode()?;
        let request =
            HttpRequest::new(HttpMethod::Patch, self.card_url(id)).with_json_body(body);
        self.transport.send(request).await?;
        Ok(())
    }

    /// Deletes a card.
    pub async fn delete(&self, id: &CardId) -> SyncResult<()> {
        let request = HttpRequest::new(HttpMethod::Delete, self.card_url(id));
        self.transport.send(request).await?;
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockTransport;
    use chrono::Utc;

    fn client() -> CardClient<MockTransport> {
        CardClient::new(MockTransport::new(), "http://localhost:3003/flash-cards/")
    }

    #[tokio::test]
    async fn list_decodes_cards() {
        let client = client();
        let card = FlashCard::new(CardId::new(), "Q1", "A1", Utc::now());
        client.transport().set_cards(&[card.clone()]);

        let cards = client.list().await.unwrap();
        assert_eq!(cards, vec![card]);

        let requests = client.transport().requests();
        assert_eq!(requests[0].method, HttpMethod::Get);
        assert_eq!(requests[0].url, "http://localhost:3003/flash-cards");
    }

    #[tokio::test]
    async fn list_accepts_any_id_form() {
        let client = client();
        let uuid_card = FlashCard::new(CardId::new(), "Q1", "A1", Utc::now());
        let mut body = serde_json::to_value([&uuid_card]).unwrap();
        let records = body.as_array_mut().unwrap();
        records.push(serde_json::json!({
            "id": "a1b2",
            "question": "Q2",
            "answer": "A2",
            "learned": "false",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:00.000Z"
        }));
        records.push(serde_json::json!({
            "id": 7,
            "question": "Q3",
            "answer": "A3",
            "createdAt": "2024-03-01T10:00:00.000Z",
            "updatedAt": "2024-03-01T10:00:00.000Z"
        }));
        client.transport().set_list_body(body);

        let cards = client.list().await.unwrap();
        let ids: Vec<&str> = cards.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![uuid_card.id.as_str(), "a1b2", "7"]);
        assert_eq!(cards[0], uuid_card);
    }

    #[tokio::test]
    async fn list_skips_undecodable_records() {
        let client = client();
        let card = FlashCard::new(CardId::new(), "Q1", "A1", Utc::now());
        let body = serde_json::json!([
            { "id": "", "question": "Q", "answer": "A" },
            { "question": "no id" },
            card,
        ]);
        client.transport().set_list_body(body);

        assert_eq!(client.list().await.unwrap(), vec![card]);
    }

    #[tokio::test]
    async fn list_rejects_non_array_body() {
        let client = client();
        client
            .transport()
            .set_list_body(serde_json::json!({ "flash-cards": [] }));

        let err = client.list().await.unwrap_err();
        assert!(err.is_transport());
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn create_posts_full_card() {
        let client = client();
        let card = FlashCard::new(CardId::new(), "Q1", "A1", Utc::now());

        client.create(&card).await.unwrap();

        let request = &client.transport().requests()[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.header("Content-Type"), Some("application/json"));
        let sent = FlashCard::decode(request.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, card);
    }

    #[tokio::test]
    async fn update_patches_card_url() {
        let client = client();
        let id = CardId::new();

        client.update(&id, &CardPatch::learned(true)).await.unwrap();

        let request = &client.transport().requests()[0];
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.url, format!("http://localhost:3003/flash-cards/{id}"));
        assert_eq!(request.body.as_deref(), Some(&br#"{"learned":true}"#[..]));
    }

    #[tokio::test]
    async fn delete_has_no_body() {
        let client = client();
        let id = CardId::new();

        client.delete(&id).await.unwrap();

        let request = &client.transport().requests()[0];
        assert_eq!(request.method, HttpMethod::Delete);
        assert!(request.body.is_none());
        assert!(request.header("Content-Type").is_none());
    }

    #[tokio::test]
    async fn errors_propagate_unchanged() {
        let client = client();
        client.transport().set_failing(true);

        let err = client.delete(&CardId::new()).await.unwrap_err();
        assert!(err.is_transport());
        assert!(err.is_retryable());
    }
}
