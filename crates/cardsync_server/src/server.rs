//! Main card server.

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::handler::{HandlerContext, RequestHandler, ServerResponse};
use crate::table::CardTable;
use cardsync_protocol::{CardId, FlashCard};
use std::sync::Arc;
use tracing::warn;

/// The card server.
///
/// Serves the flash card resource the way a `json-server` instance does,
/// without binding a socket. Every request goes through [`CardServer::handle`],
/// which never fails: errors become JSON error responses.
///
/// # Example
///
/// ```
/// use cardsync_server::{CardServer, ServerConfig};
///
/// let server = CardServer::new(ServerConfig::default()).unwrap();
/// let response = server.handle("GET", "/flash-cards", None);
/// assert_eq!(response.status, 200);
/// ```
pub struct CardServer {
    handler: RequestHandler,
    context: Arc<HandlerContext>,
}

impl CardServer {
    /// Creates a server, loading the database file if one is configured.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let table = match &config.db_path {
            Some(path) => CardTable::load(path, &config.resource)?,
            None => CardTable::new(),
        };
        Ok(Self::with_table(config, table))
    }

    /// Creates a server over an existing table.
    pub fn with_table(config: ServerConfig, table: CardTable) -> Self {
        let context = Arc::new(HandlerContext::new(config, table));
        let handler = RequestHandler::new(Arc::clone(&context));
        Self { handler, context }
    }

    /// Creates an in-memory server holding `cards`.
    pub fn with_cards(cards: Vec<FlashCard>) -> Self {
        Self::with_table(ServerConfig::default(), CardTable::from_cards(cards))
    }

    /// Handles a request.
    pub fn handle(&self, method: &str, path: &str, body: Option<&[u8]>) -> ServerResponse {
        self.handler
            .handle(method, path, body)
            .unwrap_or_else(|e| {
                if e.is_server_error() {
                    warn!(method, path, error = %e, "request failed");
                }
                ServerResponse::error(&e)
            })
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.context.config
    }

    /// Snapshot of every card in insertion order.
    pub fn cards(&self) -> Vec<FlashCard> {
        self.context.table.read().list().to_vec()
    }

    /// Returns a card.
    pub fn get(&self, id: &CardId) -> Option<FlashCard> {
        self.context.table.read().get(id).cloned()
    }

    /// Returns the number of cards.
    pub fn card_count(&self) -> usize {
        self.context.table.read().len()
    }
}
