//! Request routing for the card resource.

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::table::CardTable;
use cardsync_protocol::{CardId, FlashCard};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Status and JSON body of a handled request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResponse {
    /// HTTP status code.
    pub status: u16,
    /// JSON body.
    pub body: Vec<u8>,
}

impl ServerResponse {
    /// Serializes `value` as the body.
    pub fn json<T: Serialize + ?Sized>(status: u16, value: &T) -> ServerResult<Self> {
        Ok(Self {
            status,
            body: serde_json::to_vec(value)?,
        })
    }

    /// Builds an `{ "error": ... }` response for `error`.
    pub fn error(error: &ServerError) -> Self {
        let body = serde_json::json!({ "error": error.to_string() });
        Self {
            status: error.status_code(),
            body: body.to_string().into_bytes(),
        }
    }

    /// Returns true for 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Shared state for request handling.
pub struct HandlerContext {
    /// Server configuration.
    pub config: ServerConfig,
    /// Card table, shared across all handlers.
    pub table: RwLock<CardTable>,
}

impl HandlerContext {
    /// Creates a new handler context.
    pub fn new(config: ServerConfig, table: CardTable) -> Self {
        Self {
            config,
            table: RwLock::new(table),
        }
    }

    fn persist(&self, table: &CardTable) -> ServerResult<()> {
        match &self.config.db_path {
            Some(path) => table.save(path, &self.config.resource),
            None => Ok(()),
        }
    }

    /// Applies `change` to a copy of the table and persists the copy.
    ///
    /// The shared table is replaced only when both succeed, so a failed
    /// save leaves the served cards untouched.
    fn commit<R>(
        &self,
        change: impl FnOnce(&mut CardTable) -> ServerResult<R>,
    ) -> ServerResult<R> {
        let mut table = self.table.write();
        let mut next = table.clone();
        let result = change(&mut next)?;
        self.persist(&next)?;
        *table = next;
        Ok(result)
    }
}

enum Route {
    Collection,
    Item(CardId),
}

/// Handler for card requests.
pub struct RequestHandler {
    context: Arc<HandlerContext>,
}

impl RequestHandler {
    /// Creates a new request handler.
    pub fn new(context: Arc<HandlerContext>) -> Self {
        Self { context }
    }

    /// Routes one request.
    pub fn handle(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
    ) -> ServerResult<ServerResponse> {
        debug!(method, path, "handling request");
        let not_allowed = || ServerError::MethodNotAllowed {
            method: method.to_string(),
            path: path.to_string(),
        };

        match (self.route(path)?, method.to_ascii_uppercase().as_str()) {
            (Route::Collection, "GET") => self.handle_list(),
            (Route::Collection, "POST") => self.handle_create(body),
            (Route::Collection, _) => Err(not_allowed()),
            (Route::Item(id), "GET") => self.handle_get(&id),
            (Route::Item(id), "PATCH") => self.handle_patch(&id, body),
            (Route::Item(id), "PUT") => self.handle_put(&id, body),
            (Route::Item(id), "DELETE") => self.handle_delete(&id),
            (Route::Item(_), _) => Err(not_allowed()),
        }
    }

    fn route(&self, path: &str) -> ServerResult<Route> {
        let path_only = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path_only
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        let not_found = || ServerError::NotFound(path.to_string());

        match segments.as_slice() {
            [resource] if *resource == self.context.config.resource => Ok(Route::Collection),
            [resource, id] if *resource == self.context.config.resource => {
                CardId::parse(id).map(Route::Item).map_err(|_| not_found())
            }
            _ => Err(not_found()),
        }
    }

    /// Lists every card.
    pub fn handle_list(&self) -> ServerResult<ServerResponse> {
        let table = self.context.table.read();
        ServerResponse::json(200, table.list())
    }

    /// Returns one card.
    pub fn handle_get(&self, id: &CardId) -> ServerResult<ServerResponse> {
        let table = self.context.table.read();
        let card = table
            .get(id)
            .ok_or_else(|| ServerError::NotFound(id.to_string()))?;
        ServerResponse::json(200, card)
    }

    /// Creates a card. A missing ID is generated.
    pub fn handle_create(&self, body: Option<&[u8]>) -> ServerResult<ServerResponse> {
        let mut object = parse_object(body)?;
        if !object.contains_key("id") {
            object.insert("id".to_string(), Value::String(CardId::new().to_string()));
        }
        let card = decode_card(object)?;

        self.context.commit(|table| table.insert(card.clone()))?;
        debug!(id = %card.id, "created card");
        ServerResponse::json(201, &card)
    }

    /// Merges the body into a card.
    pub fn handle_patch(&self, id: &CardId, body: Option<&[u8]>) -> ServerResult<ServerResponse> {
        let fields = parse_object(body)?;

        let card = self.context.commit(|table| table.merge(id, fields))?;
        debug!(%id, "patched card");
        ServerResponse::json(200, &card)
    }

    /// Replaces a card with the body.
    pub fn handle_put(&self, id: &CardId, body: Option<&[u8]>) -> ServerResult<ServerResponse> {
        let mut object = parse_object(body)?;
        object
            .entry("id")
            .or_insert_with(|| Value::String(id.to_string()));
        let card = decode_card(object)?;
        if card.id != *id {
            return Err(ServerError::InvalidRequest(format!(
                "body id {} does not match {id}",
                card.id
            )));
        }

        self.context.commit(|table| table.replace(card.clone()))?;
        debug!(%id, "replaced card");
        ServerResponse::json(200, &card)
    }

    /// Removes a card.
    pub fn handle_delete(&self, id: &CardId) -> ServerResult<ServerResponse> {
        self.context.commit(|table| table.remove(id))?;
        debug!(%id, "deleted card");
        ServerResponse::json(200, &Map::new())
    }
}

fn parse_object(body: Option<&[u8]>) -> ServerResult<Map<String, Value>> {
    let bytes = body.ok_or_else(|| ServerError::InvalidRequest("missing body".into()))?;
    match serde_json::from_slice(bytes) {
        Ok(Value::Object(object)) => Ok(object),
        Ok(_) => Err(ServerError::InvalidRequest("body must be a JSON object".into())),
        Err(e) => Err(ServerError::InvalidRequest(e.to_string())),
    }
}

fn decode_card(object: Map<String, Value>) -> ServerResult<FlashCard> {
    serde_json::from_value(Value::Object(object))
        .map_err(|e| ServerError::InvalidRequest(e.to_string()))
}
