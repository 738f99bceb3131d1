//! # Cardsync Server
//!
//! Reference REST server for the flash card resource.
//!
//! This crate provides:
//! - `GET`/`POST` on `/flash-cards`
//! - `GET`/`PATCH`/`PUT`/`DELETE` on `/flash-cards/{id}`
//! - A JSON database file in `json-server` layout
//! - Restoring the database from a backup
//!
//! # Protocol
//!
//! | Request                        | Success | Errors        |
//! |--------------------------------|---------|---------------|
//! | `GET /flash-cards`             | 200     |               |
//! | `POST /flash-cards`            | 201     | 400, 409      |
//! | `GET /flash-cards/{id}`        | 200     | 404           |
//! | `PATCH /flash-cards/{id}`      | 200     | 400, 404      |
//! | `PUT /flash-cards/{id}`        | 200     | 400, 404      |
//! | `DELETE /flash-cards/{id}`     | 200     | 404           |
//!
//! Unknown routes answer 404 and known routes with the wrong method 405.
//! `PATCH` merges the given fields into the stored card.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod error;
mod handler;
mod server;
mod table;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler, ServerResponse};
pub use server::CardServer;
pub use table::{restore, CardTable};
