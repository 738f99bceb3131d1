//! # Cardsync Protocol
//!
//! Flash card data model and JSON wire format for cardsync.
//!
//! This crate provides:
//! - `CardId`, the client-generated identifier of a card
//! - `FlashCard`, the record exchanged with the `/flash-cards` resource
//! - `NewCard`, a validated draft for creating a card
//! - `CardPatch`, a partial update merged server-side
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod card;
mod error;
mod id;
mod patch;

pub use card::{FlashCard, NewCard};
pub use error::{ProtocolError, ProtocolResult};
pub use id::CardId;
pub use patch::CardPatch;

/// Name of the REST resource that holds flash cards.
pub const RESOURCE: &str = "flash-cards";
