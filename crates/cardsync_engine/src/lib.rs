//! # Cardsync Engine
//!
//! Optimistic synchronization of a flash card collection with a REST server.
//!
//! This crate provides:
//! - An in-memory collection store with per-card interaction state
//! - A controller that applies every intent locally before the remote call
//! - Rollback of failed creates and updates
//! - A timer-gated delete that does not wait for the server
//! - Single-flight protection per card
//! - An HTTP transport with injectable latency and failures
//!
//! ## Architecture
//!
//! Every intent follows the same sequence:
//! 1. Mutate the store optimistically
//! 2. Send the request through the transport
//! 3. Confirm the mutation, or revert it and surface the error
//!
//! The store is the single source of truth for presentation. Network
//! events never change interaction state; they only confirm or revert
//! card data.
//!
//! ## Key Invariants
//!
//! - At most one mutating request per card is in flight
//! - A failed create or update leaves the card exactly as it was before
//! - Card IDs are assigned locally and never change
//! - A deleted card leaves the collection after the grace interval,
//!   whatever the server answers

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod controller;
mod error;
mod flight;
mod http;
mod interaction;
mod random;
mod store;
mod transport;

pub use client::CardClient;
pub use config::{FaultConfig, SortOrder, SyncConfig};
pub use controller::{PendingDelete, PendingSync, SyncController, SyncStats};
pub use error::{SyncError, SyncResult};
pub use flight::{FlightGuard, InFlight, OperationKind};
pub use http::{
    HttpClient, HttpMethod, HttpRequest, HttpResponse, LoopbackClient, LoopbackServer,
    ReqwestClient,
};
pub use interaction::{Draft, InteractionState, Mode};
pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use store::{AppliedUpdate, CollectionStore, CollectionSummary};
pub use transport::{FaultInjectingTransport, MockTransport, Transport};

pub use cardsync_protocol::{CardId, CardPatch, FlashCard, NewCard, RESOURCE};
