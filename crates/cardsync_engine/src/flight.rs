//! Single-flight registry of pending operations.

use crate::error::{SyncError, SyncResult};
use cardsync_protocol::CardId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Kind of mutating operation outstanding for a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// `POST` of a new card.
    Create,
    /// `PATCH` of an existing card.
    Update,
    /// `DELETE` of a card.
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Delete => "delete",
        })
    }
}

/// Tracks which cards have a mutating request in flight.
///
/// At most one operation per card is outstanding. A second acquire for the
/// same card fails with [`SyncError::Conflict`]; nothing is queued.
#[derive(Debug, Default)]
pub struct InFlight {
    pending: Mutex<HashMap<CardId, OperationKind>>,
}

impl InFlight {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the slot for `id`. The slot is released when the guard drops.
    pub fn acquire(self: &Arc<Self>, id: CardId, kind: OperationKind) -> SyncResult<FlightGuard> {
        let mut pending = self.pending.lock();
        if let Some(&current) = pending.get(&id) {
            return Err(SyncError::Conflict {
                id,
                pending: current,
            });
        }
        pending.insert(id.clone(), kind);

        Ok(FlightGuard {
            registry: Arc::clone(self),
            id,
            kind,
        })
    }

    /// Returns the operation outstanding for `id`, if any.
    pub fn pending(&self, id: &CardId) -> Option<OperationKind> {
        self.pending.lock().get(id).copied()
    }

    /// Number of cards with an outstanding operation.
    pub fn len(&self) -> usize {
        self.pending.lock().len()
    }

    /// Returns true if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_empty()
    }

    fn release(&self, id: &CardId) {
        self.pending.lock().remove(id);
    }
}

/// Holds a card's single-flight slot until dropped.
#[derive(Debug)]
pub struct FlightGuard {
    registry: Arc<InFlight>,
    id: CardId,
    kind: OperationKind,
}

impl FlightGuard {
    /// The card this guard holds.
    pub fn id(&self) -> &CardId {
        &self.id
    }

    /// The operation this guard holds.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }
}

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.registry.release(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_conflicts() {
        let registry = Arc::new(InFlight::new());
        let id = CardId::new();

        let _guard = registry.acquire(id.clone(), OperationKind::Update).unwrap();
        let err = registry.acquire(id, OperationKind::Delete).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Conflict { pending: OperationKind::Update, .. }
        ));
    }

    #[test]
    fn drop_releases_slot() {
        let registry = Arc::new(InFlight::new());
        let id = CardId::new();

        {
            let guard = registry.acquire(id.clone(), OperationKind::Create).unwrap();
            assert_eq!(guard.kind(), OperationKind::Create);
            assert_eq!(registry.pending(&id), Some(OperationKind::Create));
        }

        assert_eq!(registry.pending(&id), None);
        assert!(registry.is_empty());
        assert!(registry.acquire(id, OperationKind::Delete).is_ok());
    }

    #[test]
    fn different_cards_are_independent() {
        let registry = Arc::new(InFlight::new());
        let _a = registry.acquire(CardId::new(), OperationKind::Update).unwrap();
        let _b = registry.acquire(CardId::new(), OperationKind::Update).unwrap();
        assert_eq!(registry.len(), 2);
    }
}
