//! In-memory card collection with optimistic mutations.
//!
//! The store always reflects "optimistic truth": it shows every mutation as
//! if its request will succeed, and is corrected only when one fails. It is
//! the single writer of collection membership and card fields.

use crate::config::SortOrder;
use crate::error::{SyncError, SyncResult};
use crate::interaction::InteractionState;
use cardsync_protocol::{CardId, CardPatch, FlashCard, NewCard};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Counts shown in the collection header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Number of cards.
    pub total: usize,
    /// Number of learned cards.
    pub learned: usize,
}

/// A card before and after an optimistic update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedUpdate {
    /// Value before the update.
    pub prior: FlashCard,
    /// Value the update produced.
    pub current: FlashCard,
}

#[derive(Debug, Clone)]
struct Entry {
    card: FlashCard,
    /// Last value the server acknowledged; `None` until a create is confirmed.
    confirmed: Option<FlashCard>,
    interaction: InteractionState,
}

impl Entry {
    fn new(card: FlashCard, confirmed: bool) -> Self {
        Self {
            confirmed: confirmed.then(|| card.clone()),
            card,
            interaction: InteractionState::new(),
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    order: Vec<CardId>,
    entries: HashMap<CardId, Entry>,
    /// Cards whose grace-interval removal is still scheduled.
    removing: HashSet<CardId>,
    sort_order: SortOrder,
    loading: bool,
    last_error: Option<String>,
}

impl StoreInner {
    fn created_at(&self, id: &CardId) -> Option<DateTime<Utc>> {
        self.entries.get(id).map(|e| e.card.created_at)
    }

    /// Position for a new card; ties go to the "newest" end.
    fn insertion_index(&self, created_at: DateTime<Utc>) -> usize {
        match self.sort_order {
            SortOrder::NewestFirst => self
                .order
                .partition_point(|id| self.created_at(id).is_some_and(|c| c > created_at)),
            SortOrder::OldestFirst => self
                .order
                .partition_point(|id| self.created_at(id).is_some_and(|c| c <= created_at)),
        }
    }

    fn insert(&mut self, entry: Entry) -> bool {
        let id = entry.card.id.clone();
        if self.entries.contains_key(&id) {
            return false;
        }
        let index = self.insertion_index(entry.card.created_at);
        self.order.insert(index, id.clone());
        self.entries.insert(id, entry);
        true
    }

    fn remove(&mut self, id: &CardId) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.order.retain(|other| other != id);
        Some(entry)
    }

    fn resort(&mut self) {
        let entries = &self.entries;
        let key = |id: &CardId| entries.get(id).map(|e| e.card.created_at);
        match self.sort_order {
            SortOrder::NewestFirst => self.order.sort_by(|a, b| key(b).cmp(&key(a))),
            SortOrder::OldestFirst => self.order.sort_by(|a, b| key(a).cmp(&key(b))),
        }
    }

    fn entry_mut(&mut self, id: &CardId) -> SyncResult<&mut Entry> {
        self.entries.get_mut(id).ok_or_else(|| SyncError::NotFound(id.clone()))
    }
}

/// Ordered collection of cards keyed by ID.
///
/// All methods are synchronous and never hold the lock across an await, so
/// the store can be shared between the controller and its background tasks.
#[derive(Debug, Default)]
pub struct CollectionStore {
    inner: RwLock<StoreInner>,
}

impl CollectionStore {
    /// Creates an empty store kept in the given order.
    pub fn new(sort_order: SortOrder) -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                sort_order,
                ..StoreInner::default()
            }),
        }
    }

    /// Returns the collection order.
    pub fn sort_order(&self) -> SortOrder {
        self.inner.read().sort_order
    }

    /// Changes the collection order and re-sorts.
    pub fn set_sort_order(&self, sort_order: SortOrder) {
        let mut inner = self.inner.write();
        inner.sort_order = sort_order;
        inner.resort();
    }

    /// Replaces the whole collection with server-confirmed cards.
    ///
    /// Every interaction state is reset, except that cards still waiting
    /// for their grace-interval removal stay pending-delete. Cards with a
    /// duplicate ID after the first are dropped.
    pub fn replace_all(&self, cards: Vec<FlashCard>) {
        let mut inner = self.inner.write();
        inner.order.clear();
        inner.entries.clear();

        for card in cards {
            let id = card.id.clone();
            if inner.entries.contains_key(&id) {
                warn!(%id, "dropping duplicate card from list");
                continue;
            }
            let mut entry = Entry::new(card, true);
            if inner.removing.contains(&id) {
                entry.interaction = InteractionState::deleting();
            }
            inner.order.push(id.clone());
            inner.entries.insert(id, entry);
        }
        inner.resort();
        debug!(count = inner.order.len(), "collection replaced");
    }

    /// Optimistically inserts a new card and returns it.
    ///
    /// The card gets a fresh ID and `created_at == updated_at == now`. It is
    /// placed where the sort order puts it, before any server response.
    pub fn add(&self, draft: NewCard) -> FlashCard {
        let mut inner = self.inner.write();
        let mut id = CardId::new();
        while inner.entries.contains_key(&id) {
            id = CardId::new();
        }

        let card = draft.into_card(id, Utc::now());
        inner.insert(Entry::new(card.clone(), false));
        debug!(id = %card.id, "optimistic insert");
        card
    }

    /// Inserts an existing card as unconfirmed. Returns false on duplicate ID.
    #[cfg(test)]
    pub(crate) fn insert(&self, card: FlashCard) -> bool {
        self.inner.write().insert(Entry::new(card, false))
    }

    /// Optimistically merges `patch` into a card.
    ///
    /// `updated_at` is taken from the patch, or set to now. The returned
    /// value is what [`restore`](Self::restore) needs to undo the update.
    pub fn apply_update(&self, id: &CardId, patch: &CardPatch) -> SyncResult<AppliedUpdate> {
        let mut inner = self.inner.write();
        let entry = inner.entry_mut(id)?;
        entry.interaction.ensure_active("update")?;

        let prior = entry.card.clone();
        patch.apply_to(&mut entry.card);
        if patch.updated_at.is_none() {
            entry.card.touch(Utc::now());
        }
        debug!(%id, "optimistic update");
        Ok(AppliedUpdate {
            prior,
            current: entry.card.clone(),
        })
    }

    /// Records the card's current value as acknowledged by the server.
    ///
    /// Returns false if the card is gone.
    pub fn confirm(&self, id: &CardId) -> bool {
        let mut inner = self.inner.write();
        match inner.entries.get_mut(id) {
            Some(entry) => {
                entry.confirmed = Some(entry.card.clone());
                true
            }
            None => false,
        }
    }

    /// Reverts an optimistic insert.
    ///
    /// Returns false if the card is gone, or if a reload brought in a
    /// server-acknowledged copy of it.
    pub fn rollback_add(&self, id: &CardId) -> bool {
        let mut inner = self.inner.write();
        let unconfirmed = inner
            .entries
            .get(id)
            .is_some_and(|entry| entry.confirmed.is_none());
        if !unconfirmed {
            return false;
        }
        inner.remove(id);
        warn!(%id, "rolled back insert");
        true
    }

    /// Undoes an optimistic update. The interaction state is kept.
    ///
    /// Returns false if the card is gone, or if it no longer holds the value
    /// the update produced (a reload replaced it).
    pub fn restore(&self, update: AppliedUpdate) -> bool {
        let AppliedUpdate { prior, current } = update;
        let mut inner = self.inner.write();
        match inner.entries.get_mut(&prior.id) {
            Some(entry) if entry.card == current => {
                warn!(id = %prior.id, "rolled back update");
                entry.card = prior;
                true
            }
            Some(_) => {
                debug!(id = %prior.id, "card changed since update, keeping it");
                false
            }
            None => false,
        }
    }

    /// Flags a card as fading out. The card stays in the collection until
    /// [`remove`](Self::remove), and stays flagged across reloads.
    pub fn mark_pending_delete(&self, id: &CardId) -> SyncResult<()> {
        let mut inner = self.inner.write();
        inner.entry_mut(id)?.interaction.mark_pending_delete()?;
        inner.removing.insert(id.clone());
        Ok(())
    }

    /// Removes a card from the collection.
    pub fn remove(&self, id: &CardId) -> Option<FlashCard> {
        let mut inner = self.inner.write();
        inner.removing.remove(id);
        let entry = inner.remove(id)?;
        debug!(%id, "removed card");
        Some(entry.card)
    }

    /// Runs `f` on a card's interaction state.
    pub fn update_interaction<R>(
        &self,
        id: &CardId,
        f: impl FnOnce(&mut InteractionState, &FlashCard) -> SyncResult<R>,
    ) -> SyncResult<R> {
        let mut inner = self.inner.write();
        let entry = inner.entry_mut(id)?;
        f(&mut entry.interaction, &entry.card)
    }

    /// Returns a card.
    pub fn get(&self, id: &CardId) -> Option<FlashCard> {
        self.inner.read().entries.get(id).map(|e| e.card.clone())
    }

    /// Returns the last server-acknowledged value of a card.
    pub fn confirmed(&self, id: &CardId) -> Option<FlashCard> {
        self.inner
            .read()
            .entries
            .get(id)
            .and_then(|e| e.confirmed.clone())
    }

    /// Returns a card's interaction state.
    pub fn interaction(&self, id: &CardId) -> Option<InteractionState> {
        self.inner
            .read()
            .entries
            .get(id)
            .map(|e| e.interaction.clone())
    }

    /// Returns true if the card is in the collection.
    pub fn contains(&self, id: &CardId) -> bool {
        self.inner.read().entries.contains_key(id)
    }

    /// Returns the cards in collection order.
    pub fn cards(&self) -> Vec<FlashCard> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .map(|e| e.card.clone())
            .collect()
    }

    /// Returns the card IDs in collection order.
    pub fn ids(&self) -> Vec<CardId> {
        self.inner.read().order.clone()
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.inner.read().order.len()
    }

    /// Returns true if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.read().order.is_empty()
    }

    /// Returns total and learned counts.
    pub fn summary(&self) -> CollectionSummary {
        let inner = self.inner.read();
        CollectionSummary {
            total: inner.entries.len(),
            learned: inner.entries.values().filter(|e| e.card.learned).count(),
        }
    }

    /// Sets the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.inner.write().loading = loading;
    }

    /// Returns true while the initial list is loading.
    pub fn is_loading(&self) -> bool {
        self.inner.read().loading
    }

    /// Records a visible error.
    pub fn set_error(&self, message: impl Into<String>) {
        self.inner.write().last_error = Some(message.into());
    }

    /// Returns the visible error, if any.
    pub fn last_error(&self) -> Option<String> {
        self.inner.read().last_error.clone()
    }

    /// Clears the visible error.
    pub fn clear_error(&self) {
        self.inner.write().last_error = None;
    }
}
