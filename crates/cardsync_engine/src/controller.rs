//! Synchronization controller.
//!
//! Maps user intents onto the store and the card client, always in the
//! order "optimistic local mutation, then remote call, then reconcile".
//! The local mutation happens synchronously inside the intent method; the
//! remote call runs as a background task whose handle is returned.

use crate::client::CardClient;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::flight::{FlightGuard, InFlight, OperationKind};
use crate::store::{AppliedUpdate, CollectionStore};
use crate::transport::Transport;
use cardsync_protocol::{CardId, CardPatch, FlashCard, NewCard};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Counters about intents handled by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Remote calls that succeeded.
    pub confirmed: u64,
    /// Optimistic mutations reverted after a failed call.
    pub rolled_back: u64,
    /// Intents rejected by validation, single-flight or state checks.
    pub rejected: u64,
    /// Delete calls that failed after the card was already removed.
    pub failed_deletes: u64,
}

/// Handle to the remote half of an intent.
///
/// Dropping the handle detaches the task; reconciliation still happens.
#[derive(Debug)]
pub struct PendingSync {
    id: CardId,
    kind: OperationKind,
    handle: JoinHandle<SyncResult<()>>,
}

impl PendingSync {
    /// The card the operation targets.
    pub fn id(&self) -> &CardId {
        &self.id
    }

    /// The operation in flight.
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns true once the remote call has resolved and been reconciled.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the remote call and its reconciliation.
    pub async fn wait(self) -> SyncResult<()> {
        self.handle
            .await
            .map_err(|e| SyncError::Task(e.to_string()))?
    }
}

/// Handles to the two independent completions of a delete.
///
/// The removal timer and the network call do not wait for each other.
#[derive(Debug)]
pub struct PendingDelete {
    id: CardId,
    removal: JoinHandle<bool>,
    network: PendingSync,
}

impl PendingDelete {
    /// The card being deleted.
    pub fn id(&self) -> &CardId {
        &self.id
    }

    /// Returns true once the grace interval elapsed and the card was removed.
    pub fn is_removed(&self) -> bool {
        self.removal.is_finished()
    }

    /// Returns true once the delete request resolved.
    pub fn is_confirmed(&self) -> bool {
        self.network.is_finished()
    }

    /// Waits for the removal timer only; the request keeps running detached.
    ///
    /// Returns false if the card had already left the collection.
    pub async fn removed(self) -> SyncResult<bool> {
        self.removal
            .await
            .map_err(|e| SyncError::Task(e.to_string()))
    }

    /// Waits for both completions.
    pub async fn wait(self) -> (SyncResult<bool>, SyncResult<()>) {
        let Self {
            removal, network, ..
        } = self;
        let removal = async move { removal.await.map_err(|e| SyncError::Task(e.to_string())) };
        tokio::join!(removal, network.wait())
    }
}

/// Orchestrates user intents into store mutations and remote calls.
///
/// At most one mutating request per card is outstanding; a second intent
/// for the same card is rejected with [`SyncError::Conflict`]. Intents on
/// different cards run concurrently. Methods that start a remote call must
/// be called from within a Tokio runtime.
pub struct SyncController<T: Transport + 'static> {
    config: SyncConfig,
    store: Arc<CollectionStore>,
    client: Arc<CardClient<T>>,
    in_flight: Arc<InFlight>,
    stats: Arc<RwLock<SyncStats>>,
}

impl<T: Transport + 'static> SyncController<T> {
    /// Creates a controller with a fresh store.
    pub fn new(config: SyncConfig, transport: T) -> Self {
        let store = Arc::new(CollectionStore::new(config.sort_order));
        Self::with_store(config, transport, store)
    }

    /// Creates a controller over an existing store.
    pub fn with_store(config: SyncConfig, transport: T, store: Arc<CollectionStore>) -> Self {
        let client = CardClient::new(transport, config.collection_url());
        Self {
            config,
            store,
            client: Arc::new(client),
            in_flight: Arc::new(InFlight::new()),
            stats: Arc::new(RwLock::new(SyncStats::default())),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the store.
    pub fn store(&self) -> &Arc<CollectionStore> {
        &self.store
    }

    /// Returns the card client.
    pub fn client(&self) -> &CardClient<T> {
        &self.client
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        self.client.transport()
    }

    /// Returns the operation in flight for a card, if any.
    pub fn pending(&self, id: &CardId) -> Option<OperationKind> {
        self.in_flight.pending(id)
    }

    /// Number of cards with an operation in flight.
    pub fn pending_count(&self) -> usize {
        self.in_flight.len()
    }

    /// Gets the current stats.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Loads the collection from the server.
    ///
    /// The loading flag is set for the duration of the call and cleared on
    /// both success and failure. On success the collection and every
    /// interaction state are replaced.
    pub async fn load(&self) -> SyncResult<usize> {
        self.store.set_loading(true);
        let result = self.client.list().await;
        self.store.set_loading(false);

        match result {
            Ok(cards) => {
                let count = cards.len();
                self.store.replace_all(cards);
                self.store.clear_error();
                info!(count, "loaded cards");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "failed to load cards");
                self.store.set_error(e.to_string());
                Err(e)
            }
        }
    }

    /// Adds a card.
    ///
    /// Blank question or answer is rejected before anything changes. The
    /// card is inserted immediately; if the create fails it is removed again.
    pub fn add(
        &self,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> SyncResult<PendingSync> {
        let draft = NewCard::new(question, answer)
            .validate()
            .map_err(|e| self.reject(SyncError::from(e)))?;
        let runtime = runtime()?;

        let card = self.store.add(draft);
        let id = card.id.clone();
        let guard = match self.acquire(&id, OperationKind::Create) {
            Ok(guard) => guard,
            Err(e) => {
                self.store.rollback_add(&id);
                return Err(e);
            }
        };

        let store = Arc::clone(&self.store);
        let client = Arc::clone(&self.client);
        let stats = Arc::clone(&self.stats);
        let task_id = id.clone();
        let handle = runtime.spawn(async move {
            let id = task_id;
            let _guard = guard;
            match client.create(&card).await {
                Ok(()) => {
                    if store.confirm(&id) {
                        debug!(%id, "create confirmed");
                    } else {
                        debug!(%id, "create confirmed for card no longer present");
                    }
                    stats.write().confirmed += 1;
                    Ok(())
                }
                Err(e) => {
                    warn!(%id, error = %e, "create failed");
                    if store.rollback_add(&id) {
                        stats.write().rolled_back += 1;
                    }
                    store.set_error(e.to_string());
                    Err(e)
                }
            }
        });

        Ok(PendingSync {
            id,
            kind: OperationKind::Create,
            handle,
        })
    }

    /// Flips a card's learned flag.
    ///
    /// The flag flips immediately and flips back if the update fails.
    pub fn toggle_learned(&self, id: &CardId) -> SyncResult<PendingSync> {
        let runtime = runtime()?;
        let card = self.active_card(id, "toggle-learned")?;
        let guard = self.acquire(id, OperationKind::Update)?;

        let patch = CardPatch::learned(!card.learned).with_updated_at(now_for(&card));
        let applied = self.store.apply_update(id, &patch)?;
        Ok(self.spawn_update(&runtime, guard, patch, applied))
    }

    /// Shows or hides a card's answer. Returns the new visibility.
    pub fn peek(&self, id: &CardId) -> SyncResult<bool> {
        self.store
            .update_interaction(id, |state, _| state.toggle_answer())
            .map_err(|e| self.reject(e))
    }

    /// Enters edit mode for a card.
    pub fn begin_edit(&self, id: &CardId) -> SyncResult<()> {
        self.store
            .update_interaction(id, |state, card| state.begin_edit(card))
            .map_err(|e| self.reject(e))
    }

    /// Replaces the text being edited.
    pub fn edit_draft(
        &self,
        id: &CardId,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> SyncResult<()> {
        self.store
            .update_interaction(id, |state, _| state.set_draft(question, answer))
            .map_err(|e| self.reject(e))
    }

    /// Leaves edit mode without saving.
    pub fn cancel_edit(&self, id: &CardId) -> SyncResult<()> {
        self.store
            .update_interaction(id, |state, _| state.cancel_edit())
            .map_err(|e| self.reject(e))
    }

    /// Leaves edit mode and saves the draft.
    ///
    /// Returns `Ok(None)` without any network call when the draft matches
    /// the card's last confirmed question and answer. A blank field is a
    /// validation error and the card stays in edit mode. On failure the
    /// previous text is restored.
    pub fn save_edit(&self, id: &CardId) -> SyncResult<Option<PendingSync>> {
        let runtime = runtime()?;
        let draft = self
            .store
            .update_interaction(id, |state, _| {
                state.ensure_active("save")?;
                state
                    .draft()
                    .filter(|_| state.is_editing())
                    .cloned()
                    .ok_or_else(|| SyncError::InvalidStateTransition {
                        from: state.state_name().to_string(),
                        to: "save".to_string(),
                    })
            })
            .map_err(|e| self.reject(e))?;

        let text = NewCard::new(draft.question, draft.answer)
            .validate()
            .map_err(|e| self.reject(SyncError::from(e)))?;

        let card = self.store.get(id).ok_or_else(|| SyncError::NotFound(id.clone()))?;
        let unchanged = card.same_text(&text.question, &text.answer)
            && self
                .store
                .confirmed(id)
                .map_or(true, |c| c.same_text(&text.question, &text.answer));
        if unchanged {
            self.store
                .update_interaction(id, |state, _| state.cancel_edit())?;
            debug!(%id, "edit unchanged, nothing to save");
            return Ok(None);
        }

        let guard = self.acquire(id, OperationKind::Update)?;
        self.store
            .update_interaction(id, |state, _| state.finish_edit().map(|_| ()))?;

        let patch = CardPatch::text(text.question, text.answer).with_updated_at(now_for(&card));
        let applied = self.store.apply_update(id, &patch)?;
        Ok(Some(self.spawn_update(&runtime, guard, patch, applied)))
    }

    /// Deletes a card.
    ///
    /// The card is marked pending-delete at once and removed when the grace
    /// interval elapses, whether or not the delete request has resolved. A
    /// failed request is surfaced as the visible error but not rolled back.
    pub fn delete(&self, id: &CardId) -> SyncResult<PendingDelete> {
        let runtime = runtime()?;
        self.active_card(id, "pending-delete")?;
        let guard = self.acquire(id, OperationKind::Delete)?;
        self.store.mark_pending_delete(id)?;

        let grace = self.config.delete_grace;
        let store = Arc::clone(&self.store);
        let removal_id = id.clone();
        let removal = runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            store.remove(&removal_id).is_some()
        });

        let store = Arc::clone(&self.store);
        let client = Arc::clone(&self.client);
        let stats = Arc::clone(&self.stats);
        let task_id = id.clone();
        let handle = runtime.spawn(async move {
            let id = task_id;
            let _guard = guard;
            let result = client.delete(&id).await;
            match result {
                Ok(()) => {
                    debug!(%id, "delete confirmed");
                    stats.write().confirmed += 1;
                }
                Err(ref e) => {
                    warn!(%id, error = %e, "delete failed");
                    stats.write().failed_deletes += 1;
                    store.set_error(e.to_string());
                }
            }
            result
        });

        Ok(PendingDelete {
            id: id.clone(),
            removal,
            network: PendingSync {
                id: id.clone(),
                kind: OperationKind::Delete,
                handle,
            },
        })
    }

    /// Returns the card if it exists and is not pending deletion.
    fn active_card(&self, id: &CardId, action: &str) -> SyncResult<FlashCard> {
        self.store
            .update_interaction(id, |state, card| {
                state.ensure_active(action)?;
                Ok(card.clone())
            })
            .map_err(|e| self.reject(e))
    }

    fn acquire(&self, id: &CardId, kind: OperationKind) -> SyncResult<FlightGuard> {
        self.in_flight
            .acquire(id.clone(), kind)
            .map_err(|e| self.reject(e))
    }

    /// Logs and counts a rejected intent.
    fn reject(&self, error: SyncError) -> SyncError {
        warn!(error = %error, "intent rejected");
        self.stats.write().rejected += 1;
        error
    }

    fn spawn_update(
        &self,
        runtime: &Handle,
        guard: FlightGuard,
        patch: CardPatch,
        applied: AppliedUpdate,
    ) -> PendingSync {
        let id = applied.prior.id.clone();
        let task_id = id.clone();
        let store = Arc::clone(&self.store);
        let client = Arc::clone(&self.client);
        let stats = Arc::clone(&self.stats);

        let handle = runtime.spawn(async move {
            let id = task_id;
            let _guard = guard;
            match client.update(&id, &patch).await {
                Ok(()) => {
                    if store.confirm(&id) {
                        debug!(%id, "update confirmed");
                    } else {
                        debug!(%id, "update confirmed for card no longer present");
                    }
                    stats.write().confirmed += 1;
                    Ok(())
                }
                Err(e) => {
                    warn!(%id, error = %e, "update failed");
                    if store.restore(applied) {
                        stats.write().rolled_back += 1;
                    }
                    store.set_error(e.to_string());
                    Err(e)
                }
            }
        });

        PendingSync {
            id,
            kind: OperationKind::Update,
            handle,
        }
    }
}

fn runtime() -> SyncResult<Handle> {
    Handle::try_current().map_err(|e| SyncError::Task(e.to_string()))
}

/// Current time, never earlier than the card's creation.
fn now_for(card: &FlashCard) -> chrono::DateTime<Utc> {
    Utc::now().max(card.created_at)
}
