//! In-memory ticket registry.
//!
//! The registry is the process-wide cache mirroring the durable store. It
//! loads lazily on first access behind an explicit `loaded` flag and is
//! refreshed only on demand, never silently re-read per request. Every
//! mutation is applied in memory first and then propagated to the store;
//! callers await that propagation before reporting success. A failed save
//! leaves the in-memory mutation standing (the recognized degraded mode:
//! memory runs ahead of disk until the next restart).
//!
//! Mutations are not transactionally isolated across concurrent handlers.
//! Compound read-modify-write sequences (quota check, then insert) are
//! best-effort; the store's single-writer queue is what keeps the durable
//! document itself consistent.

use helpdesk_core::gateway::ChatGateway;
use helpdesk_core::store::{StoreError, TicketMap, TicketStore};
use helpdesk_core::types::{ChannelId, TicketRecord};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

#[derive(Default)]
struct RegistryState {
    tickets: TicketMap,
    loaded: bool,
}

/// Process-wide cache of ticket records, backed by a [`TicketStore`].
pub struct TicketRegistry {
    store: Arc<dyn TicketStore>,
    state: RwLock<RegistryState>,
}

impl TicketRegistry {
    /// Create a registry over the given store. Nothing is read until the
    /// first access.
    #[must_use]
    pub fn new(store: Arc<dyn TicketStore>) -> Self {
        Self {
            store,
            state: RwLock::new(RegistryState::default()),
        }
    }

    async fn ensure_loaded(&self) {
        if self.state.read().await.loaded {
            return;
        }
        let mut state = self.state.write().await;
        if !state.loaded {
            state.tickets = self.store.load().await;
            state.loaded = true;
            debug!(tickets = state.tickets.len(), "ticket registry loaded");
        }
    }

    /// Discard the cache and re-read the store.
    pub async fn reload(&self) {
        let mut state = self.state.write().await;
        state.tickets = self.store.load().await;
        state.loaded = true;
        debug!(tickets = state.tickets.len(), "ticket registry reloaded");
    }

    /// Look up the record for a channel.
    pub async fn get(&self, channel: ChannelId) -> Option<TicketRecord> {
        self.ensure_loaded().await;
        self.state.read().await.tickets.get(&channel).cloned()
    }

    /// A point-in-time copy of every record.
    pub async fn snapshot(&self) -> TicketMap {
        self.ensure_loaded().await;
        self.state.read().await.tickets.clone()
    }

    /// Insert or overwrite a record and persist the result.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] from persistence; the in-memory insert
    /// has already happened and stands.
    pub async fn insert(&self, record: TicketRecord) -> Result<(), StoreError> {
        self.ensure_loaded().await;
        let snapshot = {
            let mut state = self.state.write().await;
            state.tickets.insert(record.channel_id, record);
            state.tickets.clone()
        };
        self.store.save(snapshot).await
    }

    /// Mutate the record for `channel` in place and persist the result.
    ///
    /// Returns `Ok(None)` when no record exists, without touching the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] from persistence; the in-memory mutation
    /// has already happened and stands.
    pub async fn update(
        &self,
        channel: ChannelId,
        mutate: impl FnOnce(&mut TicketRecord),
    ) -> Result<Option<TicketRecord>, StoreError> {
        self.ensure_loaded().await;
        let (snapshot, updated) = {
            let mut state = self.state.write().await;
            let Some(record) = state.tickets.get_mut(&channel) else {
                return Ok(None);
            };
            mutate(record);
            let updated = record.clone();
            (state.tickets.clone(), updated)
        };
        self.store.save(snapshot).await?;
        Ok(Some(updated))
    }

    /// Remove the record for `channel` and persist the result.
    ///
    /// Returns `Ok(None)` when no record exists, without touching the
    /// store.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] from persistence; the in-memory removal
    /// has already happened and stands.
    pub async fn remove(&self, channel: ChannelId) -> Result<Option<TicketRecord>, StoreError> {
        self.ensure_loaded().await;
        let (snapshot, removed) = {
            let mut state = self.state.write().await;
            let Some(removed) = state.tickets.remove(&channel) else {
                return Ok(None);
            };
            (state.tickets.clone(), removed)
        };
        self.store.save(snapshot).await?;
        Ok(Some(removed))
    }

    /// Evict every record whose channel no longer resolves on the platform
    /// and persist the pruned set.
    ///
    /// This is the startup reconciliation pass for channels deleted
    /// out-of-band while the process was down. Returns how many records
    /// were evicted.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] from persisting the pruned set; the
    /// in-memory eviction has already happened and stands.
    pub async fn prune_dead_channels(
        &self,
        gateway: &dyn ChatGateway,
    ) -> Result<usize, StoreError> {
        self.ensure_loaded().await;

        let channels: Vec<ChannelId> = {
            let state = self.state.read().await;
            state.tickets.keys().copied().collect()
        };

        let mut dead = Vec::new();
        for channel in channels {
            if !gateway.channel_exists(channel).await {
                dead.push(channel);
            }
        }
        if dead.is_empty() {
            return Ok(0);
        }

        let snapshot = {
            let mut state = self.state.write().await;
            for channel in &dead {
                state.tickets.remove(channel);
            }
            state.tickets.clone()
        };
        info!(evicted = dead.len(), "pruned tickets whose channels are gone");
        self.store.save(snapshot).await?;
        Ok(dead.len())
    }
}
