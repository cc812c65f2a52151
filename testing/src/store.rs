//! In-memory fake of the durable ticket store.

use async_trait::async_trait;
use helpdesk_core::store::{StoreError, TicketMap, TicketStore};
use helpdesk_core::types::TicketRecord;
use std::sync::Mutex;

#[derive(Default)]
struct Inner {
    map: TicketMap,
    load_count: usize,
    save_count: usize,
    fail_next_save: bool,
}

/// Store fake that keeps the "persisted" document in memory.
///
/// Counts loads and saves so registry tests can verify the lazy-load and
/// propagation contracts, and can fail the next save to exercise the
/// degraded mode where memory runs ahead of disk.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Replace the persisted document with the given records.
    pub fn seed(&self, records: impl IntoIterator<Item = TicketRecord>) {
        let mut inner = self.lock();
        inner.map = records
            .into_iter()
            .map(|record| (record.channel_id, record))
            .collect();
    }

    /// The currently persisted document.
    #[must_use]
    pub fn saved(&self) -> TicketMap {
        self.lock().map.clone()
    }

    /// How many times `load` has run.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.lock().load_count
    }

    /// How many saves have succeeded.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.lock().save_count
    }

    /// Make the next save fail with a write error.
    pub fn fail_next_save(&self) {
        self.lock().fail_next_save = true;
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn save(&self, snapshot: TicketMap) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_next_save {
            inner.fail_next_save = false;
            return Err(StoreError::Write("injected save failure".to_owned()));
        }
        inner.map = snapshot;
        inner.save_count += 1;
        Ok(())
    }

    async fn load(&self) -> TicketMap {
        let mut inner = self.lock();
        inner.load_count += 1;
        inner.map.clone()
    }
}
