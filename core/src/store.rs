//! Persistent store contract.
//!
//! The store owns on-disk durability for the ticket map and nothing else.
//! It is a trait so the registry can be exercised against an in-memory fake;
//! the production JSON-file implementation lives in the runtime crate.

use crate::types::{ChannelId, TicketRecord};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// The full keyed document persisted on every save.
pub type TicketMap = HashMap<ChannelId, TicketRecord>;

/// Errors surfaced by a durable store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The physical write failed. The previously persisted document is
    /// still intact for the next attempt.
    #[error("durable write failed: {0}")]
    Write(String),

    /// The writer task is gone; no further saves can complete.
    #[error("store writer is unavailable")]
    WriterUnavailable,
}

/// Durable key-value map of ticket records.
///
/// `save` calls are serialized: a conforming implementation never
/// interleaves two physical writes, and resolves each caller only after
/// that caller's snapshot reached durable media. `load` never fails the
/// process: missing or undecodable state degrades to an empty map, with
/// the error reported through logging.
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Persist a full snapshot of the ticket map.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] when the write could not be completed; the
    /// on-disk document from the last successful save is left intact.
    async fn save(&self, snapshot: TicketMap) -> Result<(), StoreError>;

    /// Load the persisted ticket map, or an empty map when no usable state
    /// exists.
    async fn load(&self) -> TicketMap;
}
