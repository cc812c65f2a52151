//! JSON-file ticket store with a single-writer queue.
//!
//! The persisted layout is one keyed JSON document mapping channel handle to
//! ticket record, rewritten in full on every save. Save requests are queued
//! onto a dedicated writer task and executed strictly one at a time; each
//! caller's future resolves only after its snapshot reached durable media.
//! Writes land in a sibling temp file first and are renamed over the live
//! document, so a failed write rejects that caller without corrupting the
//! document seen by the next attempt.

use async_trait::async_trait;
use helpdesk_core::store::{StoreError, TicketMap, TicketStore};
use std::path::{Path, PathBuf};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

struct SaveRequest {
    snapshot: TicketMap,
    done: oneshot::Sender<Result<(), StoreError>>,
}

/// Durable ticket store backed by a single JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
    queue: mpsc::UnboundedSender<SaveRequest>,
}

impl JsonFileStore {
    /// Open a store at `path`, spawning its writer task.
    ///
    /// The document and its parent directories are created on the first
    /// save; opening a store for a path that does not exist yet is valid
    /// and loads as empty.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (queue, mut requests) = mpsc::unbounded_channel::<SaveRequest>();

        let writer_path = path.clone();
        tokio::spawn(async move {
            while let Some(request) = requests.recv().await {
                let result = write_snapshot(&writer_path, &request.snapshot).await;
                if let Err(err) = &result {
                    error!(path = %writer_path.display(), %err, "ticket snapshot write failed");
                } else {
                    debug!(
                        path = %writer_path.display(),
                        tickets = request.snapshot.len(),
                        "ticket snapshot persisted"
                    );
                }
                // The caller may have gone away; the write itself still counts.
                let _ = request.done.send(result);
            }
        });

        Self { path, queue }
    }

    /// The path of the live document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

async fn write_snapshot(path: &Path, snapshot: &TicketMap) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(snapshot)
        .map_err(|err| StoreError::Write(err.to_string()))?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| StoreError::Write(err.to_string()))?;
        }
    }

    let staging = path.with_extension("json.tmp");
    tokio::fs::write(&staging, &bytes)
        .await
        .map_err(|err| StoreError::Write(err.to_string()))?;
    tokio::fs::rename(&staging, path)
        .await
        .map_err(|err| StoreError::Write(err.to_string()))
}

#[async_trait]
impl TicketStore for JsonFileStore {
    async fn save(&self, snapshot: TicketMap) -> Result<(), StoreError> {
        let (done, completion) = oneshot::channel();
        self.queue
            .send(SaveRequest { snapshot, done })
            .map_err(|_| StoreError::WriterUnavailable)?;
        completion.await.map_err(|_| StoreError::WriterUnavailable)?
    }

    async fn load(&self) -> TicketMap {
        let raw = match tokio::fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no persisted tickets yet, starting empty");
                return TicketMap::new();
            }
            Err(err) => {
                error!(path = %self.path.display(), %err, "ticket document unreadable, starting empty");
                return TicketMap::new();
            }
        };

        match serde_json::from_slice::<TicketMap>(&raw) {
            Ok(map) => map,
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    %err,
                    "ticket document undecodable, starting empty"
                );
                TicketMap::new()
            }
        }
    }
}
