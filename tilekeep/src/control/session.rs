//! Save session: worker pool, counters and the caller-side handle.
//!
//! ```text
//! driver
//!   ├─► worker 1 ─┐
//!   ├─► worker 2 ─┼─ pull index from cursor ─► fetch ─► spawn save task
//!   └─► worker N ─┘                                      │
//!                                                        ▼
//!                          store.put ─► counters ─► SaveEvent channel
//! ```
//!
//! Each worker pulls the next index as soon as its fetch finishes, so the
//! next download overlaps the previous save. "All" events are derived from
//! the value returned by the counter increment that completes the set, so
//! each fires exactly once whatever the interleaving.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::layer::OfflineTileLayer;
use crate::store::StoreError;
use crate::tile::{StoredTile, TileDescriptor};

use super::events::{SaveEvent, SaveStatus, SessionPhase};
use super::ControlShared;

/// Final outcome of a save session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Tiles enumerated
    pub total: u64,
    /// Tiles downloaded
    pub loaded: u64,
    /// Tiles persisted
    pub saved: u64,
    /// Tiles that failed to download or persist
    pub failed: u64,
    /// Whether the session stopped before every tile settled
    pub was_cancelled: bool,
    /// Stored tile count when the session ended
    pub storage_size: u64,
}

/// Shared counters of one session.
#[derive(Debug, Default)]
pub(super) struct SessionCounters {
    storage_size: AtomicU64,
    total: u64,
    cursor: AtomicUsize,
    loaded: AtomicU64,
    saved: AtomicU64,
    failed: AtomicU64,
    /// Tiles whose download finished, successfully or not
    fetched: AtomicU64,
    /// Tiles saved or failed
    settled: AtomicU64,
}

impl SessionCounters {
    pub(super) fn new(total: u64, storage_size: u64) -> Self {
        Self {
            storage_size: AtomicU64::new(storage_size),
            total,
            ..Default::default()
        }
    }

    pub(super) fn status(&self) -> SaveStatus {
        SaveStatus {
            storage_size: self.storage_size.load(Ordering::SeqCst),
            length_to_be_saved: self.total,
            length_loaded: self.loaded.load(Ordering::SeqCst),
            length_saved: self.saved.load(Ordering::SeqCst),
            length_failed: self.failed.load(Ordering::SeqCst),
        }
    }

    /// Record one finished download; true for the one that completes the set.
    fn mark_fetched(&self) -> bool {
        self.fetched.fetch_add(1, Ordering::SeqCst) + 1 == self.total
    }

    /// Record one settled tile; true for the one that completes the set.
    fn mark_settled(&self) -> bool {
        self.settled.fetch_add(1, Ordering::SeqCst) + 1 == self.total
    }

    fn all_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst) >= self.total
    }
}

/// Everything a running session needs, cloned into each task.
#[derive(Clone)]
pub(super) struct SessionContext {
    pub(super) generation: u64,
    pub(super) tiles: Arc<Vec<TileDescriptor>>,
    pub(super) layer: OfflineTileLayer,
    pub(super) token: CancellationToken,
    pub(super) counters: Arc<SessionCounters>,
    pub(super) events: mpsc::UnboundedSender<SaveEvent>,
    pub(super) control: Arc<ControlShared>,
}

impl SessionContext {
    fn emit(&self, event: SaveEvent) {
        // The receiver may have been dropped; the session still runs to completion
        let _ = self.events.send(event);
    }

    fn set_phase(&self, phase: SessionPhase) {
        self.control.set_phase_for(self.generation, phase);
    }

    fn on_fetched(&self) {
        if self.counters.mark_fetched() {
            self.emit(SaveEvent::AllDownloaded(self.counters.status()));
            self.set_phase(SessionPhase::Saving);
        }
    }

    fn on_settled(&self) {
        if self.counters.mark_settled() {
            let status = self.counters.status();
            info!(
                generation = self.generation,
                saved = status.length_saved,
                failed = status.length_failed,
                "All tiles saved"
            );
            self.emit(SaveEvent::AllSaved(status));
        }
    }
}

/// Drive the session to its end and produce the report.
pub(super) async fn run(ctx: SessionContext, workers: usize) -> SaveReport {
    ctx.emit(SaveEvent::Started(ctx.counters.status()));
    info!(
        generation = ctx.generation,
        tiles = ctx.counters.total,
        workers,
        "Save session started"
    );

    if ctx.counters.total == 0 {
        ctx.emit(SaveEvent::AllDownloaded(ctx.counters.status()));
        ctx.emit(SaveEvent::AllSaved(ctx.counters.status()));
    }

    let (save_tx, mut save_rx) = mpsc::unbounded_channel::<JoinHandle<()>>();
    let mut worker_handles: FuturesUnordered<_> = (0..workers)
        .map(|id| tokio::spawn(worker(ctx.clone(), id, save_tx.clone())))
        .collect();
    drop(save_tx);

    while let Some(result) = worker_handles.next().await {
        if let Err(e) = result {
            error!(generation = ctx.generation, error = %e, "Save worker panicked");
        }
    }
    while let Some(handle) = save_rx.recv().await {
        if let Err(e) = handle.await {
            error!(generation = ctx.generation, error = %e, "Save task panicked");
        }
    }

    let was_cancelled = !ctx.counters.all_settled();
    let storage_size = match ctx.layer.store().count().await {
        Ok(count) => count,
        Err(e) => {
            warn!(error = %e, "Failed to count stored tiles");
            ctx.counters.storage_size.load(Ordering::SeqCst)
        }
    };

    if was_cancelled {
        info!(generation = ctx.generation, "Save session cancelled");
        ctx.emit(SaveEvent::Cancelled(ctx.counters.status()));
    } else {
        ctx.emit(SaveEvent::StorageSize(storage_size));
    }
    ctx.control.publish_storage_size_for(ctx.generation, storage_size);
    ctx.set_phase(SessionPhase::Idle);

    let status = ctx.counters.status();
    SaveReport {
        total: status.length_to_be_saved,
        loaded: status.length_loaded,
        saved: status.length_saved,
        failed: status.length_failed,
        was_cancelled,
        storage_size,
    }
}

/// Pull tiles until the list is exhausted or the session is cancelled.
async fn worker(ctx: SessionContext, id: usize, saves: mpsc::UnboundedSender<JoinHandle<()>>) {
    loop {
        if ctx.token.is_cancelled() {
            break;
        }
        let index = ctx.counters.cursor.fetch_add(1, Ordering::SeqCst);
        let Some(tile) = ctx.tiles.get(index).cloned() else {
            break;
        };

        let result = tokio::select! {
            _ = ctx.token.cancelled() => break,
            result = ctx.layer.fetcher().fetch(&tile.url) => result,
        };

        match result {
            Ok(blob) => {
                ctx.counters.loaded.fetch_add(1, Ordering::SeqCst);
                debug!(worker = id, key = %tile.key, bytes = blob.len(), "Tile downloaded");
                ctx.emit(SaveEvent::TileDownloaded {
                    key: tile.key.clone(),
                    status: ctx.counters.status(),
                });
                ctx.on_fetched();

                let save_ctx = ctx.clone();
                let handle = tokio::spawn(save_tile(save_ctx, tile, blob));
                if saves.send(handle).is_err() {
                    warn!(worker = id, "Save task channel closed");
                }
            }
            Err(e) => {
                ctx.counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!(worker = id, key = %tile.key, error = %e, "Tile download failed");
                ctx.emit(SaveEvent::TileFailed {
                    key: tile.key,
                    error: e.to_string(),
                    status: ctx.counters.status(),
                });
                ctx.on_fetched();
                ctx.on_settled();
            }
        }
    }
}

/// Persist one downloaded tile unless the session was cancelled meanwhile.
async fn save_tile(ctx: SessionContext, tile: TileDescriptor, blob: Vec<u8>) {
    let key = tile.key.clone();
    match persist(&ctx, tile, blob).await {
        Ok(None) => {
            debug!(key = %key, "Discarding tile of cancelled session");
            return;
        }
        Ok(Some(_)) => {
            ctx.counters.saved.fetch_add(1, Ordering::SeqCst);
            ctx.emit(SaveEvent::TileSaved {
                key,
                status: ctx.counters.status(),
            });
        }
        Err(e) => {
            ctx.counters.failed.fetch_add(1, Ordering::SeqCst);
            error!(key = %key, error = %e, "Failed to store tile");
            ctx.emit(SaveEvent::TileFailed {
                key,
                error: e.to_string(),
                status: ctx.counters.status(),
            });
        }
    }
    ctx.on_settled();
}

/// Write blob then descriptor, checking the token before each write.
///
/// A blob written while the session was being cancelled is removed again.
/// `Ok(None)` means discarded.
async fn persist(
    ctx: &SessionContext,
    tile: TileDescriptor,
    blob: Vec<u8>,
) -> Result<Option<StoredTile>, StoreError> {
    if ctx.token.is_cancelled() {
        return Ok(None);
    }
    let store = ctx.layer.store();
    store.put_blob(&tile.key, blob).await?;

    if ctx.token.is_cancelled() {
        store.remove(&tile.key).await?;
        return Ok(None);
    }
    store.put_descriptor(tile).await.map(Some)
}

/// Handle to a running save session.
///
/// Events are buffered without loss until read with
/// [`next_event`](Self::next_event). Dropping the handle does not cancel
/// the session.
pub struct SaveSession {
    generation: u64,
    counters: Arc<SessionCounters>,
    token: CancellationToken,
    events: mpsc::UnboundedReceiver<SaveEvent>,
    handle: JoinHandle<SaveReport>,
}

impl SaveSession {
    pub(super) fn new(
        generation: u64,
        counters: Arc<SessionCounters>,
        token: CancellationToken,
        events: mpsc::UnboundedReceiver<SaveEvent>,
        handle: JoinHandle<SaveReport>,
    ) -> Self {
        Self {
            generation,
            counters,
            token,
            events,
            handle,
        }
    }

    /// Monotonic session number within its control.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current counters.
    pub fn status(&self) -> SaveStatus {
        self.counters.status()
    }

    /// Stop pulling new tiles and discard downloads not yet persisted.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Next event, or `None` once the session has ended and every event
    /// has been read.
    pub async fn next_event(&mut self) -> Option<SaveEvent> {
        self.events.recv().await
    }

    /// Wait for the session to end.
    pub async fn wait(self) -> SaveReport {
        match self.handle.await {
            Ok(report) => report,
            Err(e) => {
                error!(generation = self.generation, error = %e, "Save session task failed");
                let status = self.counters.status();
                SaveReport {
                    total: status.length_to_be_saved,
                    loaded: status.length_loaded,
                    saved: status.length_saved,
                    failed: status.length_failed,
                    was_cancelled: true,
                    storage_size: status.storage_size,
                }
            }
        }
    }
}

impl std::fmt::Debug for SaveSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveSession")
            .field("generation", &self.generation)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_fire_once_at_total() {
        let counters = SessionCounters::new(3, 0);
        assert!(!counters.mark_fetched());
        assert!(!counters.mark_fetched());
        assert!(counters.mark_fetched());
        assert!(!counters.mark_fetched());
    }

    #[test]
    fn test_counters_status_snapshot() {
        let counters = SessionCounters::new(4, 10);
        counters.loaded.fetch_add(2, Ordering::SeqCst);
        counters.saved.fetch_add(1, Ordering::SeqCst);

        let status = counters.status();
        assert_eq!(status.storage_size, 10);
        assert_eq!(status.length_to_be_saved, 4);
        assert_eq!(status.length_loaded, 2);
        assert_eq!(status.length_saved, 1);
        assert!(!counters.all_settled());
    }
}
