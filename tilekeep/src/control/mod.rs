//! Bulk save and remove orchestration.
//!
//! A [`SaveControl`] stands where the map's save/remove buttons would be.
//! [`SaveControl::save_tiles`] enumerates the tiles of an area over one or
//! more zoom levels and downloads them with a small worker pool, returning
//! a [`SaveSession`] to follow progress. [`SaveControl::remove_tiles`]
//! empties the store.
//!
//! # Example
//!
//! ```ignore
//! let control = SaveControl::new(layer, SaveControlConfig::new().with_zoom_levels(vec![12, 13]));
//! let viewport = Viewport::new("52.35,4.85,52.38,4.92".parse()?, 12);
//!
//! if let Some(mut session) = control.save_tiles(&viewport).await? {
//!     while let Some(event) = session.next_event().await {
//!         println!("{:?}", event);
//!     }
//!     let report = session.wait().await;
//! }
//! ```

mod config;
mod events;
mod session;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::coord::{CoordError, LatLngBounds, TileCoord, MAX_ZOOM};
use crate::layer::OfflineTileLayer;
use crate::store::StoreError;
use crate::tile::TileDescriptor;

pub use config::{
    ConfirmationHook, ControlPosition, SaveControlConfig, Viewport, DEFAULT_EVENT_CAPACITY,
    DEFAULT_MAX_ZOOM, DEFAULT_MIN_ZOOM,
};
pub use events::{ControlEvent, SaveEvent, SaveStatus, SessionPhase};
pub use session::{SaveReport, SaveSession};

use session::{SessionContext, SessionCounters};

/// Errors from save and remove operations.
#[derive(Debug, Error)]
pub enum SaveError {
    /// Save-what-you-see requested below the minimum zoom.
    #[error("It's not possible to save with zoom below level {min_zoom}.")]
    ZoomTooLow { zoom: u8, min_zoom: u8 },

    /// A requested zoom level is outside the supported range.
    #[error(transparent)]
    Coord(#[from] CoordError),

    /// The store failed while counting or clearing.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a bulk removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoveReport {
    /// Stored tile count before the removal
    pub removed: u64,
}

/// Phase of the latest session plus any save being prepared on top of it.
#[derive(Debug, Default)]
struct PhaseState {
    session: SessionPhase,
    preparing: Option<SessionPhase>,
}

impl PhaseState {
    fn effective(&self) -> SessionPhase {
        self.preparing.unwrap_or(self.session)
    }
}

/// State shared between the control and its running sessions.
pub(crate) struct ControlShared {
    generation: AtomicU64,
    storage_size: AtomicU64,
    phase_state: Mutex<PhaseState>,
    phase: watch::Sender<SessionPhase>,
    events: broadcast::Sender<ControlEvent>,
}

impl ControlShared {
    fn new(event_capacity: usize) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Idle);
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            generation: AtomicU64::new(0),
            storage_size: AtomicU64::new(0),
            phase_state: Mutex::new(PhaseState::default()),
            phase,
            events,
        }
    }

    fn update_phase(&self, f: impl FnOnce(&mut PhaseState)) {
        let mut state = self.phase_state.lock();
        f(&mut state);
        self.phase.send_if_modified(|current| {
            let next = state.effective();
            let changed = *current != next;
            *current = next;
            changed
        });
    }

    /// Show a preparation phase, or `None` to fall back to the session phase.
    fn set_preparing(&self, phase: Option<SessionPhase>) {
        self.update_phase(|state| state.preparing = phase);
    }

    /// Change the session phase only if `generation` is still the latest.
    fn set_phase_for(&self, generation: u64, phase: SessionPhase) {
        self.update_phase(|state| {
            if self.generation.load(Ordering::SeqCst) == generation {
                state.session = phase;
            }
        });
    }

    /// Make `generation` the latest session, now downloading.
    fn start_session(&self) -> u64 {
        let mut generation = 0;
        self.update_phase(|state| {
            generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            state.session = SessionPhase::Downloading;
            state.preparing = None;
        });
        generation
    }

    fn publish(&self, event: ControlEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn publish_storage_size(&self, size: u64) {
        self.storage_size.store(size, Ordering::SeqCst);
        self.publish(ControlEvent::StorageSize(size));
    }

    /// Publish a session's final size only if `generation` is still the latest.
    fn publish_storage_size_for(&self, generation: u64, size: u64) {
        if self.generation.load(Ordering::SeqCst) == generation {
            self.publish_storage_size(size);
        }
    }
}

/// The control's handle on its latest session.
struct ActiveSession {
    token: CancellationToken,
    /// Cancelled when the session task ends, panics included
    finished: CancellationToken,
}

/// Save/remove control bound to one offline layer.
pub struct SaveControl {
    layer: RwLock<OfflineTileLayer>,
    config: Arc<SaveControlConfig>,
    shared: Arc<ControlShared>,
    active: Mutex<Option<ActiveSession>>,
}

impl SaveControl {
    pub fn new(layer: OfflineTileLayer, config: SaveControlConfig) -> Self {
        let shared = Arc::new(ControlShared::new(config.event_capacity));
        Self {
            layer: RwLock::new(layer),
            config: Arc::new(config),
            shared,
            active: Mutex::new(None),
        }
    }

    /// The same control with different options.
    ///
    /// Any running session is cancelled and drained first.
    pub async fn with_config(self, config: SaveControlConfig) -> Self {
        self.drain_active().await;
        Self::new(self.layer.into_inner(), config)
    }

    pub fn config(&self) -> &SaveControlConfig {
        &self.config
    }

    /// The layer tiles are saved for.
    pub fn layer(&self) -> OfflineTileLayer {
        self.layer.read().clone()
    }

    /// Switch the base layer. Running sessions keep their own layer.
    pub fn set_layer(&self, layer: OfflineTileLayer) {
        info!(url_template = %layer.url_template(), "Base layer changed");
        *self.layer.write() = layer;
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        *self.shared.phase.borrow()
    }

    /// Receiver following phase changes.
    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.shared.phase.subscribe()
    }

    /// Subscribe to storage size and removal notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<ControlEvent> {
        self.shared.events.subscribe()
    }

    /// Generation of the latest session, 0 before the first.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Last published storage size, without touching the store.
    pub fn cached_storage_size(&self) -> u64 {
        self.shared.storage_size.load(Ordering::SeqCst)
    }

    /// Count stored tiles and publish the result.
    pub async fn storage_size(&self) -> Result<u64, SaveError> {
        let layer = self.layer();
        let size = layer.store().count().await?;
        self.shared.publish_storage_size(size);
        Ok(size)
    }

    /// Zoom levels a save from `viewport` covers.
    pub fn zoom_levels_for(&self, viewport: &Viewport) -> Result<Vec<u8>, SaveError> {
        let zooms: Vec<u8> = if self.config.save_what_you_see {
            if viewport.zoom < self.config.min_zoom {
                return Err(SaveError::ZoomTooLow {
                    zoom: viewport.zoom,
                    min_zoom: self.config.min_zoom,
                });
            }
            (viewport.zoom..=self.config.max_zoom).collect()
        } else if let Some(levels) = &self.config.zoom_levels {
            levels.clone()
        } else {
            vec![viewport.zoom]
        };

        if let Some(&zoom) = zooms.iter().find(|&&z| z > MAX_ZOOM) {
            return Err(CoordError::InvalidZoom(zoom).into());
        }
        Ok(zooms)
    }

    /// Area a save from `viewport` covers.
    pub fn bounds_for(&self, viewport: &Viewport) -> LatLngBounds {
        self.config.bounds.unwrap_or(viewport.bounds)
    }

    /// Every tile a save from `viewport` would download, zoom by zoom.
    pub fn enumerate(&self, viewport: &Viewport) -> Result<Vec<TileDescriptor>, SaveError> {
        let zooms = self.zoom_levels_for(viewport)?;
        let bounds = self.bounds_for(viewport);
        let layer = self.layer();

        Ok(zooms
            .into_iter()
            .flat_map(|zoom| layer.area_descriptors(&bounds, zoom))
            .collect())
    }

    /// Start saving the tiles of `viewport`.
    ///
    /// Returns `Ok(None)` when the confirmation hook declines. Starting a
    /// session cancels the previous one and waits for it to end; its
    /// pending saves are discarded.
    pub async fn save_tiles(&self, viewport: &Viewport) -> Result<Option<SaveSession>, SaveError> {
        self.shared.set_preparing(Some(SessionPhase::Enumerating));
        let (layer, tiles, storage_size) = match self.prepare(viewport).await {
            Ok(prepared) => prepared,
            Err(e) => {
                self.shared.set_preparing(None);
                return Err(e);
            }
        };

        let counters = Arc::new(SessionCounters::new(tiles.len() as u64, storage_size));

        if let Some(hook) = &self.config.confirm {
            self.shared
                .set_preparing(Some(SessionPhase::AwaitingConfirmation));
            if !hook.confirm(&counters.status()).await {
                info!(tiles = tiles.len(), "Save declined");
                self.shared.set_preparing(None);
                return Ok(None);
            }
        }

        self.drain_active().await;

        let token = CancellationToken::new();
        let finished = CancellationToken::new();
        let generation = self.shared.start_session();

        let workers = layer.simultaneous();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let ctx = SessionContext {
            generation,
            tiles: Arc::new(tiles),
            layer,
            token: token.clone(),
            counters: Arc::clone(&counters),
            events: events_tx,
            control: Arc::clone(&self.shared),
        };
        let finished_guard = finished.clone().drop_guard();
        let handle = tokio::spawn(async move {
            let _finished = finished_guard;
            session::run(ctx, workers).await
        });

        let active = ActiveSession {
            token: token.clone(),
            finished,
        };
        // Two saves racing past the drain: the older one is only cancelled
        if let Some(previous) = self.active.lock().replace(active) {
            previous.token.cancel();
        }

        Ok(Some(SaveSession::new(
            generation, counters, token, events_rx, handle,
        )))
    }

    async fn prepare(
        &self,
        viewport: &Viewport,
    ) -> Result<(OfflineTileLayer, Vec<TileDescriptor>, u64), SaveError> {
        let tiles = self.enumerate(viewport)?;
        let layer = self.layer();
        let storage_size = layer.store().count().await?;
        debug!(tiles = tiles.len(), storage_size, "Save enumerated");
        Ok((layer, tiles, storage_size))
    }

    /// Cancel the running save session, if any, without waiting for it.
    ///
    /// The session stays registered so a later [`drain_active`](Self::drain_active)
    /// still waits for it.
    pub fn cancel_active(&self) {
        if let Some(active) = self.active.lock().as_ref() {
            active.token.cancel();
        }
    }

    /// Cancel the running save session and wait until its last write has
    /// landed or been discarded.
    pub async fn drain_active(&self) {
        let active = self.active.lock().take();
        if let Some(active) = active {
            if !active.finished.is_cancelled() {
                debug!("Draining previous save session");
            }
            active.token.cancel();
            active.finished.cancelled().await;
        }
    }

    /// Remove every stored tile.
    ///
    /// Returns `Ok(None)` when the removal hook declines. Any running save
    /// session is cancelled and drained before the store is cleared.
    pub async fn remove_tiles(&self) -> Result<Option<RemoveReport>, SaveError> {
        let layer = self.layer();
        let removed = layer.store().count().await?;

        if let Some(hook) = &self.config.confirm_removal {
            let status = SaveStatus {
                storage_size: removed,
                ..Default::default()
            };
            if !hook.confirm(&status).await {
                info!(stored = removed, "Removal declined");
                return Ok(None);
            }
        }

        self.drain_active().await;
        layer.store().clear().await?;
        info!(removed, "All tiles removed");

        self.shared.publish(ControlEvent::TilesRemoved);
        self.shared.publish_storage_size(0);

        Ok(Some(RemoveReport { removed }))
    }

    /// Remove one tile of the current layer. Returns whether it was stored.
    pub async fn remove_tile(&self, coord: TileCoord) -> Result<bool, SaveError> {
        let layer = self.layer();
        let key = layer.storage_key(&coord);
        let existed = layer.store().remove(&key).await?;
        debug!(tile = %coord, key = %key, existed, "Tile removed");
        self.storage_size().await?;
        Ok(existed)
    }
}

impl std::fmt::Debug for SaveControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveControl")
            .field("config", &self.config)
            .field("phase", &self.phase())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}
