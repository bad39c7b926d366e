use std::collections::HashSet;
use std::sync::{Arc, Weak};

use mapkit::{MapPoint, MapPositionChanged, MessageBus, SubscriptionId};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::grid::{TileIndex, TileSettings};
use super::messages::{TileChanged, TileEvicted, TileLoaded};

#[derive(Debug, Default)]
struct State {
    current: Option<TileIndex>,
    loaded: HashSet<TileIndex>,
}

/// Tracks which tile the avatar is on and announces tiles as they are needed.
///
/// Each tile is announced with [`TileLoaded`] once, until a consumer reports
/// it gone with [`TileEvicted`].
pub struct TileController {
    settings: TileSettings,
    bus: Arc<MessageBus>,
    state: Mutex<State>,
}

impl std::fmt::Debug for TileController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("TileController")
            .field("settings", &self.settings)
            .field("current", &state.current)
            .field("loaded", &state.loaded.len())
            .finish()
    }
}

impl TileController {
    pub fn new(settings: TileSettings, bus: Arc<MessageBus>) -> Self {
        Self {
            settings,
            bus,
            state: Mutex::new(State::default()),
        }
    }

    /// Follow [`MapPositionChanged`] and [`TileEvicted`] on the controller's bus.
    ///
    /// The subscriptions hold a weak reference; once the controller is dropped
    /// the handlers do nothing.
    pub fn attach(self: &Arc<Self>) -> [SubscriptionId; 2] {
        let weak: Weak<Self> = Arc::downgrade(self);
        let positions = self.bus.subscribe(move |m: &MapPositionChanged| {
            if let Some(controller) = weak.upgrade() {
                controller.on_position(m.point);
            }
            Ok(())
        });
        let weak: Weak<Self> = Arc::downgrade(self);
        let evictions = self.bus.subscribe(move |m: &TileEvicted| {
            if let Some(controller) = weak.upgrade() {
                controller.forget(m.index);
            }
            Ok(())
        });
        [positions, evictions]
    }

    pub fn settings(&self) -> &TileSettings {
        &self.settings
    }

    pub fn current_tile(&self) -> Option<TileIndex> {
        self.state.lock().current
    }

    pub fn is_loaded(&self, index: TileIndex) -> bool {
        self.state.lock().loaded.contains(&index)
    }

    pub fn loaded_count(&self) -> usize {
        self.state.lock().loaded.len()
    }

    /// Mark `index` as no longer loaded. Returns whether it was.
    pub fn forget(&self, index: TileIndex) -> bool {
        let removed = self.state.lock().loaded.remove(&index);
        if removed {
            debug!(tile = %index, "Tile forgotten");
        }
        removed
    }

    /// Update for a new avatar position. Returns the tiles loaded by this call.
    ///
    /// Positions off the tile grid are skipped and leave the state unchanged.
    pub fn on_position(&self, point: MapPoint) -> Vec<TileIndex> {
        let Some(current) = self.settings.index_of(point) else {
            warn!(x = point.x, y = point.y, "Position is outside the tile grid; skipped");
            return Vec::new();
        };
        let wanted = self.settings.tiles_around(point);

        // Decide under the lock, publish after releasing it: subscribers may
        // call back into the controller.
        let (previous, fresh) = {
            let mut state = self.state.lock();
            let previous = state.current.replace(current);
            let fresh: Vec<TileIndex> = wanted
                .into_iter()
                .filter(|idx| state.loaded.insert(*idx))
                .collect();
            (previous, fresh)
        };

        if previous != Some(current) {
            debug!(from = ?previous, to = %current, "Current tile changed");
            self.bus.publish(&TileChanged {
                from: previous,
                to: current,
            });
        }

        for index in &fresh {
            let bounds = self.settings.bounds(*index);
            info!(tile = %index, "Tile loaded");
            self.bus.publish(&TileLoaded {
                index: *index,
                bounds,
            });
        }
        fresh
    }
}
