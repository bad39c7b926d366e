use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use infrastructure::GeoOrigin;
use mapkit::{GeoCoordinate, MessageBus, SubscriptionId};
use parking_lot::RwLock;
use tile::{TileBounds, TileEvicted, TileIndex, TileLoaded};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneTile {
    pub index: TileIndex,
    pub bounds: TileBounds,
    /// Geographic position of the tile centre.
    pub center: GeoCoordinate,
}

/// Loaded tiles in load order, capped at `max_tiles`.
#[derive(Debug)]
pub struct SceneGraph {
    origin: GeoOrigin,
    max_tiles: usize,
    tiles: RwLock<VecDeque<SceneTile>>,
}

impl SceneGraph {
    pub fn new(origin: GeoOrigin, max_tiles: usize) -> Self {
        let max_tiles = max_tiles.max(1);
        Self {
            origin,
            max_tiles,
            tiles: RwLock::new(VecDeque::with_capacity(max_tiles)),
        }
    }

    /// Record every [`TileLoaded`] published on `bus` and answer evictions
    /// with [`TileEvicted`] on the same bus.
    pub fn attach(self: &Arc<Self>, bus: &Arc<MessageBus>) -> SubscriptionId {
        let weak: Weak<Self> = Arc::downgrade(self);
        let weak_bus: Weak<MessageBus> = Arc::downgrade(bus);
        bus.subscribe(move |m: &TileLoaded| {
            let Some(scene) = weak.upgrade() else {
                return Ok(());
            };
            if let (Some(old), Some(bus)) = (scene.add_tile(m.index, m.bounds), weak_bus.upgrade()) {
                bus.publish(&TileEvicted { index: old.index });
            }
            Ok(())
        })
    }

    /// Add a tile; returns the evicted tile when the scene was full. The
    /// caller is responsible for announcing the eviction.
    pub fn add_tile(&self, index: TileIndex, bounds: TileBounds) -> Option<SceneTile> {
        let center = self.origin.to_geo(bounds.center());
        let mut tiles = self.tiles.write();
        if tiles.iter().any(|t| t.index == index) {
            return None;
        }
        let evicted = if tiles.len() == self.max_tiles {
            tiles.pop_front()
        } else {
            None
        };
        tiles.push_back(SceneTile {
            index,
            bounds,
            center,
        });
        if let Some(old) = &evicted {
            debug!(tile = %old.index, "Tile evicted from scene");
        }
        evicted
    }

    pub fn get(&self, index: TileIndex) -> Option<SceneTile> {
        self.tiles.read().iter().find(|t| t.index == index).copied()
    }

    /// Oldest first.
    pub fn tiles(&self) -> Vec<SceneTile> {
        self.tiles.read().iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.read().is_empty()
    }

    pub fn max_tiles(&self) -> usize {
        self.max_tiles
    }
}
