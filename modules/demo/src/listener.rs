use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use mapkit::{MapPositionChanged, MessageBus, Trace};
use scene::SceneGraph;
use tile::{TileChanged, TileLoaded};

const CATEGORY: &str = "demo";

/// Reports engine tile activity to the trace sink.
pub struct DemoTileListener {
    trace: Arc<dyn Trace>,
    scene: Option<Arc<SceneGraph>>,
    trace_positions: bool,
    tiles_loaded: AtomicUsize,
    positions: AtomicUsize,
}

impl std::fmt::Debug for DemoTileListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DemoTileListener")
            .field("has_scene", &self.scene.is_some())
            .field("trace_positions", &self.trace_positions)
            .field("tiles_loaded", &self.tiles_loaded())
            .field("positions", &self.positions())
            .finish()
    }
}

impl DemoTileListener {
    pub fn new(trace: Arc<dyn Trace>, scene: Option<Arc<SceneGraph>>, trace_positions: bool) -> Self {
        Self {
            trace,
            scene,
            trace_positions,
            tiles_loaded: AtomicUsize::new(0),
            positions: AtomicUsize::new(0),
        }
    }

    pub fn attach(self: &Arc<Self>, bus: &MessageBus) {
        let weak: Weak<Self> = Arc::downgrade(self);
        bus.subscribe(move |m: &TileLoaded| {
            if let Some(listener) = weak.upgrade() {
                listener.on_tile_loaded(m);
            }
            Ok(())
        });

        let weak: Weak<Self> = Arc::downgrade(self);
        bus.subscribe(move |m: &TileChanged| {
            if let Some(listener) = weak.upgrade() {
                listener.on_tile_changed(m);
            }
            Ok(())
        });

        let weak: Weak<Self> = Arc::downgrade(self);
        bus.subscribe(move |m: &MapPositionChanged| {
            if let Some(listener) = weak.upgrade() {
                listener.on_position(m);
            }
            Ok(())
        });
    }

    pub fn tiles_loaded(&self) -> usize {
        self.tiles_loaded.load(Ordering::Relaxed)
    }

    pub fn positions(&self) -> usize {
        self.positions.load(Ordering::Relaxed)
    }

    fn on_tile_loaded(&self, m: &TileLoaded) {
        self.tiles_loaded.fetch_add(1, Ordering::Relaxed);
        let placement = self
            .scene
            .as_ref()
            .and_then(|s| s.get(m.index))
            .map(|t| format!(" at {}", t.center))
            .unwrap_or_default();
        self.trace
            .info(CATEGORY, &format!("Tile {} loaded{placement}", m.index));
    }

    fn on_tile_changed(&self, m: &TileChanged) {
        self.trace
            .info(CATEGORY, &format!("Entered tile {}", m.to));
    }

    fn on_position(&self, m: &MapPositionChanged) {
        self.positions.fetch_add(1, Ordering::Relaxed);
        if self.trace_positions {
            let p = m.point;
            self.trace.debug(
                CATEGORY,
                &format!("Position ({:.1}, {:.1}, {:.1})", p.x, p.y, p.elevation),
            );
        }
    }
}
