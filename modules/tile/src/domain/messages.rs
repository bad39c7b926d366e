use super::grid::{TileBounds, TileIndex};

/// A tile became needed. Published once per tile, and again if the tile was
/// evicted in between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileLoaded {
    pub index: TileIndex,
    pub bounds: TileBounds,
}

/// The avatar crossed into another tile. `from` is `None` for the first update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileChanged {
    pub from: Option<TileIndex>,
    pub to: TileIndex,
}

/// A consumer dropped a loaded tile; the controller will announce it again
/// when it is next needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileEvicted {
    pub index: TileIndex,
}
