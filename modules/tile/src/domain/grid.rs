use std::fmt;

use mapkit::MapPoint;

use crate::config::{TileConfig, TileConfigError};

/// Integer tile coordinate on the planar grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileIndex {
    pub x: i32,
    pub y: i32,
}

impl TileIndex {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.x, self.y)
    }
}

/// Axis-aligned planar rectangle covered by a tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl TileBounds {
    pub fn center(&self) -> MapPoint {
        MapPoint::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            0.0,
        )
    }

    pub fn contains(&self, point: MapPoint) -> bool {
        point.x >= self.min_x && point.x < self.max_x && point.y >= self.min_y && point.y < self.max_y
    }
}

/// Validated tile grid geometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSettings {
    size: f64,
    offset: f64,
}

impl TileSettings {
    pub fn new(cfg: &TileConfig) -> Result<Self, TileConfigError> {
        cfg.validate()?;
        Ok(Self {
            size: cfg.size,
            offset: cfg.offset,
        })
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Tile containing `point`, or `None` when the point lies beyond the
    /// `i32` grid or is not finite.
    pub fn index_of(&self, point: MapPoint) -> Option<TileIndex> {
        let axis = |v: f64| {
            let i = (v / self.size).floor();
            (i >= f64::from(i32::MIN) && i <= f64::from(i32::MAX)).then_some(i as i32)
        };
        Some(TileIndex::new(axis(point.x)?, axis(point.y)?))
    }

    pub fn bounds(&self, index: TileIndex) -> TileBounds {
        let min_x = f64::from(index.x) * self.size;
        let min_y = f64::from(index.y) * self.size;
        TileBounds {
            min_x,
            min_y,
            max_x: min_x + self.size,
            max_y: min_y + self.size,
        }
    }

    /// Tiles that should be loaded for `point`: its own tile first, then the
    /// neighbours across every edge closer than `offset`, including the
    /// diagonal one at a corner. Empty when `point` is off the grid;
    /// neighbours past the grid edge are left out.
    pub fn tiles_around(&self, point: MapPoint) -> Vec<TileIndex> {
        let Some(current) = self.index_of(point) else {
            return Vec::new();
        };
        let b = self.bounds(current);

        let step = |low: f64, high: f64, v: f64| -> i32 {
            if v - low < self.offset {
                -1
            } else if high - v <= self.offset {
                1
            } else {
                0
            }
        };
        let dx = step(b.min_x, b.max_x, point.x);
        let dy = step(b.min_y, b.max_y, point.y);

        let shifted = |ox: i32, oy: i32| {
            Some(TileIndex::new(
                current.x.checked_add(ox)?,
                current.y.checked_add(oy)?,
            ))
        };

        let mut tiles = vec![current];
        if dx != 0 {
            tiles.extend(shifted(dx, 0));
        }
        if dy != 0 {
            tiles.extend(shifted(0, dy));
        }
        if dx != 0 && dy != 0 {
            tiles.extend(shifted(dx, dy));
        }
        tiles
    }
}
