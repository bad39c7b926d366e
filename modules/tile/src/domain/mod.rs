mod controller;
mod grid;
mod messages;

pub use controller::TileController;
pub use grid::{TileBounds, TileIndex, TileSettings};
pub use messages::{TileChanged, TileEvicted, TileLoaded};
