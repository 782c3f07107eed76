// src/map/mod.rs v2
//! Slippy-map tiles, Mercator projection and tile range planning

pub mod grid;
pub mod projection;
mod tile;

pub use grid::{GridCell, GridPlan};
pub use tile::{tiles_per_axis, validate_tile_size, validate_zoom, TileIndex, MAX_TILE_SIZE, MAX_ZOOM};
