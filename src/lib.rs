// src/lib.rs
//! Tile Stitcher Library
//!
//! Renders every slippy-map tile covering a route, stitches the tiles into a
//! single raster and draws the route on top.

pub mod compose;
pub mod config;
pub mod display;
pub mod error;
pub mod geo;
pub mod logging;
pub mod map;
pub mod overlay;
pub mod render;
pub mod report;
pub mod route;
pub mod stitcher;

// Re-export main types for convenience
pub use error::{Result, StitchError};
pub use geo::{BoundingBox, GeoPoint, Polyline};
pub use map::{GridPlan, TileIndex};
pub use render::{StyleFuture, TileRenderer};
pub use route::Route;
pub use stitcher::{plan_route, StitchOptions, Stitcher};
