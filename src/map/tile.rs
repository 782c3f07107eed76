// src/map/tile.rs
//! Slippy-map tile identifiers

use super::projection;
use crate::error::{Result, StitchError};
use crate::geo::GeoPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Highest zoom level the stitcher accepts.
pub const MAX_ZOOM: u8 = 20;

/// Largest accepted tile edge in pixels.
pub const MAX_TILE_SIZE: u32 = 4096;

/// One tile in the standard slippy-map scheme.
///
/// `x` grows eastward from the antimeridian, `y` grows southward from the
/// northern Mercator limit. Both are `< 2^zoom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileIndex {
    /// Checked constructor.
    pub fn new(x: u32, y: u32, zoom: u8) -> Result<Self> {
        validate_zoom(zoom)?;
        let n = tiles_per_axis(zoom);
        if u64::from(x) >= n || u64::from(y) >= n {
            return Err(StitchError::invalid_input(format!(
                "tile {}/{}/{} outside the {}x{} grid",
                zoom, x, y, n, n
            )));
        }
        Ok(Self { x, y, zoom })
    }

    /// The tile containing `point` at `zoom`.
    pub fn containing(point: &GeoPoint, zoom: u8) -> Result<Self> {
        validate_zoom(zoom)?;
        point.validate()?;
        Ok(Self {
            x: projection::longitude_to_tile_x(point.longitude, zoom),
            y: projection::latitude_to_tile_y(point.latitude, zoom),
            zoom,
        })
    }

    /// Geographic position of the tile's top-left corner.
    pub fn north_west(&self) -> GeoPoint {
        GeoPoint {
            latitude: projection::tile_y_to_latitude(self.y, self.zoom),
            longitude: projection::tile_x_to_longitude(self.x, self.zoom),
        }
    }

    /// Absolute pixel position of the tile's top-left corner.
    pub fn pixel_origin(&self, tile_size: u32) -> (f64, f64) {
        (
            projection::tile_to_pixel(self.x, tile_size),
            projection::tile_to_pixel(self.y, tile_size),
        )
    }
}

impl fmt::Display for TileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Number of tiles along one axis at `zoom`.
pub fn tiles_per_axis(zoom: u8) -> u64 {
    1u64 << zoom
}

pub fn validate_zoom(zoom: u8) -> Result<()> {
    if zoom > MAX_ZOOM {
        return Err(StitchError::invalid_input(format!(
            "zoom level {} outside 0..={}",
            zoom, MAX_ZOOM
        )));
    }
    Ok(())
}

pub fn validate_tile_size(tile_size: u32) -> Result<()> {
    if tile_size == 0 || tile_size > MAX_TILE_SIZE {
        return Err(StitchError::invalid_input(format!(
            "tile size {} outside 1..={}",
            tile_size, MAX_TILE_SIZE
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_constructor() {
        assert!(TileIndex::new(0, 0, 0).is_ok());
        assert!(TileIndex::new(1, 0, 0).is_err());
        assert!(TileIndex::new(65535, 65535, 16).is_ok());
        assert!(TileIndex::new(65536, 0, 16).is_err());
        assert!(TileIndex::new(0, 0, MAX_ZOOM + 1).is_err());
    }

    #[test]
    fn test_display_is_zoom_x_y() {
        let tile = TileIndex { x: 12, y: 34, zoom: 5 };
        assert_eq!(tile.to_string(), "5/12/34");
    }

    #[test]
    fn test_containing_equator() {
        let tile = TileIndex::containing(&GeoPoint { latitude: 0.0, longitude: 0.0 }, 1).unwrap();
        assert_eq!((tile.x, tile.y), (1, 1));
    }

    #[test]
    fn test_containing_rejects_bad_zoom() {
        let point = GeoPoint { latitude: 0.0, longitude: 0.0 };
        assert!(TileIndex::containing(&point, 21).is_err());
    }

    #[test]
    fn test_pixel_origin() {
        let tile = TileIndex { x: 3, y: 5, zoom: 4 };
        assert_eq!(tile.pixel_origin(256), (768.0, 1280.0));
    }

    #[test]
    fn test_tile_size_validation() {
        assert!(validate_tile_size(256).is_ok());
        assert!(validate_tile_size(0).is_err());
        assert!(validate_tile_size(MAX_TILE_SIZE + 1).is_err());
    }
}
