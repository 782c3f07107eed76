// src/map/grid.rs
//! Tile range covering a bounding box

use super::projection;
use super::tile::{validate_zoom, TileIndex};
use crate::error::Result;
use crate::geo::BoundingBox;
use serde::Serialize;

/// Position of one tile inside the composite, plus the tile it shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    pub col: u32,
    pub row: u32,
    pub tile: TileIndex,
}

/// Rectangular tile range for a bounding box at one zoom level.
///
/// `first` is the tile under the box's north-west corner and becomes the
/// composite's top-left tile. Both axes are inclusive of `last`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GridPlan {
    pub first: TileIndex,
    pub last: TileIndex,
    pub columns: u32,
    pub rows: u32,
}

impl GridPlan {
    pub fn for_bbox(bbox: &BoundingBox, zoom: u8) -> Result<Self> {
        validate_zoom(zoom)?;
        let nw = bbox.north_west();
        let se = bbox.south_east();

        let first = TileIndex {
            x: projection::longitude_to_tile_x(nw.longitude, zoom),
            y: projection::latitude_to_tile_y(nw.latitude, zoom),
            zoom,
        };
        let last = TileIndex {
            x: projection::longitude_to_tile_x(se.longitude, zoom),
            y: projection::latitude_to_tile_y(se.latitude, zoom),
            zoom,
        };

        let columns = first.x.abs_diff(last.x) + 1;
        // A box whose south edge projects above its north edge still gets one row.
        let rows = if last.y >= first.y {
            last.y - first.y + 1
        } else {
            1
        };

        Ok(Self {
            first,
            last,
            columns,
            rows,
        })
    }

    pub fn zoom(&self) -> u8 {
        self.first.zoom
    }

    pub fn tile_count(&self) -> usize {
        self.columns as usize * self.rows as usize
    }

    /// Composite dimensions in pixels, `None` if they overflow `u32`.
    pub fn pixel_dimensions(&self, tile_size: u32) -> Option<(u32, u32)> {
        Some((
            self.columns.checked_mul(tile_size)?,
            self.rows.checked_mul(tile_size)?,
        ))
    }

    /// Tile x for a column offset. Columns walk west when `last.x < first.x`.
    fn column_x(&self, col: u32) -> u32 {
        if self.last.x >= self.first.x {
            self.first.x + col
        } else {
            self.first.x - col
        }
    }

    /// Cells in scan order: columns outer, rows inner.
    pub fn cells(&self) -> impl Iterator<Item = GridCell> + '_ {
        (0..self.columns).flat_map(move |col| {
            let x = self.column_x(col);
            (0..self.rows).map(move |row| GridCell {
                col,
                row,
                tile: TileIndex {
                    x,
                    y: self.first.y + row,
                    zoom: self.first.zoom,
                },
            })
        })
    }
}
