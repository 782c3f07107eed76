// src/compose/mod.rs
//! Assembles rendered tiles into one composite raster
//!
//! [`TileGrid`] collects same-size tiles at (column, row) offsets and
//! [`Compositor`] block-copies them onto a single canvas. Missing cells keep
//! the background colour.

use crate::error::{Result, StitchError};
use crate::map::{validate_tile_size, GridCell, GridPlan};
use image::{imageops, Rgba, RgbaImage};
use tracing::debug;

/// Upper bound on composite pixels (1 GiB of RGBA).
pub const MAX_COMPOSITE_PIXELS: u64 = 1 << 28;

/// Opaque black, matching an RGB canvas with no tile drawn.
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Sparse, row-major grid of tiles awaiting composition.
#[derive(Debug, Clone)]
pub struct TileGrid {
    columns: u32,
    rows: u32,
    tile_size: u32,
    tiles: Vec<Option<RgbaImage>>,
}

impl TileGrid {
    pub fn new(columns: u32, rows: u32, tile_size: u32) -> Result<Self> {
        validate_tile_size(tile_size)?;
        if columns == 0 || rows == 0 {
            return Err(StitchError::invalid_input(format!(
                "tile grid must be at least 1x1, got {}x{}",
                columns, rows
            )));
        }
        check_composite_size(columns, rows, tile_size)?;

        Ok(Self {
            columns,
            rows,
            tile_size,
            tiles: vec![None; columns as usize * rows as usize],
        })
    }

    /// Empty grid shaped like `plan`.
    pub fn for_plan(plan: &GridPlan, tile_size: u32) -> Result<Self> {
        Self::new(plan.columns, plan.rows, tile_size)
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn filled(&self) -> usize {
        self.tiles.iter().filter(|t| t.is_some()).count()
    }

    fn slot(&self, col: u32, row: u32) -> Option<usize> {
        (col < self.columns && row < self.rows)
            .then(|| row as usize * self.columns as usize + col as usize)
    }

    /// Stores a rendered tile, rejecting anything that is not exactly
    /// `tile_size` square.
    pub fn place(&mut self, cell: GridCell, image: RgbaImage) -> Result<()> {
        if image.width() != self.tile_size || image.height() != self.tile_size {
            return Err(StitchError::MalformedTile {
                tile: cell.tile,
                width: image.width(),
                height: image.height(),
                expected: self.tile_size,
            });
        }
        let slot = self.slot(cell.col, cell.row).ok_or_else(|| {
            StitchError::invalid_input(format!(
                "cell ({}, {}) outside {}x{} grid",
                cell.col, cell.row, self.columns, self.rows
            ))
        })?;
        self.tiles[slot] = Some(image);
        Ok(())
    }
}

/// Rejects grids whose composite would overflow or exceed [`MAX_COMPOSITE_PIXELS`].
pub fn check_composite_size(columns: u32, rows: u32, tile_size: u32) -> Result<(u32, u32)> {
    let too_large = || {
        StitchError::invalid_input(format!(
            "composite of {}x{} tiles at {} px exceeds {} pixels",
            columns, rows, tile_size, MAX_COMPOSITE_PIXELS
        ))
    };
    let width = columns.checked_mul(tile_size).ok_or_else(too_large)?;
    let height = rows.checked_mul(tile_size).ok_or_else(too_large)?;
    if u64::from(width) * u64::from(height) > MAX_COMPOSITE_PIXELS {
        return Err(too_large());
    }
    Ok((width, height))
}

#[derive(Debug, Clone)]
pub struct Compositor {
    background: Rgba<u8>,
}

impl Compositor {
    pub fn new(background: Rgba<u8>) -> Self {
        Self { background }
    }

    /// Consumes the grid; each tile is released once copied.
    pub fn compose(&self, grid: TileGrid) -> RgbaImage {
        let tile_size = grid.tile_size;
        let mut canvas = RgbaImage::from_pixel(
            grid.columns * tile_size,
            grid.rows * tile_size,
            self.background,
        );

        let columns = grid.columns as usize;
        for (slot, tile) in grid.tiles.into_iter().enumerate() {
            let Some(tile) = tile else { continue };
            let col = (slot % columns) as u32;
            let row = (slot / columns) as u32;
            imageops::replace(
                &mut canvas,
                &tile,
                i64::from(col * tile_size),
                i64::from(row * tile_size),
            );
        }

        debug!(
            width = canvas.width(),
            height = canvas.height(),
            "Composite assembled"
        );
        canvas
    }
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(DEFAULT_BACKGROUND)
    }
}
