// src/render/directory.rs
//! Pre-rendered tile dataset on disk

use super::TileRenderer;
use crate::error::{Result, StitchError};
use crate::map::{TileIndex, MAX_ZOOM};
use image::RgbaImage;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use tracing::{debug, info};

/// Renders tiles by decoding `{zoom}/{x}/{y}.png` files under a root
/// directory.
#[derive(Debug)]
pub struct TileDirectory {
    root: PathBuf,
    open: AtomicBool,
    zooms: OnceLock<BTreeSet<u8>>,
}

impl TileDirectory {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StitchError::file_io(
                &root,
                std::io::Error::new(std::io::ErrorKind::NotFound, "tile directory not found"),
            ));
        }
        info!(path = %root.display(), "Opened tile directory");
        Ok(Self {
            root,
            open: AtomicBool::new(true),
            zooms: OnceLock::new(),
        })
    }

    /// Releases the dataset. Later renders fail.
    pub fn close(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            debug!(path = %self.root.display(), "Closed tile directory");
        }
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Zoom levels found by `prepare_style`, empty before that.
    pub fn zoom_levels(&self) -> Vec<u8> {
        self.zooms
            .get()
            .map(|z| z.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn tile_path(&self, tile: &TileIndex) -> PathBuf {
        Self::path_for(&self.root, tile.zoom, tile.x, tile.y)
    }

    fn path_for(root: &Path, zoom: u8, x: u32, y: u32) -> PathBuf {
        root.join(format!("{}/{}/{}.png", zoom, x, y))
    }

    fn scan_zoom_levels(&self) -> Result<BTreeSet<u8>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| StitchError::file_io(&self.root, e))?;
        let mut zooms = BTreeSet::new();
        for entry in entries.flatten() {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            let zoom = entry.file_name().to_str().and_then(|n| n.parse::<u8>().ok());
            if let (true, Some(zoom)) = (is_dir, zoom) {
                if zoom <= MAX_ZOOM {
                    zooms.insert(zoom);
                }
            }
        }
        Ok(zooms)
    }
}

impl TileRenderer for TileDirectory {
    fn name(&self) -> &str {
        "directory"
    }

    fn prepare_style(&self) -> Result<()> {
        if !self.is_open() {
            return Err(StitchError::StylePreparation(format!(
                "tile directory {} is closed",
                self.root.display()
            )));
        }
        let zooms = self.scan_zoom_levels()?;
        if zooms.is_empty() {
            return Err(StitchError::StylePreparation(format!(
                "no zoom levels under {}",
                self.root.display()
            )));
        }
        info!(path = %self.root.display(), zooms = ?zooms, "Indexed tile directory");
        // A second preparation keeps the first index
        let _ = self.zooms.set(zooms);
        Ok(())
    }

    fn render(&self, tile: &TileIndex, _tile_size: u32) -> Result<RgbaImage> {
        if !self.is_open() {
            return Err(StitchError::renderer(*tile, "tile directory is closed"));
        }
        let zooms = self
            .zooms
            .get()
            .ok_or_else(|| StitchError::renderer(*tile, "style not prepared"))?;
        if !zooms.contains(&tile.zoom) {
            return Err(StitchError::renderer(
                *tile,
                format!("zoom {} not in dataset", tile.zoom),
            ));
        }

        let path = self.tile_path(tile);
        let bytes = std::fs::read(&path)
            .map_err(|e| StitchError::renderer(*tile, format!("{}: {}", path.display(), e)))?;
        let image = image::load_from_memory(&bytes)
            .map_err(|e| StitchError::renderer(*tile, format!("{}: {}", path.display(), e)))?;
        Ok(image.to_rgba8())
    }

    fn min_zoom(&self) -> u8 {
        self.zooms.get().and_then(|z| z.first().copied()).unwrap_or(0)
    }

    fn max_zoom(&self) -> u8 {
        self.zooms.get().and_then(|z| z.last().copied()).unwrap_or(MAX_ZOOM)
    }
}

impl Drop for TileDirectory {
    fn drop(&mut self) {
        self.close();
    }
}
