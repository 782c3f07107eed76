// src/render/mod.rs
//! Tile renderers and the style readiness barrier
//!
//! The stitcher only depends on [`TileRenderer`]. A renderer prepares its
//! style once on a background task ([`StyleFuture`]) and then renders tiles
//! one at a time on the caller's blocking task.

pub mod directory;
pub mod pattern;

pub use directory::TileDirectory;
pub use pattern::{PatternRenderer, Theme};

use crate::error::{Result, StitchError};
use crate::map::{TileIndex, MAX_ZOOM};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::{spawn_blocking, JoinHandle};
use tracing::{debug, info};

/// Source of raster tiles.
pub trait TileRenderer: Send + Sync {
    /// Renderer name for logging and reports.
    fn name(&self) -> &str;

    /// One-shot style preparation. Called exactly once, off the async
    /// runtime, before the first [`render`](Self::render).
    fn prepare_style(&self) -> Result<()>;

    /// Renders one `tile_size` square tile.
    fn render(&self, tile: &TileIndex, tile_size: u32) -> Result<RgbaImage>;

    fn min_zoom(&self) -> u8 {
        0
    }

    fn max_zoom(&self) -> u8 {
        MAX_ZOOM
    }

    fn supports_zoom(&self, zoom: u8) -> bool {
        zoom >= self.min_zoom() && zoom <= self.max_zoom()
    }
}

/// Pending style preparation.
///
/// Await [`wait`](Self::wait) before rendering the first tile.
pub struct StyleFuture {
    renderer: String,
    started: Instant,
    handle: JoinHandle<Result<()>>,
}

impl StyleFuture {
    /// Starts `prepare_style` on the blocking pool. Must be called inside a
    /// tokio runtime.
    pub fn spawn(renderer: Arc<dyn TileRenderer>) -> Self {
        let name = renderer.name().to_string();
        debug!(renderer = %name, "Preparing style");
        let handle = spawn_blocking(move || renderer.prepare_style());
        Self {
            renderer: name,
            started: Instant::now(),
            handle,
        }
    }

    /// Blocks the caller until the style is ready.
    pub async fn wait(self) -> Result<()> {
        let outcome = self.handle.await.map_err(|e| {
            StitchError::StylePreparation(format!("{} style task panicked: {}", self.renderer, e))
        })?;

        match outcome {
            Ok(()) => {
                info!(
                    renderer = %self.renderer,
                    elapsed_ms = self.started.elapsed().as_millis() as u64,
                    "Style ready"
                );
                Ok(())
            }
            Err(e @ StitchError::StylePreparation(_)) => Err(e),
            Err(e) => Err(StitchError::StylePreparation(format!("{}: {}", self.renderer, e))),
        }
    }
}

/// Built-in renderer kinds selectable from config and the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Synthetic themed tiles
    #[default]
    Pattern,
    /// Pre-rendered `{zoom}/{x}/{y}.png` dataset
    Directory,
}

impl RendererKind {
    pub fn display_name(&self) -> &str {
        match self {
            RendererKind::Pattern => "pattern",
            RendererKind::Directory => "directory",
        }
    }
}

/// Everything needed to build a renderer.
#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    pub kind: RendererKind,
    pub dataset: Option<PathBuf>,
    pub theme: Option<PathBuf>,
}

impl RendererConfig {
    pub fn create(&self) -> Result<Arc<dyn TileRenderer>> {
        debug!(renderer = self.kind.display_name(), "Creating tile renderer");
        match self.kind {
            RendererKind::Pattern => {
                let renderer = match &self.theme {
                    Some(path) => PatternRenderer::with_theme_file(path),
                    None => PatternRenderer::new(),
                };
                Ok(Arc::new(renderer))
            }
            RendererKind::Directory => {
                let dataset = self.dataset.as_ref().ok_or_else(|| {
                    StitchError::Config("directory renderer needs a dataset path".to_string())
                })?;
                Ok(Arc::new(TileDirectory::open(dataset)?))
            }
        }
    }
}
