// src/render/pattern.rs
//! Synthetic themed tiles for demos and tests

use super::TileRenderer;
use crate::error::{Result, StitchError};
use crate::map::TileIndex;
use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Colours used by [`PatternRenderer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub light: [u8; 4],
    pub dark: [u8; 4],
    pub border: [u8; 4],
    /// Checker squares per tile edge
    #[serde(default = "default_checks")]
    pub checks: u32,
}

fn default_checks() -> u32 {
    4
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            name: "osmarender".to_string(),
            light: [242, 239, 233, 255],
            dark: [221, 216, 205, 255],
            border: [170, 170, 170, 255],
            checks: default_checks(),
        }
    }
}

impl Theme {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| StitchError::file_io(path, e))?;
        let theme: Self = serde_json::from_str(&contents)?;
        if theme.checks == 0 {
            return Err(StitchError::StylePreparation(format!(
                "theme {} has zero checks per tile",
                theme.name
            )));
        }
        Ok(theme)
    }
}

/// Checkerboard tiles with a one-pixel border on the north and west edges.
///
/// Adjacent tiles start on opposite colours, so tile seams are visible in the
/// composite.
#[derive(Debug, Default)]
pub struct PatternRenderer {
    theme_file: Option<PathBuf>,
    theme: OnceLock<Theme>,
}

impl PatternRenderer {
    /// Uses the built-in theme.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_theme_file(path: impl Into<PathBuf>) -> Self {
        Self {
            theme_file: Some(path.into()),
            theme: OnceLock::new(),
        }
    }

    pub fn theme(&self) -> Option<&Theme> {
        self.theme.get()
    }
}

impl TileRenderer for PatternRenderer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn prepare_style(&self) -> Result<()> {
        let theme = match &self.theme_file {
            Some(path) => Theme::load(path)?,
            None => Theme::default(),
        };
        debug!(theme = %theme.name, "Pattern theme loaded");
        let _ = self.theme.set(theme);
        Ok(())
    }

    fn render(&self, tile: &TileIndex, tile_size: u32) -> Result<RgbaImage> {
        let theme = self
            .theme
            .get()
            .ok_or_else(|| StitchError::renderer(*tile, "style not prepared"))?;

        let square = (tile_size / theme.checks).max(1);
        let parity = (tile.x ^ tile.y) & 1;
        let image = RgbaImage::from_fn(tile_size, tile_size, |px, py| {
            if px == 0 || py == 0 {
                Rgba(theme.border)
            } else if (px / square + py / square + parity) % 2 == 0 {
                Rgba(theme.light)
            } else {
                Rgba(theme.dark)
            }
        });
        Ok(image)
    }
}
