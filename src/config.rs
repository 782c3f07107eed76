// src/config.rs v3
//! Stitcher configuration stored as JSON under the user's config directory

use crate::error::{Result, StitchError};
use crate::map::{validate_tile_size, validate_zoom};
use crate::overlay::OverlayStyle;
use crate::render::{RendererConfig, RendererKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    pub zoom: u8,
    pub tile_size: u32,
    pub renderer: RendererKind,
    pub dataset: Option<PathBuf>,
    pub theme: Option<PathBuf>,
    pub output: PathBuf,
    pub background: [u8; 4],
    pub overlay: OverlayStyle,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            zoom: 16,
            tile_size: 256,
            renderer: RendererKind::Pattern,
            dataset: None,
            theme: None,
            output: PathBuf::from("route.png"),
            background: [0, 0, 0, 255],
            overlay: OverlayStyle::default(),
        }
    }
}

impl StitchConfig {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| StitchError::file_io(path, e))?;
        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| StitchError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StitchError::file_io(parent, e))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| StitchError::file_io(path, e))?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .map_err(|_| StitchError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("tile-stitcher").join("config.json"))
    }

    pub fn validate(&self) -> Result<()> {
        validate_zoom(self.zoom).map_err(|e| StitchError::Config(e.to_string()))?;
        validate_tile_size(self.tile_size).map_err(|e| StitchError::Config(e.to_string()))?;
        if self.renderer == RendererKind::Directory && self.dataset.is_none() {
            return Err(StitchError::Config(
                "renderer \"directory\" needs a dataset path".to_string(),
            ));
        }
        Ok(())
    }

    /// Switch to a pre-rendered tile directory.
    pub fn update_dataset(&mut self, dataset: PathBuf) {
        self.renderer = RendererKind::Directory;
        self.dataset = Some(dataset);
    }

    /// Switch to the pattern renderer with a theme file.
    pub fn update_theme(&mut self, theme: PathBuf) {
        self.renderer = RendererKind::Pattern;
        self.theme = Some(theme);
    }

    /// Applies command-line renderer choices. A dataset and a theme select
    /// different renderers, so both together need an explicit `renderer`.
    pub fn override_renderer(
        &mut self,
        renderer: Option<RendererKind>,
        dataset: Option<PathBuf>,
        theme: Option<PathBuf>,
    ) -> Result<()> {
        if renderer.is_none() && dataset.is_some() && theme.is_some() {
            return Err(StitchError::Config(
                "a dataset selects the directory renderer and a theme the pattern renderer; \
                 choose one with --renderer"
                    .to_string(),
            ));
        }
        if let Some(dataset) = dataset {
            self.update_dataset(dataset);
        }
        if let Some(theme) = theme {
            self.update_theme(theme);
        }
        if let Some(kind) = renderer {
            self.renderer = kind;
        }
        Ok(())
    }

    pub fn renderer_config(&self) -> RendererConfig {
        RendererConfig {
            kind: self.renderer,
            dataset: self.dataset.clone(),
            theme: self.theme.clone(),
        }
    }
}
