// src/error.rs
//! Error types for the tile stitcher

use crate::map::TileIndex;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StitchError>;

#[derive(Debug, Error)]
pub enum StitchError {
    /// The route, zoom or tile size cannot be rendered.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Renderer failed on tile {tile}: {reason}")]
    Renderer { tile: TileIndex, reason: String },

    /// The renderer returned a tile of the wrong dimensions.
    #[error("Malformed tile {tile}: got {width}x{height}, expected {expected}x{expected}")]
    MalformedTile {
        tile: TileIndex,
        width: u32,
        height: u32,
        expected: u32,
    },

    #[error("Style preparation failed: {0}")]
    StylePreparation(String),

    #[error("Route error: {0}")]
    Route(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error at {}: {source}", path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Error: {0}")]
    Other(String),
}

impl StitchError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        StitchError::InvalidInput(msg.into())
    }

    pub fn renderer(tile: TileIndex, reason: impl Into<String>) -> Self {
        StitchError::Renderer {
            tile,
            reason: reason.into(),
        }
    }

    pub fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StitchError::FileIo {
            path: path.into(),
            source,
        }
    }
}

impl From<anyhow::Error> for StitchError {
    fn from(error: anyhow::Error) -> Self {
        StitchError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_renderer_error_names_tile() {
        let tile = TileIndex { x: 35198, y: 21479, zoom: 16 };
        let err = StitchError::renderer(tile, "no data");
        assert_eq!(err.to_string(), "Renderer failed on tile 16/35198/21479: no data");
    }

    #[test]
    fn test_malformed_tile_display() {
        let err = StitchError::MalformedTile {
            tile: TileIndex { x: 1, y: 2, zoom: 3 },
            width: 128,
            height: 256,
            expected: 256,
        };
        let msg = err.to_string();
        assert!(msg.contains("3/1/2"));
        assert!(msg.contains("128x256"));
        assert!(msg.contains("256x256"));
    }

    #[test]
    fn test_file_io_display_includes_path() {
        let err = StitchError::file_io(
            "/tmp/out.png",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("/tmp/out.png"));
    }

    #[test]
    fn test_from_anyhow() {
        let err: StitchError = anyhow::anyhow!("boom").into();
        assert!(matches!(err, StitchError::Other(ref m) if m == "boom"));
    }
}
