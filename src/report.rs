// src/report.rs
//! Summary of a finished render run

use crate::error::{Result, StitchError};
use crate::map::TileIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderReport {
    pub route: String,
    pub route_points: usize,
    pub zoom: u8,
    pub tile_size: u32,
    pub renderer: String,
    pub first_tile: TileIndex,
    pub last_tile: TileIndex,
    pub columns: u32,
    pub rows: u32,
    pub tiles_rendered: usize,
    pub width: u32,
    pub height: u32,
    pub output: PathBuf,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RenderReport {
    pub fn elapsed(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| StitchError::file_io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn report() -> RenderReport {
        RenderReport {
            route: "demo".to_string(),
            route_points: 4,
            zoom: 16,
            tile_size: 256,
            renderer: "pattern".to_string(),
            first_tile: TileIndex { x: 35204, y: 21484, zoom: 16 },
            last_tile: TileIndex { x: 35205, y: 21486, zoom: 16 },
            columns: 2,
            rows: 3,
            tiles_rendered: 6,
            width: 512,
            height: 768,
            output: PathBuf::from("route.png"),
            started_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
            finished_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 3).unwrap(),
        }
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(report().elapsed().num_seconds(), 3);
    }

    #[test]
    fn test_write_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        report().write_json(&path).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["first_tile"]["x"], 35204);
        assert_eq!(value["width"], 512);
        assert_eq!(value["started_at"], "2024-05-01T12:00:00Z");

        let parsed: RenderReport = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, report());
    }
}
