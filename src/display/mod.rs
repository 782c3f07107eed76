// src/display/mod.rs
//! Progress reporting for render runs

pub mod terminal;

pub use terminal::TerminalProgress;

use crate::map::TileIndex;
use crate::report::RenderReport;
use std::fmt;

/// Pipeline stages in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Planning,
    PreparingStyle,
    Rendering,
    Composing,
    Overlay,
    Writing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Planning => "Planning tile grid",
            Stage::PreparingStyle => "Preparing style",
            Stage::Rendering => "Rendering tiles",
            Stage::Composing => "Composing",
            Stage::Overlay => "Drawing route",
            Stage::Writing => "Writing PNG",
        };
        f.write_str(label)
    }
}

/// Receives progress from the stitcher. Called from a blocking task.
pub trait ProgressSink: Send + Sync {
    fn stage(&self, stage: Stage);

    /// `done` counts tiles rendered so far, including `tile`.
    fn tile(&self, done: usize, total: usize, tile: &TileIndex);

    fn finished(&self, report: &RenderReport);
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn stage(&self, _stage: Stage) {}

    fn tile(&self, _done: usize, _total: usize, _tile: &TileIndex) {}

    fn finished(&self, _report: &RenderReport) {}
}
