// src/display/terminal.rs
//! Coloured terminal progress

use super::{ProgressSink, Stage};
use crate::map::TileIndex;
use crate::report::RenderReport;
use crossterm::{
    cursor::MoveToColumn,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::sync::Mutex;

pub struct TerminalProgress<W: Write + Send = io::Stdout> {
    out: Mutex<W>,
}

impl TerminalProgress<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalProgress<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Progress output is best effort; write errors are dropped.
    fn write_with(&self, f: impl FnOnce(&mut W) -> io::Result<()>) {
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        let _ = f(&mut *out).and_then(|_| out.flush());
    }
}

impl<W: Write + Send> ProgressSink for TerminalProgress<W> {
    fn stage(&self, stage: Stage) {
        self.write_with(|out| {
            // Rendering is followed by a live tile counter on the same line
            let end = if stage == Stage::Rendering { "" } else { "\n" };
            execute!(
                out,
                SetForegroundColor(Color::Yellow),
                Print("==> "),
                ResetColor,
                Print(format!("{}{}", stage, end))
            )
        });
    }

    fn tile(&self, done: usize, total: usize, tile: &TileIndex) {
        self.write_with(|out| {
            execute!(
                out,
                MoveToColumn(0),
                Clear(ClearType::CurrentLine),
                SetForegroundColor(Color::Yellow),
                Print("==> "),
                ResetColor,
                Print(format!("{} {}/{} ({})", Stage::Rendering, done, total, tile))
            )?;
            if done == total {
                execute!(out, Print("\n"))?;
            }
            Ok(())
        });
    }

    fn finished(&self, report: &RenderReport) {
        self.write_with(|out| {
            execute!(
                out,
                SetForegroundColor(Color::Green),
                Print("=".repeat(60)),
                Print("\n"),
                ResetColor,
                Print(format!("Route:     {} ({} points)\n", report.route, report.route_points)),
                Print(format!(
                    "Tiles:     {} to {} ({}x{}, renderer {})\n",
                    report.first_tile, report.last_tile, report.columns, report.rows, report.renderer
                )),
                Print(format!("Image:     {}x{} px\n", report.width, report.height)),
                Print(format!("Output:    {}\n", report.output.display())),
                Print(format!(
                    "Elapsed:   {:.2} s\n",
                    report.elapsed().num_milliseconds() as f64 / 1000.0
                )),
                SetForegroundColor(Color::Green),
                Print("=".repeat(60)),
                Print("\n"),
                ResetColor
            )
        });
    }
}

impl Default for TerminalProgress<io::Stdout> {
    fn default() -> Self {
        Self::stdout()
    }
}
