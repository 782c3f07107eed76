// src/stitcher.rs
//! Render pipeline: route → tile plan → tiles → composite → overlay → PNG

use crate::{
    compose::{check_composite_size, Compositor, TileGrid, DEFAULT_BACKGROUND},
    config::StitchConfig,
    display::{NoProgress, ProgressSink, Stage},
    error::{Result, StitchError},
    geo::Polyline,
    map::{validate_tile_size, GridPlan},
    overlay::{OverlayDrawer, OverlayStyle},
    render::{StyleFuture, TileRenderer},
    report::RenderReport,
    route::Route,
};
use chrono::Utc;
use image::{ImageError, ImageFormat, Rgba, RgbaImage};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::task::spawn_blocking;
use tracing::{debug, info};

/// Per-run rendering parameters.
#[derive(Debug, Clone)]
pub struct StitchOptions {
    pub zoom: u8,
    pub tile_size: u32,
    pub background: Rgba<u8>,
    pub overlay: OverlayStyle,
}

impl Default for StitchOptions {
    fn default() -> Self {
        Self {
            zoom: 16,
            tile_size: 256,
            background: DEFAULT_BACKGROUND,
            overlay: OverlayStyle::default(),
        }
    }
}

impl From<&StitchConfig> for StitchOptions {
    fn from(config: &StitchConfig) -> Self {
        Self {
            zoom: config.zoom,
            tile_size: config.tile_size,
            background: Rgba(config.background),
            overlay: config.overlay,
        }
    }
}

/// Tile plan for a route, checked against the composite size limit.
///
/// Nothing is rendered; invalid input fails here.
pub fn plan_route(route: &Route, zoom: u8, tile_size: u32) -> Result<GridPlan> {
    validate_tile_size(tile_size)?;
    let bbox = route.line.bounding_box()?;
    let plan = GridPlan::for_bbox(&bbox, zoom)?;
    check_composite_size(plan.columns, plan.rows, tile_size)?;
    Ok(plan)
}

/// Coordinates one render run.
pub struct Stitcher {
    renderer: Arc<dyn TileRenderer>,
    options: StitchOptions,
    progress: Arc<dyn ProgressSink>,
}

impl Stitcher {
    pub fn new(renderer: Arc<dyn TileRenderer>, options: StitchOptions) -> Self {
        Self {
            renderer,
            options,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    pub fn options(&self) -> &StitchOptions {
        &self.options
    }

    pub fn plan(&self, route: &Route) -> Result<GridPlan> {
        self.progress.stage(Stage::Planning);
        let plan = plan_route(route, self.options.zoom, self.options.tile_size)?;
        info!(
            first = %plan.first,
            last = %plan.last,
            columns = plan.columns,
            rows = plan.rows,
            "Tile plan ready"
        );
        Ok(plan)
    }

    /// Renders the composite with the route drawn on it. Writes nothing.
    pub async fn stitch(&self, route: &Route) -> Result<(GridPlan, RgbaImage)> {
        let plan = self.plan(route)?;

        self.progress.stage(Stage::PreparingStyle);
        StyleFuture::spawn(Arc::clone(&self.renderer)).wait().await?;
        if !self.renderer.supports_zoom(plan.zoom()) {
            return Err(StitchError::invalid_input(format!(
                "renderer {} does not cover zoom {} ({}..={})",
                self.renderer.name(),
                plan.zoom(),
                self.renderer.min_zoom(),
                self.renderer.max_zoom()
            )));
        }

        let renderer = Arc::clone(&self.renderer);
        let progress = Arc::clone(&self.progress);
        let options = self.options.clone();
        let line = route.line.clone();
        let composite = spawn_blocking(move || {
            render_composite(renderer.as_ref(), &plan, &options, progress.as_ref(), &line)
        })
        .await
        .map_err(|e| StitchError::Other(format!("render task panicked: {}", e)))??;

        Ok((plan, composite))
    }

    /// Full run: stitch, then write `output` as PNG.
    pub async fn run(&self, route: &Route, output: &Path) -> Result<RenderReport> {
        let started_at = Utc::now();
        let (plan, composite) = self.stitch(route).await?;
        let (width, height) = composite.dimensions();

        self.progress.stage(Stage::Writing);
        let path = output.to_path_buf();
        spawn_blocking(move || write_png(&composite, &path))
            .await
            .map_err(|e| StitchError::Other(format!("PNG writer panicked: {}", e)))??;

        let report = RenderReport {
            route: route.name.clone(),
            route_points: route.len(),
            zoom: plan.zoom(),
            tile_size: self.options.tile_size,
            renderer: self.renderer.name().to_string(),
            first_tile: plan.first,
            last_tile: plan.last,
            columns: plan.columns,
            rows: plan.rows,
            tiles_rendered: plan.tile_count(),
            width,
            height,
            output: output.to_path_buf(),
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            output = %output.display(),
            width,
            height,
            elapsed_ms = report.elapsed().num_milliseconds(),
            "Route image written"
        );
        self.progress.finished(&report);
        Ok(report)
    }
}

/// Sequential render, composition and overlay. Runs on a blocking thread.
fn render_composite(
    renderer: &dyn TileRenderer,
    plan: &GridPlan,
    options: &StitchOptions,
    progress: &dyn ProgressSink,
    line: &Polyline,
) -> Result<RgbaImage> {
    let tile_size = options.tile_size;
    let mut grid = TileGrid::for_plan(plan, tile_size)?;
    let total = plan.tile_count();

    progress.stage(Stage::Rendering);
    for (done, cell) in plan.cells().enumerate() {
        let image = renderer.render(&cell.tile, tile_size).map_err(|e| match e {
            e @ StitchError::Renderer { .. } => e,
            other => StitchError::renderer(cell.tile, other.to_string()),
        })?;
        grid.place(cell, image)?;
        debug!(tile = %cell.tile, col = cell.col, row = cell.row, "Tile rendered");
        progress.tile(done + 1, total, &cell.tile);
    }

    progress.stage(Stage::Composing);
    let mut composite = Compositor::new(options.background).compose(grid);

    progress.stage(Stage::Overlay);
    OverlayDrawer::new(options.overlay).draw_polyline(&mut composite, &plan.first, tile_size, line);
    Ok(composite)
}

/// Writes a PNG via a sibling temporary file, so `path` either holds the
/// complete image or is untouched.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StitchError::file_io(parent, e))?;
    }
    let temp = temp_path(path);

    if let Err(e) = image.save_with_format(&temp, ImageFormat::Png) {
        let _ = std::fs::remove_file(&temp);
        return Err(match e {
            ImageError::IoError(io) => StitchError::file_io(&temp, io),
            other => other.into(),
        });
    }
    if let Err(e) = std::fs::rename(&temp, path) {
        let _ = std::fs::remove_file(&temp);
        return Err(StitchError::file_io(path, e));
    }
    debug!(path = %path.display(), "PNG written");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.png".to_string());
    path.with_file_name(format!(".{}.partial", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::GeoPoint;
    use crate::map::TileIndex;
    use crate::render::PatternRenderer;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    /// Counts calls and misbehaves on request.
    #[derive(Default)]
    struct MockRenderer {
        prepared: AtomicUsize,
        rendered: AtomicUsize,
        fail_style: bool,
        fail_render: bool,
        wrong_size: bool,
    }

    impl TileRenderer for MockRenderer {
        fn name(&self) -> &str {
            "mock"
        }

        fn prepare_style(&self) -> Result<()> {
            self.prepared.fetch_add(1, Ordering::SeqCst);
            if self.fail_style {
                return Err(StitchError::StylePreparation("broken theme".to_string()));
            }
            Ok(())
        }

        fn render(&self, _tile: &TileIndex, tile_size: u32) -> Result<RgbaImage> {
            self.rendered.fetch_add(1, Ordering::SeqCst);
            if self.fail_render {
                return Err(StitchError::Other("no data".to_string()));
            }
            let size = if self.wrong_size { tile_size / 2 } else { tile_size };
            Ok(RgbaImage::from_pixel(size, size, Rgba([0, 128, 0, 255])))
        }
    }

    fn stitcher(renderer: Arc<dyn TileRenderer>) -> Stitcher {
        Stitcher::new(renderer, StitchOptions::default())
    }

    fn red_near(image: &RgbaImage, x: u32, y: u32) -> bool {
        (x.saturating_sub(2)..=x + 2)
            .flat_map(|px| (y.saturating_sub(2)..=y + 2).map(move |py| (px, py)))
            .filter(|&(px, py)| px < image.width() && py < image.height())
            .any(|(px, py)| *image.get_pixel(px, py) == RED)
    }

    #[tokio::test]
    async fn test_berlin_demo_route() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("berlin.png");

        let report = stitcher(Arc::new(PatternRenderer::new()))
            .run(&Route::demo(), &output)
            .await
            .unwrap();

        assert_eq!(report.first_tile, TileIndex { x: 35204, y: 21484, zoom: 16 });
        assert_eq!(report.last_tile, TileIndex { x: 35205, y: 21486, zoom: 16 });
        assert_eq!((report.columns, report.rows), (2, 3));
        assert_eq!((report.width, report.height), (512, 768));
        assert_eq!(report.tiles_rendered, 6);
        assert_eq!(report.renderer, "pattern");

        let written = image::open(&output).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (512, 768));
        // Route vertices, in composite pixels
        assert!(red_near(&written, 110, 286));
        assert!(red_near(&written, 173, 309));
        assert!(red_near(&written, 250, 558));
        assert!(!red_near(&written, 450, 50));
        assert!(!temp_path(&output).exists());
    }

    #[tokio::test]
    async fn test_stitch_matches_plan() {
        let renderer = Arc::new(MockRenderer::default());
        let (plan, composite) = stitcher(renderer.clone()).stitch(&Route::demo()).await.unwrap();

        assert_eq!(composite.dimensions(), plan.pixel_dimensions(256).unwrap());
        assert_eq!(renderer.prepared.load(Ordering::SeqCst), 1);
        assert_eq!(renderer.rendered.load(Ordering::SeqCst), plan.tile_count());
        assert_eq!(*composite.get_pixel(500, 10), Rgba([0, 128, 0, 255]));
    }

    #[tokio::test]
    async fn test_empty_route_is_invalid_input() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("empty.png");
        let renderer = Arc::new(MockRenderer::default());

        let err = stitcher(renderer.clone())
            .run(&Route::new("empty", Vec::new()), &output)
            .await
            .unwrap_err();

        assert!(matches!(err, StitchError::InvalidInput(_)));
        assert!(!output.exists());
        assert_eq!(renderer.prepared.load(Ordering::SeqCst), 0);
        assert_eq!(renderer.rendered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_wrong_size_tile_leaves_no_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("bad.png");
        let renderer = Arc::new(MockRenderer { wrong_size: true, ..Default::default() });

        let err = stitcher(renderer.clone()).run(&Route::demo(), &output).await.unwrap_err();

        match err {
            StitchError::MalformedTile { tile, width, expected, .. } => {
                assert_eq!(tile, TileIndex { x: 35204, y: 21484, zoom: 16 });
                assert_eq!((width, expected), (128, 256));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(renderer.rendered.load(Ordering::SeqCst), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_renderer_failure_names_tile() {
        let renderer = Arc::new(MockRenderer { fail_render: true, ..Default::default() });
        let err = stitcher(renderer).stitch(&Route::demo()).await.unwrap_err();

        match err {
            StitchError::Renderer { tile, reason } => {
                assert_eq!(tile, TileIndex { x: 35204, y: 21484, zoom: 16 });
                assert!(reason.contains("no data"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_style_failure_stops_before_rendering() {
        let renderer = Arc::new(MockRenderer { fail_style: true, ..Default::default() });
        let err = stitcher(renderer.clone()).stitch(&Route::demo()).await.unwrap_err();

        assert!(matches!(err, StitchError::StylePreparation(_)));
        assert_eq!(renderer.rendered.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_oversized_composite_rejected_before_style() {
        let renderer = Arc::new(MockRenderer::default());
        let route = Route::new(
            "wide",
            vec![GeoPoint { latitude: 0.0, longitude: 0.0 }, GeoPoint { latitude: 10.0, longitude: 10.0 }],
        );
        let options = StitchOptions { zoom: 20, ..Default::default() };

        let err = Stitcher::new(renderer.clone(), options).stitch(&route).await.unwrap_err();
        assert!(matches!(err, StitchError::InvalidInput(_)));
        assert_eq!(renderer.prepared.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_plan_route_validation() {
        assert!(plan_route(&Route::demo(), 16, 0).is_err());
        assert!(plan_route(&Route::demo(), 21, 256).is_err());
        let bad = Route::new("bad", vec![GeoPoint { latitude: 91.0, longitude: 0.0 }]);
        assert!(matches!(plan_route(&bad, 10, 256), Err(StitchError::InvalidInput(_))));
    }

    #[test]
    fn test_write_png_replaces_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out").join("image.png");

        write_png(&RgbaImage::new(4, 4), &path).unwrap();
        write_png(&RgbaImage::from_pixel(8, 2, RED), &path).unwrap();

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written.dimensions(), (8, 2));
        assert_eq!(*written.get_pixel(7, 1), RED);
        assert_eq!(std::fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_png_onto_directory_fails_cleanly() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.png");
        std::fs::create_dir(&path).unwrap();

        let err = write_png(&RgbaImage::from_pixel(4, 4, RED), &path).unwrap_err();

        match err {
            StitchError::FileIo { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(path.is_dir());
        assert!(!temp_path(&path).exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_png_below_regular_file_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = write_png(&RgbaImage::new(4, 4), &blocker.join("out.png")).unwrap_err();

        match err {
            StitchError::FileIo { path, .. } => assert_eq!(path, blocker),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(std::fs::read(&blocker).unwrap(), b"not a directory");
    }

    #[tokio::test]
    async fn test_run_fails_when_output_is_unwritable() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("taken.png");
        std::fs::create_dir(&output).unwrap();
        let renderer = Arc::new(MockRenderer::default());

        let err = stitcher(renderer.clone()).run(&Route::demo(), &output).await.unwrap_err();

        assert!(matches!(err, StitchError::FileIo { .. }));
        assert_eq!(renderer.rendered.load(Ordering::SeqCst), 6);
        assert!(output.is_dir());
        assert!(!temp_path(&output).exists());
    }
}
