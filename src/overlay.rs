// src/overlay.rs v1
//! Route overlay drawn on top of the composite

use crate::geo::{GeoPoint, Polyline};
use crate::map::{projection, TileIndex};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Stroke used for the route line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// RGBA
    pub color: [u8; 4],
    /// Stroke width in pixels
    pub width: u32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            color: [255, 0, 0, 255],
            width: 2,
        }
    }
}

/// Projects geographic polylines onto a composite whose top-left pixel is the
/// north-west corner of `origin`.
#[derive(Debug, Clone, Default)]
pub struct OverlayDrawer {
    style: OverlayStyle,
}

impl OverlayDrawer {
    pub fn new(style: OverlayStyle) -> Self {
        Self { style }
    }

    /// Raster-local pixel position of `point`. Points north or west of the
    /// origin come out negative.
    pub fn local_pixel(point: &GeoPoint, origin: &TileIndex, tile_size: u32) -> (f64, f64) {
        let (origin_x, origin_y) = origin.pixel_origin(tile_size);
        (
            projection::longitude_to_pixel_x(point.longitude, origin.zoom, tile_size) - origin_x,
            projection::latitude_to_pixel_y(point.latitude, origin.zoom, tile_size) - origin_y,
        )
    }

    /// Draws segments between consecutive points, clipped to the raster.
    ///
    /// Fewer than two points draws nothing. The zoom level is taken from
    /// `origin`.
    pub fn draw_polyline<'a>(
        &self,
        raster: &'a mut RgbaImage,
        origin: &TileIndex,
        tile_size: u32,
        line: &Polyline,
    ) -> &'a mut RgbaImage {
        let bounds = (
            f64::from(raster.width().saturating_sub(1)),
            f64::from(raster.height().saturating_sub(1)),
        );
        if raster.width() == 0 || raster.height() == 0 {
            return raster;
        }

        for (from, to) in line.segments() {
            let start = Self::local_pixel(from, origin, tile_size);
            let end = Self::local_pixel(to, origin, tile_size);

            match clip_segment(start, end, bounds) {
                Some((a, b)) => {
                    let a = (a.0.round() as f32, a.1.round() as f32);
                    let b = (b.0.round() as f32, b.1.round() as f32);
                    self.stroke(raster, a, b);
                }
                None => warn!(
                    from = %from,
                    to = %to,
                    "Segment outside composite, skipped"
                ),
            }
        }
        raster
    }

    fn stroke(&self, raster: &mut RgbaImage, start: (f32, f32), end: (f32, f32)) {
        let color = Rgba(self.style.color);
        let width = self.style.width.max(1);

        let dx = end.0 - start.0;
        let dy = end.1 - start.1;
        let length = (dx * dx + dy * dy).sqrt();

        if width == 1 {
            draw_line_segment_mut(raster, start, end, color);
            return;
        }

        let radius = (width / 2) as i32;
        if length < f32::EPSILON {
            draw_filled_circle_mut(raster, (start.0 as i32, start.1 as i32), radius, color);
            return;
        }

        // Parallel passes across the stroke width
        let (nx, ny) = (-dy / length, dx / length);
        let half = (width - 1) as f32 / 2.0;
        for i in 0..width {
            let offset = i as f32 - half;
            draw_line_segment_mut(
                raster,
                (start.0 + nx * offset, start.1 + ny * offset),
                (end.0 + nx * offset, end.1 + ny * offset),
                color,
            );
        }

        // Round joins for wide strokes
        if width >= 3 {
            draw_filled_circle_mut(raster, (start.0 as i32, start.1 as i32), radius, color);
            draw_filled_circle_mut(raster, (end.0 as i32, end.1 as i32), radius, color);
        }
    }
}

/// Liang-Barsky clip of a segment to `[0, max_x] x [0, max_y]`.
fn clip_segment(
    start: (f64, f64),
    end: (f64, f64),
    (max_x, max_y): (f64, f64),
) -> Option<((f64, f64), (f64, f64))> {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;

    for (p, q) in [
        (-dx, start.0),
        (dx, max_x - start.0),
        (-dy, start.1),
        (dy, max_y - start.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some((
        (start.0 + t0 * dx, start.1 + t0 * dy),
        (start.0 + t1 * dx, start.1 + t1 * dy),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILE: u32 = 64;
    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    fn origin() -> TileIndex {
        TileIndex { x: 8, y: 8, zoom: 5 }
    }

    /// Geographic point at a raster-local pixel position.
    fn point_at(local_x: f64, local_y: f64) -> GeoPoint {
        let (ox, oy) = origin().pixel_origin(TILE);
        GeoPoint {
            latitude: projection::pixel_y_to_latitude(oy + local_y, 5, TILE),
            longitude: projection::pixel_x_to_longitude(ox + local_x, 5, TILE),
        }
    }

    fn line(points: &[GeoPoint]) -> Polyline {
        Polyline::new(points.to_vec())
    }

    fn canvas() -> RgbaImage {
        RgbaImage::from_pixel(2 * TILE, 2 * TILE, WHITE)
    }

    fn red_count(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| **p == RED).count()
    }

    #[test]
    fn test_local_pixel_round_trip() {
        let (x, y) = OverlayDrawer::local_pixel(&point_at(12.0, 70.0), &origin(), TILE);
        assert!((x - 12.0).abs() < 1e-6);
        assert!((y - 70.0).abs() < 1e-6);
    }

    #[test]
    fn test_horizontal_segment_is_two_pixels_wide() {
        let mut image = canvas();
        let points = [point_at(10.0, 40.0), point_at(100.0, 40.0)];
        OverlayDrawer::default().draw_polyline(&mut image, &origin(), TILE, &line(&points));

        assert_eq!(*image.get_pixel(55, 39), RED);
        assert_eq!(*image.get_pixel(55, 40), RED);
        assert_eq!(*image.get_pixel(55, 42), WHITE);
        assert_eq!(*image.get_pixel(55, 37), WHITE);
        assert_eq!(*image.get_pixel(110, 40), WHITE);
    }

    #[test]
    fn test_single_point_is_noop() {
        let mut image = canvas();
        let before = image.clone();
        OverlayDrawer::default().draw_polyline(&mut image, &origin(), TILE, &line(&[point_at(20.0, 20.0)]));
        assert_eq!(image, before);

        OverlayDrawer::default().draw_polyline(&mut image, &origin(), TILE, &Polyline::default());
        assert_eq!(image, before);
    }

    #[test]
    fn test_drawing_twice_overlaps_exactly() {
        let points = [point_at(5.0, 5.0), point_at(90.0, 60.0), point_at(30.0, 120.0)];
        let drawer = OverlayDrawer::default();

        let mut once = canvas();
        drawer.draw_polyline(&mut once, &origin(), TILE, &line(&points));
        let mut twice = once.clone();
        drawer.draw_polyline(&mut twice, &origin(), TILE, &line(&points));

        assert!(red_count(&once) > 0);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_points_north_west_of_origin_are_not_mirrored() {
        let mut image = canvas();
        let before = image.clone();
        // Entirely above and left of the composite
        let points = [point_at(-30.0, -30.0), point_at(-10.0, -50.0)];
        OverlayDrawer::default().draw_polyline(&mut image, &origin(), TILE, &line(&points));
        assert_eq!(image, before);
    }

    #[test]
    fn test_segment_clipped_to_raster() {
        let mut image = canvas();
        let points = [point_at(-50.0, 20.0), point_at(300.0, 20.0)];
        OverlayDrawer::default().draw_polyline(&mut image, &origin(), TILE, &line(&points));

        assert_eq!(*image.get_pixel(0, 20), RED);
        assert_eq!(*image.get_pixel(2 * TILE - 1, 20), RED);
        assert_eq!(*image.get_pixel(64, 60), WHITE);
    }

    #[test]
    fn test_custom_style() {
        let style = OverlayStyle { color: [0, 0, 255, 255], width: 1 };
        let mut image = canvas();
        let points = [point_at(10.0, 10.0), point_at(10.0, 100.0)];
        OverlayDrawer::new(style).draw_polyline(&mut image, &origin(), TILE, &line(&points));

        assert_eq!(*image.get_pixel(10, 50), Rgba([0, 0, 255, 255]));
        assert_eq!(*image.get_pixel(11, 50), WHITE);
        assert_eq!(*image.get_pixel(9, 50), WHITE);
    }

    #[test]
    fn test_clip_segment() {
        let bounds = (99.0, 49.0);
        assert_eq!(clip_segment((10.0, 10.0), (20.0, 20.0), bounds), Some(((10.0, 10.0), (20.0, 20.0))));
        assert_eq!(clip_segment((-10.0, 10.0), (10.0, 10.0), bounds), Some(((0.0, 10.0), (10.0, 10.0))));
        assert_eq!(clip_segment((-10.0, -10.0), (-5.0, 30.0), bounds), None);
        assert_eq!(clip_segment((0.0, 60.0), (99.0, 60.0), bounds), None);
    }
}
