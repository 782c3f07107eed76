// src/map/projection.rs
//! Web-Mercator conversions between geographic, pixel and tile space
//!
//! Everything here is a pure function. Pixel coordinates are absolute
//! positions in the full map raster at a zoom level, whose edge length is
//! [`map_size`].

use std::f64::consts::PI;

/// Latitude where the Mercator square ends.
pub const MAX_LATITUDE: f64 = 85.05112877980659;

/// Distance in normalized map units within which a coordinate snaps onto the
/// nearest tile edge. Round-trip drift stays below 2e-15, so a tile's own
/// corner maps back to it while points a micro-tile west of an edge do not.
const UNIT_EDGE_EPSILON: f64 = 1e-14;

/// Edge length of the full map raster in pixels.
pub fn map_size(zoom: u8, tile_size: u32) -> u64 {
    u64::from(tile_size) << zoom
}

pub fn clamp_latitude(latitude: f64) -> f64 {
    latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE)
}

/// Normalized x in [0, 1].
fn longitude_to_unit_x(longitude: f64) -> f64 {
    (longitude + 180.0) / 360.0
}

/// Normalized Mercator y in [0, 1], 0 at the northern limit.
fn latitude_to_unit_y(latitude: f64) -> f64 {
    let sin_lat = clamp_latitude(latitude).to_radians().sin();
    let y = 0.5 - ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / (4.0 * PI);
    y.clamp(0.0, 1.0)
}

/// Converts a fractional tile coordinate to an index in `[0, 2^zoom)`.
fn unit_to_tile(unit: f64, zoom: u8) -> u32 {
    let n = (1u64 << zoom) as f64;
    let scaled = unit * n;
    let nearest = scaled.round();
    let index = if (scaled - nearest).abs() < UNIT_EDGE_EPSILON * n {
        nearest
    } else {
        scaled.floor()
    };
    index.clamp(0.0, n - 1.0) as u32
}

pub fn longitude_to_tile_x(longitude: f64, zoom: u8) -> u32 {
    unit_to_tile(longitude_to_unit_x(longitude), zoom)
}

pub fn latitude_to_tile_y(latitude: f64, zoom: u8) -> u32 {
    unit_to_tile(latitude_to_unit_y(latitude), zoom)
}

pub fn longitude_to_pixel_x(longitude: f64, zoom: u8, tile_size: u32) -> f64 {
    let size = map_size(zoom, tile_size) as f64;
    (longitude_to_unit_x(longitude) * size).clamp(0.0, size)
}

pub fn latitude_to_pixel_y(latitude: f64, zoom: u8, tile_size: u32) -> f64 {
    latitude_to_unit_y(latitude) * map_size(zoom, tile_size) as f64
}

/// Absolute pixel coordinate of a tile's top-left edge on one axis.
pub fn tile_to_pixel(tile_index: u32, tile_size: u32) -> f64 {
    f64::from(tile_index) * f64::from(tile_size)
}

pub fn pixel_x_to_longitude(pixel_x: f64, zoom: u8, tile_size: u32) -> f64 {
    let size = map_size(zoom, tile_size) as f64;
    let unit = pixel_x.clamp(0.0, size) / size;
    360.0 * (unit - 0.5)
}

pub fn pixel_y_to_latitude(pixel_y: f64, zoom: u8, tile_size: u32) -> f64 {
    let size = map_size(zoom, tile_size) as f64;
    let y = 0.5 - pixel_y.clamp(0.0, size) / size;
    90.0 - 360.0 * (-y * 2.0 * PI).exp().atan() / PI
}

/// Longitude of a tile column's western edge.
pub fn tile_x_to_longitude(tile_x: u32, zoom: u8) -> f64 {
    let n = (1u64 << zoom) as f64;
    f64::from(tile_x) / n * 360.0 - 180.0
}

/// Latitude of a tile row's northern edge.
pub fn tile_y_to_latitude(tile_y: u32, zoom: u8) -> f64 {
    let n = (1u64 << zoom) as f64;
    let lat_rad = (PI * (1.0 - 2.0 * f64::from(tile_y) / n)).sinh().atan();
    lat_rad.to_degrees()
}
