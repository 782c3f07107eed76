// src/geo/mod.rs
//! Geographic value types: points, bounding boxes and polylines

use crate::error::{Result, StitchError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point, rejecting non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        let point = Self { latitude, longitude };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(StitchError::invalid_input(format!(
                "latitude {} outside [-90, 90]",
                self.latitude
            )));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(StitchError::invalid_input(format!(
                "longitude {} outside [-180, 180]",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }

    /// Smallest box containing every point.
    ///
    /// An empty slice is an `InvalidInput` error: there is nothing to render.
    pub fn from_points(points: &[GeoPoint]) -> Result<Self> {
        let (first, rest) = points
            .split_first()
            .ok_or_else(|| StitchError::invalid_input("route contains no points"))?;
        first.validate()?;

        let mut bbox = Self::new(first.latitude, first.longitude, first.latitude, first.longitude);
        for point in rest {
            point.validate()?;
            bbox.min_lat = bbox.min_lat.min(point.latitude);
            bbox.max_lat = bbox.max_lat.max(point.latitude);
            bbox.min_lon = bbox.min_lon.min(point.longitude);
            bbox.max_lon = bbox.max_lon.max(point.longitude);
        }
        Ok(bbox)
    }

    /// Top-left corner in map space.
    pub fn north_west(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.max_lat,
            longitude: self.min_lon,
        }
    }

    /// Bottom-right corner in map space.
    pub fn south_east(&self) -> GeoPoint {
        GeoPoint {
            latitude: self.min_lat,
            longitude: self.max_lon,
        }
    }

    pub fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Ordered sequence of points drawn as connected segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Consecutive point pairs, one per drawn segment.
    pub fn segments(&self) -> impl Iterator<Item = (&GeoPoint, &GeoPoint)> {
        self.points.windows(2).map(|pair| (&pair[0], &pair[1]))
    }

    pub fn bounding_box(&self) -> Result<BoundingBox> {
        BoundingBox::from_points(&self.points)
    }
}

impl From<Vec<GeoPoint>> for Polyline {
    fn from(points: Vec<GeoPoint>) -> Self {
        Self::new(points)
    }
}
