// src/route.rs
//! Route loading from GeoJSON, CSV and JSON files

use crate::error::{Result, StitchError};
use crate::geo::{GeoPoint, Polyline};
use geojson::{Feature, GeoJson, Geometry, Value};
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteFormat {
    GeoJSON,
    CSV,
    JSON,
}

impl RouteFormat {
    pub fn extension(&self) -> &str {
        match self {
            RouteFormat::GeoJSON => "geojson",
            RouteFormat::CSV => "csv",
            RouteFormat::JSON => "json",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            RouteFormat::GeoJSON => "GeoJSON",
            RouteFormat::CSV => "CSV",
            RouteFormat::JSON => "JSON point list",
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        [RouteFormat::GeoJSON, RouteFormat::CSV, RouteFormat::JSON]
            .into_iter()
            .find(|f| f.extension() == ext)
            .ok_or_else(|| {
                StitchError::Route(format!(
                    "unsupported route file {}, expected .geojson, .csv or .json",
                    path.display()
                ))
            })
    }
}

/// A named polyline to render.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub name: String,
    pub line: Polyline,
}

impl Route {
    pub fn new(name: impl Into<String>, points: Vec<GeoPoint>) -> Self {
        Self {
            name: name.into(),
            line: Polyline::new(points),
        }
    }

    /// Four points around Berlin Nordbahnhof.
    pub fn demo() -> Self {
        Self::new(
            "demo",
            vec![
                GeoPoint { latitude: 52.5459, longitude: 13.3837 },
                GeoPoint { latitude: 52.5453, longitude: 13.3864 },
                GeoPoint { latitude: 52.54665, longitude: 13.38733 },
                GeoPoint { latitude: 52.54235, longitude: 13.38671 },
            ],
        )
    }

    pub fn points(&self) -> &[GeoPoint] {
        self.line.points()
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    /// Reads a route, picking the parser from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = RouteFormat::from_path(path)?;
        let contents = std::fs::read_to_string(path).map_err(|e| StitchError::file_io(path, e))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("route")
            .to_string();

        let route = Self::parse(&name, &contents, format)?;
        debug!(
            path = %path.display(),
            format = format.display_name(),
            points = route.len(),
            "Loaded route"
        );
        Ok(route)
    }

    pub fn parse(name: &str, contents: &str, format: RouteFormat) -> Result<Self> {
        let points = match format {
            RouteFormat::GeoJSON => Self::parse_geojson(contents)?,
            RouteFormat::CSV => Self::parse_csv(contents)?,
            RouteFormat::JSON => serde_json::from_str::<Vec<GeoPoint>>(contents)?,
        };
        for point in &points {
            point.validate()?;
        }
        Ok(Self::new(name, points))
    }

    fn parse_geojson(contents: &str) -> Result<Vec<GeoPoint>> {
        let geojson = contents
            .parse::<GeoJson>()
            .map_err(|e| StitchError::Route(format!("Failed to parse GeoJSON: {}", e)))?;
        let mut points = Vec::new();
        collect_geojson(geojson, &mut points)?;
        Ok(points)
    }

    fn parse_csv(contents: &str) -> Result<Vec<GeoPoint>> {
        let mut lat_col = 0;
        let mut lon_col = 1;
        let mut points = Vec::new();

        for (number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();

            if number == 0 && fields.iter().any(|f| f.parse::<f64>().is_err()) {
                let column = |names: &[&str]| {
                    fields
                        .iter()
                        .position(|f| names.contains(&f.to_ascii_lowercase().as_str()))
                };
                lat_col = column(&["latitude", "lat"]).unwrap_or(lat_col);
                lon_col = column(&["longitude", "lon", "lng"]).unwrap_or(lon_col);
                continue;
            }

            let field = |col: usize| -> Result<f64> {
                fields
                    .get(col)
                    .and_then(|f| f.parse::<f64>().ok())
                    .ok_or_else(|| {
                        StitchError::Route(format!("line {}: no number in column {}", number + 1, col + 1))
                    })
            };
            points.push(GeoPoint {
                latitude: field(lat_col)?,
                longitude: field(lon_col)?,
            });
        }
        Ok(points)
    }
}

fn collect_geojson(geojson: GeoJson, points: &mut Vec<GeoPoint>) -> Result<()> {
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                collect_feature(feature, points)?;
            }
        }
        GeoJson::Feature(feature) => collect_feature(feature, points)?,
        GeoJson::Geometry(geometry) => collect_geometry(geometry, points)?,
    }
    Ok(())
}

fn collect_feature(feature: Feature, points: &mut Vec<GeoPoint>) -> Result<()> {
    match feature.geometry {
        Some(geometry) => collect_geometry(geometry, points),
        None => Ok(()),
    }
}

fn collect_geometry(geometry: Geometry, points: &mut Vec<GeoPoint>) -> Result<()> {
    match geometry.value {
        Value::Point(pos) => points.push(position(&pos)?),
        Value::LineString(line) | Value::MultiPoint(line) => {
            for pos in &line {
                points.push(position(pos)?);
            }
        }
        Value::MultiLineString(lines) => {
            for pos in lines.iter().flatten() {
                points.push(position(pos)?);
            }
        }
        Value::GeometryCollection(geometries) => {
            for geometry in geometries {
                collect_geometry(geometry, points)?;
            }
        }
        Value::Polygon(_) => {
            return Err(StitchError::Route("unsupported GeoJSON type Polygon".to_string()));
        }
        Value::MultiPolygon(_) => {
            return Err(StitchError::Route("unsupported GeoJSON type MultiPolygon".to_string()));
        }
    }
    Ok(())
}

/// `[longitude, latitude, elevation?]`
fn position(pos: &[f64]) -> Result<GeoPoint> {
    match pos {
        [longitude, latitude, ..] => Ok(GeoPoint {
            latitude: *latitude,
            longitude: *longitude,
        }),
        _ => Err(StitchError::Route(format!("bad position {:?}", pos))),
    }
}
