//! Canonical geometry types used across all geoscope crates.
//!
//! These types provide a bridge between GeoJSON serialization and the
//! computational geo crate types. All coordinates are WGS 84 (EPSG:4326)
//! longitude/latitude pairs.

use serde::{Deserialize, Serialize};

use crate::error::{GeoscopeError, Result};

/// EPSG code of the single coordinate reference used by the store
pub const WGS84_EPSG: u32 = 4326;

/// Geometry type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GeometryType {
    #[default]
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
}

/// GeoJSON-compatible geometry representation
///
/// This enum directly maps to GeoJSON geometry types with coordinate arrays.
/// It can be serialized/deserialized as GeoJSON and converted to/from `geo` crate types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: [f64; 2],
    },
    LineString {
        coordinates: Vec<[f64; 2]>,
    },
    Polygon {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPoint {
        coordinates: Vec<[f64; 2]>,
    },
    MultiLineString {
        coordinates: Vec<Vec<[f64; 2]>>,
    },
    MultiPolygon {
        coordinates: Vec<Vec<Vec<[f64; 2]>>>,
    },
}

impl Geometry {
    /// Create a Point geometry
    pub fn point(x: f64, y: f64) -> Self {
        Geometry::Point { coordinates: [x, y] }
    }

    /// Create a LineString geometry
    pub fn line_string(coords: Vec<[f64; 2]>) -> Self {
        Geometry::LineString { coordinates: coords }
    }

    /// Create a Polygon geometry
    pub fn polygon(rings: Vec<Vec<[f64; 2]>>) -> Self {
        Geometry::Polygon { coordinates: rings }
    }

    /// Get the geometry type
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Geometry::Point { .. } => GeometryType::Point,
            Geometry::LineString { .. } => GeometryType::LineString,
            Geometry::Polygon { .. } => GeometryType::Polygon,
            Geometry::MultiPoint { .. } => GeometryType::MultiPoint,
            Geometry::MultiLineString { .. } => GeometryType::MultiLineString,
            Geometry::MultiPolygon { .. } => GeometryType::MultiPolygon,
        }
    }

    /// Try to parse from a serde_json::Value (GeoJSON)
    ///
    /// Positions may carry altitude or measure values after longitude and
    /// latitude; those are dropped so the geometry is stored in 2D.
    pub fn from_geojson(value: &serde_json::Value) -> Option<Self> {
        let mut value = value.clone();
        if let Some(coordinates) = value.get_mut("coordinates") {
            truncate_positions(coordinates);
        }
        serde_json::from_value(value).ok()
    }

    /// Convert to serde_json::Value (GeoJSON)
    pub fn to_geojson(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// Every position of the geometry, in document order
    pub fn positions(&self) -> Vec<[f64; 2]> {
        match self {
            Geometry::Point { coordinates } => vec![*coordinates],
            Geometry::LineString { coordinates } | Geometry::MultiPoint { coordinates } => {
                coordinates.clone()
            }
            Geometry::Polygon { coordinates } | Geometry::MultiLineString { coordinates } => {
                coordinates.iter().flatten().copied().collect()
            }
            Geometry::MultiPolygon { coordinates } => {
                coordinates.iter().flatten().flatten().copied().collect()
            }
        }
    }

    /// Bounding envelope over all positions, `None` for an empty geometry
    pub fn bounds(&self) -> Option<Envelope> {
        let positions = self.positions();
        let first = positions.first()?;
        let mut envelope = Envelope::from_point(*first);
        for position in &positions[1..] {
            envelope.expand_to(*position);
        }
        Some(envelope)
    }
}

/// Cut every position in a nested coordinate array down to `[lon, lat]`
fn truncate_positions(value: &mut serde_json::Value) {
    if let serde_json::Value::Array(items) = value {
        if items.first().is_some_and(serde_json::Value::is_number) {
            items.truncate(2);
        } else {
            items.iter_mut().for_each(truncate_positions);
        }
    }
}

/// Axis-aligned bounding envelope in geographic coordinates.
///
/// The envelope is closed: a geometry touching its edge intersects it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Envelope {
    /// Create a validated envelope
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Result<Self> {
        let envelope = Self { min_lon, min_lat, max_lon, max_lat };
        envelope.validate()?;
        Ok(envelope)
    }

    /// Degenerate envelope covering a single position
    pub fn from_point(position: [f64; 2]) -> Self {
        Self {
            min_lon: position[0],
            min_lat: position[1],
            max_lon: position[0],
            max_lat: position[1],
        }
    }

    /// Parse the `minLon,minLat,maxLon,maxLat` form used by query strings
    pub fn parse_bbox(value: &str) -> Result<Self> {
        let parts: Vec<f64> = value
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| GeoscopeError::validation("bbox", format!("not a number: {}", e)))?;

        match parts.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] => {
                Self::new(*min_lon, *min_lat, *max_lon, *max_lat)
            }
            _ => Err(GeoscopeError::validation(
                "bbox",
                format!("expected 4 comma-separated values, found {}", parts.len()),
            )),
        }
    }

    /// Check that all bounds are finite and the corners are ordered
    pub fn validate(&self) -> Result<()> {
        let values = [self.min_lon, self.min_lat, self.max_lon, self.max_lat];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(GeoscopeError::validation("envelope", "bounds must be finite numbers"));
        }
        if self.min_lon > self.max_lon || self.min_lat > self.max_lat {
            return Err(GeoscopeError::validation(
                "envelope",
                format!(
                    "minimum corner ({}, {}) exceeds maximum corner ({}, {})",
                    self.min_lon, self.min_lat, self.max_lon, self.max_lat
                ),
            ));
        }
        Ok(())
    }

    /// Grow the envelope to include a position
    pub fn expand_to(&mut self, position: [f64; 2]) {
        self.min_lon = self.min_lon.min(position[0]);
        self.min_lat = self.min_lat.min(position[1]);
        self.max_lon = self.max_lon.max(position[0]);
        self.max_lat = self.max_lat.max(position[1]);
    }

    /// Smallest envelope covering both
    pub fn union(&self, other: &Envelope) -> Envelope {
        Envelope {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Closed containment test for a position
    pub fn contains_point(&self, position: [f64; 2]) -> bool {
        position[0] >= self.min_lon
            && position[0] <= self.max_lon
            && position[1] >= self.min_lat
            && position[1] <= self.max_lat
    }

    /// Closed overlap test between two envelopes
    pub fn intersects(&self, other: &Envelope) -> bool {
        self.min_lon <= other.max_lon
            && self.max_lon >= other.min_lon
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    pub fn min(&self) -> [f64; 2] {
        [self.min_lon, self.min_lat]
    }

    pub fn max(&self) -> [f64; 2] {
        [self.max_lon, self.max_lat]
    }

    /// Closed polygon ring tracing the envelope
    pub fn to_polygon(&self) -> Geometry {
        Geometry::polygon(vec![vec![
            [self.min_lon, self.min_lat],
            [self.max_lon, self.min_lat],
            [self.max_lon, self.max_lat],
            [self.min_lon, self.max_lat],
            [self.min_lon, self.min_lat],
        ]])
    }

    /// `[minLon, minLat, maxLon, maxLat]` as used by GeoJSON `bbox`
    pub fn to_bbox(&self) -> [f64; 4] {
        [self.min_lon, self.min_lat, self.max_lon, self.max_lat]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_serialization() {
        let point = Geometry::point(115.0, -8.5);
        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("Point"));
        assert!(json.contains("115"));

        let parsed: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(point, parsed);
    }

    #[test]
    fn test_three_dimensional_positions_drop_altitude() {
        let point = Geometry::from_geojson(&serde_json::json!({
            "type": "Point",
            "coordinates": [115.26, -8.5, 312.0]
        }))
        .unwrap();
        assert_eq!(point, Geometry::point(115.26, -8.5));

        let line = Geometry::from_geojson(&serde_json::json!({
            "type": "LineString",
            "coordinates": [[0.0, 0.0, 10.0], [1.0, 1.0, 12.5, 0.3]]
        }))
        .unwrap();
        assert_eq!(line, Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]]));

        // A position still needs both longitude and latitude
        assert!(Geometry::from_geojson(&serde_json::json!({
            "type": "Point",
            "coordinates": [1.0]
        }))
        .is_none());
    }

    #[test]
    fn test_polygon_bounds() {
        let polygon = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [4.0, 0.0],
            [4.0, 3.0],
            [0.0, 0.0],
        ]]);
        let bounds = polygon.bounds().unwrap();
        assert_eq!(bounds.to_bbox(), [0.0, 0.0, 4.0, 3.0]);
    }

    #[test]
    fn test_empty_geometry_has_no_bounds() {
        assert!(Geometry::line_string(vec![]).bounds().is_none());
    }

    #[test]
    fn test_envelope_rejects_inverted_corners() {
        assert!(Envelope::new(10.0, 0.0, 0.0, 10.0).is_err());
        assert!(Envelope::new(0.0, 0.0, f64::NAN, 10.0).is_err());
        assert!(Envelope::new(5.0, 5.0, 5.0, 5.0).is_ok());
    }

    #[test]
    fn test_envelope_closed_boundary() {
        let envelope = Envelope::new(0.0, 0.0, 10.0, 10.0).unwrap();
        assert!(envelope.contains_point([10.0, 10.0]));
        assert!(envelope.contains_point([0.0, 5.0]));
        assert!(!envelope.contains_point([10.000001, 5.0]));

        let touching = Envelope::new(10.0, 10.0, 20.0, 20.0).unwrap();
        assert!(envelope.intersects(&touching));
    }

    #[test]
    fn test_parse_bbox() {
        let envelope = Envelope::parse_bbox("106.7, -6.3, 106.9,-6.1").unwrap();
        assert_eq!(envelope.to_bbox(), [106.7, -6.3, 106.9, -6.1]);

        assert!(Envelope::parse_bbox("1,2,3").is_err());
        assert!(Envelope::parse_bbox("a,b,c,d").is_err());
    }

    #[test]
    fn test_envelope_polygon_is_closed() {
        let polygon = Envelope::new(0.0, 0.0, 1.0, 1.0).unwrap().to_polygon();
        match polygon {
            Geometry::Polygon { coordinates } => {
                assert_eq!(coordinates[0].len(), 5);
                assert_eq!(coordinates[0].first(), coordinates[0].last());
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }
}
