use crate::models::Geometry;
use geoscope_core::error::{GeoscopeError, Result};
use geoscope_core::models::NewFeature;

/// Validation result with details
#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

/// Validation error with location details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub location: String,
    pub reason: String,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid() -> Self {
        Self { is_valid: true, errors: Vec::new() }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, location: impl Into<String>, reason: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(ValidationError { location: location.into(), reason: reason.into() });
    }

    /// Nest another result's errors under a location prefix
    fn absorb(&mut self, prefix: &str, other: ValidationResult) {
        for error in other.errors {
            self.add_error(format!("{}.{}", prefix, error.location), error.reason);
        }
    }

    /// Human-readable summary of the first error
    pub fn first_error(&self) -> Option<String> {
        self.errors.first().map(|e| format!("{}: {}", e.location, e.reason))
    }
}

/// Validate a geometry.
///
/// Works on the submitted coordinates, so unclosed rings are reported even
/// though `geo::Polygon::new` would silently close them.
pub fn validate_geometry(geometry: &Geometry) -> ValidationResult {
    match geometry {
        Geometry::Point { coordinates } => validate_positions("Point", &[*coordinates]),
        Geometry::LineString { coordinates } => validate_linestring("LineString", coordinates),
        Geometry::Polygon { coordinates } => validate_polygon("Polygon", coordinates),
        Geometry::MultiPoint { coordinates } => {
            let mut result = ValidationResult::valid();
            if coordinates.is_empty() {
                result.add_error("MultiPoint", "MultiPoint must have at least one point");
                return result;
            }
            result.absorb("MultiPoint", validate_positions("points", coordinates));
            result
        }
        Geometry::MultiLineString { coordinates } => {
            let mut result = ValidationResult::valid();
            if coordinates.is_empty() {
                result.add_error("MultiLineString", "MultiLineString must have at least one line");
                return result;
            }
            for (i, line) in coordinates.iter().enumerate() {
                result.absorb(
                    "MultiLineString",
                    validate_linestring(&format!("LineString[{}]", i), line),
                );
            }
            result
        }
        Geometry::MultiPolygon { coordinates } => {
            let mut result = ValidationResult::valid();
            if coordinates.is_empty() {
                result.add_error("MultiPolygon", "MultiPolygon must have at least one polygon");
                return result;
            }
            for (i, polygon) in coordinates.iter().enumerate() {
                result.absorb("MultiPolygon", validate_polygon(&format!("Polygon[{}]", i), polygon));
            }
            result
        }
    }
}

fn validate_positions(location: &str, positions: &[[f64; 2]]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    for (i, [lon, lat]) in positions.iter().enumerate() {
        if !lon.is_finite() || !lat.is_finite() {
            result.add_error(format!("{}[{}]", location, i), "Coordinates must be finite");
        } else if !(-180.0..=180.0).contains(lon) || !(-90.0..=90.0).contains(lat) {
            result.add_error(
                format!("{}[{}]", location, i),
                format!("({}, {}) is outside WGS 84 bounds", lon, lat),
            );
        }
    }

    result
}

fn validate_linestring(location: &str, coordinates: &[[f64; 2]]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if coordinates.len() < 2 {
        result.add_error(
            location,
            format!("LineString must have at least 2 points, found {}", coordinates.len()),
        );
        return result;
    }

    result.absorb(location, validate_positions("coordinates", coordinates));
    result
}

fn validate_polygon(location: &str, rings: &[Vec<[f64; 2]>]) -> ValidationResult {
    let mut result = ValidationResult::valid();

    if rings.is_empty() {
        result.add_error(location, "Polygon must have an exterior ring");
        return result;
    }

    for (i, ring) in rings.iter().enumerate() {
        let ring_location =
            if i == 0 { format!("{} exterior", location) } else { format!("{} interior[{}]", location, i - 1) };

        if ring.len() < 4 {
            result.add_error(
                ring_location.clone(),
                format!("Ring must have at least 4 points, found {}", ring.len()),
            );
            continue;
        }

        if ring.first() != ring.last() {
            result.add_error(
                ring_location.clone(),
                "Ring must be closed (first point == last point)",
            );
        }

        result.absorb(&ring_location, validate_positions("coordinates", ring));
    }

    result
}

/// Validate an ingestion batch, stopping at the first invalid entry.
///
/// Returns the validated geometries in input order, or `MalformedGeometry`
/// naming the offending index. A missing geometry is malformed.
pub fn validate_batch(features: &[NewFeature]) -> Result<Vec<Geometry>> {
    features
        .iter()
        .enumerate()
        .map(|(index, feature)| {
            let geometry = feature.geometry.as_ref().ok_or_else(|| {
                GeoscopeError::MalformedGeometry { index, reason: "geometry is missing".to_string() }
            })?;

            let result = validate_geometry(geometry);
            match result.first_error() {
                Some(reason) => Err(GeoscopeError::MalformedGeometry { index, reason }),
                None => Ok(geometry.clone()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Geometry {
        Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]]])
    }

    #[test]
    fn test_valid_geometries() {
        assert!(validate_geometry(&Geometry::point(115.2, -8.6)).is_valid);
        assert!(validate_geometry(&Geometry::line_string(vec![[0.0, 0.0], [1.0, 1.0]])).is_valid);
        assert!(validate_geometry(&square()).is_valid);
    }

    #[test]
    fn test_out_of_range_coordinates() {
        let result = validate_geometry(&Geometry::point(181.0, 0.0));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("WGS 84"));

        assert!(!validate_geometry(&Geometry::point(0.0, f64::INFINITY)).is_valid);
    }

    #[test]
    fn test_short_linestring() {
        let result = validate_geometry(&Geometry::line_string(vec![[0.0, 0.0]]));
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("at least 2 points"));
    }

    #[test]
    fn test_unclosed_ring() {
        let open = Geometry::polygon(vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]]);
        let result = validate_geometry(&open);
        assert!(!result.is_valid);
        assert!(result.errors[0].reason.contains("closed"));
    }

    #[test]
    fn test_polygon_needs_exterior() {
        assert!(!validate_geometry(&Geometry::polygon(vec![])).is_valid);
    }

    #[test]
    fn test_empty_multi_geometries() {
        assert!(!validate_geometry(&Geometry::MultiPoint { coordinates: vec![] }).is_valid);
        assert!(!validate_geometry(&Geometry::MultiPolygon { coordinates: vec![] }).is_valid);
    }

    #[test]
    fn test_multipolygon_member_errors_are_located() {
        let geometry = Geometry::MultiPolygon {
            coordinates: vec![
                vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                vec![vec![[0.0, 0.0], [1.0, 0.0]]],
            ],
        };
        let result = validate_geometry(&geometry);
        assert!(!result.is_valid);
        assert!(result.errors[0].location.contains("Polygon[1]"));
    }

    #[test]
    fn test_batch_reports_first_invalid_index() {
        let batch = vec![
            NewFeature::new(Geometry::point(1.0, 1.0)),
            NewFeature::new(Geometry::point(2.0, 2.0)),
            NewFeature { geometry: None, properties: Default::default() },
            NewFeature::new(Geometry::point(500.0, 1.0)),
        ];

        match validate_batch(&batch) {
            Err(GeoscopeError::MalformedGeometry { index, reason }) => {
                assert_eq!(index, 2);
                assert!(reason.contains("missing"));
            }
            other => panic!("expected malformed geometry, got {:?}", other),
        }
    }

    #[test]
    fn test_batch_returns_geometries_in_order() {
        let batch =
            vec![NewFeature::new(Geometry::point(1.0, 1.0)), NewFeature::new(square())];
        let geometries = validate_batch(&batch).unwrap();
        assert_eq!(geometries.len(), 2);
        assert_eq!(geometries[1], square());
    }
}
