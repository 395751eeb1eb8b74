//! Geometry models for geoscope-geo.
//!
//! This module re-exports canonical types from `geoscope-core` and provides
//! conversions to the `geo` crate types used for computation.

use geo::Geometry as GeoGeometry;

pub use geoscope_core::models::{Envelope, Geometry, GeometryType};

fn coord(c: &[f64; 2]) -> geo::Coord {
    geo::Coord { x: c[0], y: c[1] }
}

fn line_string(coords: &[[f64; 2]]) -> geo::LineString {
    geo::LineString::new(coords.iter().map(coord).collect())
}

fn polygon(rings: &[Vec<[f64; 2]>]) -> geo::Polygon {
    match rings.split_first() {
        Some((exterior, interiors)) => geo::Polygon::new(
            line_string(exterior),
            interiors.iter().map(|ring| line_string(ring)).collect(),
        ),
        None => geo::Polygon::new(geo::LineString::new(vec![]), vec![]),
    }
}

/// Convert a canonical Geometry to a geo::Geometry
pub fn to_geo_geometry(geom: &Geometry) -> GeoGeometry {
    match geom {
        Geometry::Point { coordinates } => {
            GeoGeometry::Point(geo::Point::new(coordinates[0], coordinates[1]))
        }
        Geometry::LineString { coordinates } => GeoGeometry::LineString(line_string(coordinates)),
        Geometry::Polygon { coordinates } => GeoGeometry::Polygon(polygon(coordinates)),
        Geometry::MultiPoint { coordinates } => GeoGeometry::MultiPoint(geo::MultiPoint::new(
            coordinates.iter().map(|c| geo::Point::new(c[0], c[1])).collect(),
        )),
        Geometry::MultiLineString { coordinates } => GeoGeometry::MultiLineString(
            geo::MultiLineString::new(coordinates.iter().map(|l| line_string(l)).collect()),
        ),
        Geometry::MultiPolygon { coordinates } => GeoGeometry::MultiPolygon(
            geo::MultiPolygon::new(coordinates.iter().map(|p| polygon(p)).collect()),
        ),
    }
}

/// Convert an envelope to the `geo` shape with the same point set.
///
/// `geo::Rect` is only used for envelopes with area; a zero-width or
/// zero-height envelope becomes a line and a zero-size one a point.
pub fn envelope_to_geo(envelope: &Envelope) -> GeoGeometry {
    let min = geo::Coord { x: envelope.min_lon, y: envelope.min_lat };
    let max = geo::Coord { x: envelope.max_lon, y: envelope.max_lat };

    match (min.x == max.x, min.y == max.y) {
        (true, true) => GeoGeometry::Point(geo::Point::from(min)),
        (true, false) | (false, true) => GeoGeometry::Line(geo::Line::new(min, max)),
        (false, false) => GeoGeometry::Rect(geo::Rect::new(min, max)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polygon_with_hole_converts() {
        let geom = Geometry::polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[4.0, 4.0], [6.0, 4.0], [6.0, 6.0], [4.0, 6.0], [4.0, 4.0]],
        ]);

        match to_geo_geometry(&geom) {
            GeoGeometry::Polygon(p) => {
                assert_eq!(p.exterior().0.len(), 5);
                assert_eq!(p.interiors().len(), 1);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
    }

    #[test]
    fn test_bounding_rect_matches_bounds() {
        use geo::BoundingRect;

        let geom = Geometry::line_string(vec![[115.1, -8.7], [115.3, -8.4]]);
        let rect = to_geo_geometry(&geom).bounding_rect().unwrap();
        let bounds = geom.bounds().unwrap();
        assert_eq!(rect.min(), geo::Coord { x: bounds.min_lon, y: bounds.min_lat });
        assert_eq!(rect.max(), geo::Coord { x: bounds.max_lon, y: bounds.max_lat });
    }

    #[test]
    fn test_degenerate_envelopes() {
        let point = Envelope::new(1.0, 1.0, 1.0, 1.0).unwrap();
        assert!(matches!(envelope_to_geo(&point), GeoGeometry::Point(_)));

        let line = Envelope::new(1.0, 0.0, 1.0, 5.0).unwrap();
        assert!(matches!(envelope_to_geo(&line), GeoGeometry::Line(_)));

        let rect = Envelope::new(0.0, 0.0, 1.0, 5.0).unwrap();
        assert!(matches!(envelope_to_geo(&rect), GeoGeometry::Rect(_)));
    }
}
