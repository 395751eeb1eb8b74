use crate::models::{envelope_to_geo, to_geo_geometry, Envelope, Geometry};
use geo::algorithm::intersects::Intersects;

/// Exact test: does the geometry share at least one point with the closed
/// envelope?
///
/// Boundary contact counts, so a point on the envelope edge matches and a
/// polygon whose hole fully contains the envelope does not.
pub fn intersects_envelope(geometry: &Geometry, envelope: &Envelope) -> bool {
    // Cheap reject before building geo shapes
    match geometry.bounds() {
        Some(bounds) if bounds.intersects(envelope) => {}
        _ => return false,
    }

    if let Geometry::Point { coordinates } = geometry {
        return envelope.contains_point(*coordinates);
    }

    let geo_geom = to_geo_geometry(geometry);
    let window = envelope_to_geo(envelope);
    geo_geom.intersects(&window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(a: f64, b: f64, c: f64, d: f64) -> Envelope {
        Envelope::new(a, b, c, d).unwrap()
    }

    #[test]
    fn test_points_inside_and_outside() {
        let window = envelope(0.0, 0.0, 10.0, 10.0);
        assert!(intersects_envelope(&Geometry::point(5.0, 5.0), &window));
        assert!(!intersects_envelope(&Geometry::point(20.0, 20.0), &window));
    }

    #[test]
    fn test_boundary_is_closed() {
        let window = envelope(0.0, 0.0, 10.0, 10.0);
        assert!(intersects_envelope(&Geometry::point(10.0, 10.0), &window));
        assert!(intersects_envelope(&Geometry::point(0.0, 3.0), &window));

        let touching = Geometry::polygon(vec![vec![
            [10.0, 2.0],
            [12.0, 2.0],
            [12.0, 4.0],
            [10.0, 4.0],
            [10.0, 2.0],
        ]]);
        assert!(intersects_envelope(&touching, &window));
    }

    #[test]
    fn test_line_crossing_without_vertices_inside() {
        let window = envelope(4.0, 4.0, 6.0, 6.0);
        let line = Geometry::line_string(vec![[0.0, 5.0], [10.0, 5.0]]);
        assert!(intersects_envelope(&line, &window));
    }

    #[test]
    fn test_diagonal_line_misses_corner() {
        // Bounding boxes overlap but the segment passes outside the window
        let window = envelope(0.0, 0.0, 1.0, 1.0);
        let line = Geometry::line_string(vec![[0.5, 2.0], [2.0, 0.5]]);
        let crossing = Geometry::line_string(vec![[0.0, 1.5], [1.5, 0.0]]);
        assert!(!intersects_envelope(&line, &window));
        assert!(intersects_envelope(&crossing, &window));
    }

    #[test]
    fn test_envelope_inside_polygon_hole() {
        let donut = Geometry::polygon(vec![
            vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]],
            vec![[3.0, 3.0], [7.0, 3.0], [7.0, 7.0], [3.0, 7.0], [3.0, 3.0]],
        ]);
        assert!(!intersects_envelope(&donut, &envelope(4.0, 4.0, 6.0, 6.0)));
        assert!(intersects_envelope(&donut, &envelope(1.0, 1.0, 2.0, 2.0)));
    }

    #[test]
    fn test_envelope_inside_polygon() {
        let square = Geometry::polygon(vec![vec![
            [0.0, 0.0],
            [10.0, 0.0],
            [10.0, 10.0],
            [0.0, 10.0],
            [0.0, 0.0],
        ]]);
        assert!(intersects_envelope(&square, &envelope(4.0, 4.0, 6.0, 6.0)));
        assert!(intersects_envelope(&square, &envelope(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn test_degenerate_window_on_line() {
        let line = Geometry::line_string(vec![[0.0, 0.0], [10.0, 0.0]]);
        assert!(intersects_envelope(&line, &envelope(3.0, 0.0, 3.0, 0.0)));
        assert!(!intersects_envelope(&line, &envelope(3.0, 0.5, 3.0, 0.5)));
    }
}
