//! Convex hull construction for stop polygons (spec.md §3, §4.1).

use geo::algorithm::convex_hull::ConvexHull;
use geo::{MultiPoint, Point, Polygon};

use crate::model::AisPoint;

/// Computes the convex hull of a set of points as a closed ring.
///
/// Returns `None` if the points reduce to a line or a single point — the
/// hull of fewer than 3 non-collinear points is never a simple polygon.
pub fn convex_hull_ring(points: &[AisPoint]) -> Option<Vec<(f64, f64)>> {
    if points.len() < 3 {
        return None;
    }

    let multi = MultiPoint::new(points.iter().map(|p| Point::new(p.x, p.y)).collect());
    let hull: Polygon<f64> = multi.convex_hull();
    let ring: Vec<(f64, f64)> = hull.exterior().0.iter().map(|c| (c.x, c.y)).collect();

    // A closed triangle is the smallest simple polygon: 3 distinct vertices
    // plus the repeated first vertex. Anything shorter means the input
    // collapsed onto a line or a point.
    if ring.len() < 4 {
        None
    } else {
        Some(ring)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(x: f64, y: f64) -> AisPoint {
        AisPoint::new(1, x, y, 0.0, None)
    }

    #[test]
    fn collinear_points_rejected() {
        let points = vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(2.0, 0.0), pt(3.0, 0.0)];
        assert!(convex_hull_ring(&points).is_none());
    }

    #[test]
    fn single_point_rejected() {
        let points = vec![pt(0.0, 0.0)];
        assert!(convex_hull_ring(&points).is_none());
    }

    #[test]
    fn square_produces_closed_quad_hull() {
        let points = vec![
            pt(0.0, 0.0),
            pt(0.0, 1.0),
            pt(1.0, 1.0),
            pt(1.0, 0.0),
            pt(0.5, 0.5), // interior point, dropped by the hull
        ];
        let ring = convex_hull_ring(&points).unwrap();
        assert!(ring.len() >= 4);
        assert_eq!(ring.first(), ring.last());
    }
}
