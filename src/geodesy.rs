//! Geodesic distance and implied speed, used consistently across the
//! Segmenter and the stop-merge logic (spec.md §4.1: "Implementations must
//! use the same formula across Segmenter and merge-distance checks to keep
//! thresholds consistent").
//!
//! Per the design notes ("implement Karney's or Vincenty's inverse formula"),
//! this uses Karney's algorithm on the WGS84 ellipsoid via `geographiclib-rs`
//! rather than a spherical (haversine) approximation.

use geographiclib_rs::{Geodesic, InverseGeodesic};

use crate::model::AisPoint;

/// Knots-per-(m/s) conversion factor used by spec.md's implied-speed formula.
pub const KNOTS_PER_MPS: f64 = 1.0 / 0.514444;

/// Geodesic distance in meters between two (lon, lat) points, WGS84.
pub fn distance_m_xy(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let geod = Geodesic::wgs84();
    geod.inverse(y1, x1, y2, x2)
}

/// Geodesic distance in meters between two AIS points (ignores `t`, `sog`).
pub fn distance_m(p: &AisPoint, q: &AisPoint) -> f64 {
    distance_m_xy(p.x, p.y, q.x, q.y)
}

/// Implied speed over ground in knots, per spec.md §4.1:
/// `v̂(p,q) = d(p,q) / (t_q − t_p) / 0.514444` when `t_q > t_p`, else `+∞`.
pub fn implied_speed_knots(p: &AisPoint, q: &AisPoint) -> f64 {
    let dt = q.t - p.t;
    if dt > 0.0 {
        distance_m(p, q) / dt * KNOTS_PER_MPS
    } else {
        f64::INFINITY
    }
}

/// Centroid (mean of x, y) of a set of points, used by the stop-merge step.
pub fn centroid(points: &[AisPoint]) -> (f64, f64) {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / n, sy / n)
}

/// Geodesic minimum-bounding-rectangle area in square meters, per spec.md
/// §4.1: width is the geodesic distance between `(min_y, min_x)` and
/// `(min_y, max_x)`; height between `(min_y, min_x)` and `(max_y, min_x)`.
pub fn mbr_area_m2(points: &[AisPoint]) -> f64 {
    let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
    let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
    let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
    let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

    let width = distance_m_xy(min_x, min_y, max_x, min_y);
    let height = distance_m_xy(min_x, min_y, min_x, max_y);
    width * height
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_known_one_degree_equator() {
        let d = distance_m_xy(0.0, 0.0, 1.0, 0.0);
        // WGS84 ellipsoid: a touch over the spherical 111.195 km figure.
        assert!((d - 111_319.0).abs() < 200.0);
    }

    #[test]
    fn implied_speed_infinite_on_nonpositive_dt() {
        let p = AisPoint::new(1, 0.0, 0.0, 10.0, None);
        let q = AisPoint::new(1, 0.0, 0.0, 10.0, None);
        assert_eq!(implied_speed_knots(&p, &q), f64::INFINITY);
    }

    #[test]
    fn centroid_of_square() {
        let pts = vec![
            AisPoint::new(1, 0.0, 0.0, 0.0, None),
            AisPoint::new(1, 2.0, 0.0, 1.0, None),
            AisPoint::new(1, 2.0, 2.0, 2.0, None),
            AisPoint::new(1, 0.0, 2.0, 3.0, None),
        ];
        let (cx, cy) = centroid(&pts);
        assert!((cx - 1.0).abs() < 1e-9);
        assert!((cy - 1.0).abs() < 1e-9);
    }
}
