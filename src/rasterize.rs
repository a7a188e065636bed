//! Rasterizer: linestring → ordered cellstring (Bresenham walk) and
//! polygon → cellstring (supercover or center-test) (spec.md §4.2).

use crate::config::PolygonMode;
use crate::model::{CellId, CellString};
use crate::tile;

/// Rasterizes an ordered polyline into a [`CellString`] by running a 2D
/// Bresenham walk between each consecutive pair of vertices at `zoom`.
///
/// No deduplication is performed across segments; `unique_cells` is derived
/// post-hoc from the raw sequence. Edge cases per spec.md §4.2: an empty or
/// single-vertex line yields an empty cellstring; coincident consecutive
/// vertices yield one cell for that pair.
pub fn rasterize_linestring(vertices: &[(f64, f64)], zoom: u8) -> CellString {
    if vertices.len() < 2 {
        return CellString::new(Vec::new());
    }

    let mut cells = Vec::new();
    for pair in vertices.windows(2) {
        let (x0, y0) = tile::lonlat_to_tile(pair[0].0, pair[0].1, zoom);
        let (x1, y1) = tile::lonlat_to_tile(pair[1].0, pair[1].1, zoom);
        bresenham(x0 as i64, y0 as i64, x1 as i64, y1 as i64, |x, y| {
            cells.push(tile::pack(x as u64, y as u64, zoom));
        });
    }
    CellString::new(cells)
}

/// Classical integer Bresenham line walk between two tile coordinates,
/// inclusive of both endpoints, invoking `visit` in traversal order.
fn bresenham(x0: i64, y0: i64, x1: i64, y1: i64, mut visit: impl FnMut(i64, i64)) {
    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx: i64 = if x0 < x1 { 1 } else { -1 };
    let sy: i64 = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    let (mut x, mut y) = (x0, y0);
    loop {
        visit(x, y);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x += sx;
        }
        if e2 < dx {
            err += dx;
            y += sy;
        }
    }
}

/// Axis-aligned bounding box in lon/lat.
struct BBox {
    min_x: f64,
    min_y: f64,
    max_x: f64,
    max_y: f64,
}

fn bbox_of(ring: &[(f64, f64)]) -> Option<BBox> {
    if ring.is_empty() {
        return None;
    }
    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for &(x, y) in ring {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    Some(BBox { min_x, min_y, max_x, max_y })
}

/// `true` iff the point `(x, y)` lies inside the polygon ring (ray casting,
/// even-odd rule). `ring` must be closed (first vertex repeated as last).
fn point_in_ring(x: f64, y: f64, ring: &[(f64, f64)]) -> bool {
    let mut inside = false;
    let n = ring.len();
    let mut j = n - 1;
    for i in 0..n {
        let (xi, yi) = ring[i];
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) {
            let x_intersect = xj + (y - yj) / (yi - yj) * (xi - xj);
            if x < x_intersect {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// `true` iff the tile rectangle `(min_x, min_y)..(max_x, max_y)` intersects
/// the polygon ring: any ring vertex inside the tile, any tile corner inside
/// the ring, or any ring edge crossing a tile edge.
fn tile_intersects_ring(tile_bbox: &BBox, ring: &[(f64, f64)]) -> bool {
    let corners = [
        (tile_bbox.min_x, tile_bbox.min_y),
        (tile_bbox.max_x, tile_bbox.min_y),
        (tile_bbox.max_x, tile_bbox.max_y),
        (tile_bbox.min_x, tile_bbox.max_y),
    ];

    if corners.iter().any(|&(x, y)| point_in_ring(x, y, ring)) {
        return true;
    }
    if ring
        .iter()
        .any(|&(x, y)| x >= tile_bbox.min_x && x <= tile_bbox.max_x && y >= tile_bbox.min_y && y <= tile_bbox.max_y)
    {
        return true;
    }

    // Edge/edge segment intersection test between the tile boundary and the
    // polygon boundary, needed when the polygon passes straight through the
    // tile without any vertex or corner landing inside either shape.
    let tile_edges = [
        ((tile_bbox.min_x, tile_bbox.min_y), (tile_bbox.max_x, tile_bbox.min_y)),
        ((tile_bbox.max_x, tile_bbox.min_y), (tile_bbox.max_x, tile_bbox.max_y)),
        ((tile_bbox.max_x, tile_bbox.max_y), (tile_bbox.min_x, tile_bbox.max_y)),
        ((tile_bbox.min_x, tile_bbox.max_y), (tile_bbox.min_x, tile_bbox.min_y)),
    ];
    for pair in ring.windows(2) {
        for &(te0, te1) in &tile_edges {
            if segments_intersect(pair[0], pair[1], te0, te1) {
                return true;
            }
        }
    }
    false
}

fn segments_intersect(p1: (f64, f64), p2: (f64, f64), p3: (f64, f64), p4: (f64, f64)) -> bool {
    fn cross(o: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
        (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
    }
    let d1 = cross(p3, p4, p1);
    let d2 = cross(p3, p4, p2);
    let d3 = cross(p1, p2, p3);
    let d4 = cross(p1, p2, p4);
    ((d1 > 0.0) != (d2 > 0.0)) && ((d3 > 0.0) != (d4 > 0.0))
}

/// Returns the lon/lat rectangle covered by tile `(x, y)` at `zoom`.
fn tile_rect(x: u64, y: u64, zoom: u8) -> BBox {
    let n = (1u64 << zoom) as f64;
    let min_x = (x as f64) / n * 360.0 - 180.0;
    let max_x = ((x + 1) as f64) / n * 360.0 - 180.0;

    let lat_of_y = |yy: f64| -> f64 {
        let merc = PI_HELPER - 2.0 * PI_HELPER * yy / n;
        (merc.sinh()).atan().to_degrees()
    };
    // y increases southward, so larger y is smaller latitude.
    let max_y = lat_of_y(y as f64);
    let min_y = lat_of_y((y + 1) as f64);

    BBox { min_x, min_y, max_x, max_y }
}

const PI_HELPER: f64 = std::f64::consts::PI;

/// Rasterizes a polygon ring into a [`CellString`] via tile enumeration over
/// its bounding box, keeping tiles per `mode` (spec.md §4.2). Enumeration
/// order is row-major: y ascending within x ascending.
pub fn rasterize_polygon(ring: &[(f64, f64)], zoom: u8, mode: PolygonMode) -> CellString {
    let Some(bbox) = bbox_of(ring) else {
        return CellString::new(Vec::new());
    };
    if ring.len() < 4 {
        return CellString::new(Vec::new());
    }

    let (min_tx, max_ty) = tile::lonlat_to_tile(bbox.min_x, bbox.min_y, zoom);
    let (max_tx, min_ty) = tile::lonlat_to_tile(bbox.max_x, bbox.max_y, zoom);

    let mut cells = Vec::new();
    for x in min_tx..=max_tx {
        for y in min_ty..=max_ty {
            let keep = match mode {
                PolygonMode::Supercover => {
                    let rect = tile_rect(x, y, zoom);
                    tile_intersects_ring(&rect, ring)
                }
                PolygonMode::CenterTest => {
                    let rect = tile_rect(x, y, zoom);
                    let cx = (rect.min_x + rect.max_x) / 2.0;
                    let cy = (rect.min_y + rect.max_y) / 2.0;
                    point_in_ring(cx, cy, ring)
                }
            };
            if keep {
                cells.push(tile::pack(x, y, zoom));
            }
        }
    }
    CellString::new(cells)
}

#[allow(dead_code)]
fn dedup_count(cells: &[CellId]) -> usize {
    let set: std::collections::HashSet<_> = cells.iter().collect();
    set.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_geometry_yields_empty_cellstring() {
        let cs = rasterize_linestring(&[], 21);
        assert!(cs.is_empty());
        let cs = rasterize_linestring(&[(1.0, 1.0)], 21);
        assert!(cs.is_empty());
    }

    #[test]
    fn single_segment_same_point_yields_one_cell() {
        let cs = rasterize_linestring(&[(10.0, 55.0), (10.0, 55.0)], 21);
        assert_eq!(cs.cells.len(), 1);
    }

    #[test]
    fn bresenham_matches_documented_scenario() {
        let cs = rasterize_linestring(
            &[(10.836495, 57.368236), (10.835510, 57.368526)],
            21,
        );
        let ys: Vec<u64> = cs
            .cells
            .iter()
            .map(|&c| tile::unpack(c, 21).1)
            .collect();
        assert_eq!(
            ys,
            vec![638525, 638525, 638524, 638524, 638523, 638523, 638522]
        );
        let xs: Vec<u64> = cs
            .cells
            .iter()
            .map(|&c| tile::unpack(c, 21).0)
            .collect();
        assert_eq!(xs, vec![1111703, 1111702, 1111701, 1111700, 1111699, 1111698, 1111697]);
        assert!(cs.unique_cells);
    }

    #[test]
    fn polygon_supercover_covers_bbox_interior_tiles() {
        // A coarse square big enough to span multiple z13 tiles.
        let ring = vec![
            (10.0, 55.0),
            (10.0, 56.0),
            (11.0, 56.0),
            (11.0, 55.0),
            (10.0, 55.0),
        ];
        let cs = rasterize_polygon(&ring, 13, PolygonMode::Supercover);
        assert!(!cs.is_empty());
        assert!(cs.unique_cells);
    }

    #[test]
    fn degenerate_polygon_yields_empty_cellstring() {
        let cs = rasterize_polygon(&[], 13, PolygonMode::Supercover);
        assert!(cs.is_empty());
    }
}
