//! Area-polygon interface (spec.md §6): rasterizes a named, arbitrary
//! polygon independent of any vessel's Stop, reusing the Rasterizer
//! verbatim. Grounded on `original_source/src/convert_area_polygon.py`'s
//! `area_polygon_to_cellstring` entry point and its `benchmark.area_poly` /
//! `benchmark.area_cs` tables.

use crate::config::{PolygonMode, Zoom};
use crate::error::Result;
use crate::rasterize::rasterize_polygon;
use crate::store::CellStringSink;

/// Rasterizes `ring` at every zoom in `zooms` and records each cellstring
/// against `name` in the sink, for benchmarking rather than per-vessel
/// segmentation output.
pub fn rasterize_named_polygon<S: CellStringSink>(
    sink: &S,
    name: &str,
    ring: &[(f64, f64)],
    zooms: &[Zoom],
    mode: PolygonMode,
) -> Result<()> {
    for zoom in zooms {
        let z = zoom.as_u8();
        let cellstring = rasterize_polygon(ring, z, mode);
        sink.insert_area_cellstring(name, z, &cellstring)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    #[test]
    fn rasterizes_and_records_per_zoom() {
        let store = MemoryStore::new();
        let ring = vec![(10.0, 55.0), (10.0, 56.0), (11.0, 56.0), (11.0, 55.0), (10.0, 55.0)];
        rasterize_named_polygon(&store, "demo-area", &ring, &[Zoom::Z13], PolygonMode::Supercover).unwrap();
    }
}
