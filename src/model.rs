//! Core data model: AIS points, derived trajectories/stops, and cell ids.

use serde::{Deserialize, Serialize};

/// A single timestamped AIS position report for one vessel.
///
/// `(x, y)` are WGS84 lon/lat in degrees; `t` is epoch seconds; `sog` is
/// speed-over-ground in knots when reported by the source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AisPoint {
    pub mmsi: u32,
    pub x: f64,
    pub y: f64,
    pub t: f64,
    pub sog: Option<f64>,
}

impl AisPoint {
    pub fn new(mmsi: u32, x: f64, y: f64, t: f64, sog: Option<f64>) -> Self {
        Self { mmsi, x, y, t, sog }
    }

    /// `true` iff `x`, `y` and `t` satisfy the invariants in the data model.
    pub fn is_valid(&self) -> bool {
        (-85.0511..=85.0511).contains(&self.y) && (-180.0..=180.0).contains(&self.x) && self.t >= 0.0
    }
}

/// A vertex of a trajectory polyline: `(x, y, t)` with `t` the M-ordinate.
pub type LinePoint = (f64, f64, f64);

/// A moving episode: an ordered polyline with an epoch-second M-ordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub mmsi: u32,
    pub t_start: f64,
    pub t_end: f64,
    pub line: Vec<LinePoint>,
}

/// A stationary episode: the convex hull of its constituent points.
///
/// `polygon` is a closed ring (first vertex repeated as last) in (x, y).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub mmsi: u32,
    pub t_start: f64,
    pub t_end: f64,
    pub polygon: Vec<(f64, f64)>,
}

/// A packed 64-bit tile identifier (see `tile` module for the encoding).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId(pub u64);

/// An ordered rasterization of a geometry into tile identifiers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CellString {
    pub cells: Vec<CellId>,
    pub unique_cells: bool,
}

impl CellString {
    pub fn new(cells: Vec<CellId>) -> Self {
        let mut seen = std::collections::HashSet::with_capacity(cells.len());
        let unique_cells = cells.iter().all(|c| seen.insert(*c));
        Self { cells, unique_cells }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The rasterization of one [`Trajectory`] at one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryCellString {
    pub mmsi: u32,
    pub t_start: f64,
    pub t_end: f64,
    pub zoom: u8,
    pub cellstring: CellString,
}

/// The rasterization of one [`Stop`] at one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopCellString {
    pub mmsi: u32,
    pub t_start: f64,
    pub t_end: f64,
    pub zoom: u8,
    pub cellstring: CellString,
}

/// The four outcomes of stop-repair (spec.md §4.1), tallied per MMSI for
/// operational visibility — grounded on the `merge_case_count` counters in
/// `construct_trajs_stops.py`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RepairTally {
    pub bridge: u64,
    pub append: u64,
    pub prepend: u64,
    pub orphan: u64,
    pub discarded: u64,
}

/// Per-MMSI segmentation diagnostics, not part of the core contract but
/// useful for monitoring a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SegmentStats {
    pub points_seen: usize,
    pub duplicates_dropped: usize,
    pub outliers_dropped: usize,
    pub trajectories_emitted: usize,
    pub stops_emitted: usize,
    pub repairs: RepairTally,
}
