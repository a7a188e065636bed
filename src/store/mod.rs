//! Store Adapter traits (spec.md §6) plus concrete implementations.
//!
//! `PointStore` pulls per-MMSI input points; `TrajectoryStopSink` and
//! `CellStringSink` accept the Segmenter's and Rasterizer's derived rows.
//! These are deliberately synchronous and connection-per-call, matching
//! the worker-pool model in `scheduler.rs` (§5: "workers open their own
//! short-lived connections").

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres_store;

use crate::error::Result;
use crate::model::{AisPoint, Stop, StopCellString, Trajectory, TrajectoryCellString};

/// Pulls the set of MMSIs still to process and their ordered points.
pub trait PointStore {
    /// Distinct MMSIs not yet present in the derived sinks.
    fn list_mmsis(&self) -> Result<Vec<u32>>;
    /// Points for one MMSI, ordered by `t` ascending.
    fn points_for_mmsi(&self, mmsi: u32) -> Result<Vec<AisPoint>>;
}

/// Bulk-accepts Segmenter output.
pub trait TrajectoryStopSink {
    fn insert_trajectories(&self, rows: &[Trajectory]) -> Result<()>;
    fn insert_stops(&self, rows: &[Stop]) -> Result<()>;
}

/// Bulk-accepts Rasterizer output, one call per configured zoom.
pub trait CellStringSink {
    fn insert_trajectory_cellstrings(&self, zoom: u8, rows: &[TrajectoryCellString]) -> Result<()>;
    fn insert_stop_cellstrings(&self, zoom: u8, rows: &[StopCellString]) -> Result<()>;

    /// Records a named area polygon's cellstring for benchmarking
    /// (spec.md §6 "Area polygon interface"), grounded on
    /// `original_source/src/convert_area_polygon.py`'s `benchmark.area_poly`
    /// / `benchmark.area_cs` tables.
    fn insert_area_cellstring(&self, name: &str, zoom: u8, cellstring: &crate::model::CellString) -> Result<()>;
}
