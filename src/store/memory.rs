//! In-memory store adapter: used by the test suite and by `demos/` to
//! exercise the full pipeline without a database.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::Result;
use crate::model::{AisPoint, CellString, Stop, StopCellString, Trajectory, TrajectoryCellString};
use crate::store::{CellStringSink, PointStore, TrajectoryStopSink};

/// A fixed input set plus mutable output buffers, all guarded by a single
/// mutex — adequate for tests and small demo runs, not a production sink.
#[derive(Debug, Default)]
pub struct MemoryStore {
    points: HashMap<u32, Vec<AisPoint>>,
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    trajectories: Vec<Trajectory>,
    stops: Vec<Stop>,
    trajectory_cellstrings: HashMap<u8, Vec<TrajectoryCellString>>,
    stop_cellstrings: HashMap<u8, Vec<StopCellString>>,
    area_cellstrings: Vec<(String, u8, CellString)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with one vessel's points (must already be sorted by
    /// `t` ascending, per the `PointStore` contract).
    pub fn with_points(mut self, mmsi: u32, points: Vec<AisPoint>) -> Self {
        self.points.insert(mmsi, points);
        self
    }

    pub fn trajectories(&self) -> Vec<Trajectory> {
        self.state.lock().expect("memory store mutex poisoned").trajectories.clone()
    }

    pub fn stops(&self) -> Vec<Stop> {
        self.state.lock().expect("memory store mutex poisoned").stops.clone()
    }

    pub fn trajectory_cellstrings(&self, zoom: u8) -> Vec<TrajectoryCellString> {
        self.state
            .lock()
            .expect("memory store mutex poisoned")
            .trajectory_cellstrings
            .get(&zoom)
            .cloned()
            .unwrap_or_default()
    }

    pub fn stop_cellstrings(&self, zoom: u8) -> Vec<StopCellString> {
        self.state
            .lock()
            .expect("memory store mutex poisoned")
            .stop_cellstrings
            .get(&zoom)
            .cloned()
            .unwrap_or_default()
    }
}

impl PointStore for MemoryStore {
    fn list_mmsis(&self) -> Result<Vec<u32>> {
        let mut mmsis: Vec<u32> = self.points.keys().copied().collect();
        mmsis.sort_unstable();
        Ok(mmsis)
    }

    fn points_for_mmsi(&self, mmsi: u32) -> Result<Vec<AisPoint>> {
        Ok(self.points.get(&mmsi).cloned().unwrap_or_default())
    }
}

impl TrajectoryStopSink for MemoryStore {
    fn insert_trajectories(&self, rows: &[Trajectory]) -> Result<()> {
        self.state
            .lock()
            .expect("memory store mutex poisoned")
            .trajectories
            .extend_from_slice(rows);
        Ok(())
    }

    fn insert_stops(&self, rows: &[Stop]) -> Result<()> {
        self.state.lock().expect("memory store mutex poisoned").stops.extend_from_slice(rows);
        Ok(())
    }
}

impl CellStringSink for MemoryStore {
    fn insert_trajectory_cellstrings(&self, zoom: u8, rows: &[TrajectoryCellString]) -> Result<()> {
        self.state
            .lock()
            .expect("memory store mutex poisoned")
            .trajectory_cellstrings
            .entry(zoom)
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }

    fn insert_stop_cellstrings(&self, zoom: u8, rows: &[StopCellString]) -> Result<()> {
        self.state
            .lock()
            .expect("memory store mutex poisoned")
            .stop_cellstrings
            .entry(zoom)
            .or_default()
            .extend_from_slice(rows);
        Ok(())
    }

    fn insert_area_cellstring(&self, name: &str, zoom: u8, cellstring: &CellString) -> Result<()> {
        self.state
            .lock()
            .expect("memory store mutex poisoned")
            .area_cellstrings
            .push((name.to_string(), zoom, cellstring.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_mmsis_is_sorted_and_distinct() {
        let store = MemoryStore::new()
            .with_points(42, vec![AisPoint::new(42, 0.0, 0.0, 0.0, None)])
            .with_points(7, vec![AisPoint::new(7, 0.0, 0.0, 0.0, None)]);
        assert_eq!(store.list_mmsis().unwrap(), vec![7, 42]);
    }

    #[test]
    fn insert_then_read_back_trajectories() {
        let store = MemoryStore::new();
        let traj = Trajectory { mmsi: 1, t_start: 0.0, t_end: 10.0, line: vec![(0.0, 0.0, 0.0), (1.0, 1.0, 10.0)] };
        store.insert_trajectories(std::slice::from_ref(&traj)).unwrap();
        assert_eq!(store.trajectories(), vec![traj]);
    }
}
