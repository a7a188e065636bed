//! Fans MMSIs (Segmenter phase) or derived rows (Rasterizer phase) out to
//! a rayon worker pool in batches, collates results, and bulk-upserts to
//! the sink under one transaction per batch (spec.md §5).
//!
//! Process-level isolation in the reference design becomes a thread pool
//! here, per the Design Note: "in languages with true shared-memory
//! parallelism ... a thread pool with per-worker sink connection is
//! equivalent and cheaper."

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{error, info, warn};

use crate::config::{Config, Zoom};
use crate::error::{Error, Result};
use crate::model::{SegmentStats, Stop, StopCellString, Trajectory, TrajectoryCellString};
use crate::rasterize::{rasterize_linestring, rasterize_polygon};
use crate::segmenter::{self, Thresholds};
use crate::store::{CellStringSink, PointStore, TrajectoryStopSink};

/// Drives both pipeline phases against one configuration.
pub struct Scheduler {
    pool: ThreadPool,
    segmenter_batch: usize,
    rasterizer_batch: usize,
    zooms: Vec<Zoom>,
    polygon_mode: crate::config::PolygonMode,
}

impl Scheduler {
    pub fn new(config: &Config) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_count())
            .build()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(Self {
            pool,
            segmenter_batch: config.segmenter_batch,
            rasterizer_batch: config.rasterizer_batch,
            zooms: config.zooms.clone(),
            polygon_mode: config.polygon_mode,
        })
    }

    /// Runs the Segmenter phase: one work unit per MMSI, batched, with one
    /// insert-and-commit per batch (spec.md §5 "Batching"). Within a batch,
    /// units run across the pool via `par_iter`; order across batches is
    /// preserved, order within a batch is not (spec.md §5 "Ordering
    /// guarantees").
    pub fn run_segmenter_phase<S>(&self, store: &S, thresholds: &Thresholds) -> Result<SegmentStats>
    where
        S: PointStore + TrajectoryStopSink + Sync,
    {
        let mmsis = store.list_mmsis()?;
        let mut total = SegmentStats::default();

        for batch in mmsis.chunks(self.segmenter_batch) {
            let outcomes: Vec<Result<SegmentUnit>> = self.pool.install(|| {
                batch
                    .par_iter()
                    .map(|&mmsi| {
                        let result = panic::catch_unwind(AssertUnwindSafe(|| segment_one(store, mmsi, thresholds)));
                        match result {
                            Ok(inner) => inner,
                            Err(panic) => Err(Error::WorkerFailed { mmsi, source: panic_message(&panic) }),
                        }
                    })
                    .collect()
            });

            let mut trajectories = Vec::new();
            let mut stops = Vec::new();
            for outcome in outcomes {
                match outcome {
                    Ok(unit) => {
                        accumulate_stats(&mut total, &unit.stats);
                        trajectories.extend(unit.trajectories);
                        stops.extend(unit.stops);
                    }
                    Err(e) => {
                        error!(error = %e, "segmenter worker failed, skipping unit");
                    }
                }
            }

            store.insert_trajectories(&trajectories)?;
            store.insert_stops(&stops)?;
            info!(
                batch_len = batch.len(),
                trajectories = trajectories.len(),
                stops = stops.len(),
                "segmenter batch committed"
            );
        }

        Ok(total)
    }

    /// Runs the Rasterizer phase over already-segmented trajectories and
    /// stops, one work unit per row, independently at each configured zoom.
    pub fn run_rasterizer_phase<S>(&self, store: &S, trajectories: &[Trajectory], stops: &[Stop]) -> Result<()>
    where
        S: CellStringSink + Sync,
    {
        for zoom in &self.zooms {
            let z = zoom.as_u8();
            for batch in trajectories.chunks(self.rasterizer_batch) {
                let rows = self.rasterize_trajectory_batch(batch, z);
                store.insert_trajectory_cellstrings(z, &rows)?;
            }
            for batch in stops.chunks(self.rasterizer_batch) {
                let rows = self.rasterize_stop_batch(batch, z);
                store.insert_stop_cellstrings(z, &rows)?;
            }
        }
        Ok(())
    }

    fn rasterize_trajectory_batch(&self, batch: &[Trajectory], zoom: u8) -> Vec<TrajectoryCellString> {
        self.pool.install(|| {
            batch
                .par_iter()
                .map(|t| {
                    let vertices: Vec<(f64, f64)> = t.line.iter().map(|p| (p.0, p.1)).collect();
                    let cellstring = rasterize_linestring(&vertices, zoom);
                    TrajectoryCellString { mmsi: t.mmsi, t_start: t.t_start, t_end: t.t_end, zoom, cellstring }
                })
                .collect()
        })
    }

    fn rasterize_stop_batch(&self, batch: &[Stop], zoom: u8) -> Vec<StopCellString> {
        let mode = self.polygon_mode;
        self.pool.install(|| {
            batch
                .par_iter()
                .map(|s| {
                    let cellstring = rasterize_polygon(&s.polygon, zoom, mode);
                    StopCellString { mmsi: s.mmsi, t_start: s.t_start, t_end: s.t_end, zoom, cellstring }
                })
                .collect()
        })
    }
}

struct SegmentUnit {
    trajectories: Vec<Trajectory>,
    stops: Vec<Stop>,
    stats: SegmentStats,
}

fn segment_one<S: PointStore>(store: &S, mmsi: u32, thresholds: &Thresholds) -> Result<SegmentUnit> {
    let points = store.points_for_mmsi(mmsi)?;
    if points.is_empty() {
        warn!(mmsi, "no points for mmsi, skipping");
        return Ok(SegmentUnit { trajectories: Vec::new(), stops: Vec::new(), stats: SegmentStats::default() });
    }
    let (trajectories, stops, stats) = segmenter::segment(&points, thresholds);
    Ok(SegmentUnit { trajectories, stops, stats })
}

fn accumulate_stats(total: &mut SegmentStats, unit: &SegmentStats) {
    total.points_seen += unit.points_seen;
    total.duplicates_dropped += unit.duplicates_dropped;
    total.outliers_dropped += unit.outliers_dropped;
    total.trajectories_emitted += unit.trajectories_emitted;
    total.stops_emitted += unit.stops_emitted;
    total.repairs.bridge += unit.repairs.bridge;
    total.repairs.append += unit.repairs.append;
    total.repairs.prepend += unit.repairs.prepend;
    total.repairs.orphan += unit.repairs.orphan;
    total.repairs.discarded += unit.repairs.discarded;
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "worker panicked with a non-string payload".to_string()
    }
}
