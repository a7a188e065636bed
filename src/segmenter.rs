//! Per-vessel sweep: classifies points into candidate stops/trajectories,
//! merges adjacent stop candidates, validates them, and repairs rejected
//! stops by splicing them into the trajectory set (spec.md §4.1).

use serde::{Deserialize, Serialize};

use crate::geodesy::{centroid, distance_m, implied_speed_knots, mbr_area_m2};
use crate::hull::convex_hull_ring;
use crate::model::{AisPoint, RepairTally, SegmentStats, Stop, Trajectory};

/// Tunable thresholds for one segmentation run (spec.md §4.1 table).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// `v_stop`: speed (knots) below which a point is considered stopped.
    pub v_stop: f64,
    /// `d_stop`: max inter-point geodesic distance (m) in a candidate stop.
    pub d_stop: f64,
    /// `t_stop`: max inter-point time gap (s) in a candidate stop.
    pub t_stop: f64,
    /// `n_stop`: min points in a validated stop.
    pub n_stop: usize,
    /// `Δt_stop`: min duration (s) of a validated stop.
    pub dt_stop: f64,
    /// `d_merge`: max centroid distance (m) to merge adjacent candidate stops.
    pub d_merge: f64,
    /// `t_merge`: max gap (s) to merge adjacent candidate stops.
    pub t_merge: f64,
    /// `A_mbr`: max MBR area (m²) of a validated stop polygon.
    pub a_mbr: f64,
    /// `v_traj`: max implied inter-point speed (knots) inside a trajectory.
    pub v_traj: f64,
    /// `t_gap`: max inter-point time gap (s) inside a trajectory.
    pub t_gap: f64,
    /// `n_traj`: min points in a recorded trajectory.
    pub n_traj: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            v_stop: 1.0,
            d_stop: 250.0,
            t_stop: 5400.0,
            n_stop: 10,
            dt_stop: 5400.0,
            d_merge: 250.0,
            t_merge: 3600.0,
            a_mbr: 5.0e6,
            v_traj: 50.0,
            t_gap: 3600.0,
            n_traj: 10,
        }
    }
}

type PointBuf = Vec<AisPoint>;

/// `true` iff `b` can be appended after `a` at trajectory speed: a positive
/// time gap no larger than `t_gap` and an implied speed no larger than
/// `v_traj` (spec.md §4.1 stop-repair "can be connected" test).
fn trajectory_connects(a: &AisPoint, b: &AisPoint, th: &Thresholds) -> bool {
    let dt = b.t - a.t;
    dt > 0.0 && dt <= th.t_gap && implied_speed_knots(a, b) <= th.v_traj
}

/// Runs the full per-MMSI sweep, merge, validate, and repair pipeline over
/// an already `t`-ascending-sorted point sequence for one vessel.
pub fn segment(points: &[AisPoint], th: &Thresholds) -> (Vec<Trajectory>, Vec<Stop>, SegmentStats) {
    let mut stats = SegmentStats::default();
    let (cand_trajs, cand_stops) = sweep(points, th, &mut stats);

    let merged_stops = merge_candidate_stops(cand_stops, th);

    let mut cand_trajs = cand_trajs;
    let mut stops = Vec::new();
    for merged in merged_stops {
        match validate_stop(&merged, th) {
            Some(stop) => stops.push(stop),
            None => repair_stop(merged, &mut cand_trajs, th, &mut stats.repairs),
        }
    }

    let trajectories = emit_trajectories(cand_trajs, th);

    stats.trajectories_emitted = trajectories.len();
    stats.stops_emitted = stops.len();
    (trajectories, stops, stats)
}

/// Step 1 of the pipeline: the stateful classification sweep (spec.md
/// §4.1 "Algorithm — per-MMSI sweep").
fn sweep(points: &[AisPoint], th: &Thresholds, stats: &mut SegmentStats) -> (Vec<PointBuf>, Vec<PointBuf>) {
    let mut cur_traj: PointBuf = Vec::new();
    let mut cur_stop: PointBuf = Vec::new();
    let mut prev: Option<AisPoint> = None;
    let mut cand_trajs: Vec<PointBuf> = Vec::new();
    let mut cand_stops: Vec<PointBuf> = Vec::new();

    for &p in points {
        stats.points_seen += 1;
        debug_assert!(
            prev.map(|pr| p.t >= pr.t).unwrap_or(true),
            "points_for_mmsi must be ordered by t ascending"
        );

        let Some(pr) = prev else {
            if p.sog.map(|s| s < th.v_stop).unwrap_or(false) {
                cur_stop.push(p);
            } else {
                cur_traj.push(p);
            }
            prev = Some(p);
            continue;
        };

        if p.t == pr.t {
            stats.duplicates_dropped += 1;
            continue;
        }

        let dt = p.t - pr.t;
        let dd = distance_m(&pr, &p);
        let v_hat = implied_speed_knots(&pr, &p);
        let v = p.sog.unwrap_or(v_hat);

        if v < th.v_stop && dt < th.t_stop && dd < th.d_stop {
            cur_stop.push(p);
            if cur_traj.len() > 1 {
                cand_trajs.push(std::mem::take(&mut cur_traj));
            } else {
                cur_traj.clear();
            }
        } else {
            let is_outlier = v_hat >= th.v_traj;
            if is_outlier {
                stats.outliers_dropped += 1;
            } else if dt >= th.t_gap {
                if cur_traj.len() > 1 {
                    cand_trajs.push(std::mem::take(&mut cur_traj));
                } else {
                    cur_traj.clear();
                }
                cur_traj.push(p);
            } else {
                cur_traj.push(p);
            }

            if cur_stop.len() > 1 {
                cand_stops.push(std::mem::take(&mut cur_stop));
            } else {
                cur_stop.clear();
            }

            if is_outlier {
                // Sensor outlier: drop p and do not advance prev (spec.md
                // Open Question #3).
                continue;
            }
        }

        prev = Some(p);
    }

    if cur_traj.len() > 1 {
        cand_trajs.push(cur_traj);
    }
    if cur_stop.len() > 1 {
        cand_stops.push(cur_stop);
    }

    (cand_trajs, cand_stops)
}

/// Step 2: merges adjacent candidate stops whose centroids and time gap
/// fall within `d_merge`/`t_merge` (spec.md §4.1 "Candidate-stop merge").
fn merge_candidate_stops(cand_stops: Vec<PointBuf>, th: &Thresholds) -> Vec<PointBuf> {
    let mut iter = cand_stops.into_iter();
    let Some(first) = iter.next() else {
        return Vec::new();
    };

    let mut result = Vec::new();
    let mut merged = first;
    for c in iter {
        let last_t = merged.last().expect("candidate stop buffers are never empty").t;
        let dt = c[0].t - last_t;
        let (mcx, mcy) = centroid(&merged);
        let (ccx, ccy) = centroid(&c);
        let dd = distance_m(
            &AisPoint::new(0, mcx, mcy, 0.0, None),
            &AisPoint::new(0, ccx, ccy, 0.0, None),
        );

        if dt < th.t_merge && dd < th.d_merge {
            merged.extend(c);
        } else {
            result.push(std::mem::replace(&mut merged, c));
        }
    }
    result.push(merged);
    result
}

/// Step 3: validates one merged stop candidate against `n_stop`,
/// `Δt_stop`, hull simplicity, and `A_mbr` (spec.md §4.1 "Stop validation").
/// Returns `None` for rejected candidates, which the caller routes to
/// stop repair.
fn validate_stop(points: &PointBuf, th: &Thresholds) -> Option<Stop> {
    let t_first = points.first()?.t;
    let t_last = points.last()?.t;

    if points.len() < th.n_stop || (t_last - t_first) < th.dt_stop {
        return None;
    }
    let polygon = convex_hull_ring(points)?;
    if mbr_area_m2(points) > th.a_mbr {
        return None;
    }

    let mmsi = points[0].mmsi;
    Some(Stop { mmsi, t_start: t_first, t_end: t_last, polygon })
}

/// Step 4: stop repair (spec.md §4.1 "Stop repair (fall-back)"). Splices a
/// rejected stop into the trajectory set in place, or discards it.
fn repair_stop(rejected: PointBuf, cand_trajs: &mut Vec<PointBuf>, th: &Thresholds, tally: &mut RepairTally) {
    let internally_traversable = rejected
        .windows(2)
        .all(|pair| trajectory_connects(&pair[0], &pair[1], th));
    if !internally_traversable {
        tally.discarded += 1;
        return;
    }

    let s_first = *rejected.first().expect("rejected stop is non-empty");
    let s_last = *rejected.last().expect("rejected stop is non-empty");

    let ta_idx = cand_trajs
        .iter()
        .position(|t| trajectory_connects(t.last().expect("trajectory buffers are non-empty"), &s_first, th));
    let tb_idx = cand_trajs
        .iter()
        .position(|t| trajectory_connects(&s_last, t.first().expect("trajectory buffers are non-empty"), th));

    match (ta_idx, tb_idx) {
        (Some(a), Some(b)) if a != b => {
            tally.bridge += 1;
            let lo = a.min(b);
            let hi = a.max(b);
            // Remove the higher-indexed trajectory first so `lo` stays valid.
            let removed_hi = cand_trajs.remove(hi);
            let (ta_content, tb_content) = if a < b {
                (std::mem::take(&mut cand_trajs[lo]), removed_hi)
            } else {
                (removed_hi, std::mem::take(&mut cand_trajs[lo]))
            };
            let mut spliced = ta_content;
            spliced.extend(rejected);
            spliced.extend(tb_content);
            cand_trajs[lo] = spliced;
        }
        (Some(a), _) => {
            tally.append += 1;
            cand_trajs[a].extend(rejected);
        }
        (None, Some(b)) => {
            tally.prepend += 1;
            let mut spliced = rejected;
            spliced.extend(std::mem::take(&mut cand_trajs[b]));
            cand_trajs[b] = spliced;
        }
        (None, None) => {
            if rejected.len() >= th.n_traj {
                tally.orphan += 1;
                cand_trajs.push(rejected);
            } else {
                tally.discarded += 1;
            }
        }
    }
}

/// Step 5: trajectory emission (spec.md §4.1 "Trajectory emission").
fn emit_trajectories(cand_trajs: Vec<PointBuf>, th: &Thresholds) -> Vec<Trajectory> {
    cand_trajs
        .into_iter()
        .filter_map(|t| {
            let t_start = t.first()?.t;
            let t_end = t.last()?.t;
            if t.len() < th.n_traj || t_end <= t_start {
                return None;
            }
            let mmsi = t[0].mmsi;
            let line = t.iter().map(|p| (p.x, p.y, p.t)).collect();
            Some(Trajectory { mmsi, t_start, t_end, line })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(mmsi: u32, x: f64, y: f64, t: f64, sog: Option<f64>) -> AisPoint {
        AisPoint::new(mmsi, x, y, t, sog)
    }

    /// Scenario 1: pure transit, 12 colinear points at 8 kn, 30s apart.
    #[test]
    fn pure_transit_yields_one_trajectory() {
        let mut points = Vec::new();
        for i in 0..12 {
            // ~4km over 12 points along a meridian, roughly 8kn*30s steps.
            let y = 57.0 + i as f64 * 0.0033;
            points.push(pt(1, 10.0, y, i as f64 * 30.0, Some(8.0)));
        }
        let (trajs, stops, stats) = segment(&points, &Thresholds::default());
        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].line.len(), 12);
        assert!(stops.is_empty());
        assert_eq!(stats.points_seen, 12);
    }

    /// Scenario 2: pure mooring, 15 slow points scattered within 40m, over
    /// 4200s (< Δt_stop, so the un-merged candidate is itself the full
    /// run and must still individually satisfy duration — use default
    /// thresholds with a lowered Δt_stop to exercise validation directly).
    #[test]
    fn pure_mooring_yields_one_stop() {
        let mut th = Thresholds::default();
        th.dt_stop = 4000.0; // so a single 4200s cluster validates alone.
        let mut points = Vec::new();
        let offsets = [(0.0002, 0.0), (0.0, 0.0002), (-0.0002, 0.0), (0.0, -0.0002)];
        for i in 0..15 {
            let (dx, dy) = offsets[i % offsets.len()];
            points.push(pt(2, 10.0 + dx, 57.0 + dy, i as f64 * 300.0, Some(0.2)));
        }
        let (trajs, stops, _stats) = segment(&points, &th);
        assert!(trajs.is_empty());
        assert_eq!(stops.len(), 1);
        assert!(stops[0].polygon.len() >= 4);
    }

    /// Scenario 3: outlier rejection, 10 transit points at 10kn plus one
    /// injected point implying 80kn.
    #[test]
    fn outlier_is_dropped_and_does_not_break_trajectory() {
        let mut points = Vec::new();
        for i in 0..5 {
            let y = 57.0 + i as f64 * 0.005;
            points.push(pt(3, 10.0, y, i as f64 * 60.0, Some(10.0)));
        }
        // Outlier: huge jump implying ~80kn over a short time window.
        points.push(pt(3, 10.0, 59.0, 300.0 + 1.0, Some(10.0)));
        for i in 5..10 {
            let y = 57.0 + i as f64 * 0.005;
            points.push(pt(3, 10.0, y, 300.0 + i as f64 * 60.0, Some(10.0)));
        }
        let (trajs, _stops, stats) = segment(&points, &Thresholds::default());
        assert_eq!(stats.outliers_dropped, 1);
        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].line.len(), 10);
    }

    /// Scenario 4: two stop clusters 200m apart, 2400s gap, merge into one
    /// Stop of length 16 once combined duration reaches Δt_stop.
    #[test]
    fn adjacent_stop_clusters_merge() {
        let th = Thresholds::default();
        let offsets = [(0.0001, 0.0), (0.0, 0.0001), (-0.0001, 0.0), (0.0, -0.0001)];
        let mut points = Vec::new();
        for i in 0..8 {
            let (dx, dy) = offsets[i % offsets.len()];
            points.push(pt(4, 10.0 + dx, 57.0 + dy, i as f64 * 300.0, Some(0.2)));
        }
        let gap_start = 8.0 * 300.0 + 2400.0;
        for i in 0..8 {
            let (dx, dy) = offsets[i % offsets.len()];
            points.push(pt(4, 10.002 + dx, 57.0 + dy, gap_start + i as f64 * 300.0, Some(0.2)));
        }
        let (trajs, stops, _stats) = segment(&points, &th);
        assert!(trajs.is_empty());
        assert_eq!(stops.len(), 1);
    }

    /// Scenario 5: bridge repair. Trajectory A (12 pts), a rejected stop S
    /// (6 pts) traj-connected on both ends, Trajectory B (12 pts) → one
    /// Trajectory of 30 vertices, zero Stops.
    #[test]
    fn bridge_repair_splices_stop_between_two_trajectories() {
        let th = Thresholds::default();
        let mut points = Vec::new();
        let mut t = 0.0;
        for i in 0..12 {
            points.push(pt(5, 10.0 + i as f64 * 0.001, 57.0, t, Some(10.0)));
            t += 60.0;
        }
        // S: 6 points too short/too-brief to validate as a stop on its own
        // (n_stop=10), but internally and at-boundary traj-connectable.
        for i in 0..6 {
            points.push(pt(5, 10.012 + i as f64 * 0.0001, 57.0, t, Some(0.5)));
            t += 60.0;
        }
        for i in 0..12 {
            points.push(pt(5, 10.02 + i as f64 * 0.001, 57.0, t, Some(10.0)));
            t += 60.0;
        }
        let (trajs, stops, stats) = segment(&points, &th);
        assert_eq!(stops.len(), 0);
        assert_eq!(trajs.len(), 1);
        assert_eq!(trajs[0].line.len(), 30);
        assert_eq!(stats.repairs.bridge, 1);
    }

    #[test]
    fn duplicate_timestamp_is_dropped() {
        let points = vec![
            pt(6, 10.0, 57.0, 0.0, Some(10.0)),
            pt(6, 10.0, 57.0, 0.0, Some(10.0)),
            pt(6, 10.001, 57.0, 60.0, Some(10.0)),
        ];
        let (_trajs, _stops, stats) = segment(&points, &Thresholds::default());
        assert_eq!(stats.duplicates_dropped, 1);
    }
}
