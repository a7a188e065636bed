//! End-to-end integration test exercising the full Segmenter → Rasterizer
//! pipeline against the in-memory store, for the scenario that spans both
//! components (spec.md §8 scenario 5: bridge repair).

use trajcell::config::{Config, PolygonMode, Zoom};
use trajcell::scheduler::Scheduler;
use trajcell::store::memory::MemoryStore;
use trajcell::{AisPoint, Thresholds};

fn bridge_repair_points(mmsi: u32) -> Vec<AisPoint> {
    let mut points = Vec::new();
    let mut t = 0.0;
    for i in 0..12 {
        points.push(AisPoint::new(mmsi, 10.0 + i as f64 * 0.001, 57.0, t, Some(10.0)));
        t += 60.0;
    }
    for i in 0..6 {
        points.push(AisPoint::new(mmsi, 10.012 + i as f64 * 0.0001, 57.0, t, Some(0.5)));
        t += 60.0;
    }
    for i in 0..12 {
        points.push(AisPoint::new(mmsi, 10.02 + i as f64 * 0.001, 57.0, t, Some(10.0)));
        t += 60.0;
    }
    points
}

#[test]
fn bridge_repair_pipeline_end_to_end() {
    let store = MemoryStore::new().with_points(123_456_789, bridge_repair_points(123_456_789));

    let config = Config {
        database_url: None,
        max_workers: 2,
        segmenter_batch: 100,
        rasterizer_batch: 5000,
        zooms: vec![Zoom::Z13],
        polygon_mode: PolygonMode::Supercover,
    };
    let scheduler = Scheduler::new(&config).expect("scheduler builds");
    let thresholds = Thresholds::default();

    let stats = scheduler.run_segmenter_phase(&store, &thresholds).expect("segmenter phase succeeds");
    assert_eq!(stats.trajectories_emitted, 1);
    assert_eq!(stats.stops_emitted, 0);
    assert_eq!(stats.repairs.bridge, 1);

    let trajectories = store.trajectories();
    let stops = store.stops();
    assert_eq!(trajectories.len(), 1);
    assert_eq!(trajectories[0].line.len(), 30);
    assert!(stops.is_empty());

    scheduler.run_rasterizer_phase(&store, &trajectories, &stops).expect("rasterizer phase succeeds");
    let cellstrings = store.trajectory_cellstrings(13);
    assert_eq!(cellstrings.len(), 1);
    assert!(!cellstrings[0].cellstring.is_empty());
}
