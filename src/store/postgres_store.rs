//! PostgreSQL-backed store adapter (`postgres` feature), reproducing the
//! schema sketched in `examples/original_source/src/tables/*.py`: separate
//! tables per derived product, one cellstring table per zoom, plus the
//! `benchmark.area_*` pair for the area-polygon interface.
//!
//! Uses the synchronous `postgres` crate rather than `sqlx`/`tokio-postgres`:
//! the Scheduler (§5) is CPU-bound and rayon-driven, not async, and each
//! worker opens its own short-lived connection per spec.md §5 ("Shared
//! resources").

use std::sync::Mutex;

use postgres::{Client, NoTls};

use crate::error::{Error, Result};
use crate::model::{AisPoint, CellString, Stop, StopCellString, Trajectory, TrajectoryCellString};
use crate::store::{CellStringSink, PointStore, TrajectoryStopSink};

/// Owns one live connection, guarded by a mutex so the adapter can
/// implement `&self` trait methods. Intended to be constructed once per
/// worker thread, not shared across the pool.
pub struct PostgresStore {
    client: Mutex<Client>,
}

impl PostgresStore {
    pub fn connect(database_url: &str) -> Result<Self> {
        let client = Client::connect(database_url, NoTls).map_err(|e| Error::Store(e.to_string()))?;
        Ok(Self { client: Mutex::new(client) })
    }

    /// Creates the schema this adapter expects, if absent. Mirrors
    /// `create_ls_traj_stop_tables.py` / `create_cs_traj_stop_tables.py`.
    pub fn ensure_schema(&self) -> Result<()> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        client
            .batch_execute(
                "
                CREATE SCHEMA IF NOT EXISTS ls_experiment;
                CREATE TABLE IF NOT EXISTS ls_experiment.trajectory (
                    mmsi BIGINT NOT NULL,
                    t_start DOUBLE PRECISION NOT NULL,
                    t_end DOUBLE PRECISION NOT NULL,
                    xs DOUBLE PRECISION[] NOT NULL,
                    ys DOUBLE PRECISION[] NOT NULL,
                    ts DOUBLE PRECISION[] NOT NULL,
                    PRIMARY KEY (mmsi, t_start)
                );
                CREATE TABLE IF NOT EXISTS ls_experiment.stop (
                    mmsi BIGINT NOT NULL,
                    t_start DOUBLE PRECISION NOT NULL,
                    t_end DOUBLE PRECISION NOT NULL,
                    xs DOUBLE PRECISION[] NOT NULL,
                    ys DOUBLE PRECISION[] NOT NULL,
                    PRIMARY KEY (mmsi, t_start)
                );
                CREATE TABLE IF NOT EXISTS ls_experiment.trajectory_cs (
                    parent_mmsi BIGINT NOT NULL,
                    zoom SMALLINT NOT NULL,
                    mmsi BIGINT NOT NULL,
                    t_start DOUBLE PRECISION NOT NULL,
                    t_end DOUBLE PRECISION NOT NULL,
                    unique_cells BOOLEAN NOT NULL,
                    cellstring BIGINT[] NOT NULL
                );
                CREATE INDEX IF NOT EXISTS trajectory_cs_cellstring_gin
                    ON ls_experiment.trajectory_cs USING GIN (cellstring);
                CREATE TABLE IF NOT EXISTS ls_experiment.stop_cs (
                    parent_mmsi BIGINT NOT NULL,
                    zoom SMALLINT NOT NULL,
                    mmsi BIGINT NOT NULL,
                    t_start DOUBLE PRECISION NOT NULL,
                    t_end DOUBLE PRECISION NOT NULL,
                    unique_cells BOOLEAN NOT NULL,
                    cellstring BIGINT[] NOT NULL
                );
                CREATE INDEX IF NOT EXISTS stop_cs_cellstring_gin
                    ON ls_experiment.stop_cs USING GIN (cellstring);
                CREATE SCHEMA IF NOT EXISTS benchmark;
                CREATE TABLE IF NOT EXISTS benchmark.area_poly (
                    name TEXT PRIMARY KEY,
                    xs DOUBLE PRECISION[] NOT NULL,
                    ys DOUBLE PRECISION[] NOT NULL
                );
                CREATE TABLE IF NOT EXISTS benchmark.area_cs (
                    name TEXT NOT NULL,
                    zoom SMALLINT NOT NULL,
                    unique_cells BOOLEAN NOT NULL,
                    cellstring BIGINT[] NOT NULL,
                    PRIMARY KEY (name, zoom)
                );
                ",
            )
            .map_err(|e| Error::Store(e.to_string()))
    }
}

fn cellstring_to_i64(cs: &CellString) -> Vec<i64> {
    cs.cells.iter().map(|c| c.0 as i64).collect()
}

impl PostgresStore {
    /// Trajectories not yet present in `trajectory_cs` for any zoom — the
    /// Rasterizer's input skip list (spec.md §2: "each pipeline stage...
    /// idempotent with respect to already-processed MMSIs").
    pub fn trajectories_pending_rasterization(&self) -> Result<Vec<Trajectory>> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let rows = client
            .query(
                "SELECT mmsi, t_start, t_end, xs, ys, ts FROM ls_experiment.trajectory t
                 WHERE NOT EXISTS (
                     SELECT 1 FROM ls_experiment.trajectory_cs c
                     WHERE c.mmsi = t.mmsi AND c.t_start = t.t_start
                 )",
                &[],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows
            .iter()
            .map(|r| {
                let xs: Vec<f64> = r.get(3);
                let ys: Vec<f64> = r.get(4);
                let ts: Vec<f64> = r.get(5);
                let line = xs.into_iter().zip(ys).zip(ts).map(|((x, y), t)| (x, y, t)).collect();
                Trajectory { mmsi: r.get::<_, i64>(0) as u32, t_start: r.get(1), t_end: r.get(2), line }
            })
            .collect())
    }

    /// Stops not yet present in `stop_cs` for any zoom.
    pub fn stops_pending_rasterization(&self) -> Result<Vec<Stop>> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let rows = client
            .query(
                "SELECT mmsi, t_start, t_end, xs, ys FROM ls_experiment.stop s
                 WHERE NOT EXISTS (
                     SELECT 1 FROM ls_experiment.stop_cs c
                     WHERE c.mmsi = s.mmsi AND c.t_start = s.t_start
                 )",
                &[],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows
            .iter()
            .map(|r| {
                let xs: Vec<f64> = r.get(3);
                let ys: Vec<f64> = r.get(4);
                let polygon = xs.into_iter().zip(ys).collect();
                Stop { mmsi: r.get::<_, i64>(0) as u32, t_start: r.get(1), t_end: r.get(2), polygon }
            })
            .collect())
    }
}

impl PointStore for PostgresStore {
    fn list_mmsis(&self) -> Result<Vec<u32>> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let rows = client
            .query(
                "SELECT DISTINCT mmsi FROM ais.point p
                 WHERE NOT EXISTS (
                     SELECT 1 FROM ls_experiment.trajectory t WHERE t.mmsi = p.mmsi
                     UNION ALL
                     SELECT 1 FROM ls_experiment.stop s WHERE s.mmsi = p.mmsi
                 )
                 ORDER BY mmsi",
                &[],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows.iter().map(|r| r.get::<_, i64>(0) as u32).collect())
    }

    fn points_for_mmsi(&self, mmsi: u32) -> Result<Vec<AisPoint>> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let rows = client
            .query(
                "SELECT mmsi, ST_X(geom), ST_Y(geom), ST_M(geom), sog
                 FROM ais.point WHERE mmsi = $1 ORDER BY ST_M(geom)",
                &[&(mmsi as i64)],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(rows
            .iter()
            .map(|r| {
                AisPoint::new(
                    r.get::<_, i64>(0) as u32,
                    r.get(1),
                    r.get(2),
                    r.get(3),
                    r.get::<_, Option<f64>>(4),
                )
            })
            .collect())
    }
}

impl TrajectoryStopSink for PostgresStore {
    fn insert_trajectories(&self, rows: &[Trajectory]) -> Result<()> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let mut tx = client.transaction().map_err(|e| Error::Store(e.to_string()))?;
        for t in rows {
            let xs: Vec<f64> = t.line.iter().map(|p| p.0).collect();
            let ys: Vec<f64> = t.line.iter().map(|p| p.1).collect();
            let ts: Vec<f64> = t.line.iter().map(|p| p.2).collect();
            tx.execute(
                "INSERT INTO ls_experiment.trajectory (mmsi, t_start, t_end, xs, ys, ts)
                 VALUES ($1, $2, $3, $4, $5, $6)
                 ON CONFLICT (mmsi, t_start) DO NOTHING",
                &[&(t.mmsi as i64), &t.t_start, &t.t_end, &xs, &ys, &ts],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        }
        tx.commit().map_err(|e| Error::Store(e.to_string()))
    }

    fn insert_stops(&self, rows: &[Stop]) -> Result<()> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let mut tx = client.transaction().map_err(|e| Error::Store(e.to_string()))?;
        for s in rows {
            let xs: Vec<f64> = s.polygon.iter().map(|p| p.0).collect();
            let ys: Vec<f64> = s.polygon.iter().map(|p| p.1).collect();
            tx.execute(
                "INSERT INTO ls_experiment.stop (mmsi, t_start, t_end, xs, ys)
                 VALUES ($1, $2, $3, $4, $5)
                 ON CONFLICT (mmsi, t_start) DO NOTHING",
                &[&(s.mmsi as i64), &s.t_start, &s.t_end, &xs, &ys],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        }
        tx.commit().map_err(|e| Error::Store(e.to_string()))
    }
}

impl CellStringSink for PostgresStore {
    fn insert_trajectory_cellstrings(&self, zoom: u8, rows: &[TrajectoryCellString]) -> Result<()> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let mut tx = client.transaction().map_err(|e| Error::Store(e.to_string()))?;
        for r in rows {
            let cells = cellstring_to_i64(&r.cellstring);
            tx.execute(
                "INSERT INTO ls_experiment.trajectory_cs
                     (parent_mmsi, zoom, mmsi, t_start, t_end, unique_cells, cellstring)
                 VALUES ($1, $2, $1, $3, $4, $5, $6)",
                &[&(r.mmsi as i64), &(zoom as i16), &r.t_start, &r.t_end, &r.cellstring.unique_cells, &cells],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        }
        tx.commit().map_err(|e| Error::Store(e.to_string()))
    }

    fn insert_stop_cellstrings(&self, zoom: u8, rows: &[StopCellString]) -> Result<()> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let mut tx = client.transaction().map_err(|e| Error::Store(e.to_string()))?;
        for r in rows {
            let cells = cellstring_to_i64(&r.cellstring);
            tx.execute(
                "INSERT INTO ls_experiment.stop_cs
                     (parent_mmsi, zoom, mmsi, t_start, t_end, unique_cells, cellstring)
                 VALUES ($1, $2, $1, $3, $4, $5, $6)",
                &[&(r.mmsi as i64), &(zoom as i16), &r.t_start, &r.t_end, &r.cellstring.unique_cells, &cells],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        }
        tx.commit().map_err(|e| Error::Store(e.to_string()))
    }

    fn insert_area_cellstring(&self, name: &str, zoom: u8, cellstring: &CellString) -> Result<()> {
        let mut client = self.client.lock().expect("postgres client mutex poisoned");
        let cells = cellstring_to_i64(cellstring);
        client
            .execute(
                "INSERT INTO benchmark.area_cs (name, zoom, unique_cells, cellstring)
                 VALUES ($1, $2, $3, $4)
                 ON CONFLICT (name, zoom) DO UPDATE
                     SET unique_cells = EXCLUDED.unique_cells, cellstring = EXCLUDED.cellstring",
                &[&name, &(zoom as i16), &cellstring.unique_cells, &cells],
            )
            .map_err(|e| Error::Store(e.to_string()))?;
        Ok(())
    }
}
