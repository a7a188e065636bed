//! trajcell: segments AIS position streams into per-vessel trajectories and
//! stops, then rasterizes both into ordered Web-Mercator cellstrings for
//! inverted-index lookup.
//!
//! The core is the [`segmenter`] sweep and the [`rasterize`] Bresenham/
//! supercover walk; [`scheduler`] drives both across many vessels on a
//! rayon worker pool, and [`store`] defines the sink/source traits that
//! decouple them from any particular database.

pub mod area;
pub mod config;
pub mod error;
pub mod geodesy;
pub mod hull;
pub mod model;
pub mod rasterize;
pub mod scheduler;
pub mod segmenter;
pub mod store;
pub mod tile;

pub use config::Config;
pub use error::{Error, Result};
pub use model::{AisPoint, CellId, CellString, SegmentStats, Stop, StopCellString, Trajectory, TrajectoryCellString};
pub use scheduler::Scheduler;
pub use segmenter::Thresholds;
