//! Process-start configuration (spec.md §6).

use clap::{Parser, ValueEnum};

use crate::error::{Error, Result};

/// Polygon rasterization mode (spec.md §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolygonMode {
    /// Keep a tile iff its rectangle intersects the polygon. Reference
    /// contract for stop polygons.
    Supercover,
    /// Keep a tile iff its center lies inside the polygon.
    CenterTest,
}

/// Zoom level recognized by the rasterizer (spec.md §4.3 defines z13/z21;
/// z17 is accepted as a configuration value and derives its own digit
/// width (6, from `2^17 - 1`) under the same general packing rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Zoom {
    #[value(name = "13")]
    Z13,
    #[value(name = "17")]
    Z17,
    #[value(name = "21")]
    Z21,
}

impl Zoom {
    pub fn as_u8(self) -> u8 {
        match self {
            Zoom::Z13 => 13,
            Zoom::Z17 => 17,
            Zoom::Z21 => 21,
        }
    }
}

/// Command-line configuration, all recognized options set at process start.
#[derive(Debug, Parser)]
#[command(name = "trajcell")]
#[command(about = "Segments AIS points into trajectories/stops and rasterizes them into cellstrings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Config {
    /// Database connection string for the point store and derived sinks.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Max worker threads (clamped to `min(cpu_count, 12)`).
    #[arg(long, default_value_t = 12)]
    pub max_workers: usize,

    /// MMSIs per Segmenter batch.
    #[arg(long, default_value_t = 100)]
    pub segmenter_batch: usize,

    /// Derived rows per Rasterizer batch.
    #[arg(long, default_value_t = 5000)]
    pub rasterizer_batch: usize,

    /// Zoom levels to rasterize at (repeatable). Defaults to the canonical
    /// z13+z21 pair.
    #[arg(long = "zoom", value_enum, num_args = 1.., default_values_t = [Zoom::Z13, Zoom::Z21])]
    pub zooms: Vec<Zoom>,

    /// Polygon-rasterization mode.
    #[arg(long, value_enum, default_value = "supercover")]
    pub polygon_mode: PolygonMode,
}

impl Config {
    /// Number of worker threads actually used by the scheduler.
    pub fn worker_count(&self) -> usize {
        self.max_workers.min(num_cpus::get()).min(12).max(1)
    }

    /// Validates the configuration and returns the connection string,
    /// mapping a missing value onto exit code 1 (spec.md §6).
    pub fn require_database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .ok_or(Error::MissingConnectionString)
    }
}
