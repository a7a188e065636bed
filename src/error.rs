//! Library-level error taxonomy.
//!
//! `thiserror` is used here (the library boundary); `anyhow` is reserved for
//! the CLI boundary in `main.rs`.

use thiserror::Error;

/// Convenience result type for trajcell operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no database connection string configured")]
    MissingConnectionString,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("worker failed for mmsi {mmsi}: {source}")]
    WorkerFailed { mmsi: u32, source: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
