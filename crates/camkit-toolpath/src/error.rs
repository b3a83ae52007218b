//! Error types for toolpath generation.

use camkit_geom::GeometryError;
use thiserror::Error;

/// Errors that can occur while generating toolpaths.
///
/// Per-sample anomalies (a drop test above the allowed range, a blocked
/// engrave segment) are not errors; they end up in
/// [`Diagnostics`](crate::Diagnostics).
#[derive(Error, Debug)]
pub enum ToolpathError {
    /// The model has no triangles.
    #[error("model is empty")]
    EmptyModel,

    /// Invalid generator, grid or cutter settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A scan line delivered an odd number of interval breakpoints.
    #[error("scan line has an odd number of breakpoints ({count})")]
    OddScanline {
        /// Number of points received on the line.
        count: usize,
    },

    /// Geometry construction failed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Result type for toolpath operations.
pub type Result<T> = std::result::Result<T, ToolpathError>;
