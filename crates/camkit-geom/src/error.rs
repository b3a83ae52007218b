//! Error types for the geometry kernel.

use thiserror::Error;

/// Errors raised while building or transforming geometry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Triangle with collinear or coincident vertices.
    #[error("degenerate triangle: {reason}")]
    DegenerateTriangle {
        /// What made the triangle unusable.
        reason: String,
    },

    /// A mesh index points past the end of the vertex array.
    #[error("vertex index {index} out of range ({len} vertices)")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of vertices available.
        len: usize,
    },

    /// Mesh buffers are malformed.
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),

    /// A construction parameter is out of range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for geometry operations.
pub type Result<T> = std::result::Result<T, GeometryError>;
