#![warn(missing_docs)]

//! Toolpath generation for 3-axis milling.
//!
//! Given a triangulated [`Model`](camkit_geom::Model) and a [`Cutter`], the
//! generators in this crate compute the tool positions that follow the
//! surface without cutting into it:
//!
//! - [`DropCutter`] for surfacing over a grid
//! - [`PushCutter`] for waterlines and slices at fixed heights
//! - [`EngraveCutter`] for following 2D contours down to a depth
//!
//! Generators stream raw points into a [`PathProcessor`], which shapes them
//! into the final [`Path`] list: one path per scan line
//! ([`PathAccumulator`]), closed outlines ([`ContourCutter`]), zig-zag fills
//! ([`PolygonCutter`]) or plain segment pairs ([`SimpleCutter`]).
//!
//! # Example
//!
//! ```
//! use camkit_geom::Model;
//! use camkit_toolpath::{
//!     DropCutter, DropCutterSettings, NoProgress, PathAccumulator, SphericalCutter,
//! };
//!
//! let vertices = [
//!     [0.0, 0.0, 1.0],
//!     [10.0, 0.0, 1.0],
//!     [10.0, 10.0, 1.0],
//!     [0.0, 10.0, 1.0],
//! ];
//! let model = Model::from_mesh(&vertices, &[0, 2, 1, 0, 3, 2]).unwrap();
//!
//! let cutter = SphericalCutter::new(1.5).unwrap();
//! let generator = DropCutter::new(cutter, DropCutterSettings::default()).unwrap();
//! let mut processor = PathAccumulator::new(true);
//! let result = generator
//!     .generate(&model, None, &mut processor, &mut NoProgress)
//!     .unwrap();
//!
//! assert!(!result.paths.is_empty());
//! let on_surface = |z: f64| (z - 1.0).abs() < 1e-9;
//! assert!(result.paths.iter().flat_map(|p| &p.points).all(|p| on_surface(p.z)));
//! ```

pub mod cutter;
pub mod error;
pub mod extractor;
pub mod generator;
pub mod grid;
pub mod oracle;
pub mod path;
pub mod processor;
pub mod progress;

pub use cutter::{drop_height, Cutter, CylindricalCutter, SphericalCutter};
pub use error::{Result, ToolpathError};
pub use extractor::{ExtractPolicy, PolygonExtractor};
pub use generator::{
    layer_heights, order_contours, Diagnostics, DropCutter, DropCutterSettings, EngraveCutter,
    EngraveSettings, GenerationResult, PushCutter, PushCutterSettings,
};
pub use grid::{Axis, GridSettings, MillingStyle, MotionGrid, ScanDirection, ScanLine};
pub use oracle::{get_free_paths, CollisionOracle, FreePathSettings, TriangleOracle};
pub use path::Path;
pub use processor::{ContourCutter, PathAccumulator, PathProcessor, PolygonCutter, SimpleCutter};
pub use progress::{CancelToken, NoProgress, Progress, ProgressUpdate};
