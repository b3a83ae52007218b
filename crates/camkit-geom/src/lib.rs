#![warn(missing_docs)]

//! Geometry kernel for the camkit toolpath engine.
//!
//! Provides the value types every generator samples against ([`Line`],
//! [`Plane`], [`Triangle`], [`Bounds`]), the appendable [`Model`], and the
//! kd-trees used to find candidate triangles for a scan line
//! ([`TriangleKdTree`]) and to weld imported vertices ([`PointKdTree`]).
//!
//! # Example
//!
//! ```
//! use camkit_geom::{Bounds2, Model};
//!
//! let vertices = [
//!     [0.0, 0.0, 0.0],
//!     [10.0, 0.0, 0.0],
//!     [10.0, 10.0, 0.0],
//!     [0.0, 10.0, 0.0],
//! ];
//! let model = Model::from_mesh(&vertices, &[0, 2, 1, 0, 3, 2]).unwrap();
//! let near_origin = model.triangles_in(&Bounds2::around_point(1.0, 1.0, 0.5));
//! assert!(near_origin.count() > 0);
//! ```

pub mod bounds;
pub mod error;
pub mod kdtree;
pub mod line;
pub mod model;
pub mod plane;
pub mod point_kdtree;
pub mod triangle;

pub use bounds::{Aabb3, Bounds, Bounds2};
pub use error::{GeometryError, Result};
pub use kdtree::{IndexSettings, KdEntry, KdTree, TriangleKdTree};
pub use line::Line;
pub use model::Model;
pub use plane::Plane;
pub use point_kdtree::{EdgeId, PointId, PointKdTree};
pub use triangle::Triangle;
