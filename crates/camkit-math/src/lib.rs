#![warn(missing_docs)]

//! Math types for the camkit toolpath engine.
//!
//! Thin aliases over nalgebra plus the handful of pieces every other
//! crate needs: an affine [`Transform`] for moving models around and the
//! [`Tolerance`] values the sampling code compares against.

use nalgebra::{Matrix3, Matrix4, Vector2, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in the XY plane.
pub type Point2 = nalgebra::Point2<f64>;

/// A vector in the XY plane.
pub type Vec2 = Vector2<f64>;

/// Drop the Z component of a point.
pub fn xy(p: &Point3) -> Point2 {
    Point2::new(p.x, p.y)
}

/// Drop the Z component of a vector.
pub fn xy_vec(v: &Vec3) -> Vec2 {
    Vec2::new(v.x, v.y)
}

/// 2D cross product (z component of the 3D cross product).
pub fn cross2(a: &Vec2, b: &Vec2) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Smallest root of `a*t^2 + b*t + c = 0`, if the roots are real.
///
/// Returns `None` for a vanishing leading coefficient; callers treat that
/// as "moving parallel, no entry point".
pub fn smallest_root(a: f64, b: f64, c: f64) -> Option<f64> {
    if a.abs() < 1e-14 {
        return None;
    }
    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return None;
    }
    let sq = disc.sqrt();
    let r1 = (-b - sq) / (2.0 * a);
    let r2 = (-b + sq) / (2.0 * a);
    Some(r1.min(r2))
}

/// A 4x4 affine transformation matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    ///
    /// The only rotation a fixed-orientation 3-axis setup needs: spinning
    /// the part on the table.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Swap two axes (`0` = X, `1` = Y, `2` = Z). Useful for re-orienting
    /// imported parts so the machined face points up.
    pub fn swap_axes(a: usize, b: usize) -> Self {
        let mut m = Matrix4::identity();
        if a < 3 && b < 3 && a != b {
            m[(a, a)] = 0.0;
            m[(b, b)] = 0.0;
            m[(a, b)] = 1.0;
            m[(b, a)] = 1.0;
        }
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Whether the linear part flips handedness.
    ///
    /// Mirroring transforms reverse triangle winding, so the model code
    /// swaps two vertices to keep normals pointing outward.
    pub fn is_mirroring(&self) -> bool {
        let m3: Matrix3<f64> = self.matrix.fixed_view::<3, 3>(0, 0).into_owned();
        m3.determinant() < 0.0
    }

    /// Inverse of this transform, if it exists.
    pub fn inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(|matrix| Self { matrix })
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Tolerance values for geometric comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance in mm.
    pub linear: f64,
    /// Tolerance on squared cross-product magnitudes used to reject
    /// collinear triangles.
    pub area: f64,
}

impl Tolerance {
    /// Default engine tolerances.
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        area: 1e-12,
    };

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm() < self.linear
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}
