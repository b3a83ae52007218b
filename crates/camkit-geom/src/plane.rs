//! Infinite planes.

use camkit_math::{Point3, Vec3};

/// A plane through `point` with unit `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// A point on the plane.
    pub point: Point3,
    /// Unit normal.
    pub normal: Vec3,
}

impl Plane {
    /// Create a plane; the normal is normalized here.
    pub fn new(point: Point3, normal: Vec3) -> Self {
        let n = normal.norm();
        let normal = if n > 0.0 { normal / n } else { Vec3::z() };
        Self { point, normal }
    }

    /// Horizontal plane at height `z`, normal pointing up.
    pub fn horizontal(z: f64) -> Self {
        Self {
            point: Point3::new(0.0, 0.0, z),
            normal: Vec3::z(),
        }
    }

    /// Signed distance from `p` (positive on the normal side).
    pub fn dist_to_point(&self, p: &Point3) -> f64 {
        self.normal.dot(&(p - self.point))
    }

    /// Orthogonal projection of `p` onto the plane.
    pub fn project_point(&self, p: &Point3) -> Point3 {
        p - self.normal * self.dist_to_point(p)
    }

    /// Where the ray `point + l * direction` meets the plane.
    ///
    /// Returns the hit and the signed parameter `l`, or `None` when the ray
    /// runs parallel to the plane.
    pub fn intersect_point(&self, direction: &Vec3, point: &Point3) -> Option<(Point3, f64)> {
        let denom = self.normal.dot(direction);
        if denom.abs() < 1e-12 {
            return None;
        }
        let l = self.normal.dot(&(self.point - point)) / denom;
        Some((point + direction * l, l))
    }
}
