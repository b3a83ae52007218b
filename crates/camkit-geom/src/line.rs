//! Directed line segments.

use camkit_math::{Point3, Vec3};

use crate::plane::Plane;

/// A directed segment `p1 -> p2`.
///
/// Direction and length are computed on construction; the endpoints are
/// only reachable through accessors so the two can never disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    p1: Point3,
    p2: Point3,
    dir: Vec3,
    len: f64,
}

impl Line {
    /// Create a segment from two endpoints.
    pub fn new(p1: Point3, p2: Point3) -> Self {
        let v = p2 - p1;
        let len = v.norm();
        let dir = if len > 0.0 { v / len } else { Vec3::zeros() };
        Self { p1, p2, dir, len }
    }

    /// Start point.
    pub fn p1(&self) -> Point3 {
        self.p1
    }

    /// End point.
    pub fn p2(&self) -> Point3 {
        self.p2
    }

    /// Unit direction (zero for a zero-length segment).
    pub fn dir(&self) -> Vec3 {
        self.dir
    }

    /// Segment length.
    pub fn len(&self) -> f64 {
        self.len
    }

    /// True for a zero-length segment.
    pub fn is_empty(&self) -> bool {
        self.len == 0.0
    }

    /// Same segment, opposite direction.
    pub fn reversed(&self) -> Self {
        Self::new(self.p2, self.p1)
    }

    /// Point at distance `l` from `p1` along the segment direction.
    pub fn point_at(&self, l: f64) -> Point3 {
        self.p1 + self.dir * l
    }

    /// Midpoint.
    pub fn midpoint(&self) -> Point3 {
        Point3::from((self.p1.coords + self.p2.coords) * 0.5)
    }

    /// Lowest Z of the two endpoints.
    pub fn min_z(&self) -> f64 {
        self.p1.z.min(self.p2.z)
    }

    /// Highest Z of the two endpoints.
    pub fn max_z(&self) -> f64 {
        self.p1.z.max(self.p2.z)
    }

    /// Closest point on the segment to `p`.
    pub fn closest_point(&self, p: &Point3) -> Point3 {
        if self.is_empty() {
            return self.p1;
        }
        let t = (p - self.p1).dot(&self.dir).clamp(0.0, self.len);
        self.point_at(t)
    }

    /// Distance from `p` to the segment.
    pub fn dist_to_point(&self, p: &Point3) -> f64 {
        (p - self.closest_point(p)).norm()
    }

    /// True if `p` lies on the segment within `tol`.
    pub fn is_point_inside(&self, p: &Point3, tol: f64) -> bool {
        self.dist_to_point(p) <= tol
    }

    /// Intersection with a plane, if it falls within the segment.
    ///
    /// Returns the point and its distance from `p1`.
    pub fn intersect_plane(&self, plane: &Plane) -> Option<(Point3, f64)> {
        if self.is_empty() {
            return None;
        }
        let (point, l) = plane.intersect_point(&self.dir, &self.p1)?;
        if (0.0..=self.len).contains(&l) {
            Some((point, l))
        } else {
            None
        }
    }

    /// Split where the segment crosses the horizontal plane at `z`.
    ///
    /// Returns `(below, above)`; either part is `None` when the segment
    /// does not reach that side.
    pub fn split_at_z(&self, z: f64) -> (Option<Line>, Option<Line>) {
        if self.max_z() <= z {
            return (Some(*self), None);
        }
        if self.min_z() >= z {
            return (None, Some(*self));
        }
        let t = (z - self.p1.z) / (self.p2.z - self.p1.z);
        let cross = self.p1 + (self.p2 - self.p1) * t;
        let cross = Point3::new(cross.x, cross.y, z);
        if self.p1.z < z {
            (Some(Line::new(self.p1, cross)), Some(Line::new(cross, self.p2)))
        } else {
            (Some(Line::new(cross, self.p2)), Some(Line::new(self.p1, cross)))
        }
    }
}
