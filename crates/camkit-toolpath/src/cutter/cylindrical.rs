//! Flat end mill.
//!
//! A flat end mill is a disc at the tip with a cylindrical shank above it.
//! Dropping it onto a triangle has three contact regions:
//! 1. Bottom face - the disc rests on the triangle interior
//! 2. Rim - the disc edge rests on a triangle edge
//! 3. Corner - the disc rests on a triangle vertex

use camkit_geom::Triangle;
use camkit_math::{xy, xy_vec, Point2, Point3, Vec2, Vec3};

use super::{clip_above, disc_entry, is_horizontal, Cutter};
use crate::error::{Result, ToolpathError};

/// Flat end mill of a given radius.
#[derive(Debug, Clone, PartialEq)]
pub struct CylindricalCutter {
    radius: f64,
    location: Point3,
}

impl CylindricalCutter {
    /// Create a flat end mill at the origin.
    pub fn new(radius: f64) -> Result<Self> {
        if !(radius > 0.0 && radius.is_finite()) {
            return Err(ToolpathError::InvalidSettings(format!(
                "cutter radius must be positive, got {radius}"
            )));
        }
        Ok(Self {
            radius,
            location: Point3::origin(),
        })
    }

    /// Highest triangle point within the disc around `(x, y)`.
    fn highest_contact(&self, triangle: &Triangle, x: f64, y: f64) -> Option<f64> {
        let r = self.radius;
        let c = Point2::new(x, y);
        let mut max_z: Option<f64> = None;
        let mut keep = |z: f64| {
            if max_z.map_or(true, |m| z > m) {
                max_z = Some(z);
            }
        };

        // Bottom face: the plane is linear, so the highest disc point lies
        // on the rim in the uphill direction, or anywhere for a level plane.
        if let Some(z) = triangle.z_at_xy(x, y) {
            if triangle.contains_xy(&c) {
                keep(z);
            }
            let n = triangle.normal();
            let uphill = Vec2::new(-n.x, -n.y) * n.z.signum();
            let len = uphill.norm();
            if len > 1e-12 {
                let q = c + uphill * (r / len);
                if triangle.contains_xy(&q) {
                    if let Some(z) = triangle.z_at_xy(q.x, q.y) {
                        keep(z);
                    }
                }
            }
        }

        // Edges clipped to the disc; Z is linear along an edge so only the
        // clipped endpoints matter. Vertices inside the disc are covered too.
        for edge in triangle.edges() {
            let a = xy(&edge.p1());
            let e = xy(&edge.p2()) - a;
            let w = a - c;
            let qa = e.norm_squared();
            let (lo, hi) = if qa < 1e-18 {
                if w.norm() <= r {
                    (0.0, 0.0)
                } else {
                    continue;
                }
            } else {
                let qb = 2.0 * e.dot(&w);
                let qc = w.norm_squared() - r * r;
                let disc = qb * qb - 4.0 * qa * qc;
                if disc < 0.0 {
                    continue;
                }
                let sq = disc.sqrt();
                let s0 = ((-qb - sq) / (2.0 * qa)).max(0.0);
                let s1 = ((-qb + sq) / (2.0 * qa)).min(1.0);
                if s0 > s1 {
                    continue;
                }
                (s0, s1)
            };
            let z1 = edge.p1().z;
            let dz = edge.p2().z - z1;
            keep(z1 + dz * lo);
            keep(z1 + dz * hi);
        }

        max_z
    }
}

impl Cutter for CylindricalCutter {
    fn radius(&self) -> f64 {
        self.radius
    }

    fn location(&self) -> Point3 {
        self.location
    }

    fn move_to(&mut self, location: Point3) {
        self.location = location;
    }

    fn drop_triangle(&self, triangle: &Triangle) -> Option<Point3> {
        let (x, y) = (self.location.x, self.location.y);
        if !triangle.bounds_xy().expanded(self.radius).contains([x, y]) {
            return None;
        }
        let z = self.highest_contact(triangle, x, y)?;
        Some(Point3::new(x, y, z))
    }

    /// Horizontal moves and straight plunges only; any other direction
    /// yields `None`.
    fn intersect(&self, direction: &Vec3, triangle: &Triangle) -> Option<(Point3, f64)> {
        if is_horizontal(direction) {
            let above = clip_above(triangle, self.location.z);
            if above.is_empty() {
                return None;
            }
            let polygon: Vec<Point2> = above.iter().map(xy).collect();
            let d = xy_vec(direction);
            let len = d.norm();
            if len < 1e-12 {
                return None;
            }
            let l = disc_entry(&xy(&self.location), &(d / len), self.radius, &polygon)? / len;
            return Some((self.location + direction * l, l));
        }
        if direction.x.abs() < 1e-9 && direction.y.abs() < 1e-9 && direction.z < 0.0 {
            let cl = self.drop_triangle(triangle)?;
            let l = (self.location.z - cl.z) / -direction.z;
            return Some((self.location + direction * l, l));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slope() -> Triangle {
        // Plane z = x over x in [0, 10].
        Triangle::new(
            Point3::new(0.0, -10.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(10.0, 0.0, 10.0),
        )
        .unwrap()
    }

    #[test]
    fn test_drop_on_slope_uses_uphill_rim() {
        let mut c = CylindricalCutter::new(1.0).unwrap();
        c.move_to(Point3::new(3.0, 0.0, 0.0));
        let cl = c.drop_triangle(&slope()).unwrap();
        assert_relative_eq!(cl.z, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_drop_on_level_face() {
        let t = Triangle::new(
            Point3::new(-10.0, -10.0, 2.0),
            Point3::new(0.0, 10.0, 2.0),
            Point3::new(10.0, -10.0, 2.0),
        )
        .unwrap();
        let mut c = CylindricalCutter::new(0.5).unwrap();
        c.move_to(Point3::new(0.0, 0.0, 0.0));
        assert_relative_eq!(c.drop_triangle(&t).unwrap().z, 2.0);
    }

    #[test]
    fn test_drop_on_vertex_beside_disc_centre() {
        let t = Triangle::new(
            Point3::new(0.0, 0.0, 3.0),
            Point3::new(-5.0, 0.0, 0.0),
            Point3::new(-5.0, -5.0, 0.0),
        )
        .unwrap();
        let mut c = CylindricalCutter::new(1.0).unwrap();
        c.move_to(Point3::new(0.9, 0.0, 0.0));
        assert_relative_eq!(c.drop_triangle(&t).unwrap().z, 3.0, epsilon = 1e-12);
        c.move_to(Point3::new(1.1, 0.0, 0.0));
        assert!(c.drop_triangle(&t).is_none());
    }

    #[test]
    fn test_intersect_horizontal_above_and_below() {
        let mut c = CylindricalCutter::new(1.0).unwrap();
        c.move_to(Point3::new(-5.0, 0.0, 5.0));
        // Only x >= 5 of the slope is at or above the tip.
        let (cl, l) = c.intersect(&Vec3::x(), &slope()).unwrap();
        assert_relative_eq!(l, 9.0, epsilon = 1e-9);
        assert_relative_eq!(cl.x, 4.0, epsilon = 1e-9);

        c.move_to(Point3::new(-5.0, 0.0, 11.0));
        assert!(c.intersect(&Vec3::x(), &slope()).is_none());
    }

    #[test]
    fn test_intersect_plunge_matches_drop() {
        let mut c = CylindricalCutter::new(1.0).unwrap();
        c.move_to(Point3::new(3.0, 0.0, 20.0));
        let (cl, l) = c.intersect(&Vec3::new(0.0, 0.0, -1.0), &slope()).unwrap();
        assert_relative_eq!(cl.z, 4.0, epsilon = 1e-9);
        assert_relative_eq!(l, 16.0, epsilon = 1e-9);
        assert!(c.intersect(&Vec3::new(0.6, 0.0, -0.8), &slope()).is_none());
    }
}
