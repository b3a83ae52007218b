//! Ball end mill.
//!
//! The tip is a sphere of the tool radius whose centre sits one radius above
//! the tip; a cylindrical shank of the same radius rises from the centre.
//! Contact regions against a triangle:
//! 1. Face - sphere touches the triangle plane inside the triangle
//! 2. Edge - sphere touches the interior of an edge
//! 3. Vertex - sphere touches a corner
//! 4. Shank - only for horizontal moves, the part of the triangle above the
//!    sphere centre reaches the shank

use camkit_geom::Triangle;
use camkit_math::{smallest_root, xy, xy_vec, Point2, Point3, Vec3};

use super::{clip_above, disc_entry, is_horizontal, keep_min, Cutter};
use crate::error::{Result, ToolpathError};

/// Ball end mill of a given radius.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalCutter {
    radius: f64,
    location: Point3,
}

impl SphericalCutter {
    /// Create a ball end mill at the origin.
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

    /// Sphere centre for the current location.
    pub fn center(&self) -> Point3 {
        self.location + Vec3::new(0.0, 0.0, self.radius)
    }

    /// Signed travel of the sphere centre from `center` along `direction`
    /// until the sphere first touches `triangle`.
    fn sphere_entry(&self, center: &Point3, direction: &Vec3, triangle: &Triangle) -> Option<f64> {
        let r = self.radius;
        let mut best = None;

        // Face: distance to the plane equals r on the side we approach from.
        let n = triangle.normal();
        let nd = n.dot(direction);
        if nd.abs() > 1e-12 {
            let s0 = n.dot(&(center - triangle.p1()));
            let side = if nd < 0.0 { 1.0 } else { -1.0 };
            let l = (side * r - s0) / nd;
            let contact = center + direction * l - n * (side * r);
            if triangle.contains_point(&contact) {
                keep_min(&mut best, l);
            }
        }

        // Edges: distance to the edge line equals r with the foot inside.
        for edge in triangle.edges() {
            let t = edge.dir();
            let w0 = center - edge.p1();
            let w0p = w0 - t * w0.dot(&t);
            let dp = direction - t * direction.dot(&t);
            let a = dp.norm_squared();
            let b = 2.0 * w0p.dot(&dp);
            let c = w0p.norm_squared() - r * r;
            let Some(l) = smallest_root(a, b, c) else {
                continue;
            };
            let u = (w0 + direction * l).dot(&t);
            if (0.0..=edge.len()).contains(&u) {
                keep_min(&mut best, l);
            }
        }

        // Vertices.
        for v in triangle.vertices() {
            let w = center - v;
            let a = direction.norm_squared();
            let b = 2.0 * direction.dot(&w);
            if let Some(l) = smallest_root(a, b, w.norm_squared() - r * r) {
                keep_min(&mut best, l);
            }
        }

        best
    }

    /// Signed travel until the shank touches the part of `triangle` above
    /// the sphere centre. Horizontal moves only.
    fn shank_entry(&self, center: &Point3, direction: &Vec3, triangle: &Triangle) -> Option<f64> {
        let above = clip_above(triangle, center.z);
        if above.is_empty() {
            return None;
        }
        let polygon: Vec<Point2> = above.iter().map(xy).collect();
        let d = xy_vec(direction);
        let len = d.norm();
        if len < 1e-12 {
            return None;
        }
        disc_entry(&xy(center), &(d / len), self.radius, &polygon).map(|l| l / len)
    }
}

impl Cutter for SphericalCutter {
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
        // Start above everything so the entry distance stays positive.
        let start = Point3::new(x, y, triangle.max_z() + 2.0 * self.radius);
        let down = Vec3::new(0.0, 0.0, -1.0);
        let l = self.sphere_entry(&start, &down, triangle)?;
        Some(Point3::new(x, y, start.z - l - self.radius))
    }

    fn intersect(&self, direction: &Vec3, triangle: &Triangle) -> Option<(Point3, f64)> {
        let center = self.center();
        let mut best = self.sphere_entry(&center, direction, triangle);
        if is_horizontal(direction) {
            if let Some(l) = self.shank_entry(&center, direction, triangle) {
                keep_min(&mut best, l);
            }
        }
        best.map(|l| (self.location + direction * l, l))
    }
}
