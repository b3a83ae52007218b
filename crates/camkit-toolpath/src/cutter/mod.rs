//! Cutter shapes and their contact tests.
//!
//! Generators only talk to a cutter through the [`Cutter`] trait: position
//! it, ask how far it can drop onto a triangle, or ask where it first touches
//! a triangle when pushed along a direction. The cutter location is always
//! the tip, the lowest point on the tool axis.
//!
//! # Supported Tool Types
//!
//! - **Spherical** (ball end): sphere plus a cylindrical shank above its centre
//! - **Cylindrical** (flat end): flat disc bottom plus a cylindrical shank

mod cylindrical;
mod spherical;

pub use cylindrical::CylindricalCutter;
pub use spherical::SphericalCutter;

use camkit_geom::{Bounds2, Model, Triangle};
use camkit_math::{smallest_root, Point2, Point3, Vec2, Vec3};

/// A tool shape that can be tested against model triangles.
pub trait Cutter {
    /// Bounding radius in XY.
    fn radius(&self) -> f64;

    /// Current tip position.
    fn location(&self) -> Point3;

    /// Move the tip to `location`.
    fn move_to(&mut self, location: Point3);

    /// Tip position when the cutter, held at the current XY, is lowered onto
    /// `triangle` from above until it touches.
    ///
    /// `None` if the triangle is out of reach at this XY. The current Z of
    /// the cutter does not matter.
    fn drop_triangle(&self, triangle: &Triangle) -> Option<Point3>;

    /// First contact when the cutter travels along the line through its
    /// location with unit `direction`.
    ///
    /// Returns the tip position at contact and its signed distance from the
    /// current location. The distance is negative when the contact lies
    /// behind the cutter. Calling it again with the reversed direction
    /// yields the point where the cutter leaves the triangle.
    fn intersect(&self, direction: &Vec3, triangle: &Triangle) -> Option<(Point3, f64)>;
}

/// Highest tip Z at `(x, y)` over every triangle of `model` in reach.
///
/// Moves the cutter to `(x, y)` keeping its Z. `None` when nothing is in
/// reach.
pub fn drop_height<C: Cutter + ?Sized>(
    cutter: &mut C,
    model: &Model,
    x: f64,
    y: f64,
) -> Option<f64> {
    let z = cutter.location().z;
    cutter.move_to(Point3::new(x, y, z));
    let cutter = &*cutter;
    let range = Bounds2::around_point(x, y, cutter.radius());
    model
        .triangles_in(&range)
        .filter_map(|t| cutter.drop_triangle(t))
        .map(|cl| cl.z)
        .max_by(f64::total_cmp)
}

/// The part of `triangle` at or above height `z`, as a convex polygon.
///
/// Empty if the triangle lies entirely below.
pub(crate) fn clip_above(triangle: &Triangle, z: f64) -> Vec<Point3> {
    let v = triangle.vertices();
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = v[i];
        let b = v[(i + 1) % 3];
        let a_in = a.z >= z;
        let b_in = b.z >= z;
        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let t = (z - a.z) / (b.z - a.z);
            let p = a + (b - a) * t;
            out.push(Point3::new(p.x, p.y, z));
        }
    }
    out
}

/// Signed travel until a disc of `radius` centred at `center`, moving with
/// unit 2D `direction`, first touches the convex `polygon`.
///
/// The polygon may degenerate to a segment or a single point.
pub(crate) fn disc_entry(
    center: &Point2,
    direction: &Vec2,
    radius: f64,
    polygon: &[Point2],
) -> Option<f64> {
    let mut best: Option<f64> = None;

    for v in polygon {
        let w = center - v;
        let a = direction.norm_squared();
        let b = 2.0 * direction.dot(&w);
        let c = w.norm_squared() - radius * radius;
        if let Some(l) = smallest_root(a, b, c) {
            keep_min(&mut best, l);
        }
    }

    let n = polygon.len();
    if n < 2 {
        return best;
    }
    let edge_count = if n == 2 { 1 } else { n };
    for i in 0..edge_count {
        let a = polygon[i];
        let b = polygon[(i + 1) % n];
        let e = b - a;
        let len = e.norm();
        if len < 1e-12 {
            continue;
        }
        let t = e / len;
        let m = Vec2::new(-t.y, t.x);
        let md = m.dot(direction);
        if md.abs() < 1e-12 {
            continue;
        }
        let s0 = m.dot(&(center - a));
        let side = if md < 0.0 { 1.0 } else { -1.0 };
        let l = (side * radius - s0) / md;
        let u = t.dot(&(center + direction * l - a));
        if (-1e-9..=len + 1e-9).contains(&u) {
            keep_min(&mut best, l);
        }
    }
    best
}

pub(crate) fn keep_min(best: &mut Option<f64>, l: f64) {
    if best.map_or(true, |b| l < b) {
        *best = Some(l);
    }
}

/// True for a direction with no Z component.
pub(crate) fn is_horizontal(direction: &Vec3) -> bool {
    direction.z.abs() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn slope() -> Triangle {
        Triangle::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
            Point3::new(10.0, 0.0, 10.0),
        )
        .unwrap()
    }

    #[test]
    fn test_clip_above_partial() {
        let poly = clip_above(&slope(), 5.0);
        assert_eq!(poly.len(), 3);
        assert!(poly.iter().all(|p| p.z >= 5.0 - 1e-12));
        assert!(clip_above(&slope(), 11.0).is_empty());
        assert_eq!(clip_above(&slope(), -1.0).len(), 3);
    }

    #[test]
    fn test_disc_entry_point() {
        let point = [Point2::new(5.0, 0.0)];
        let l = disc_entry(&Point2::new(0.0, 0.0), &Vec2::new(1.0, 0.0), 1.0, &point).unwrap();
        assert_relative_eq!(l, 4.0);
    }

    #[test]
    fn test_disc_entry_edge() {
        let square = [
            Point2::new(5.0, -2.0),
            Point2::new(7.0, -2.0),
            Point2::new(7.0, 2.0),
            Point2::new(5.0, 2.0),
        ];
        let l = disc_entry(&Point2::new(0.0, 0.0), &Vec2::new(1.0, 0.0), 1.0, &square).unwrap();
        assert_relative_eq!(l, 4.0, epsilon = 1e-12);
        let back = disc_entry(&Point2::new(0.0, 0.0), &Vec2::new(-1.0, 0.0), 1.0, &square).unwrap();
        assert_relative_eq!(back, -8.0, epsilon = 1e-12);
        assert!(disc_entry(&Point2::new(0.0, 5.0), &Vec2::new(1.0, 0.0), 1.0, &square).is_none());
    }
}
