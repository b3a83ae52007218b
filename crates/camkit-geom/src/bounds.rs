//! Axis-aligned bounds in any number of tracked dimensions.
//!
//! The kd-tree indexes entities by one interval per tracked dimension, the
//! model keeps a 3D box, and scan lines query with 2D rectangles. All three
//! are the same type with a different `D`.

use camkit_math::Point3;

/// Axis-aligned bounds: one closed interval `[min[d], max[d]]` per dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const D: usize> {
    /// Lower end of each interval.
    pub min: [f64; D],
    /// Upper end of each interval.
    pub max: [f64; D],
}

/// Rectangle in the XY plane.
pub type Bounds2 = Bounds<2>;

/// Axis-aligned box in 3D.
pub type Aabb3 = Bounds<3>;

impl<const D: usize> Bounds<D> {
    /// Create bounds from min and max corners.
    pub fn new(min: [f64; D], max: [f64; D]) -> Self {
        Self { min, max }
    }

    /// Create empty (inverted) bounds suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: [f64::INFINITY; D],
            max: [f64::NEG_INFINITY; D],
        }
    }

    /// True if nothing has been included yet.
    pub fn is_empty(&self) -> bool {
        (0..D).any(|d| self.min[d] > self.max[d])
    }

    /// Expand to include a single coordinate tuple.
    pub fn include(&mut self, p: [f64; D]) {
        for d in 0..D {
            self.min[d] = self.min[d].min(p[d]);
            self.max[d] = self.max[d].max(p[d]);
        }
    }

    /// Expand to include other bounds.
    pub fn union(&mut self, other: &Self) {
        for d in 0..D {
            self.min[d] = self.min[d].min(other.min[d]);
            self.max[d] = self.max[d].max(other.max[d]);
        }
    }

    /// Test if two bounds overlap (touching counts as overlap).
    pub fn overlaps(&self, other: &Self) -> bool {
        (0..D).all(|d| self.min[d] <= other.max[d] && self.max[d] >= other.min[d])
    }

    /// Test if a coordinate tuple lies inside (inclusive).
    pub fn contains(&self, p: [f64; D]) -> bool {
        (0..D).all(|d| p[d] >= self.min[d] && p[d] <= self.max[d])
    }

    /// Grow every interval by `tol` on both ends.
    pub fn expanded(&self, tol: f64) -> Self {
        let mut out = *self;
        for d in 0..D {
            out.min[d] -= tol;
            out.max[d] += tol;
        }
        out
    }

    /// Length of the interval along `dim`.
    pub fn span(&self, dim: usize) -> f64 {
        self.max[dim] - self.min[dim]
    }

    /// Midpoint of the interval along `dim`.
    pub fn center(&self, dim: usize) -> f64 {
        0.5 * (self.min[dim] + self.max[dim])
    }
}

impl<const D: usize> Default for Bounds<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    /// Expand to include a 3D point.
    pub fn include_point(&mut self, p: &Point3) {
        self.include([p.x, p.y, p.z]);
    }

    /// Project onto the XY plane.
    pub fn xy(&self) -> Bounds2 {
        Bounds2::new([self.min[0], self.min[1]], [self.max[0], self.max[1]])
    }

    /// Minimum corner as a point.
    pub fn min_point(&self) -> Point3 {
        Point3::new(self.min[0], self.min[1], self.min[2])
    }

    /// Maximum corner as a point.
    pub fn max_point(&self) -> Point3 {
        Point3::new(self.max[0], self.max[1], self.max[2])
    }
}

impl Bounds2 {
    /// Rectangle swept by a segment in XY, grown by `radius`.
    pub fn around_segment(a: &Point3, b: &Point3, radius: f64) -> Self {
        Self::new(
            [a.x.min(b.x) - radius, a.y.min(b.y) - radius],
            [a.x.max(b.x) + radius, a.y.max(b.y) + radius],
        )
    }

    /// Square of half-width `radius` centred on `(x, y)`.
    pub fn around_point(x: f64, y: f64, radius: f64) -> Self {
        Self::new([x - radius, y - radius], [x + radius, y + radius])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_then_include() {
        let mut b = Aabb3::empty();
        assert!(b.is_empty());
        b.include_point(&Point3::new(1.0, 2.0, 3.0));
        b.include_point(&Point3::new(-1.0, 0.0, 5.0));
        assert!(!b.is_empty());
        assert_eq!(b.min, [-1.0, 0.0, 3.0]);
        assert_eq!(b.max, [1.0, 2.0, 5.0]);
    }

    #[test]
    fn test_touching_overlaps() {
        let a = Bounds2::new([0.0, 0.0], [1.0, 1.0]);
        let b = Bounds2::new([1.0, 0.5], [2.0, 2.0]);
        let c = Bounds2::new([1.0001, 0.5], [2.0, 2.0]);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_around_segment() {
        let r = Bounds2::around_segment(&Point3::new(2.0, 1.0, 0.0), &Point3::new(0.0, 1.0, 0.0), 0.5);
        assert_eq!(r.min, [-0.5, 0.5]);
        assert_eq!(r.max, [2.5, 1.5]);
    }
}
