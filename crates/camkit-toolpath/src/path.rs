//! Toolpath point sequences.

use camkit_geom::Bounds2;
use camkit_math::Point3;

/// Points closer than this are treated as the same position.
const SAME_POINT: f64 = 1e-9;

/// An ordered sequence of tool positions.
///
/// `top_join`, `bot_join` and `winding` are only meaningful while the
/// polygon extractor stitches scan-line fragments together; `top_join` and
/// `bot_join` hold the ids of the fragments joined at this fragment's first
/// and last point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    /// Id, unique among the paths produced by one processor.
    pub id: usize,
    /// Tool positions.
    pub points: Vec<Point3>,
    /// Fragment joined at the first point.
    pub top_join: Option<usize>,
    /// Fragment joined at the last point.
    pub bot_join: Option<usize>,
    /// Winding of the region this boundary belongs to: 1 for outer
    /// boundaries, 0 for holes.
    pub winding: i32,
}

impl Path {
    /// Create an empty path.
    pub fn new(id: usize) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// Create a path from points.
    pub fn with_points(id: usize, points: Vec<Point3>) -> Self {
        Self {
            id,
            points,
            ..Default::default()
        }
    }

    /// Append a point.
    pub fn append(&mut self, p: Point3) {
        self.points.push(p);
    }

    /// Append a point, dropping repeats and the previous point when it sits
    /// on a straight run with its neighbours.
    pub fn append_reduced(&mut self, p: Point3) {
        if let Some(last) = self.points.last() {
            if (p - last).norm() < SAME_POINT {
                return;
            }
        }
        self.points.push(p);
        let n = self.points.len();
        if n >= 3 && is_colinear(&self.points[n - 3], &self.points[n - 2], &self.points[n - 1]) {
            self.points.remove(n - 2);
        }
    }

    /// Drop points on straight runs across the start/end seam of a closed
    /// outline.
    pub fn reduce_closed(&mut self) {
        while self.points.len() > 3 {
            let n = self.points.len();
            if is_colinear(&self.points[n - 1], &self.points[0], &self.points[1]) {
                self.points.remove(0);
            } else if is_colinear(&self.points[n - 2], &self.points[n - 1], &self.points[0]) {
                self.points.pop();
            } else {
                break;
            }
        }
    }

    /// Reverse the point order.
    pub fn reverse(&mut self) {
        self.points.reverse();
    }

    /// Close the path by repeating its first point, if not already closed.
    pub fn close(&mut self) {
        if let Some(&first) = self.points.first() {
            if !self.is_closed() {
                self.points.push(first);
            }
        }
    }

    /// True if the last point repeats the first.
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(a), Some(b)) if self.points.len() > 2 => (a - b).norm() < SAME_POINT,
            _ => false,
        }
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the path has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Polyline length.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Shoelace area of the XY projection, treating the path as closed.
    /// Positive for counter-clockwise outlines.
    pub fn signed_area_xy(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        for i in 0..n {
            let a = &self.points[i];
            let b = &self.points[(i + 1) % n];
            sum += a.x * b.y - b.x * a.y;
        }
        0.5 * sum
    }

    /// XY bounds of the points.
    pub fn bounds_xy(&self) -> Bounds2 {
        let mut b = Bounds2::empty();
        for p in &self.points {
            b.include([p.x, p.y]);
        }
        b
    }
}

fn is_colinear(a: &Point3, b: &Point3, c: &Point3) -> bool {
    let d1 = b - a;
    let d2 = c - b;
    let (l1, l2) = (d1.norm(), d2.norm());
    if l1 < SAME_POINT || l2 < SAME_POINT {
        return true;
    }
    (d1 / l1 - d2 / l2).norm() < 1e-9
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> Point3 {
        Point3::new(x, y, 0.0)
    }

    #[test]
    fn test_append_reduced_drops_straight_runs() {
        let mut path = Path::new(0);
        for q in [p(0.0, 0.0), p(1.0, 0.0), p(2.0, 0.0), p(2.0, 0.0), p(2.0, 1.0), p(2.0, 3.0)] {
            path.append_reduced(q);
        }
        assert_eq!(path.points, vec![p(0.0, 0.0), p(2.0, 0.0), p(2.0, 3.0)]);
    }

    #[test]
    fn test_reversal_is_not_a_straight_run() {
        let mut path = Path::new(0);
        for q in [p(0.0, 0.0), p(2.0, 0.0), p(1.0, 0.0)] {
            path.append_reduced(q);
        }
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn test_reduce_closed_seam() {
        let mut path = Path::with_points(0, vec![p(1.0, 0.0), p(2.0, 0.0), p(2.0, 2.0), p(0.0, 2.0), p(0.0, 0.0)]);
        path.reduce_closed();
        assert_eq!(path.len(), 4);
        assert!(!path.points.contains(&p(1.0, 0.0)));
    }

    #[test]
    fn test_close_and_area() {
        let mut path = Path::with_points(3, vec![p(0.0, 0.0), p(4.0, 0.0), p(4.0, 2.0), p(0.0, 2.0)]);
        assert_relative_eq!(path.signed_area_xy(), 8.0);
        assert!(!path.is_closed());
        path.close();
        assert!(path.is_closed());
        assert_eq!(path.len(), 5);
        assert_relative_eq!(path.length(), 12.0);
        path.close();
        assert_eq!(path.len(), 5);
        path.reverse();
        assert_relative_eq!(path.signed_area_xy(), -8.0);
        assert_eq!(path.bounds_xy().max, [4.0, 2.0]);
    }
}
