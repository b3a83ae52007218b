//! Segment pairs, one path each.

use camkit_math::Point3;

use super::PathProcessor;
use crate::error::{Result, ToolpathError};
use crate::path::Path;

/// Pairs consecutive points into two-point paths.
///
/// Suits generators that already emit `(begin, end)` pairs. With `reverse`,
/// each pair is reversed and placed in front of the earlier ones.
#[derive(Debug, Clone, Default)]
pub struct SimpleCutter {
    reverse: bool,
    pending: Option<Point3>,
    paths: Vec<Path>,
}

impl SimpleCutter {
    /// Create a pairing processor.
    pub fn new(reverse: bool) -> Self {
        Self {
            reverse,
            ..Default::default()
        }
    }

    fn check_pending(&mut self) -> Result<()> {
        match self.pending.take() {
            Some(_) => Err(ToolpathError::OddScanline { count: 1 }),
            None => Ok(()),
        }
    }
}

impl PathProcessor for SimpleCutter {
    fn append(&mut self, point: Point3) {
        let Some(begin) = self.pending.take() else {
            self.pending = Some(point);
            return;
        };
        if self.reverse {
            self.paths.insert(0, Path::with_points(0, vec![point, begin]));
        } else {
            self.paths.push(Path::with_points(0, vec![begin, point]));
        }
    }

    fn end_scanline(&mut self) -> Result<()> {
        self.check_pending()
    }

    fn finish(&mut self) -> Result<Vec<Path>> {
        self.check_pending()?;
        let mut paths = std::mem::take(&mut self.paths);
        for (id, path) in paths.iter_mut().enumerate() {
            path.id = id;
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64) -> Point3 {
        Point3::new(x, 0.0, 0.0)
    }

    #[test]
    fn test_pairs_points() {
        let mut s = SimpleCutter::new(false);
        for x in [0.0, 1.0, 2.0, 3.0] {
            s.append(p(x));
        }
        s.end_scanline().unwrap();
        let paths = s.finish().unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].points, vec![p(0.0), p(1.0)]);
        assert_eq!(paths[1].id, 1);
    }

    #[test]
    fn test_reverse_prepends() {
        let mut s = SimpleCutter::new(true);
        for x in [0.0, 1.0, 2.0, 3.0] {
            s.append(p(x));
        }
        let paths = s.finish().unwrap();
        assert_eq!(paths[0].points, vec![p(3.0), p(2.0)]);
        assert_eq!(paths[1].points, vec![p(1.0), p(0.0)]);
    }

    #[test]
    fn test_leftover_point_is_an_error() {
        let mut s = SimpleCutter::new(false);
        s.append(p(0.0));
        assert!(matches!(s.end_scanline(), Err(ToolpathError::OddScanline { count: 1 })));
        // The stray point is discarded.
        assert!(s.finish().unwrap().is_empty());
    }
}
