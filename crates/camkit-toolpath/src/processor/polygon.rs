//! Zig-zag fills of monotone pieces.

use camkit_math::Point3;

use super::PathProcessor;
use crate::error::Result;
use crate::extractor::{ExtractPolicy, PolygonExtractor};
use crate::grid::Axis;
use crate::path::Path;

/// Zig-zag fill of monotone pieces of the covered regions.
///
/// Each piece comes out of the extractor as its left side followed by its
/// right side bottom-up, so point `i` and point `n - 1 - i` lie on the same
/// scan line. The fill walks those pairs line by line, alternating sides.
#[derive(Debug, Clone)]
pub struct PolygonCutter {
    extractor: PolygonExtractor,
}

impl PolygonCutter {
    /// Create a zig-zag fill processor.
    pub fn new() -> Self {
        Self {
            extractor: PolygonExtractor::new(ExtractPolicy::Monotone),
        }
    }
}

impl Default for PolygonCutter {
    fn default() -> Self {
        Self::new()
    }
}

fn zigzag(piece: &Path) -> Path {
    let n = piece.points.len();
    let mut path = Path::new(piece.id);
    path.winding = piece.winding;
    for i in 0..n / 2 {
        let (a, b) = (piece.points[i], piece.points[n - 1 - i]);
        if i % 2 == 0 {
            path.append(a);
            path.append(b);
        } else {
            path.append(b);
            path.append(a);
        }
    }
    path
}

impl PathProcessor for PolygonCutter {
    fn new_direction(&mut self, axis: Axis) {
        self.extractor.new_direction(axis);
    }

    fn end_direction(&mut self) {
        self.extractor.end_direction();
    }

    fn new_scanline(&mut self) {
        self.extractor.new_scanline();
    }

    fn append(&mut self, point: Point3) {
        self.extractor.append(point);
    }

    fn end_scanline(&mut self) -> Result<()> {
        self.extractor.end_scanline()
    }

    fn finish(&mut self) -> Result<Vec<Path>> {
        Ok(self.extractor.finish().iter().map(zigzag).collect())
    }
}
