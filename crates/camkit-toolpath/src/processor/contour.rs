//! Closed waterline outlines.

use camkit_math::Point3;

use super::PathProcessor;
use crate::error::Result;
use crate::extractor::{ExtractPolicy, PolygonExtractor};
use crate::grid::Axis;
use crate::path::Path;

/// Closed outlines of the covered regions (waterlines).
#[derive(Debug, Clone)]
pub struct ContourCutter {
    extractor: PolygonExtractor,
}

impl ContourCutter {
    /// Create a contour processor.
    pub fn new() -> Self {
        Self {
            extractor: PolygonExtractor::new(ExtractPolicy::Contour),
        }
    }
}

impl Default for ContourCutter {
    fn default() -> Self {
        Self::new()
    }
}

impl PathProcessor for ContourCutter {
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
        let mut paths = self.extractor.finish();
        for path in &mut paths {
            path.close();
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outlines_are_closed() {
        let mut c = ContourCutter::new();
        c.new_direction(Axis::X);
        for y in 0..3 {
            c.new_scanline();
            c.append(Point3::new(1.0, y as f64, 0.0));
            c.append(Point3::new(0.0, y as f64, 0.0));
            c.end_scanline().unwrap();
        }
        c.end_direction();
        let paths = c.finish().unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].is_closed());
        assert_eq!(paths[0].len(), 5);
    }
}
