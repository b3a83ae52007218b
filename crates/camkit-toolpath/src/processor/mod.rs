//! Path processors: turn a generator's raw point stream into paths.
//!
//! Generators call the hooks in a fixed order: `new_direction`, then per
//! scan line `new_scanline`, any number of `append`, `end_scanline`; then
//! `end_direction`. `finish` hands over the result once generation is done.

mod accumulator;
mod contour;
mod polygon;
mod simple;

pub use accumulator::PathAccumulator;
pub use contour::ContourCutter;
pub use polygon::PolygonCutter;
pub use simple::SimpleCutter;

use camkit_math::Point3;

use crate::error::Result;
use crate::grid::Axis;
use crate::path::Path;

/// Consumer of generator output.
pub trait PathProcessor {
    /// A scan direction starts.
    fn new_direction(&mut self, _axis: Axis) {}

    /// The current scan direction is complete.
    fn end_direction(&mut self) {}

    /// A scan line starts.
    fn new_scanline(&mut self) {}

    /// Next point of the current scan line.
    fn append(&mut self, point: Point3);

    /// The current scan line is complete.
    fn end_scanline(&mut self) -> Result<()> {
        Ok(())
    }

    /// Take the finished paths.
    fn finish(&mut self) -> Result<Vec<Path>>;
}
