//! Per-line path collection for grid generators.

use camkit_math::{Point3, Vec3};

use super::PathProcessor;
use crate::error::Result;
use crate::grid::Axis;
use crate::path::Path;

/// One path per scan line, with straight runs reduced to their ends.
///
/// With `zigzag`, a line that runs the same way as the previous line of its
/// direction is reversed, so consecutive paths alternate whatever order the
/// generator visits the points in.
#[derive(Debug, Clone, Default)]
pub struct PathAccumulator {
    zigzag: bool,
    current: Option<Path>,
    paths: Vec<Path>,
    /// Travel direction of the last path stored in this scan direction.
    last_run: Option<Vec3>,
}

impl PathAccumulator {
    /// Create an accumulator.
    pub fn new(zigzag: bool) -> Self {
        Self {
            zigzag,
            ..Default::default()
        }
    }

    fn store_current(&mut self) {
        if let Some(mut path) = self.current.take() {
            if !path.is_empty() {
                if self.zigzag {
                    let run = run_of(&path);
                    if self.last_run.is_some_and(|last| last.dot(&run) > 0.0) {
                        path.reverse();
                    }
                    self.last_run = Some(run_of(&path));
                }
                path.id = self.paths.len();
                self.paths.push(path);
            }
        }
    }
}

impl PathProcessor for PathAccumulator {
    fn new_direction(&mut self, _axis: Axis) {
        self.last_run = None;
    }

    fn new_scanline(&mut self) {
        self.current = Some(Path::new(self.paths.len()));
    }

    fn append(&mut self, point: Point3) {
        let id = self.paths.len();
        self.current
            .get_or_insert_with(|| Path::new(id))
            .append_reduced(point);
    }

    fn end_scanline(&mut self) -> Result<()> {
        self.store_current();
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<Path>> {
        self.store_current();
        Ok(std::mem::take(&mut self.paths))
    }
}

fn run_of(path: &Path) -> Vec3 {
    match (path.points.first(), path.points.last()) {
        (Some(a), Some(b)) => b - a,
        _ => Vec3::zeros(),
    }
}
