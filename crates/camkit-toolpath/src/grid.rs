//! Motion grid: the scan lines a generator walks.
//!
//! A grid covers an XY rectangle at a fixed height with parallel scan lines
//! spaced `line_step` apart, along X, Y, or both (X pass first). Milling
//! style only changes the order points are visited along a line.

use camkit_geom::Bounds2;
use camkit_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolpathError};

/// Axis a scan line runs along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Lines parallel to X, stepping across Y.
    X,
    /// Lines parallel to Y, stepping across X.
    Y,
}

impl Axis {
    /// Unit vector along the axis.
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::x(),
            Axis::Y => Vec3::y(),
        }
    }
}

/// Which scan passes to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanDirection {
    /// Lines along X only.
    #[default]
    X,
    /// Lines along Y only.
    Y,
    /// An X pass followed by a Y pass.
    #[serde(rename = "xy")]
    XY,
}

impl ScanDirection {
    /// Axes of the passes, in order.
    pub fn axes(self) -> &'static [Axis] {
        match self {
            ScanDirection::X => &[Axis::X],
            ScanDirection::Y => &[Axis::Y],
            ScanDirection::XY => &[Axis::X, Axis::Y],
        }
    }
}

/// Ordering of points along successive scan lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MillingStyle {
    /// Alternate direction line by line (shortest travel).
    #[default]
    Ignore,
    /// Every line runs in the positive axis direction.
    Climb,
    /// Every line runs in the negative axis direction.
    Conventional,
}

impl MillingStyle {
    /// Whether line number `index` of a pass runs backwards.
    pub fn is_reversed(self, index: usize) -> bool {
        match self {
            MillingStyle::Ignore => index % 2 == 1,
            MillingStyle::Climb => false,
            MillingStyle::Conventional => true,
        }
    }
}

/// Grid spacing and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Distance between neighbouring scan lines.
    pub line_step: f64,
    /// Maximum distance between samples along a line.
    pub sample_step: f64,
    /// Passes to run.
    pub direction: ScanDirection,
    /// Point order along lines.
    pub milling_style: MillingStyle,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            line_step: 1.0,
            sample_step: 0.5,
            direction: ScanDirection::X,
            milling_style: MillingStyle::Ignore,
        }
    }
}

impl GridSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.line_step > 0.0 && self.line_step.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "line_step must be positive".into(),
            ));
        }
        if !(self.sample_step > 0.0 && self.sample_step.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "sample_step must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// One straight scan line at a fixed height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanLine {
    /// Axis the line runs along.
    pub axis: Axis,
    /// First point visited.
    pub start: Point3,
    /// Last point visited.
    pub end: Point3,
}

impl ScanLine {
    /// Length of the line.
    pub fn length(&self) -> f64 {
        (self.end - self.start).norm()
    }

    /// Unit direction from start to end; the axis direction for a
    /// zero-length line.
    pub fn direction(&self) -> Vec3 {
        let d = self.end - self.start;
        let len = d.norm();
        if len < 1e-12 {
            self.axis.unit()
        } else {
            d / len
        }
    }

    /// Point at distance `t` from the start.
    pub fn point_at(&self, t: f64) -> Point3 {
        self.start + self.direction() * t
    }

    /// Evenly spaced samples at most `step` apart, both ends included.
    pub fn samples(&self, step: f64) -> Vec<Point3> {
        let len = self.length();
        let count = (len / step).ceil().max(1.0) as usize;
        (0..=count)
            .map(|i| self.start + (self.end - self.start) * (i as f64 / count as f64))
            .collect()
    }
}

/// The scan lines of one grid, grouped by pass.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionGrid {
    passes: Vec<(Axis, Vec<ScanLine>)>,
}

impl MotionGrid {
    /// Lay out scan lines over `bounds` at height `z`.
    ///
    /// Lines step across from the low edge; the last line sits on the high
    /// edge so the whole rectangle is covered.
    pub fn new(bounds: &Bounds2, z: f64, settings: &GridSettings) -> Result<Self> {
        settings.validate()?;
        if bounds.is_empty() {
            return Err(ToolpathError::InvalidSettings(
                "grid bounds are empty".into(),
            ));
        }
        let passes = settings
            .direction
            .axes()
            .iter()
            .map(|&axis| (axis, Self::pass(bounds, z, axis, settings)))
            .collect();
        Ok(Self { passes })
    }

    fn pass(bounds: &Bounds2, z: f64, axis: Axis, settings: &GridSettings) -> Vec<ScanLine> {
        let (along, across) = match axis {
            Axis::X => (0, 1),
            Axis::Y => (1, 0),
        };
        let span = bounds.span(across);
        let count = ((span / settings.line_step) - 1e-9).ceil().max(0.0) as usize;
        (0..=count)
            .map(|i| {
                let c = (bounds.min[across] + i as f64 * settings.line_step).min(bounds.max[across]);
                let (lo, hi) = (bounds.min[along], bounds.max[along]);
                let point = |a: f64| match axis {
                    Axis::X => Point3::new(a, c, z),
                    Axis::Y => Point3::new(c, a, z),
                };
                let (start, end) = if settings.milling_style.is_reversed(i) {
                    (point(hi), point(lo))
                } else {
                    (point(lo), point(hi))
                };
                ScanLine { axis, start, end }
            })
            .collect()
    }

    /// Passes in order, each with its scan lines.
    pub fn passes(&self) -> &[(Axis, Vec<ScanLine>)] {
        &self.passes
    }

    /// Total number of scan lines over all passes.
    pub fn line_count(&self) -> usize {
        self.passes.iter().map(|(_, lines)| lines.len()).sum()
    }
}
