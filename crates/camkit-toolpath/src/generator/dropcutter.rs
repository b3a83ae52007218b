//! Drop cutter: surfacing by lowering the tool onto the model over a grid.

use camkit_geom::{Bounds2, Model};
use camkit_math::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Diagnostics, GenerationResult};
use crate::cutter::{drop_height, Cutter};
use crate::error::{Result, ToolpathError};
use crate::grid::{GridSettings, MotionGrid};
use crate::processor::PathProcessor;
use crate::progress::{Progress, ProgressUpdate};

/// Drop cutter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropCutterSettings {
    /// Lowest allowed tip height; defaults to the model bottom.
    pub min_z: Option<f64>,
    /// Highest allowed tip height; defaults to the model top.
    pub max_z: Option<f64>,
    /// Height used where there is no contact or it lies above `max_z`.
    pub safety_height: f64,
    /// Sampling grid.
    pub grid: GridSettings,
}

impl Default for DropCutterSettings {
    fn default() -> Self {
        Self {
            min_z: None,
            max_z: None,
            safety_height: 25.0,
            grid: GridSettings::default(),
        }
    }
}

impl DropCutterSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        self.grid.validate()?;
        if let (Some(lo), Some(hi)) = (self.min_z, self.max_z) {
            if lo > hi {
                return Err(ToolpathError::InvalidSettings(format!(
                    "min_z ({lo}) is above max_z ({hi})"
                )));
            }
        }
        if !self.safety_height.is_finite() {
            return Err(ToolpathError::InvalidSettings(
                "safety_height must be finite".into(),
            ));
        }
        Ok(())
    }
}

/// Surfacing generator: the highest tip position at every grid sample.
#[derive(Debug, Clone)]
pub struct DropCutter<C> {
    cutter: C,
    settings: DropCutterSettings,
}

impl<C: Cutter + Clone> DropCutter<C> {
    /// Create a drop cutter generator.
    pub fn new(cutter: C, settings: DropCutterSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { cutter, settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &DropCutterSettings {
        &self.settings
    }

    /// Sample `model` over `bounds` (the model's XY bounds if `None`) and
    /// stream one point per sample into `processor`.
    ///
    /// Samples with a contact below `min_z` sit at `min_z`. Samples with no
    /// contact in reach, or whose contact exceeds `max_z`, are replaced by
    /// the safety height and reported once per run.
    ///
    /// Progress is reported after every scan line; on cancellation the
    /// current direction is closed and the paths finished so far are
    /// returned.
    pub fn generate<P, G>(
        &self,
        model: &Model,
        bounds: Option<&Bounds2>,
        processor: &mut P,
        progress: &mut G,
    ) -> Result<GenerationResult>
    where
        P: PathProcessor + ?Sized,
        G: Progress + ?Sized,
    {
        if model.is_empty() {
            return Err(ToolpathError::EmptyModel);
        }
        let model_bounds = model.bounds();
        let bounds = bounds.copied().unwrap_or_else(|| model_bounds.xy());
        let min_z = self.settings.min_z.unwrap_or(model_bounds.min[2]);
        let max_z = self.settings.max_z.unwrap_or(model_bounds.max[2]);
        let grid = MotionGrid::new(&bounds, max_z, &self.settings.grid)?;

        let mut cutter = self.cutter.clone();
        let mut diagnostics = Diagnostics::default();
        let total = grid.line_count();
        let mut completed = 0;

        'passes: for (axis, lines) in grid.passes() {
            processor.new_direction(*axis);
            for line in lines {
                processor.new_scanline();
                for p in line.samples(self.settings.grid.sample_step) {
                    let z = match drop_height(&mut cutter, model, p.x, p.y) {
                        Some(z) if z <= max_z + 1e-9 => z.max(min_z),
                        _ => {
                            diagnostics.boundary_exceeded += 1;
                            self.settings.safety_height
                        }
                    };
                    processor.append(Point3::new(p.x, p.y, z));
                }
                processor.end_scanline()?;
                completed += 1;
                let update = ProgressUpdate {
                    completed,
                    total,
                    z: None,
                };
                if progress.update(&update) {
                    debug!(completed, total, "drop cutter cancelled");
                    diagnostics.cancelled = true;
                    processor.end_direction();
                    break 'passes;
                }
            }
            processor.end_direction();
        }

        if diagnostics.boundary_exceeded > 0 {
            warn!(
                samples = diagnostics.boundary_exceeded,
                max_z,
                safety_height = self.settings.safety_height,
                "no cutter contact within the height limits; safety height substituted"
            );
        }
        if !diagnostics.cancelled {
            diagnostics.layers_completed = 1;
        }
        Ok(GenerationResult {
            paths: processor.finish()?,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutter::SphericalCutter;
    use crate::grid::{MillingStyle, ScanDirection};
    use crate::processor::PathAccumulator;
    use crate::progress::NoProgress;
    use approx::assert_relative_eq;
    use camkit_geom::Triangle;

    fn plane(z: f64) -> Model {
        Model::from_mesh(
            &[[0.0, 0.0, z], [10.0, 0.0, z], [10.0, 10.0, z], [0.0, 10.0, z]],
            &[0, 2, 1, 0, 3, 2],
        )
        .unwrap()
    }

    fn settings() -> DropCutterSettings {
        DropCutterSettings {
            grid: GridSettings {
                line_step: 2.5,
                sample_step: 1.0,
                direction: ScanDirection::X,
                milling_style: MillingStyle::Climb,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_flat_plane_gives_level_lines() {
        let model = plane(1.0);
        let gen = DropCutter::new(SphericalCutter::new(0.5).unwrap(), settings()).unwrap();
        let mut acc = PathAccumulator::new(false);
        let result = gen.generate(&model, None, &mut acc, &mut NoProgress).unwrap();
        assert_eq!(result.paths.len(), 5);
        for path in &result.paths {
            assert_eq!(path.len(), 2);
            assert!(path.points.iter().all(|p| (p.z - 1.0).abs() < 1e-9));
        }
        assert_eq!(result.diagnostics, Diagnostics { layers_completed: 1, ..Default::default() });
    }

    #[test]
    fn test_contact_above_max_uses_safety_height() {
        let mut model = plane(0.0);
        model.append(
            Triangle::new(
                Point3::new(4.0, -1.0, 5.0),
                Point3::new(6.0, 11.0, 5.0),
                Point3::new(6.0, -1.0, 5.0),
            )
            .unwrap(),
        );
        let s = DropCutterSettings {
            max_z: Some(2.0),
            safety_height: 10.0,
            ..settings()
        };
        let gen = DropCutter::new(SphericalCutter::new(0.5).unwrap(), s).unwrap();
        let mut acc = PathAccumulator::new(false);
        let result = gen.generate(&model, None, &mut acc, &mut NoProgress).unwrap();
        assert!(result.diagnostics.boundary_exceeded > 0);
        let top = result.paths[0].points.iter().map(|p| p.z).fold(f64::MIN, f64::max);
        assert_relative_eq!(top, 10.0);
    }

    #[test]
    fn test_missing_contact_uses_safety_height() {
        let model = plane(0.0);
        let s = DropCutterSettings {
            min_z: Some(-2.0),
            safety_height: 10.0,
            ..settings()
        };
        let gen = DropCutter::new(SphericalCutter::new(0.5).unwrap(), s).unwrap();
        let outside = Bounds2::new([20.0, 20.0], [22.0, 22.0]);
        let mut acc = PathAccumulator::new(false);
        let result = gen.generate(&model, Some(&outside), &mut acc, &mut NoProgress).unwrap();
        let zs: Vec<f64> = result.paths.iter().flat_map(|p| &p.points).map(|p| p.z).collect();
        assert!(!zs.is_empty());
        assert!(zs.iter().all(|&z| z == 10.0));
        // Three samples on each of the two lines at y = 20 and y = 22.
        assert_eq!(result.diagnostics.boundary_exceeded, 6);
    }

    #[test]
    fn test_contact_below_min_z_is_clamped() {
        let model = plane(0.0);
        let s = DropCutterSettings {
            min_z: Some(1.0),
            max_z: Some(2.0),
            ..settings()
        };
        let gen = DropCutter::new(SphericalCutter::new(0.5).unwrap(), s).unwrap();
        let mut acc = PathAccumulator::new(false);
        let result = gen.generate(&model, None, &mut acc, &mut NoProgress).unwrap();
        assert!(result.paths.iter().flat_map(|p| &p.points).all(|p| p.z == 1.0));
        assert_eq!(result.diagnostics.boundary_exceeded, 0);
    }

    #[test]
    fn test_empty_model_is_rejected() {
        let gen = DropCutter::new(SphericalCutter::new(0.5).unwrap(), settings()).unwrap();
        let mut acc = PathAccumulator::new(false);
        let err = gen.generate(&Model::new(), None, &mut acc, &mut NoProgress).unwrap_err();
        assert!(matches!(err, ToolpathError::EmptyModel));
    }

    #[test]
    fn test_inverted_limits_are_rejected() {
        let s = DropCutterSettings {
            min_z: Some(1.0),
            max_z: Some(0.0),
            ..Default::default()
        };
        assert!(DropCutter::new(SphericalCutter::new(0.5).unwrap(), s).is_err());
    }
}
