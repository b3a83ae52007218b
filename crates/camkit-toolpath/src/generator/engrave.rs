//! Contour engraving, layer by layer down to a depth.

use camkit_geom::{Line, Model};
use camkit_math::Point3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{layer_heights, Diagnostics, GenerationResult};
use crate::cutter::{drop_height, Cutter};
use crate::error::{Result, ToolpathError};
use crate::oracle::{get_free_paths, FreePathSettings, TriangleOracle};
use crate::path::Path;
use crate::processor::{PathAccumulator, PathProcessor, SimpleCutter};
use crate::progress::{Progress, ProgressUpdate};

/// Engrave settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngraveSettings {
    /// Height the first layer steps down from.
    pub start_z: f64,
    /// Engraving depth; the last layer.
    pub final_z: f64,
    /// Distance between layers.
    pub step_down: f64,
    /// Sample spacing along contours on the final layer.
    pub sample_step: f64,
    /// Bisection depth limit for blocked segments.
    pub max_depth: u32,
    /// Blocked pieces shorter than `radius / accuracy` are given up on.
    pub accuracy: u32,
}

impl Default for EngraveSettings {
    fn default() -> Self {
        Self {
            start_z: 0.0,
            final_z: -1.0,
            step_down: 0.5,
            sample_step: 0.5,
            max_depth: 20,
            accuracy: 20,
        }
    }
}

impl EngraveSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_down > 0.0 && self.step_down.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "step_down must be positive".into(),
            ));
        }
        if !(self.sample_step > 0.0 && self.sample_step.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "sample_step must be positive".into(),
            ));
        }
        if self.final_z > self.start_z {
            return Err(ToolpathError::InvalidSettings(format!(
                "final_z ({}) is above start_z ({})",
                self.final_z, self.start_z
            )));
        }
        self.free_paths().validate()
    }

    fn free_paths(&self) -> FreePathSettings {
        FreePathSettings {
            max_depth: self.max_depth,
            accuracy: self.accuracy,
        }
    }
}

/// Order contours for engraving: open outlines and clockwise (hole)
/// outlines first, then closed counter-clockwise outlines; smaller areas
/// first within each group.
pub fn order_contours(contours: &[Path]) -> Vec<&Path> {
    let key = |p: &Path| {
        let area = p.signed_area_xy();
        let outline = p.is_closed() && area >= 0.0;
        (outline, area.abs())
    };
    let mut ordered: Vec<&Path> = contours.iter().collect();
    ordered.sort_by(|a, b| {
        let (ka, kb) = (key(a), key(b));
        ka.0.cmp(&kb.0).then_with(|| ka.1.total_cmp(&kb.1))
    });
    ordered
}

/// Contour-following generator.
///
/// The Z of a contour point is the floor of the cut there: on each layer the
/// tool runs at the higher of the point's Z and the layer height.
///
/// Layers step down from `start_z` to `final_z`. On every layer but the
/// last, each contour segment is raised onto the layer wherever it dips
/// below it, trimmed to the part below the previous layer, and split into
/// collision-free pieces. The last
/// layer follows the contours with drop tests so the tool rides the model
/// surface wherever it rises above the engraving depth.
#[derive(Debug, Clone)]
pub struct EngraveCutter<C> {
    cutter: C,
    settings: EngraveSettings,
}

impl<C: Cutter + Clone> EngraveCutter<C> {
    /// Create an engrave generator.
    pub fn new(cutter: C, settings: EngraveSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { cutter, settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &EngraveSettings {
        &self.settings
    }

    /// Engrave `contours` into `model`.
    ///
    /// Progress is reported after every layer; on cancellation the paths of
    /// the finished layers are returned.
    pub fn generate<G: Progress + ?Sized>(
        &self,
        model: &Model,
        contours: &[Path],
        progress: &mut G,
    ) -> Result<GenerationResult> {
        if model.is_empty() {
            return Err(ToolpathError::EmptyModel);
        }
        let s = &self.settings;
        let heights = layer_heights(s.start_z, s.final_z, s.step_down)?;
        let ordered = order_contours(contours);
        let mut diagnostics = Diagnostics::default();
        let mut paths = Vec::new();
        let mut prev_z = s.start_z;

        for (idx, &z) in heights.iter().enumerate() {
            let is_final = idx + 1 == heights.len();
            let layer = if is_final {
                self.final_layer(model, &ordered, z)?
            } else {
                self.layer(model, &ordered, z, prev_z, &mut diagnostics)?
            };
            debug!(z, paths = layer.len(), is_final, "engrave layer");
            paths.extend(layer);
            diagnostics.layers_completed += 1;
            prev_z = z;

            let update = ProgressUpdate {
                completed: idx + 1,
                total: heights.len(),
                z: Some(z),
            };
            if progress.update(&update) && !is_final {
                diagnostics.cancelled = true;
                break;
            }
        }

        for (id, path) in paths.iter_mut().enumerate() {
            path.id = id;
        }
        Ok(GenerationResult { paths, diagnostics })
    }

    fn layer(
        &self,
        model: &Model,
        contours: &[&Path],
        z: f64,
        prev_z: f64,
        diagnostics: &mut Diagnostics,
    ) -> Result<Vec<Path>> {
        let radius = self.cutter.radius();
        let free_paths = self.settings.free_paths();
        let mut oracle = TriangleOracle::new(model, self.cutter.clone());
        let mut pairs = SimpleCutter::new(false);
        for contour in contours {
            for seg in contour.points.windows(2) {
                for piece in lift(&Line::new(seg[0], seg[1]), z) {
                    // Parts above the previous layer were cut there already.
                    let (Some(below), _) = piece.split_at_z(prev_z) else {
                        continue;
                    };
                    if below.is_empty() {
                        continue;
                    }
                    let free =
                        get_free_paths(&mut oracle, below.p1(), below.p2(), radius, &free_paths);
                    if free.is_empty() {
                        diagnostics.blocked_segments += 1;
                    }
                    for p in free {
                        pairs.append(p);
                    }
                }
            }
        }
        pairs.finish()
    }

    fn final_layer(&self, model: &Model, contours: &[&Path], z: f64) -> Result<Vec<Path>> {
        let mut cutter = self.cutter.clone();
        let mut acc = PathAccumulator::new(false);
        for contour in contours {
            acc.new_scanline();
            for seg in contour.points.windows(2) {
                let line = Line::new(seg[0], seg[1]);
                let count = (line.len() / self.settings.sample_step).ceil().max(1.0) as usize;
                for i in 0..=count {
                    let p = line.point_at(line.len() * i as f64 / count as f64);
                    let floor = p.z.max(z);
                    let height = drop_height(&mut cutter, model, p.x, p.y)
                        .map_or(floor, |h| h.max(floor));
                    acc.append(Point3::new(p.x, p.y, height));
                }
            }
            acc.end_scanline()?;
        }
        acc.finish()
    }
}

/// The tool track over contour segment `seg` at layer `z`: the part of the
/// segment below the layer is raised onto it, the rest is followed as is.
/// Pieces come back in segment order.
fn lift(seg: &Line, z: f64) -> Vec<Line> {
    let (below, above) = seg.split_at_z(z);
    let below = below.map(|b| {
        let flat = |p: Point3| Point3::new(p.x, p.y, z);
        Line::new(flat(b.p1()), flat(b.p2()))
    });
    let pieces = if seg.p1().z <= seg.p2().z {
        [below, above]
    } else {
        [above, below]
    };
    pieces.into_iter().flatten().filter(|l| !l.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cutter::CylindricalCutter;
    use crate::progress::NoProgress;
    use approx::assert_relative_eq;
    use camkit_geom::Triangle;

    /// Closed square contour with its floor at z = -1.
    fn square(id: usize, x0: f64, size: f64, ccw: bool) -> Path {
        let mut pts = vec![
            Point3::new(x0, 0.0, -1.0),
            Point3::new(x0 + size, 0.0, -1.0),
            Point3::new(x0 + size, size, -1.0),
            Point3::new(x0, size, -1.0),
        ];
        if !ccw {
            pts.reverse();
        }
        let mut p = Path::with_points(id, pts);
        p.close();
        p
    }

    fn plate() -> Model {
        // Top of the stock at z = 0.
        Model::from_mesh(
            &[[-5.0, -5.0, 0.0], [25.0, -5.0, 0.0], [25.0, 25.0, 0.0], [-5.0, 25.0, 0.0]],
            &[0, 2, 1, 0, 3, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_order_holes_and_open_first() {
        let big = square(0, 0.0, 10.0, true);
        let small = square(1, 0.0, 2.0, true);
        let hole = square(2, 0.0, 5.0, false);
        let open = Path::with_points(3, vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0)]);
        let contours = [big, small, hole, open];
        let ids: Vec<usize> = order_contours(&contours).iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![3, 2, 1, 0]);
    }

    #[test]
    fn test_layers_step_down_to_depth() {
        let model = plate();
        let settings = EngraveSettings {
            start_z: 0.0,
            final_z: -1.0,
            step_down: 0.5,
            ..Default::default()
        };
        let gen = EngraveCutter::new(CylindricalCutter::new(0.5).unwrap(), settings).unwrap();
        let contour = square(0, 0.0, 4.0, true);
        let result = gen.generate(&model, &[contour], &mut NoProgress).unwrap();
        assert_eq!(result.diagnostics.layers_completed, 2);
        // Layer -0.5: the plate is above the tool, so every side is blocked.
        assert_eq!(result.diagnostics.blocked_segments, 4);
        // Final layer: one path riding the plate surface.
        assert_eq!(result.paths.len(), 1);
        assert!(result.paths[0].points.iter().all(|p| p.z.abs() < 1e-9));
        assert!(result.paths[0].is_closed());
    }

    #[test]
    fn test_free_layer_emits_pairs() {
        // A plate well below the engraving depth never blocks the tool.
        let model = Model::from_triangles(vec![Triangle::new(
            Point3::new(-5.0, -5.0, -10.0),
            Point3::new(20.0, 20.0, -10.0),
            Point3::new(20.0, -5.0, -10.0),
        )
        .unwrap()]);
        let settings = EngraveSettings {
            start_z: 0.0,
            final_z: -1.0,
            step_down: 0.5,
            ..Default::default()
        };
        let gen = EngraveCutter::new(CylindricalCutter::new(0.5).unwrap(), settings).unwrap();
        let result = gen
            .generate(&model, &[square(0, 0.0, 4.0, true)], &mut NoProgress)
            .unwrap();
        // Four sides on the first layer, then the final contour.
        assert_eq!(result.paths.len(), 5);
        assert!(result.paths[..4].iter().all(|p| p.len() == 2 && p.points[0].z == -0.5));
        assert!(result.paths[4].points.iter().all(|p| p.z == -1.0));
    }

    fn floor(z: f64) -> Model {
        Model::from_mesh(
            &[[-5.0, -5.0, z], [25.0, -5.0, z], [25.0, 25.0, z], [-5.0, 25.0, z]],
            &[0, 2, 1, 0, 3, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_sloped_contour_is_trimmed_per_layer() {
        // Floor rises from -1.5 to 0 along x, then runs level at 0.
        let contour = Path::with_points(
            0,
            vec![
                Point3::new(0.0, 0.0, -1.5),
                Point3::new(6.0, 0.0, 0.0),
                Point3::new(6.0, 4.0, 0.0),
            ],
        );
        let settings = EngraveSettings {
            start_z: 0.0,
            final_z: -1.5,
            step_down: 0.5,
            ..Default::default()
        };
        let gen = EngraveCutter::new(CylindricalCutter::new(0.5).unwrap(), settings).unwrap();
        let result = gen.generate(&floor(-10.0), &[contour], &mut NoProgress).unwrap();
        let d = result.diagnostics;
        assert_eq!(d.layers_completed, 3);
        assert_eq!(d.blocked_segments, 0);

        let p = &result.paths;
        // Layer -0.5: flat run up to where the floor meets the layer, then
        // the slope up to the start height, then the level side.
        assert_eq!(p.len(), 6);
        assert_relative_eq!(p[0].points[0], Point3::new(0.0, 0.0, -0.5), epsilon = 1e-9);
        assert_relative_eq!(p[0].points[1], Point3::new(4.0, 0.0, -0.5), epsilon = 1e-9);
        assert_relative_eq!(p[1].points[1], Point3::new(6.0, 0.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(p[2].points[1], Point3::new(6.0, 4.0, 0.0), epsilon = 1e-9);

        // Layer -1.0: the slope is cut off at the previous layer and the
        // level side, wholly above it, is skipped.
        assert_relative_eq!(p[3].points[0], Point3::new(0.0, 0.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(p[3].points[1], Point3::new(2.0, 0.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(p[4].points[0], Point3::new(2.0, 0.0, -1.0), epsilon = 1e-9);
        assert_relative_eq!(p[4].points[1], Point3::new(4.0, 0.0, -0.5), epsilon = 1e-9);
        for (paths, prev_z) in [(&p[..3], 0.0), (&p[3..5], -0.5)] {
            for path in paths {
                assert_eq!(path.len(), 2);
                assert!(path.points.iter().all(|q| q.z <= prev_z + 1e-9));
            }
        }

        // Final layer follows the floor, never below the depth.
        let last = &p[5];
        assert_relative_eq!(last.points[0].z, -1.5, epsilon = 1e-9);
        assert!(last.points.iter().all(|q| q.z >= -1.5 - 1e-9));
        assert_relative_eq!(last.points.last().unwrap().z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_cancel_stops_after_layer() {
        let model = plate();
        let settings = EngraveSettings {
            final_z: -3.0,
            ..Default::default()
        };
        let gen = EngraveCutter::new(CylindricalCutter::new(0.5).unwrap(), settings).unwrap();
        let mut calls = 0;
        let mut cancel_first = |_: &ProgressUpdate| {
            calls += 1;
            true
        };
        let result = gen
            .generate(&model, &[square(0, 0.0, 4.0, true)], &mut cancel_first)
            .unwrap();
        assert!(result.diagnostics.cancelled);
        assert_eq!(result.diagnostics.layers_completed, 1);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_rejects_inverted_depth() {
        let settings = EngraveSettings {
            start_z: -2.0,
            final_z: 0.0,
            ..Default::default()
        };
        assert!(EngraveCutter::new(CylindricalCutter::new(0.5).unwrap(), settings).is_err());
    }
}
