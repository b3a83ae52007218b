//! Push cutter: slices and waterlines from scan lines at fixed heights.

use camkit_geom::{Bounds2, Model};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Diagnostics, GenerationResult};
use crate::cutter::{drop_height, Cutter};
use crate::error::{Result, ToolpathError};
use crate::grid::{GridSettings, MillingStyle, MotionGrid, ScanDirection, ScanLine};
use crate::processor::PathProcessor;
use crate::progress::{CancelToken, Progress, ProgressUpdate};

/// Push cutter settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PushCutterSettings {
    /// Offset used to sample either side of a contact; near-duplicate hits
    /// within `epsilon / 2` are collapsed.
    pub epsilon: f64,
    /// Distance between scan lines.
    pub step: f64,
    /// Scan passes per layer.
    pub directions: ScanDirection,
}

impl Default for PushCutterSettings {
    fn default() -> Self {
        Self {
            epsilon: 1e-4,
            step: 0.5,
            directions: ScanDirection::X,
        }
    }
}

impl PushCutterSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.epsilon > 0.0 && self.epsilon.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "epsilon must be positive".into(),
            ));
        }
        if !(self.step > 0.0 && self.step.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "step must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Slicing generator: the intervals of each scan line where the cutter can
/// sit at a layer height without cutting into the model.
///
/// Scan lines cover the model's XY bounds grown by the cutter diameter, so
/// every line starts and ends in free space, and always run in the positive
/// axis direction, so each line's breakpoints reach the processor in order.
#[derive(Debug, Clone)]
pub struct PushCutter<C> {
    cutter: C,
    settings: PushCutterSettings,
}

impl<C: Cutter + Clone> PushCutter<C> {
    /// Create a push cutter generator.
    pub fn new(cutter: C, settings: PushCutterSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { cutter, settings })
    }

    /// Settings in use.
    pub fn settings(&self) -> &PushCutterSettings {
        &self.settings
    }

    /// Slice every layer in `layers`, in the given order, into one
    /// processor. Each layer starts its own scan directions.
    ///
    /// Progress is reported after every scan line; on cancellation the
    /// current line and direction are closed and the paths finished so far
    /// are returned.
    pub fn generate<P, G>(
        &self,
        model: &Model,
        layers: &[f64],
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
        let bounds = model.bounds().xy().expanded(2.0 * self.cutter.radius());
        let grids = layers
            .iter()
            .map(|&z| MotionGrid::new(&bounds, z, &self.grid_settings()).map(|g| (z, g)))
            .collect::<Result<Vec<_>>>()?;
        let total = grids.iter().map(|(_, g)| g.line_count()).sum();

        let mut cutter = self.cutter.clone();
        let mut diagnostics = Diagnostics::default();
        let mut completed = 0;

        'layers: for (z, grid) in &grids {
            debug!(z, lines = grid.line_count(), "push cutter layer");
            for (axis, lines) in grid.passes() {
                processor.new_direction(*axis);
                for line in lines {
                    processor.new_scanline();
                    self.slice_line(&mut cutter, model, line, processor);
                    processor.end_scanline()?;
                    completed += 1;
                    let update = ProgressUpdate {
                        completed,
                        total,
                        z: Some(*z),
                    };
                    if progress.update(&update) {
                        debug!(z, completed, total, "push cutter cancelled");
                        diagnostics.cancelled = true;
                        processor.end_direction();
                        break 'layers;
                    }
                }
                processor.end_direction();
            }
            diagnostics.layers_completed += 1;
        }

        Ok(GenerationResult {
            paths: processor.finish()?,
            diagnostics,
        })
    }

    /// Slice layers in parallel, one task and one processor per layer.
    ///
    /// Results come back in the order of `layers`. Cancelling `cancel`
    /// stops every layer at its next scan line.
    pub fn generate_layers_parallel<P, F>(
        &self,
        model: &Model,
        layers: &[f64],
        factory: F,
        cancel: &CancelToken,
    ) -> Result<Vec<GenerationResult>>
    where
        C: Sync,
        P: PathProcessor,
        F: Fn() -> P + Sync,
    {
        if model.is_empty() {
            return Err(ToolpathError::EmptyModel);
        }
        // Build the index once up front rather than racing to build it.
        model.index();
        layers
            .par_iter()
            .map(|&z| {
                let mut processor = factory();
                let mut token = cancel.clone();
                self.generate(model, &[z], &mut processor, &mut token)
            })
            .collect()
    }

    fn grid_settings(&self) -> GridSettings {
        GridSettings {
            line_step: self.settings.step,
            sample_step: self.settings.step,
            direction: self.settings.directions,
            milling_style: MillingStyle::Climb,
        }
    }

    /// Emit the `(begin, end)` pairs of the free intervals of one line.
    fn slice_line<P: PathProcessor + ?Sized>(
        &self,
        cutter: &mut C,
        model: &Model,
        line: &ScanLine,
        processor: &mut P,
    ) {
        let eps = self.settings.epsilon;
        let z = line.start.z;
        let len = line.length();
        let forward = line.direction();
        let backward = -forward;

        let mut hits = vec![0.0, len];
        let range = Bounds2::around_segment(&line.start, &line.end, cutter.radius());
        cutter.move_to(line.start);
        for t in model.triangles_in(&range) {
            if t.max_z() < z {
                continue;
            }
            let entry = cutter.intersect(&forward, t).map(|(_, l)| l);
            let exit = cutter.intersect(&backward, t).map(|(_, l)| -l);
            for l in entry.into_iter().chain(exit) {
                for s in [l - eps, l, l + eps] {
                    if (0.0..=len).contains(&s) {
                        hits.push(s);
                    }
                }
            }
        }
        hits.sort_by(f64::total_cmp);
        let mut kept: Vec<f64> = Vec::with_capacity(hits.len());
        for h in hits {
            match kept.last() {
                Some(&last) if h - last < eps / 2.0 => {}
                _ => kept.push(h),
            }
        }
        // The end sentinel may have been folded into a hit just before it.
        if let Some(last) = kept.last_mut() {
            *last = len;
        }

        let mut runs: Vec<(f64, f64)> = Vec::new();
        let mut open = false;
        for t in kept {
            let p = line.point_at(t);
            let resolved = drop_height(cutter, model, p.x, p.y).map_or(z, |h| h.max(z));
            let free = (resolved - z).abs() < eps / 10.0;
            if free && open {
                if let Some(run) = runs.last_mut() {
                    run.1 = t;
                }
            } else if free {
                runs.push((t, t));
            }
            open = free;
        }
        for (begin, end) in runs {
            if end - begin > eps {
                processor.append(line.point_at(begin));
                processor.append(line.point_at(end));
            }
        }
    }
}
