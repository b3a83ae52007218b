//! Collision queries for swept cutter moves.
//!
//! A [`CollisionOracle`] answers one question: does the cutter, moved in a
//! straight line from a start pose by some offset, cut into the model? The
//! triangle oracle answers it with drop tests; an external physics backend
//! can be plugged in behind the same trait.

use camkit_geom::{Bounds2, Model};
use camkit_math::{Point3, Vec3};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cutter::{drop_height, is_horizontal, Cutter};
use crate::error::{Result, ToolpathError};

/// A cutter pose plus a straight sweep, tested against a model.
pub trait CollisionOracle {
    /// Set the sweep offset from the current position.
    fn extend(&mut self, dx: f64, dy: f64, dz: f64);

    /// Move the start of the sweep.
    fn set_position(&mut self, position: Point3);

    /// Whether the swept cutter cuts into the model.
    fn check_collision(&mut self) -> bool;

    /// Return to the origin with no sweep.
    fn reset(&mut self);
}

/// Collision oracle over a [`Model`] and a [`Cutter`].
///
/// A sample collides when the cutter could not be lowered to the sample
/// height there without cutting into the model. Horizontal sweeps are exact:
/// besides both ends, every point where the cutter enters or leaves a
/// triangle is sampled, along with the midpoints between them. Other sweeps
/// are sampled every `sample_step`.
#[derive(Debug, Clone)]
pub struct TriangleOracle<'a, C> {
    model: &'a Model,
    cutter: C,
    position: Point3,
    sweep: Vec3,
    tolerance: f64,
    sample_step: f64,
}

impl<'a, C: Cutter> TriangleOracle<'a, C> {
    /// Create an oracle; sloped sweeps are sampled at a quarter of the
    /// cutter radius.
    pub fn new(model: &'a Model, cutter: C) -> Self {
        let sample_step = cutter.radius() / 4.0;
        Self {
            model,
            cutter,
            position: Point3::origin(),
            sweep: Vec3::zeros(),
            tolerance: 1e-5,
            sample_step,
        }
    }

    /// Override the sampling distance for sloped sweeps.
    pub fn with_sample_step(mut self, step: f64) -> Result<Self> {
        if !(step > 0.0 && step.is_finite()) {
            return Err(ToolpathError::InvalidSettings(
                "oracle sample step must be positive".into(),
            ));
        }
        self.sample_step = step;
        Ok(self)
    }

    /// The cutter being swept.
    pub fn cutter(&self) -> &C {
        &self.cutter
    }

    fn collides_at(&mut self, p: &Point3) -> bool {
        let tolerance = self.tolerance;
        drop_height(&mut self.cutter, self.model, p.x, p.y).is_some_and(|z| z > p.z + tolerance)
    }

    fn check_horizontal(&mut self, start: Point3, len: f64, dir: Vec3) -> bool {
        let z = start.z;
        let mut ts = vec![0.0, len];
        self.cutter.move_to(start);
        let end = start + dir * len;
        let range = Bounds2::around_segment(&start, &end, self.cutter.radius());
        for t in self.model.triangles_in(&range) {
            if t.max_z() <= z + self.tolerance {
                continue;
            }
            if let Some((_, l)) = self.cutter.intersect(&dir, t) {
                ts.push(l);
            }
            if let Some((_, l)) = self.cutter.intersect(&-dir, t) {
                ts.push(-l);
            }
        }
        ts.retain(|t| (0.0..=len).contains(t));
        ts.sort_by(f64::total_cmp);
        let mids: Vec<f64> = ts.windows(2).map(|w| 0.5 * (w[0] + w[1])).collect();
        ts.extend(mids);
        ts.into_iter().any(|t| self.collides_at(&(start + dir * t)))
    }
}

impl<C: Cutter> CollisionOracle for TriangleOracle<'_, C> {
    fn extend(&mut self, dx: f64, dy: f64, dz: f64) {
        self.sweep = Vec3::new(dx, dy, dz);
    }

    fn set_position(&mut self, position: Point3) {
        self.position = position;
    }

    fn check_collision(&mut self) -> bool {
        let start = self.position;
        let len = self.sweep.norm();
        let xy_len = self.sweep.xy().norm();
        if xy_len < 1e-12 {
            // In place or plunging: the lowest pose decides.
            let low = if self.sweep.z < 0.0 {
                start + self.sweep
            } else {
                start
            };
            return self.collides_at(&low);
        }
        let dir = self.sweep / len;
        if is_horizontal(&dir) {
            return self.check_horizontal(start, len, dir);
        }
        let sweep = self.sweep;
        let count = (len / self.sample_step).ceil().max(1.0) as usize;
        (0..=count).any(|i| self.collides_at(&(start + sweep * (i as f64 / count as f64))))
    }

    fn reset(&mut self) {
        self.position = Point3::origin();
        self.sweep = Vec3::zeros();
    }
}

/// Bisection limits for [`get_free_paths`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreePathSettings {
    /// Maximum bisection depth.
    pub max_depth: u32,
    /// Blocked pieces shorter than `radius / accuracy` are not split
    /// further.
    pub accuracy: u32,
}

impl Default for FreePathSettings {
    fn default() -> Self {
        Self {
            max_depth: 20,
            accuracy: 20,
        }
    }
}

impl FreePathSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.accuracy == 0 {
            return Err(ToolpathError::InvalidSettings(
                "accuracy must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Collision-free pieces of the segment `p1 -> p2`, as a flat list of
/// `(begin, end)` pairs in segment order.
///
/// Blocked pieces are bisected until they are free, shorter than
/// `radius / accuracy`, or `max_depth` levels deep. Touching free pieces are
/// merged.
pub fn get_free_paths<O: CollisionOracle + ?Sized>(
    oracle: &mut O,
    p1: Point3,
    p2: Point3,
    radius: f64,
    settings: &FreePathSettings,
) -> Vec<Point3> {
    let min_len = radius / f64::from(settings.accuracy.max(1));
    let mut pairs = Vec::new();
    collect_free(oracle, p1, p2, min_len, settings.max_depth, &mut pairs);

    let mut merged: Vec<Point3> = Vec::with_capacity(pairs.len());
    for pair in pairs.chunks_exact(2) {
        match merged.last_mut() {
            Some(end) if (*end - pair[0]).norm() < 1e-9 => *end = pair[1],
            _ => merged.extend_from_slice(pair),
        }
    }
    trace!(pieces = merged.len() / 2, "free paths");
    merged
}

fn collect_free<O: CollisionOracle + ?Sized>(
    oracle: &mut O,
    a: Point3,
    b: Point3,
    min_len: f64,
    depth_left: u32,
    out: &mut Vec<Point3>,
) {
    let d = b - a;
    oracle.set_position(a);
    oracle.extend(d.x, d.y, d.z);
    if !oracle.check_collision() {
        out.push(a);
        out.push(b);
        return;
    }
    if depth_left == 0 || d.norm() <= min_len {
        return;
    }
    let mid = a + d * 0.5;
    collect_free(oracle, a, mid, min_len, depth_left - 1, out);
    collect_free(oracle, mid, b, min_len, depth_left - 1, out);
}
