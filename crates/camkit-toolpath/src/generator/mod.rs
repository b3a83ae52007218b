//! Toolpath generators.
//!
//! Each generator samples a [`Model`](camkit_geom::Model) with a
//! [`Cutter`](crate::Cutter) and streams the resulting points into a
//! [`PathProcessor`](crate::PathProcessor):
//!
//! - [`DropCutter`]: lowers the cutter onto the model over a grid (surfacing)
//! - [`PushCutter`]: pushes the cutter along scan lines at fixed heights
//!   (waterline and slicing)
//! - [`EngraveCutter`]: follows 2D contours layer by layer down to a depth

mod dropcutter;
mod engrave;
mod pushcutter;

pub use dropcutter::{DropCutter, DropCutterSettings};
pub use engrave::{order_contours, EngraveCutter, EngraveSettings};
pub use pushcutter::{PushCutter, PushCutterSettings};

use crate::error::{Result, ToolpathError};
use crate::path::Path;

/// Per-run anomalies that were handled without failing the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Samples with no contact, or a contact above the allowed range, that
    /// were replaced by the safety height.
    pub boundary_exceeded: usize,
    /// Contour segments with no collision-free part at their layer.
    pub blocked_segments: usize,
    /// Whether the progress reporter stopped the run early.
    pub cancelled: bool,
    /// Layers (or passes) fully processed.
    pub layers_completed: usize,
}

/// Paths produced by one generator run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationResult {
    /// Finished paths, in output order.
    pub paths: Vec<Path>,
    /// What happened along the way.
    pub diagnostics: Diagnostics,
}

/// Heights from `top` down to `bottom`, `step_down` apart.
///
/// `top` itself is excluded and the last height is exactly `bottom`, so a
/// remainder shorter than `step_down` becomes a thinner final layer. If
/// `top` is not above `bottom`, only `bottom` is returned.
pub fn layer_heights(top: f64, bottom: f64, step_down: f64) -> Result<Vec<f64>> {
    if !(step_down > 0.0 && step_down.is_finite()) {
        return Err(ToolpathError::InvalidSettings(
            "step_down must be positive".into(),
        ));
    }
    if !(top.is_finite() && bottom.is_finite()) {
        return Err(ToolpathError::InvalidSettings(
            "layer limits must be finite".into(),
        ));
    }
    if top <= bottom {
        return Ok(vec![bottom]);
    }
    let count = ((top - bottom) / step_down - 1e-9).ceil().max(1.0) as usize;
    Ok((1..=count)
        .map(|i| (top - i as f64 * step_down).max(bottom))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_heights_even() {
        assert_eq!(layer_heights(0.0, -3.0, 1.0).unwrap(), vec![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_layer_heights_remainder() {
        assert_eq!(layer_heights(0.0, -2.5, 1.0).unwrap(), vec![-1.0, -2.0, -2.5]);
    }

    #[test]
    fn test_layer_heights_degenerate() {
        assert_eq!(layer_heights(-1.0, -1.0, 1.0).unwrap(), vec![-1.0]);
        assert!(layer_heights(0.0, -1.0, 0.0).is_err());
    }
}
