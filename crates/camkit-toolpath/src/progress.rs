//! Progress reporting and cooperative cancellation.
//!
//! Generators report once per scan line (drop and push) or per layer
//! (engrave). A reporter that answers `true` asks the generator to stop; the
//! generator then closes whatever it has open and returns the paths finished
//! so far.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// What a generator has done so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    /// Units of work finished in the current pass (scan lines or layers).
    pub completed: usize,
    /// Units of work in the current pass.
    pub total: usize,
    /// Height of the layer being worked on, if the pass is layered.
    pub z: Option<f64>,
}

impl ProgressUpdate {
    /// Completed fraction in `0.0..=1.0`.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Receives progress updates; returning `true` requests cancellation.
pub trait Progress {
    /// Handle an update.
    fn update(&mut self, update: &ProgressUpdate) -> bool;
}

impl<F> Progress for F
where
    F: FnMut(&ProgressUpdate) -> bool,
{
    fn update(&mut self, update: &ProgressUpdate) -> bool {
        self(update)
    }
}

/// Reporter that ignores updates and never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _update: &ProgressUpdate) -> bool {
        false
    }
}

/// Shared cancellation flag for work spread over threads.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation for every holder of this token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Progress for CancelToken {
    fn update(&mut self, _update: &ProgressUpdate) -> bool {
        self.is_cancelled()
    }
}
