//! Scanline polygon extraction.
//!
//! Slicing generators deliver, per scan line, the sorted breakpoints of the
//! intervals where the cutter may sit. The extractor follows those
//! intervals from line to line, growing one boundary fragment per interval
//! end, and stitches the fragments into closed outlines when a scan
//! direction ends.
//!
//! Vertical passes (lines along Y) are handled by swapping X and Y on the
//! way in and back on the way out, so the sweep itself always runs along X
//! and steps across Y.

use std::ops::Range;

use camkit_math::Point3;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{Result, ToolpathError};
use crate::grid::Axis;
use crate::path::Path;

/// Winding of a fragment that starts a new outer region.
const OUTER: i32 = 1;
/// Winding of a fragment that starts a gap inside a region.
const HOLE: i32 = 0;

/// How fragments are followed across scan lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractPolicy {
    /// Follow joins and splits so each connected boundary comes out as one
    /// outline. With both scan directions, vertical-pass points are merged
    /// into the horizontal outlines.
    #[default]
    Contour,
    /// Close the current pieces whenever intervals join or split, giving
    /// pieces that are monotone in the step direction.
    Monotone,
}

/// Stateful scanline sweep producing winding-tagged outlines.
#[derive(Debug, Clone)]
pub struct PolygonExtractor {
    policy: ExtractPolicy,
    axis: Axis,
    /// Fragments of the current direction; a fragment's id is its index.
    fragments: Vec<Path>,
    /// Open fragments, ordered along the line, two per covered interval.
    active: Vec<usize>,
    prev_line: Vec<Point3>,
    curr_line: Vec<Point3>,
    horizontal: Vec<Path>,
    vertical: Vec<Path>,
}

impl PolygonExtractor {
    /// Create an extractor; the first direction is horizontal until
    /// [`new_direction`](Self::new_direction) says otherwise.
    pub fn new(policy: ExtractPolicy) -> Self {
        Self {
            policy,
            axis: Axis::X,
            fragments: Vec::new(),
            active: Vec::new(),
            prev_line: Vec::new(),
            curr_line: Vec::new(),
            horizontal: Vec::new(),
            vertical: Vec::new(),
        }
    }

    /// Extraction policy.
    pub fn policy(&self) -> ExtractPolicy {
        self.policy
    }

    /// Number of fragments still open.
    pub fn open_fragments(&self) -> usize {
        self.active.len()
    }

    /// Start a scan direction, closing any direction still in progress.
    pub fn new_direction(&mut self, axis: Axis) {
        if !self.fragments.is_empty() {
            self.end_direction();
        }
        self.axis = axis;
    }

    /// Start a scan line.
    pub fn new_scanline(&mut self) {
        self.curr_line.clear();
    }

    /// Add a breakpoint to the current scan line.
    pub fn append(&mut self, point: Point3) {
        let p = match self.axis {
            Axis::X => point,
            Axis::Y => swap_xy(&point),
        };
        self.curr_line.push(p);
    }

    /// Match the current line's intervals against the open fragments.
    ///
    /// Fails if the line has an odd number of breakpoints; the line is
    /// dropped and the open fragments are left as they were.
    pub fn end_scanline(&mut self) -> Result<()> {
        let mut curr = std::mem::take(&mut self.curr_line);
        if curr.len() % 2 != 0 {
            return Err(ToolpathError::OddScanline { count: curr.len() });
        }
        curr.sort_by(|a, b| a.x.total_cmp(&b.x));

        let old = intervals(&self.prev_line);
        let new = intervals(&curr);
        let mut next = Vec::with_capacity(curr.len());
        let (mut i, mut j) = (0, 0);
        while i < old.len() || j < new.len() {
            let (oe, ne) = component(&old, &new, i, j);
            self.advance(i..oe, j..ne, &curr, &mut next);
            i = oe;
            j = ne;
        }
        self.active = next;
        self.prev_line = curr;
        debug_assert!(self.active.len() % 2 == 0);
        debug_assert_eq!(self.active.len(), self.prev_line.len());
        trace!(open = self.active.len(), "scan line matched");
        Ok(())
    }

    /// Close every open fragment and stitch this direction's outlines.
    pub fn end_direction(&mut self) {
        let active = std::mem::take(&mut self.active);
        for pair in active.chunks_exact(2) {
            self.join_bottom(pair[0], pair[1]);
        }
        self.prev_line.clear();
        self.curr_line.clear();

        let fragments = std::mem::take(&mut self.fragments);
        let mut polygons = stitch(&fragments, self.policy);
        debug!(
            axis = ?self.axis,
            fragments = fragments.len(),
            polygons = polygons.len(),
            "scan direction finished"
        );
        match self.axis {
            Axis::X => self.horizontal.append(&mut polygons),
            Axis::Y => {
                for polygon in &mut polygons {
                    for p in &mut polygon.points {
                        *p = swap_xy(p);
                    }
                }
                self.vertical.append(&mut polygons);
            }
        }
    }

    /// All outlines extracted so far, with fresh ids.
    ///
    /// Under [`ExtractPolicy::Contour`], each vertical-pass outline is merged
    /// into the first horizontal outline at the same height with the same
    /// winding and overlapping bounds; vertical outlines without a match are
    /// kept as they are.
    pub fn finish(&mut self) -> Vec<Path> {
        if !self.fragments.is_empty() {
            self.end_direction();
        }
        let mut out = std::mem::take(&mut self.horizontal);
        let vertical = std::mem::take(&mut self.vertical);
        let horizontal_count = out.len();
        for v in vertical {
            let target = match self.policy {
                ExtractPolicy::Contour => out[..horizontal_count]
                    .iter()
                    .position(|h| same_region(h, &v)),
                ExtractPolicy::Monotone => None,
            };
            match target {
                Some(idx) => splice(&mut out[idx], &v),
                None => out.push(v),
            }
        }
        for (id, polygon) in out.iter_mut().enumerate() {
            polygon.id = id;
        }
        out
    }

    /// Update fragments for one connected group of old and new intervals.
    fn advance(
        &mut self,
        old: Range<usize>,
        new: Range<usize>,
        curr: &[Point3],
        next: &mut Vec<usize>,
    ) {
        let extend = !old.is_empty()
            && !new.is_empty()
            && (self.policy == ExtractPolicy::Contour || (old.len() == 1 && new.len() == 1));

        if !extend {
            for k in old {
                let (a, b) = (self.active[2 * k], self.active[2 * k + 1]);
                self.join_bottom(a, b);
            }
            for k in new {
                let (a, b) = self.open_pair(curr[2 * k], curr[2 * k + 1], OUTER);
                next.push(a);
                next.push(b);
            }
            return;
        }

        let left = self.active[2 * old.start];
        let right = self.active[2 * old.end - 1];
        self.fragments[left].append(curr[2 * new.start]);
        next.push(left);
        // Neighbouring old intervals merge here.
        for k in old.start..old.end - 1 {
            let (a, b) = (self.active[2 * k + 1], self.active[2 * k + 2]);
            self.join_bottom(a, b);
        }
        // Gaps between new intervals start here.
        for k in new.start..new.end - 1 {
            let (a, b) = self.open_pair(curr[2 * k + 1], curr[2 * k + 2], HOLE);
            next.push(a);
            next.push(b);
        }
        self.fragments[right].append(curr[2 * new.end - 1]);
        next.push(right);
    }

    fn open_pair(&mut self, a: Point3, b: Point3, winding: i32) -> (usize, usize) {
        let ia = self.fragments.len();
        let ib = ia + 1;
        for (id, p, other) in [(ia, a, ib), (ib, b, ia)] {
            let mut fragment = Path::with_points(id, vec![p]);
            fragment.top_join = Some(other);
            fragment.winding = winding;
            self.fragments.push(fragment);
        }
        (ia, ib)
    }

    fn join_bottom(&mut self, a: usize, b: usize) {
        self.fragments[a].bot_join = Some(b);
        self.fragments[b].bot_join = Some(a);
    }
}

fn swap_xy(p: &Point3) -> Point3 {
    Point3::new(p.y, p.x, p.z)
}

fn intervals(line: &[Point3]) -> Vec<(f64, f64)> {
    line.chunks_exact(2).map(|c| (c[0].x, c[1].x)).collect()
}

/// Ends of the connected group of overlapping intervals that starts at old
/// interval `i` / new interval `j`, whichever begins first.
fn component(old: &[(f64, f64)], new: &[(f64, f64)], i: usize, j: usize) -> (usize, usize) {
    let (mut oe, mut ne) = (i, j);
    let mut reach_old = f64::NEG_INFINITY;
    let mut reach_new = f64::NEG_INFINITY;
    if j >= new.len() || (i < old.len() && old[i].0 <= new[j].0) {
        reach_old = old[i].1;
        oe += 1;
    } else {
        reach_new = new[j].1;
        ne += 1;
    }
    loop {
        let mut grown = false;
        while ne < new.len() && new[ne].0 <= reach_old {
            reach_new = reach_new.max(new[ne].1);
            ne += 1;
            grown = true;
        }
        while oe < old.len() && old[oe].0 <= reach_new {
            reach_old = reach_old.max(old[oe].1);
            oe += 1;
            grown = true;
        }
        if !grown {
            return (oe, ne);
        }
    }
}

/// Follow bottom and top joins from the lowest unused fragment until the
/// chain returns to its start.
fn stitch(fragments: &[Path], policy: ExtractPolicy) -> Vec<Path> {
    let mut used = vec![false; fragments.len()];
    let mut polygons = Vec::new();
    for start in 0..fragments.len() {
        if used[start] {
            continue;
        }
        let mut polygon = Path::new(polygons.len());
        polygon.winding = fragments[start].winding;
        let mut push = |p: Point3| match policy {
            ExtractPolicy::Contour => polygon.append_reduced(p),
            ExtractPolicy::Monotone => polygon.append(p),
        };

        let mut current = start;
        let mut forward = true;
        loop {
            used[current] = true;
            let fragment = &fragments[current];
            if forward {
                fragment.points.iter().for_each(|p| push(*p));
            } else {
                fragment.points.iter().rev().for_each(|p| push(*p));
            }
            let next = if forward {
                fragment.bot_join
            } else {
                fragment.top_join
            };
            match next {
                Some(n) if n != start && !used[n] => {
                    current = n;
                    forward = !forward;
                }
                _ => break,
            }
        }

        if policy == ExtractPolicy::Contour {
            polygon.reduce_closed();
        }
        polygons.push(polygon);
    }
    polygons
}

fn same_region(a: &Path, b: &Path) -> bool {
    let (Some(pa), Some(pb)) = (a.points.first(), b.points.first()) else {
        return false;
    };
    a.winding == b.winding
        && (pa.z - pb.z).abs() < 1e-6
        && a.bounds_xy().overlaps(&b.bounds_xy())
}

/// Insert the points of `source` into the nearest edges of the closed
/// outline `target`, keeping their order along each edge.
fn splice(target: &mut Path, source: &Path) {
    let n = target.points.len();
    if n < 2 {
        return;
    }
    let mut inserts: Vec<Vec<(f64, Point3)>> = vec![Vec::new(); n];
    for q in &source.points {
        let mut best: Option<(f64, usize, f64)> = None;
        for i in 0..n {
            let (d, t) = segment_distance_xy(&target.points[i], &target.points[(i + 1) % n], q);
            if best.map_or(true, |(bd, _, _)| d < bd) {
                best = Some((d, i, t));
            }
        }
        // Points nearest a corner would be ambiguous; skip them.
        if let Some((_, i, t)) = best {
            if t > 1e-9 && t < 1.0 - 1e-9 {
                inserts[i].push((t, *q));
            }
        }
    }
    let mut points = Vec::with_capacity(n + source.points.len());
    for (i, mut extra) in inserts.into_iter().enumerate() {
        points.push(target.points[i]);
        extra.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.extend(extra.into_iter().map(|(_, p)| p));
    }
    target.points = points;
}

/// XY distance from `q` to segment `a-b` and the segment parameter of the
/// closest point.
fn segment_distance_xy(a: &Point3, b: &Point3, q: &Point3) -> (f64, f64) {
    let (ex, ey) = (b.x - a.x, b.y - a.y);
    let len2 = ex * ex + ey * ey;
    let t = if len2 < 1e-18 {
        0.0
    } else {
        (((q.x - a.x) * ex + (q.y - a.y) * ey) / len2).clamp(0.0, 1.0)
    };
    let (dx, dy) = (a.x + ex * t - q.x, a.y + ey * t - q.y);
    ((dx * dx + dy * dy).sqrt(), t)
}
