//! Binary kd-tree over bounded entities.
//!
//! Entities carry one closed interval per tracked dimension. Internal nodes
//! cycle the cut dimension with depth and remember the extent of their whole
//! subtree along that dimension, so a range query can skip a branch with a
//! single comparison. Leaves ("buckets") hold entities directly.

use serde::{Deserialize, Serialize};

use crate::bounds::{Bounds, Bounds2};
use crate::error::{GeometryError, Result};
use crate::triangle::Triangle;

/// Bucket limits for kd-tree construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    /// Stop splitting once a node holds at most this many entities.
    pub cutoff: usize,
    /// Stop splitting once the subtree extent along the cut dimension is
    /// at most this long (clustered or coincident bounds).
    pub cutoff_distance: f64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            cutoff: 3,
            cutoff_distance: 1e-3,
        }
    }
}

impl IndexSettings {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if self.cutoff == 0 {
            return Err(GeometryError::InvalidParameter(
                "cutoff must be at least 1".into(),
            ));
        }
        if self.cutoff_distance.is_nan() || self.cutoff_distance < 0.0 {
            return Err(GeometryError::InvalidParameter(
                "cutoff_distance must be non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// An indexed entity and its bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct KdEntry<T, const D: usize> {
    /// The payload returned by queries.
    pub item: T,
    /// Bounds used for partitioning and overlap tests.
    pub bounds: Bounds<D>,
}

/// A kd-tree node.
#[derive(Debug, Clone)]
enum Node<T, const D: usize> {
    Bucket(Vec<KdEntry<T, D>>),
    Split {
        dim: usize,
        /// Median entry midpoint; `lo` holds entries at or below it.
        cut: f64,
        /// Extent of the whole subtree along `dim`.
        min: f64,
        max: f64,
        lo: Box<Node<T, D>>,
        hi: Box<Node<T, D>>,
    },
}

/// Read-only kd-tree built once from a set of entries.
#[derive(Debug, Clone)]
pub struct KdTree<T, const D: usize> {
    root: Node<T, D>,
    len: usize,
}

impl<T, const D: usize> KdTree<T, D> {
    /// Build a tree. A `cutoff` of zero is treated as one.
    pub fn build(entries: Vec<KdEntry<T, D>>, settings: &IndexSettings) -> Self {
        let len = entries.len();
        let root = build_node(entries, 0, settings.cutoff.max(1), settings.cutoff_distance);
        Self { root, len }
    }

    /// Every entity whose bounds overlap `range` (touching counts).
    ///
    /// Each entity appears at most once since it lives in exactly one bucket.
    pub fn query(&self, range: &Bounds<D>) -> Vec<&T> {
        let mut out = Vec::new();
        query_node(&self.root, range, &mut out);
        out
    }

    /// Number of indexed entities.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth of the deepest bucket (a lone bucket has depth 0).
    pub fn depth(&self) -> usize {
        fn walk<T, const D: usize>(node: &Node<T, D>) -> usize {
            match node {
                Node::Bucket(_) => 0,
                Node::Split { lo, hi, .. } => 1 + walk(lo).max(walk(hi)),
            }
        }
        walk(&self.root)
    }

    /// Number of leaves.
    pub fn bucket_count(&self) -> usize {
        fn walk<T, const D: usize>(node: &Node<T, D>) -> usize {
            match node {
                Node::Bucket(_) => 1,
                Node::Split { lo, hi, .. } => walk(lo) + walk(hi),
            }
        }
        walk(&self.root)
    }

    /// `(depth, dim, cut)` for every internal node, pre-order.
    pub fn cuts(&self) -> Vec<(usize, usize, f64)> {
        fn walk<T, const D: usize>(node: &Node<T, D>, depth: usize, out: &mut Vec<(usize, usize, f64)>) {
            if let Node::Split { dim, cut, lo, hi, .. } = node {
                out.push((depth, *dim, *cut));
                walk(lo, depth + 1, out);
                walk(hi, depth + 1, out);
            }
        }
        let mut out = Vec::new();
        walk(&self.root, 0, &mut out);
        out
    }
}

fn build_node<T, const D: usize>(
    mut entries: Vec<KdEntry<T, D>>,
    depth: usize,
    cutoff: usize,
    cutoff_distance: f64,
) -> Node<T, D> {
    if entries.len() <= cutoff || D == 0 {
        return Node::Bucket(entries);
    }

    let dim = depth % D;
    let (min, max) = entries.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), e| {
        (lo.min(e.bounds.min[dim]), hi.max(e.bounds.max[dim]))
    });
    if max - min <= cutoff_distance {
        return Node::Bucket(entries);
    }

    entries.sort_by(|a, b| a.bounds.center(dim).total_cmp(&b.bounds.center(dim)));
    // len > cutoff >= 1, so both halves are non-empty and every level shrinks.
    let mid = entries.len() / 2;
    let hi_entries = entries.split_off(mid);
    let cut = entries
        .last()
        .map(|e| e.bounds.center(dim))
        .unwrap_or(min);

    Node::Split {
        dim,
        cut,
        min,
        max,
        lo: Box::new(build_node(entries, depth + 1, cutoff, cutoff_distance)),
        hi: Box::new(build_node(hi_entries, depth + 1, cutoff, cutoff_distance)),
    }
}

fn query_node<'a, T, const D: usize>(node: &'a Node<T, D>, range: &Bounds<D>, out: &mut Vec<&'a T>) {
    match node {
        Node::Bucket(entries) => {
            out.extend(
                entries
                    .iter()
                    .filter(|e| e.bounds.overlaps(range))
                    .map(|e| &e.item),
            );
        }
        Node::Split {
            dim, min, max, lo, hi, ..
        } => {
            if range.max[*dim] < *min || range.min[*dim] > *max {
                return;
            }
            query_node(lo, range, out);
            query_node(hi, range, out);
        }
    }
}

/// Triangle index over XY-projected bounds.
///
/// Stores triangle indices into the slice it was built from; rebuild it
/// whenever that slice changes.
#[derive(Debug, Clone)]
pub struct TriangleKdTree {
    tree: KdTree<usize, 2>,
}

impl TriangleKdTree {
    /// Index `triangles` by their XY bounds.
    pub fn build(triangles: &[Triangle], settings: &IndexSettings) -> Self {
        let entries = triangles
            .iter()
            .enumerate()
            .map(|(item, t)| KdEntry {
                item,
                bounds: t.bounds_xy(),
            })
            .collect();
        Self {
            tree: KdTree::build(entries, settings),
        }
    }

    /// Indices of the triangles whose XY bounds overlap `range`, ascending.
    pub fn query(&self, range: &Bounds2) -> Vec<usize> {
        let mut hits: Vec<usize> = self.tree.query(range).into_iter().copied().collect();
        hits.sort_unstable();
        hits
    }

    /// Number of indexed triangles.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// True if no triangles are indexed.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// The underlying tree.
    pub fn tree(&self) -> &KdTree<usize, 2> {
        &self.tree
    }
}
