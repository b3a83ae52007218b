//! Dynamic point kd-tree for vertex welding.
//!
//! Importers feed every incoming vertex through
//! [`PointKdTree::nearest_neighbor`]; vertices within the weld tolerance of
//! an existing point collapse onto it, everything else becomes a new point.

use std::collections::HashMap;

use camkit_math::Point3;

/// Handle of a welded point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PointId(pub usize);

/// Handle of an importer-defined edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

#[derive(Debug, Clone)]
struct PointNode {
    point: Point3,
    dim: usize,
    lo: Option<usize>,
    hi: Option<usize>,
}

/// Incrementally built 3D point tree.
///
/// Nodes live in an arena; a node's index is its [`PointId`].
#[derive(Debug, Clone, Default)]
pub struct PointKdTree {
    nodes: Vec<PointNode>,
    edges: HashMap<PointId, Vec<EdgeId>>,
}

impl PointKdTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the existing point within `tolerance` of `p`, or insert `p`.
    ///
    /// When several stored points are within tolerance the closest wins.
    pub fn nearest_neighbor(&mut self, p: Point3, tolerance: f64) -> PointId {
        if let Some(id) = self.find_within(&p, tolerance) {
            return id;
        }
        self.insert(p)
    }

    /// Closest stored point within `tolerance`, without inserting.
    pub fn find_within(&self, p: &Point3, tolerance: f64) -> Option<PointId> {
        let mut best: Option<(usize, f64)> = None;
        if !self.nodes.is_empty() {
            self.search(0, p, tolerance, &mut best);
        }
        best.map(|(idx, _)| PointId(idx))
    }

    fn search(&self, idx: usize, p: &Point3, tolerance: f64, best: &mut Option<(usize, f64)>) {
        let node = &self.nodes[idx];
        let dist = (node.point - p).norm();
        if dist <= tolerance && best.map_or(true, |(_, d)| dist < d) {
            *best = Some((idx, dist));
        }
        let delta = p[node.dim] - node.point[node.dim];
        if delta <= tolerance {
            if let Some(lo) = node.lo {
                self.search(lo, p, tolerance, best);
            }
        }
        if delta >= -tolerance {
            if let Some(hi) = node.hi {
                self.search(hi, p, tolerance, best);
            }
        }
    }

    fn insert(&mut self, p: Point3) -> PointId {
        let new_idx = self.nodes.len();
        let mut depth = 0;
        let mut cur = if self.nodes.is_empty() { None } else { Some(0) };
        while let Some(idx) = cur {
            depth += 1;
            let node = &mut self.nodes[idx];
            let go_lo = p[node.dim] < node.point[node.dim];
            let next = if go_lo { node.lo } else { node.hi };
            cur = match next {
                Some(next) => Some(next),
                None => {
                    if go_lo {
                        node.lo = Some(new_idx);
                    } else {
                        node.hi = Some(new_idx);
                    }
                    None
                }
            };
        }
        self.nodes.push(PointNode {
            point: p,
            dim: depth % 3,
            lo: None,
            hi: None,
        });
        PointId(new_idx)
    }

    /// Position of a stored point.
    pub fn point(&self, id: PointId) -> Option<Point3> {
        self.nodes.get(id.0).map(|n| n.point)
    }

    /// All stored points in insertion order.
    pub fn points(&self) -> impl Iterator<Item = Point3> + '_ {
        self.nodes.iter().map(|n| n.point)
    }

    /// Number of stored points.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Record that `edge` uses `point`.
    pub fn add_edge(&mut self, point: PointId, edge: EdgeId) {
        let list = self.edges.entry(point).or_default();
        if !list.contains(&edge) {
            list.push(edge);
        }
    }

    /// Edges recorded against `point`.
    pub fn edges(&self, point: PointId) -> &[EdgeId] {
        self.edges.get(&point).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welds_within_tolerance() {
        let mut tree = PointKdTree::new();
        let a = tree.nearest_neighbor(Point3::new(0.0, 0.0, 0.0), 1e-3);
        let b = tree.nearest_neighbor(Point3::new(1.0, 0.0, 0.0), 1e-3);
        let c = tree.nearest_neighbor(Point3::new(0.0005, 0.0, 0.0), 1e-3);
        assert_eq!(a, c);
        assert_ne!(a, b);
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_closest_of_several_candidates_wins() {
        let mut tree = PointKdTree::new();
        let a = tree.nearest_neighbor(Point3::new(0.0, 0.0, 0.0), 0.0);
        let b = tree.nearest_neighbor(Point3::new(0.3, 0.0, 0.0), 0.0);
        assert_ne!(a, b);
        assert_eq!(tree.nearest_neighbor(Point3::new(0.2, 0.0, 0.0), 0.5), b);
    }

    #[test]
    fn test_many_points_round_trip() {
        let mut tree = PointKdTree::new();
        let mut ids = Vec::new();
        for i in 0..10 {
            for j in 0..10 {
                ids.push(tree.nearest_neighbor(Point3::new(i as f64, j as f64, (i * j) as f64), 1e-6));
            }
        }
        assert_eq!(tree.len(), 100);
        for i in 0..10 {
            for j in 0..10 {
                let p = Point3::new(i as f64 + 1e-8, j as f64, (i * j) as f64);
                assert_eq!(tree.nearest_neighbor(p, 1e-6), ids[i * 10 + j]);
            }
        }
        assert_eq!(tree.len(), 100);
    }

    #[test]
    fn test_edge_side_table() {
        let mut tree = PointKdTree::new();
        let p = tree.nearest_neighbor(Point3::new(1.0, 2.0, 3.0), 1e-6);
        assert!(tree.edges(p).is_empty());
        tree.add_edge(p, EdgeId(4));
        tree.add_edge(p, EdgeId(4));
        tree.add_edge(p, EdgeId(7));
        assert_eq!(tree.edges(p), &[EdgeId(4), EdgeId(7)]);
    }
}
