//! Triangle models with a lazily built spatial index.

use std::sync::OnceLock;

use camkit_math::{Point3, Transform};
use tracing::{debug, warn};

use crate::bounds::{Aabb3, Bounds2};
use crate::error::{GeometryError, Result};
use crate::kdtree::{IndexSettings, TriangleKdTree};
use crate::triangle::Triangle;

/// An appendable triangle collection.
///
/// The aggregate bounds grow with every append and are recomputed from
/// scratch after a transform. The XY kd-tree is built on first use and
/// dropped whenever the triangle set changes.
#[derive(Debug, Clone, Default)]
pub struct Model {
    triangles: Vec<Triangle>,
    bounds: Aabb3,
    settings: IndexSettings,
    rejected: usize,
    index: OnceLock<TriangleKdTree>,
}

impl Model {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a model from already validated triangles.
    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        let mut model = Self::new();
        model.extend(triangles);
        model
    }

    /// Build a model from an indexed triangle mesh.
    ///
    /// Degenerate triangles are skipped with a warning and counted in
    /// [`Model::rejected`]; malformed buffers are an error.
    pub fn from_mesh(vertices: &[[f64; 3]], indices: &[u32]) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(GeometryError::InvalidMesh(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }

        let mut model = Self::new();
        for (n, chunk) in indices.chunks_exact(3).enumerate() {
            let mut p = [Point3::origin(); 3];
            for (slot, &i) in p.iter_mut().zip(chunk) {
                let v = vertices
                    .get(i as usize)
                    .ok_or(GeometryError::IndexOutOfRange {
                        index: i as usize,
                        len: vertices.len(),
                    })?;
                *slot = Point3::new(v[0], v[1], v[2]);
            }
            match Triangle::new(p[0], p[1], p[2]) {
                Ok(t) => model.append(t),
                Err(err) => {
                    warn!(triangle = n, %err, "skipping degenerate triangle");
                    model.rejected += 1;
                }
            }
        }
        debug!(
            triangles = model.len(),
            rejected = model.rejected,
            "model built from mesh"
        );
        Ok(model)
    }

    /// Use different bucket limits for the spatial index.
    pub fn with_index_settings(mut self, settings: IndexSettings) -> Result<Self> {
        settings.validate()?;
        self.settings = settings;
        self.index = OnceLock::new();
        Ok(self)
    }

    /// Append one triangle.
    pub fn append(&mut self, triangle: Triangle) {
        self.bounds.union(triangle.bounds());
        self.triangles.push(triangle);
        self.index = OnceLock::new();
    }

    /// Append many triangles.
    pub fn extend(&mut self, triangles: impl IntoIterator<Item = Triangle>) {
        for t in triangles {
            self.bounds.union(t.bounds());
            self.triangles.push(t);
        }
        self.index = OnceLock::new();
    }

    /// All triangles, in insertion order.
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Triangle by index.
    pub fn triangle(&self, idx: usize) -> Option<&Triangle> {
        self.triangles.get(idx)
    }

    /// Triangles whose XY bounds overlap `range`, via the spatial index.
    pub fn triangles_in(&self, range: &Bounds2) -> impl Iterator<Item = &Triangle> + '_ {
        self.index()
            .query(range)
            .into_iter()
            .map(move |i| &self.triangles[i])
    }

    /// Aggregate bounds (empty for an empty model).
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// Number of triangles.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// True if the model has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Degenerate triangles skipped by [`Model::from_mesh`].
    pub fn rejected(&self) -> usize {
        self.rejected
    }

    /// The XY spatial index, built on first use.
    pub fn index(&self) -> &TriangleKdTree {
        self.index
            .get_or_init(|| TriangleKdTree::build(&self.triangles, &self.settings))
    }

    /// True if the spatial index is currently built.
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Transform every triangle in place.
    ///
    /// Fails, leaving the model untouched, if the transform collapses a
    /// triangle.
    pub fn transform(&mut self, t: &Transform) -> Result<()> {
        let moved = self
            .triangles
            .iter()
            .map(|tri| tri.transformed(t))
            .collect::<Result<Vec<_>>>()?;
        self.bounds = Aabb3::empty();
        for tri in &moved {
            self.bounds.union(tri.bounds());
        }
        self.triangles = moved;
        self.index = OnceLock::new();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_mesh() -> (Vec<[f64; 3]>, Vec<u32>) {
        let v = vec![
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
        ];
        (v, vec![0, 2, 1, 0, 3, 2])
    }

    #[test]
    fn test_from_mesh_bounds() {
        let (v, i) = quad_mesh();
        let m = Model::from_mesh(&v, &i).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.bounds().min, [0.0, 0.0, 0.0]);
        assert_eq!(m.bounds().max, [10.0, 10.0, 0.0]);
        assert!(m.triangles().iter().all(|t| t.normal().z > 0.0));
    }

    #[test]
    fn test_from_mesh_skips_degenerates() {
        let (mut v, mut i) = quad_mesh();
        v.push([20.0, 0.0, 0.0]);
        i.extend([0, 1, 4]);
        let m = Model::from_mesh(&v, &i).unwrap();
        assert_eq!(m.len(), 2);
        assert_eq!(m.rejected(), 1);
    }

    #[test]
    fn test_from_mesh_rejects_bad_buffers() {
        let (v, _) = quad_mesh();
        assert!(matches!(
            Model::from_mesh(&v, &[0, 1]),
            Err(GeometryError::InvalidMesh(_))
        ));
        assert!(matches!(
            Model::from_mesh(&v, &[0, 1, 9]),
            Err(GeometryError::IndexOutOfRange { index: 9, len: 4 })
        ));
    }

    #[test]
    fn test_index_invalidated_on_append() {
        let (v, i) = quad_mesh();
        let mut m = Model::from_mesh(&v, &i).unwrap();
        assert_eq!(m.index().len(), 2);
        assert!(m.is_indexed());
        let t = Triangle::new(
            Point3::new(20.0, 0.0, 1.0),
            Point3::new(20.0, 5.0, 1.0),
            Point3::new(25.0, 0.0, 1.0),
        )
        .unwrap();
        m.append(t);
        assert!(!m.is_indexed());
        assert_eq!(m.index().len(), 3);
        assert_eq!(m.bounds().max[0], 25.0);
        let hits: Vec<_> = m
            .triangles_in(&Bounds2::new([19.0, 0.0], [21.0, 1.0]))
            .collect();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_transform_resets_bounds_and_index() {
        let (v, i) = quad_mesh();
        let mut m = Model::from_mesh(&v, &i).unwrap();
        m.index();
        m.transform(&Transform::translation(5.0, 0.0, 2.0)).unwrap();
        assert!(!m.is_indexed());
        assert_eq!(m.bounds().min, [5.0, 0.0, 2.0]);
        assert_eq!(m.bounds().max, [15.0, 10.0, 2.0]);

        m.transform(&Transform::scale(-1.0, 1.0, 1.0)).unwrap();
        assert!(m.triangles().iter().all(|t| t.normal().z > 0.0));
        assert_eq!(m.bounds().min[0], -15.0);
    }

    #[test]
    fn test_collapsing_transform_is_rejected() {
        let (v, i) = quad_mesh();
        let mut m = Model::from_mesh(&v, &i).unwrap();
        assert!(m.transform(&Transform::scale(1.0, 0.0, 1.0)).is_err());
        assert_eq!(m.bounds().max, [10.0, 10.0, 0.0]);
    }
}
