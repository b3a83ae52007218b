//! Triangles with their derived quantities computed once.

use camkit_math::{Point2, Point3, Tolerance, Transform, Vec3};

use crate::bounds::{Aabb3, Bounds2};
use crate::error::{GeometryError, Result};
use crate::line::Line;
use crate::plane::Plane;

/// A model triangle.
///
/// Vertices are clockwise when viewed along the outward normal, so the
/// normal is `(p3 - p1) x (p2 - p1)`, normalized. Everything derived from
/// the vertices is computed in [`Triangle::new`]; there is no way to
/// mutate a triangle in place, so nothing cached can go stale. Transforms
/// build a new triangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    p: [Point3; 3],
    normal: Vec3,
    bounds: Aabb3,
    centroid: Point3,
    circle_center: Point3,
    circle_radius: f64,
}

impl Triangle {
    /// Build a triangle, rejecting collinear or coincident vertices.
    pub fn new(p1: Point3, p2: Point3, p3: Point3) -> Result<Self> {
        Self::with_tolerance(p1, p2, p3, &Tolerance::DEFAULT)
    }

    /// Build a triangle with explicit tolerances.
    pub fn with_tolerance(p1: Point3, p2: Point3, p3: Point3, tol: &Tolerance) -> Result<Self> {
        if tol.points_equal(&p1, &p2) || tol.points_equal(&p2, &p3) || tol.points_equal(&p3, &p1) {
            return Err(GeometryError::DegenerateTriangle {
                reason: format!("duplicate vertex in ({p1}, {p2}, {p3})"),
            });
        }

        let cross = (p3 - p1).cross(&(p2 - p1));
        let len_sq = cross.norm_squared();
        if len_sq <= tol.area {
            return Err(GeometryError::DegenerateTriangle {
                reason: format!("collinear vertices ({p1}, {p2}, {p3})"),
            });
        }
        let normal = cross / len_sq.sqrt();

        let mut bounds = Aabb3::empty();
        for p in [&p1, &p2, &p3] {
            bounds.include_point(p);
        }

        let centroid = Point3::from((p1.coords + p2.coords + p3.coords) / 3.0);

        // Circumcenter offset from p1: ((|a|^2 b - |b|^2 a) x (a x b)) / (2 |a x b|^2).
        let a = p2 - p1;
        let b = p3 - p1;
        let axb = a.cross(&b);
        let to_center =
            (b * a.norm_squared() - a * b.norm_squared()).cross(&axb) / (2.0 * axb.norm_squared());
        let circle_center = p1 + to_center;
        let circle_radius = to_center.norm();

        Ok(Self {
            p: [p1, p2, p3],
            normal,
            bounds,
            centroid,
            circle_center,
            circle_radius,
        })
    }

    /// First vertex.
    pub fn p1(&self) -> Point3 {
        self.p[0]
    }

    /// Second vertex.
    pub fn p2(&self) -> Point3 {
        self.p[1]
    }

    /// Third vertex.
    pub fn p3(&self) -> Point3 {
        self.p[2]
    }

    /// All three vertices.
    pub fn vertices(&self) -> &[Point3; 3] {
        &self.p
    }

    /// Unit normal, consistent with the vertex winding.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// The supporting plane.
    pub fn plane(&self) -> Plane {
        Plane {
            point: self.p[0],
            normal: self.normal,
        }
    }

    /// The three edges `p1->p2`, `p2->p3`, `p3->p1`.
    pub fn edges(&self) -> [Line; 3] {
        [
            Line::new(self.p[0], self.p[1]),
            Line::new(self.p[1], self.p[2]),
            Line::new(self.p[2], self.p[0]),
        ]
    }

    /// Axis-aligned bounding box.
    pub fn bounds(&self) -> &Aabb3 {
        &self.bounds
    }

    /// XY projection of the bounding box.
    pub fn bounds_xy(&self) -> Bounds2 {
        self.bounds.xy()
    }

    /// Lowest vertex Z.
    pub fn min_z(&self) -> f64 {
        self.bounds.min[2]
    }

    /// Highest vertex Z.
    pub fn max_z(&self) -> f64 {
        self.bounds.max[2]
    }

    /// Centroid.
    pub fn centroid(&self) -> Point3 {
        self.centroid
    }

    /// Center of the circumscribed circle.
    pub fn circle_center(&self) -> Point3 {
        self.circle_center
    }

    /// Radius of the circumscribed circle.
    pub fn circle_radius(&self) -> f64 {
        self.circle_radius
    }

    /// Barycentric containment test for a point on (or near) the plane.
    pub fn contains_point(&self, p: &Point3) -> bool {
        let v0 = self.p[2] - self.p[0];
        let v1 = self.p[1] - self.p[0];
        let v2 = p - self.p[0];
        let dot00 = v0.dot(&v0);
        let dot01 = v0.dot(&v1);
        let dot02 = v0.dot(&v2);
        let dot11 = v1.dot(&v1);
        let dot12 = v1.dot(&v2);
        let denom = dot00 * dot11 - dot01 * dot01;
        if denom.abs() < 1e-18 {
            return false;
        }
        let u = (dot11 * dot02 - dot01 * dot12) / denom;
        let v = (dot00 * dot12 - dot01 * dot02) / denom;
        let eps = -1e-9;
        u >= eps && v >= eps && u + v <= 1.0 - eps
    }

    /// Containment test in the XY projection.
    pub fn contains_xy(&self, q: &Point2) -> bool {
        let a = Point2::new(self.p[0].x, self.p[0].y);
        let b = Point2::new(self.p[1].x, self.p[1].y);
        let c = Point2::new(self.p[2].x, self.p[2].y);
        let d1 = camkit_math::cross2(&(b - a), &(q - a));
        let d2 = camkit_math::cross2(&(c - b), &(q - b));
        let d3 = camkit_math::cross2(&(a - c), &(q - c));
        let eps = 1e-12;
        let has_neg = d1 < -eps || d2 < -eps || d3 < -eps;
        let has_pos = d1 > eps || d2 > eps || d3 > eps;
        !(has_neg && has_pos)
    }

    /// Height of the supporting plane above `(x, y)`; `None` for vertical triangles.
    pub fn z_at_xy(&self, x: f64, y: f64) -> Option<f64> {
        if self.normal.z.abs() < 1e-12 {
            return None;
        }
        let p = self.p[0];
        Some(p.z - (self.normal.x * (x - p.x) + self.normal.y * (y - p.y)) / self.normal.z)
    }

    /// A transformed copy. Mirroring transforms swap two vertices so the
    /// normal still points outward.
    pub fn transformed(&self, t: &Transform) -> Result<Self> {
        let [a, b, c] = self.p.map(|p| t.apply_point(&p));
        if t.is_mirroring() {
            Self::new(a, c, b)
        } else {
            Self::new(a, b, c)
        }
    }
}
