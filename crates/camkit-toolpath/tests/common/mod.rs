//! Shared test models.

#![allow(dead_code)]

use camkit_geom::{Model, Triangle};
use camkit_math::Point3;

/// Square plate from (0, 0) to (10, 10) at height `z`.
pub fn plane(z: f64) -> Model {
    Model::from_mesh(
        &[[0.0, 0.0, z], [10.0, 0.0, z], [10.0, 10.0, z], [0.0, 10.0, z]],
        &[0, 2, 1, 0, 3, 2],
    )
    .unwrap()
}

/// A 4 x 4 x 2 box on the XY plane, lower corner at the origin.
pub fn block() -> Model {
    let v = [
        [0.0, 0.0, 0.0],
        [4.0, 0.0, 0.0],
        [4.0, 4.0, 0.0],
        [0.0, 4.0, 0.0],
        [0.0, 0.0, 2.0],
        [4.0, 0.0, 2.0],
        [4.0, 4.0, 2.0],
        [0.0, 4.0, 2.0],
    ];
    let idx = [
        0, 1, 2, 0, 2, 3, 4, 6, 5, 4, 7, 6, 0, 4, 5, 0, 5, 1, 1, 5, 6, 1, 6, 2, 2, 6, 7, 2, 7, 3,
        3, 7, 4, 3, 4, 0,
    ];
    Model::from_mesh(&v, &idx).unwrap()
}

/// Faceted roof: a flat top triangle at z = 4 sloping down to an
/// irregular seven-point ring at z = 2.
pub fn roof() -> Model {
    let p = [
        Point3::new(-2.0, 1.0, 4.0),
        Point3::new(2.0, 1.0, 4.0),
        Point3::new(0.0, -2.0, 4.0),
        Point3::new(-5.0, 2.0, 2.0),
        Point3::new(-1.0, 3.0, 2.0),
        Point3::new(5.0, 2.0, 2.0),
        Point3::new(4.0, -1.0, 2.0),
        Point3::new(2.0, -4.0, 2.0),
        Point3::new(-2.0, -4.0, 2.0),
        Point3::new(-3.0, -2.0, 2.0),
    ];
    let faces = [
        (5, 4, 1),
        (4, 3, 0),
        (3, 9, 0),
        (9, 8, 2),
        (8, 7, 2),
        (7, 6, 2),
        (6, 5, 1),
        (4, 0, 1),
        (9, 2, 0),
        (6, 1, 2),
        (0, 1, 2),
    ];
    let triangles = faces
        .iter()
        .map(|&(a, b, c)| {
            let t = Triangle::new(p[a], p[b], p[c]).unwrap();
            if t.normal().z < 0.0 {
                Triangle::new(p[a], p[c], p[b]).unwrap()
            } else {
                t
            }
        })
        .collect();
    Model::from_triangles(triangles)
}
