//! Measures of simplices produced by side decomposition.
//!
//! Vertices are `[x, y, z]` triples; 2D callers leave `z` at zero.
//! - Triangle: signed area in the xy-plane, positive for counter-clockwise
//!   winding.
//! - Tetrahedron: unsigned volume.

use crate::mesh_error::MeshError;

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Signed area of the triangle `(a, b, c)` projected on the xy-plane.
pub fn triangle_area_signed(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    0.5 * (a[0] * (b[1] - c[1]) + b[0] * (c[1] - a[1]) + c[0] * (a[1] - b[1]))
}

/// Unsigned volume of the tetrahedron `(a, b, c, d)`.
pub fn tet_volume(a: [f64; 3], b: [f64; 3], c: [f64; 3], d: [f64; 3]) -> f64 {
    dot(sub(a, d), cross(sub(b, d), sub(c, d))).abs() / 6.0
}

/// Measure of a side simplex of a `dim`-dimensional decomposition.
///
/// Triangles (`dim == 2`) report their signed area, tetrahedra
/// (`dim == 3`) their volume.
pub fn side_measure(dim: usize, vertices: &[[f64; 3]]) -> Result<f64, MeshError> {
    match (dim, vertices) {
        (2, &[a, b, c]) => Ok(triangle_area_signed(a, b, c)),
        (3, &[a, b, c, d]) => Ok(tet_volume(a, b, c, d)),
        (2 | 3, _) => Err(MeshError::InvalidGeometry(format!(
            "vertex count mismatch: expected {}, got {}",
            dim + 1,
            vertices.len()
        ))),
        _ => Err(MeshError::UnsupportedOperation(format!(
            "side measure in {dim} dimensions"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn triangle_area_sign_follows_winding() {
        let a = [0.0, 0.0, 0.0];
        let b = [1.0, 0.0, 0.0];
        let c = [0.0, 1.0, 0.0];
        assert_relative_eq!(triangle_area_signed(a, b, c), 0.5);
        assert_relative_eq!(triangle_area_signed(a, c, b), -0.5);
    }

    #[test]
    fn unit_tet_volume() {
        let v = tet_volume(
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        );
        assert_relative_eq!(v, 1.0 / 6.0);
        let w = tet_volume(
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
        );
        assert_relative_eq!(w, 1.0 / 6.0);
    }

    #[test]
    fn side_measure_checks_arity() {
        let tri = [[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
        assert_relative_eq!(side_measure(2, &tri).unwrap(), 2.0);
        assert!(matches!(
            side_measure(3, &tri),
            Err(MeshError::InvalidGeometry(_))
        ));
        assert!(matches!(
            side_measure(1, &tri[..2]),
            Err(MeshError::UnsupportedOperation(_))
        ));
    }
}
