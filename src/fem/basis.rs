use nalgebra::{Matrix2, Point2, Vector2};

/// Q1 (4-node bilinear quadrilateral) basis functions on the reference
/// cell [0,1]^2.
///
/// Node numbering matches `QuadCell`:
///   N0 at (0,0), N1 at (1,0), N2 at (0,1), N3 at (1,1)
///
/// Shape functions:
///   N0 = (1-x)(1-y)   N1 = x(1-y)   N2 = (1-x)y   N3 = xy
pub struct Q1Basis;

impl Q1Basis {
    pub const N_NODES: usize = 4;

    /// Evaluate all 4 shape functions at a reference point.
    pub fn shape_functions(p: &Point2<f64>) -> [f64; 4] {
        let (x, y) = (p.x, p.y);
        [
            (1.0 - x) * (1.0 - y),
            x * (1.0 - y),
            (1.0 - x) * y,
            x * y,
        ]
    }

    /// Reference-cell gradients [dN/dx, dN/dy] of all 4 shape functions.
    pub fn shape_gradients(p: &Point2<f64>) -> [Vector2<f64>; 4] {
        let (x, y) = (p.x, p.y);
        [
            Vector2::new(-(1.0 - y), -(1.0 - x)),
            Vector2::new(1.0 - y, -x),
            Vector2::new(-y, 1.0 - x),
            Vector2::new(y, x),
        ]
    }

    /// Reference-cell second derivatives of all 4 shape functions.
    ///
    /// A bilinear function has vanishing pure second derivatives; only
    /// the mixed derivative survives and is constant.
    pub fn shape_hessians(_p: &Point2<f64>) -> [Matrix2<f64>; 4] {
        [
            Matrix2::new(0.0, 1.0, 1.0, 0.0),
            Matrix2::new(0.0, -1.0, -1.0, 0.0),
            Matrix2::new(0.0, -1.0, -1.0, 0.0),
            Matrix2::new(0.0, 1.0, 1.0, 0.0),
        ]
    }
}
