use nalgebra::{Matrix2, Point2, Vector2};

use super::basis::Q1Basis;
use crate::mesh::Mesh;

/// The Newton iteration for the inverse bilinear map did not converge.
///
/// Callers searching candidate cells for a point treat this as "not in
/// this cell" and move on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InverseMapError;

/// Bilinear reference-to-physical map of a single quadrilateral cell,
/// x(xi) = sum_i N_i(xi) v_i.
#[derive(Debug, Clone)]
pub struct BilinearMap {
    vertices: [Point2<f64>; 4],
}

impl BilinearMap {
    const MAX_NEWTON_ITERATIONS: usize = 20;
    const NEWTON_TOLERANCE: f64 = 1e-13;
    /// Reference coordinates this close to the unit-cell bounds are
    /// snapped onto them, so containment checks see exact zeros.
    const SNAP_TOLERANCE: f64 = 1e-12;

    pub fn new(vertices: [Point2<f64>; 4]) -> Self {
        Self { vertices }
    }

    pub fn from_cell(mesh: &Mesh, cell: usize) -> Self {
        Self::new(mesh.cell_vertices(cell))
    }

    /// Map a reference point to physical coordinates.
    pub fn map(&self, xi: &Point2<f64>) -> Point2<f64> {
        let n = Q1Basis::shape_functions(xi);
        let mut x = Vector2::zeros();
        for i in 0..4 {
            x += n[i] * self.vertices[i].coords;
        }
        Point2::from(x)
    }

    /// Jacobian dx/dxi at a reference point. Column j holds dx/dxi_j.
    pub fn jacobian(&self, xi: &Point2<f64>) -> Matrix2<f64> {
        let grads = Q1Basis::shape_gradients(xi);
        let mut j = Matrix2::zeros();
        for i in 0..4 {
            j.column_mut(0).axpy(grads[i].x, &self.vertices[i].coords, 1.0);
            j.column_mut(1).axpy(grads[i].y, &self.vertices[i].coords, 1.0);
        }
        j
    }

    /// Constant mixed derivative d^2 x / (dxi deta) of the bilinear map.
    /// Zero exactly when the cell is a parallelogram.
    pub fn mixed_derivative(&self) -> Vector2<f64> {
        self.vertices[0].coords - self.vertices[1].coords - self.vertices[2].coords
            + self.vertices[3].coords
    }

    /// Invert the map by Newton iteration: find xi with x(xi) = p.
    ///
    /// Coordinates within a tight tolerance of the unit-cell bounds are
    /// snapped onto them. Non-convergence and singular Jacobians report
    /// `InverseMapError`.
    pub fn inverse_map(&self, p: &Point2<f64>) -> Result<Point2<f64>, InverseMapError> {
        let mut xi = Point2::new(0.5, 0.5);
        for _ in 0..Self::MAX_NEWTON_ITERATIONS {
            let residual = p - self.map(&xi);
            if residual.norm() < Self::NEWTON_TOLERANCE {
                return Ok(Self::snap(xi));
            }
            let j = self.jacobian(&xi);
            let delta = j.lu().solve(&residual).ok_or(InverseMapError)?;
            xi += delta;
            // Bilinear maps of convex quads are invertible near the cell;
            // a wildly diverging iterate means p is far outside.
            if xi.coords.norm() > 1e3 {
                return Err(InverseMapError);
            }
        }
        Err(InverseMapError)
    }

    fn snap(mut xi: Point2<f64>) -> Point2<f64> {
        for c in 0..2 {
            if (xi[c]).abs() < Self::SNAP_TOLERANCE {
                xi[c] = 0.0;
            }
            if (xi[c] - 1.0).abs() < Self::SNAP_TOLERANCE {
                xi[c] = 1.0;
            }
        }
        xi
    }
}

/// Distance from a reference point to the unit cell [0,1]^2 in the
/// max norm; zero exactly when the point lies inside or on the boundary.
pub fn distance_to_unit_cell(xi: &Point2<f64>) -> f64 {
    let mut dist = 0.0_f64;
    for c in 0..2 {
        dist = dist.max(-xi[c]).max(xi[c] - 1.0);
    }
    dist.max(0.0)
}

/// Locate the cell containing a physical point and the point's reference
/// coordinates within it.
///
/// Linear scan with a bounding-box rejection; the traction integrator
/// calls this for a handful of sampling points per evaluation.
pub fn find_cell_around_point(mesh: &Mesh, p: &Point2<f64>) -> Option<(usize, Point2<f64>)> {
    for cell in 0..mesh.num_cells() {
        let v = mesh.cell_vertices(cell);
        let pad = 1e-12;
        let (min_x, max_x) = v
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), q| {
                (lo.min(q.x), hi.max(q.x))
            });
        let (min_y, max_y) = v
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), q| {
                (lo.min(q.y), hi.max(q.y))
            });
        if p.x < min_x - pad || p.x > max_x + pad || p.y < min_y - pad || p.y > max_y + pad {
            continue;
        }
        let map = BilinearMap::from_cell(mesh, cell);
        if let Ok(xi) = map.inverse_map(p) {
            if distance_to_unit_cell(&xi) == 0.0 {
                return Some((cell, xi));
            }
        }
    }
    None
}
