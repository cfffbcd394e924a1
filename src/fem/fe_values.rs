use nalgebra::{Matrix2, Point2, Vector2};

use super::basis::Q1Basis;
use super::dof::DofHandler;
use super::mapping::BilinearMap;
use super::quadrature::GaussQuadrature;
use crate::mesh::Mesh;

/// Per-cell finite-element values: scalar Q1 shape functions, their
/// physical gradients and Laplacians, quadrature points and JxW weights.
///
/// `reinit` recomputes everything for one cell; the assembler reuses a
/// single instance across the cell loop. The Laplacians feed the strong
/// residual of the stabilization terms, so the mapping's second
/// derivative correction is included (it vanishes on parallelogram
/// cells).
#[derive(Debug, Clone)]
pub struct FeValues {
    quadrature: GaussQuadrature,
    q_points: Vec<Point2<f64>>,
    jxw: Vec<f64>,
    shape_values: Vec<[f64; 4]>,
    shape_gradients: Vec<[Vector2<f64>; 4]>,
    shape_laplacians: Vec<[f64; 4]>,
}

impl FeValues {
    pub fn new(quadrature: GaussQuadrature) -> Self {
        let n_q = quadrature.num_points();
        Self {
            quadrature,
            q_points: vec![Point2::origin(); n_q],
            jxw: vec![0.0; n_q],
            shape_values: vec![[0.0; 4]; n_q],
            shape_gradients: vec![[Vector2::zeros(); 4]; n_q],
            shape_laplacians: vec![[0.0; 4]; n_q],
        }
    }

    /// Recompute all tables for one cell.
    pub fn reinit(&mut self, mesh: &Mesh, cell: usize) {
        let map = BilinearMap::from_cell(mesh, cell);
        let mixed = map.mixed_derivative();

        for (q, xi) in self.quadrature.points.iter().enumerate() {
            let jac = map.jacobian(xi);
            let det = jac.determinant();
            debug_assert!(det > 0.0, "inverted cell {}", cell);
            let jac_inv = jac
                .try_inverse()
                .expect("cell mapping Jacobian is singular");

            self.q_points[q] = map.map(xi);
            self.jxw[q] = det.abs() * self.quadrature.weights[q];
            self.shape_values[q] = Q1Basis::shape_functions(xi);

            let ref_grads = Q1Basis::shape_gradients(xi);
            let ref_hessians = Q1Basis::shape_hessians(xi);
            for i in 0..4 {
                let grad_phys = jac_inv.transpose() * ref_grads[i];
                self.shape_gradients[q][i] = grad_phys;

                // H_x = J^-T (H_ref - sum_k d2x_k/dxi2 * dN/dx_k) J^-1
                let correction = Matrix2::new(
                    0.0,
                    mixed.x * grad_phys.x + mixed.y * grad_phys.y,
                    mixed.x * grad_phys.x + mixed.y * grad_phys.y,
                    0.0,
                );
                let h_phys =
                    jac_inv.transpose() * (ref_hessians[i] - correction) * jac_inv;
                self.shape_laplacians[q][i] = h_phys.trace();
            }
        }
    }

    pub fn n_q_points(&self) -> usize {
        self.quadrature.num_points()
    }

    pub fn jxw(&self, q: usize) -> f64 {
        self.jxw[q]
    }

    pub fn quadrature_point(&self, q: usize) -> &Point2<f64> {
        &self.q_points[q]
    }

    pub fn quadrature_points(&self) -> &[Point2<f64>] {
        &self.q_points
    }

    /// Scalar Q1 shape value of a vertex node at a quadrature point.
    pub fn shape_value(&self, node: usize, q: usize) -> f64 {
        self.shape_values[q][node]
    }

    /// Physical gradient of a vertex node's shape function.
    pub fn shape_gradient(&self, node: usize, q: usize) -> Vector2<f64> {
        self.shape_gradients[q][node]
    }

    /// Physical Laplacian of a vertex node's shape function.
    pub fn shape_laplacian(&self, node: usize, q: usize) -> f64 {
        self.shape_laplacians[q][node]
    }

    /// Interpolated velocity at every quadrature point.
    pub fn velocity_values(
        &self,
        mesh: &Mesh,
        dofh: &DofHandler,
        cell: usize,
        solution: &[f64],
    ) -> Vec<Vector2<f64>> {
        let verts = mesh.connectivity.quad_cells[cell].vertices;
        (0..self.n_q_points())
            .map(|q| {
                let mut u = Vector2::zeros();
                for (lv, &v) in verts.iter().enumerate() {
                    let n = self.shape_values[q][lv];
                    u.x += n * solution[dofh.velocity_dof(v, 0)];
                    u.y += n * solution[dofh.velocity_dof(v, 1)];
                }
                u
            })
            .collect()
    }

    /// Interpolated velocity gradient; entry (a, b) is du_a/dx_b.
    pub fn velocity_gradients(
        &self,
        mesh: &Mesh,
        dofh: &DofHandler,
        cell: usize,
        solution: &[f64],
    ) -> Vec<Matrix2<f64>> {
        let verts = mesh.connectivity.quad_cells[cell].vertices;
        (0..self.n_q_points())
            .map(|q| {
                let mut g = Matrix2::zeros();
                for (lv, &v) in verts.iter().enumerate() {
                    let grad = self.shape_gradients[q][lv];
                    let ux = solution[dofh.velocity_dof(v, 0)];
                    let uy = solution[dofh.velocity_dof(v, 1)];
                    g.m11 += ux * grad.x;
                    g.m12 += ux * grad.y;
                    g.m21 += uy * grad.x;
                    g.m22 += uy * grad.y;
                }
                g
            })
            .collect()
    }

    /// Interpolated velocity Laplacian.
    pub fn velocity_laplacians(
        &self,
        mesh: &Mesh,
        dofh: &DofHandler,
        cell: usize,
        solution: &[f64],
    ) -> Vec<Vector2<f64>> {
        let verts = mesh.connectivity.quad_cells[cell].vertices;
        (0..self.n_q_points())
            .map(|q| {
                let mut l = Vector2::zeros();
                for (lv, &v) in verts.iter().enumerate() {
                    let lap = self.shape_laplacians[q][lv];
                    l.x += lap * solution[dofh.velocity_dof(v, 0)];
                    l.y += lap * solution[dofh.velocity_dof(v, 1)];
                }
                l
            })
            .collect()
    }

    /// Interpolated pressure at every quadrature point.
    pub fn pressure_values(
        &self,
        mesh: &Mesh,
        dofh: &DofHandler,
        cell: usize,
        solution: &[f64],
    ) -> Vec<f64> {
        let verts = mesh.connectivity.quad_cells[cell].vertices;
        (0..self.n_q_points())
            .map(|q| {
                verts
                    .iter()
                    .enumerate()
                    .map(|(lv, &v)| self.shape_values[q][lv] * solution[dofh.pressure_dof(v)])
                    .sum()
            })
            .collect()
    }

    /// Interpolated pressure gradient at every quadrature point.
    pub fn pressure_gradients(
        &self,
        mesh: &Mesh,
        dofh: &DofHandler,
        cell: usize,
        solution: &[f64],
    ) -> Vec<Vector2<f64>> {
        let verts = mesh.connectivity.quad_cells[cell].vertices;
        (0..self.n_q_points())
            .map(|q| {
                let mut g = Vector2::zeros();
                for (lv, &v) in verts.iter().enumerate() {
                    g += self.shape_gradients[q][lv] * solution[dofh.pressure_dof(v)];
                }
                g
            })
            .collect()
    }
}

/// Velocity interpolated at an arbitrary reference point of a cell.
pub fn interpolate_velocity(
    mesh: &Mesh,
    dofh: &DofHandler,
    cell: usize,
    xi: &Point2<f64>,
    solution: &[f64],
) -> Vector2<f64> {
    let verts = mesh.connectivity.quad_cells[cell].vertices;
    let n = Q1Basis::shape_functions(xi);
    let mut u = Vector2::zeros();
    for (lv, &v) in verts.iter().enumerate() {
        u.x += n[lv] * solution[dofh.velocity_dof(v, 0)];
        u.y += n[lv] * solution[dofh.velocity_dof(v, 1)];
    }
    u
}

/// Pressure interpolated at an arbitrary reference point of a cell.
pub fn interpolate_pressure(
    mesh: &Mesh,
    dofh: &DofHandler,
    cell: usize,
    xi: &Point2<f64>,
    solution: &[f64],
) -> f64 {
    let verts = mesh.connectivity.quad_cells[cell].vertices;
    let n = Q1Basis::shape_functions(xi);
    verts
        .iter()
        .enumerate()
        .map(|(lv, &v)| n[lv] * solution[dofh.pressure_dof(v)])
        .sum()
}
