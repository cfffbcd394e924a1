use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};
use rayon::prelude::*;
use sprs::CsMat;

use super::functions::FlowFunction;
use crate::fem::dof::{DofHandler, COMPONENTS, DIM, DOFS_PER_CELL};
use crate::fem::{ConstraintSet, FeValues, GaussQuadrature};
use crate::linalg::sparse;
use crate::mesh::Mesh;

/// GLS-stabilized assembler for the steady incompressible Navier-Stokes
/// residual and Jacobian on Q1/Q1 elements.
///
/// The PSPG branch of the stabilization is always active; it is what
/// makes the equal-order pair stable. The SUPG/Jacobian-completeness
/// branch is a configuration choice; results with and without it
/// differ quantitatively.
pub struct GlsAssembler<'a> {
    mesh: &'a Mesh,
    dofh: &'a DofHandler,
    viscosity: f64,
    supg: bool,
}

/// Per-dof shape data at one quadrature point, in the mixed-element view:
/// local dof l carries component l % 3 of the Q1 function of vertex l / 3.
struct ShapeData {
    phi_u: [Vector2<f64>; DOFS_PER_CELL],
    grad_phi_u: [Matrix2<f64>; DOFS_PER_CELL],
    div_phi_u: [f64; DOFS_PER_CELL],
    lap_phi_u: [Vector2<f64>; DOFS_PER_CELL],
    phi_p: [f64; DOFS_PER_CELL],
    grad_phi_p: [Vector2<f64>; DOFS_PER_CELL],
}

impl ShapeData {
    fn at_quadrature_point(fe: &FeValues, q: usize) -> Self {
        let mut data = Self {
            phi_u: [Vector2::zeros(); DOFS_PER_CELL],
            grad_phi_u: [Matrix2::zeros(); DOFS_PER_CELL],
            div_phi_u: [0.0; DOFS_PER_CELL],
            lap_phi_u: [Vector2::zeros(); DOFS_PER_CELL],
            phi_p: [0.0; DOFS_PER_CELL],
            grad_phi_p: [Vector2::zeros(); DOFS_PER_CELL],
        };
        for k in 0..DOFS_PER_CELL {
            let vertex = DofHandler::local_vertex(k);
            let comp = DofHandler::local_component(k);
            let value = fe.shape_value(vertex, q);
            let grad = fe.shape_gradient(vertex, q);
            let lap = fe.shape_laplacian(vertex, q);
            if comp < DIM {
                data.phi_u[k][comp] = value;
                data.grad_phi_u[k].set_row(comp, &grad.transpose());
                data.div_phi_u[k] = grad[comp];
                data.lap_phi_u[k][comp] = lap;
            } else {
                data.phi_p[k] = value;
                data.grad_phi_p[k] = grad;
            }
        }
        data
    }
}

impl<'a> GlsAssembler<'a> {
    pub fn new(mesh: &'a Mesh, dofh: &'a DofHandler, viscosity: f64, supg: bool) -> Self {
        Self {
            mesh,
            dofh,
            viscosity,
            supg,
        }
    }

    /// Gauss rule of order element degree + 2.
    pub fn quadrature() -> GaussQuadrature {
        GaussQuadrature::tensor(3)
    }

    /// Assemble the Jacobian and residual at `evaluation_point`.
    pub fn assemble_system(
        &self,
        evaluation_point: &[f64],
        forcing: &dyn FlowFunction,
        constraints: &ConstraintSet,
        matrix: &mut CsMat<f64>,
        rhs: &mut [f64],
    ) {
        sparse::zero_values(matrix);
        rhs.fill(0.0);

        let mut fe = FeValues::new(Self::quadrature());
        for cell in 0..self.mesh.num_cells() {
            fe.reinit(self.mesh, cell);
            let (local_matrix, local_rhs) =
                self.cell_contribution(&fe, cell, evaluation_point, forcing, true);
            let dofs = self
                .dofh
                .cell_dof_indices(&self.mesh.connectivity.quad_cells[cell]);
            constraints.distribute_local_to_global(
                &local_matrix,
                &local_rhs,
                &dofs,
                matrix,
                rhs,
            );
        }
    }

    /// Assemble the residual only.
    pub fn assemble_rhs(
        &self,
        evaluation_point: &[f64],
        forcing: &dyn FlowFunction,
        constraints: &ConstraintSet,
        rhs: &mut [f64],
    ) {
        rhs.fill(0.0);

        let mut fe = FeValues::new(Self::quadrature());
        for cell in 0..self.mesh.num_cells() {
            fe.reinit(self.mesh, cell);
            let (_, local_rhs) =
                self.cell_contribution(&fe, cell, evaluation_point, forcing, false);
            let dofs = self
                .dofh
                .cell_dof_indices(&self.mesh.connectivity.quad_cells[cell]);
            constraints.distribute_local_rhs(&local_rhs, &dofs, rhs);
        }
    }

    /// Parallel variant of `assemble_system`: cell contributions are
    /// computed concurrently, the scatter stays serial. Produces the
    /// same system as the serial path.
    pub fn assemble_system_parallel(
        &self,
        evaluation_point: &[f64],
        forcing: &(dyn FlowFunction + Sync),
        constraints: &ConstraintSet,
        matrix: &mut CsMat<f64>,
        rhs: &mut [f64],
    ) {
        sparse::zero_values(matrix);
        rhs.fill(0.0);

        let contributions: Vec<(usize, DMatrix<f64>, DVector<f64>)> = (0..self.mesh.num_cells())
            .into_par_iter()
            .map(|cell| {
                let mut fe = FeValues::new(Self::quadrature());
                fe.reinit(self.mesh, cell);
                let (local_matrix, local_rhs) =
                    self.cell_contribution(&fe, cell, evaluation_point, forcing, true);
                (cell, local_matrix, local_rhs)
            })
            .collect();

        for (cell, local_matrix, local_rhs) in contributions {
            let dofs = self
                .dofh
                .cell_dof_indices(&self.mesh.connectivity.quad_cells[cell]);
            constraints.distribute_local_to_global(
                &local_matrix,
                &local_rhs,
                &dofs,
                matrix,
                rhs,
            );
        }
    }

    /// Local Galerkin + GLS contribution of one cell, linearized about
    /// the interpolated `evaluation_point`.
    fn cell_contribution(
        &self,
        fe: &FeValues,
        cell: usize,
        evaluation_point: &[f64],
        forcing: &dyn FlowFunction,
        build_matrix: bool,
    ) -> (DMatrix<f64>, DVector<f64>) {
        let nu = self.viscosity;
        let mut local_matrix = DMatrix::zeros(DOFS_PER_CELL, DOFS_PER_CELL);
        let mut local_rhs = DVector::zeros(DOFS_PER_CELL);

        let velocity = fe.velocity_values(self.mesh, self.dofh, cell, evaluation_point);
        let velocity_gradient =
            fe.velocity_gradients(self.mesh, self.dofh, cell, evaluation_point);
        let velocity_laplacian =
            fe.velocity_laplacians(self.mesh, self.dofh, cell, evaluation_point);
        let pressure = fe.pressure_values(self.mesh, self.dofh, cell, evaluation_point);
        let pressure_gradient =
            fe.pressure_gradients(self.mesh, self.dofh, cell, evaluation_point);

        let mut force_values = vec![[0.0; COMPONENTS]; fe.n_q_points()];
        forcing.vector_value_list(fe.quadrature_points(), &mut force_values);

        // diameter of the circle of equal area
        let h = (4.0 * self.mesh.cell_measure(cell) / PI).sqrt();

        for q in 0..fe.n_q_points() {
            let jxw = fe.jxw(q);
            let u = velocity[q];
            let grad_u = velocity_gradient[q];
            let u_mag = u.norm().max(1e-12);
            let tau = 1.0
                / ((2.0 * u_mag / h).powi(2) + 9.0 * (4.0 * nu / (h * h)).powi(2)).sqrt();

            let shapes = ShapeData::at_quadrature_point(fe, q);
            let force = Vector2::new(force_values[q][0], force_values[q][1]);

            let strong_residual =
                grad_u * u + pressure_gradient[q] - nu * velocity_laplacian[q] - force;

            if build_matrix {
                for j in 0..DOFS_PER_CELL {
                    let strong_jac = grad_u * shapes.phi_u[j]
                        + shapes.grad_phi_u[j] * u
                        + shapes.grad_phi_p[j]
                        - nu * shapes.lap_phi_u[j];

                    for i in 0..DOFS_PER_CELL {
                        local_matrix[(i, j)] += (nu
                            * shapes.grad_phi_u[j].dot(&shapes.grad_phi_u[i])
                            + (grad_u * shapes.phi_u[j]).dot(&shapes.phi_u[i])
                            + (shapes.grad_phi_u[j] * u).dot(&shapes.phi_u[i])
                            - shapes.div_phi_u[i] * shapes.phi_p[j]
                            + shapes.phi_p[i] * shapes.div_phi_u[j])
                            * jxw;

                        // PSPG
                        local_matrix[(i, j)] +=
                            tau * strong_jac.dot(&shapes.grad_phi_p[i]) * jxw;

                        if self.supg {
                            local_matrix[(i, j)] += tau
                                * (strong_jac.dot(&(shapes.grad_phi_u[i] * u))
                                    + strong_residual
                                        .dot(&(shapes.grad_phi_u[i] * shapes.phi_u[j])))
                                * jxw;
                        }
                    }
                }
            }

            let divergence = grad_u.trace();
            for i in 0..DOFS_PER_CELL {
                local_rhs[i] += (-nu * grad_u.dot(&shapes.grad_phi_u[i])
                    - (grad_u * u).dot(&shapes.phi_u[i])
                    + pressure[q] * shapes.div_phi_u[i]
                    - divergence * shapes.phi_p[i]
                    + force.dot(&shapes.phi_u[i]))
                    * jxw;

                // PSPG
                local_rhs[i] -= tau * strong_residual.dot(&shapes.grad_phi_p[i]) * jxw;

                if self.supg {
                    local_rhs[i] -=
                        tau * strong_residual.dot(&(shapes.grad_phi_u[i] * u)) * jxw;
                }
            }
        }

        (local_matrix, local_rhs)
    }
}
