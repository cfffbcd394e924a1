use log::{debug, warn};
use nalgebra::Point2;
use sprs::CsMat;

use super::surface::ImmersedCircle;
use crate::fem::basis::Q1Basis;
use crate::fem::dof::{DofHandler, COMPONENTS, DIM, DOFS_PER_CELL};
use crate::fem::mapping::{distance_to_unit_cell, BilinearMap};
use crate::linalg::sparse;
use crate::mesh::{Mesh, VertexCellIndex};

/// Sharp-edge immersed-boundary overrider.
///
/// Runs after assembly and before the linear solve, rewriting the
/// equation of every velocity dof in a cut cell into a three-point
/// Dirichlet stencil: the prescribed value at the surface projection,
/// the dof itself, and an interpolated value at the collinear point one
/// projection distance beyond the dof. Pressure rows are never touched.
///
/// Rows are scaled by the post-assembly diagonal entry so the rewritten
/// equations keep the magnitude of their neighbors; the caller hands in
/// that diagonal snapshot, which also makes a repeated application
/// reproduce the same system bit for bit.
pub struct SharpEdgeOverrider<'a> {
    mesh: &'a Mesh,
    dofh: &'a DofHandler,
    vertex_cells: &'a VertexCellIndex,
    surfaces: &'a [ImmersedCircle],
}

impl<'a> SharpEdgeOverrider<'a> {
    pub fn new(
        mesh: &'a Mesh,
        dofh: &'a DofHandler,
        vertex_cells: &'a VertexCellIndex,
        surfaces: &'a [ImmersedCircle],
    ) -> Self {
        Self {
            mesh,
            dofh,
            vertex_cells,
            surfaces,
        }
    }

    /// Whether a cell is cut by the given surface: its dofs sit on both
    /// sides.
    pub fn is_cut(&self, cell: usize, surface: &ImmersedCircle) -> bool {
        let dofs = self
            .dofh
            .cell_dof_indices(&self.mesh.connectivity.quad_cells[cell]);
        let inside = dofs
            .iter()
            .filter(|&&d| surface.is_inside(self.dofh.support_point(d)))
            .count();
        inside != 0 && inside != DOFS_PER_CELL
    }

    /// Cells cut by any surface.
    pub fn cut_cells(&self) -> Vec<usize> {
        (0..self.mesh.num_cells())
            .filter(|&c| self.surfaces.iter().any(|s| self.is_cut(c, s)))
            .collect()
    }

    /// Rewrite the rows of all cut-cell velocity dofs in `(matrix, rhs)`.
    ///
    /// `reference_diagonal` is the post-assembly matrix diagonal; on the
    /// initial Newton step the rhs carries the prescribed surface value,
    /// afterwards the first iterate has absorbed it and the rhs is zero.
    /// Returns the rewritten row indices, sorted and deduplicated.
    pub fn apply(
        &self,
        matrix: &mut CsMat<f64>,
        rhs: &mut [f64],
        reference_diagonal: &[f64],
        initial_step: bool,
    ) -> Vec<usize> {
        let mut rows = Vec::new();
        // one full pass per surface; a later surface may re-target rows
        // rewritten by an earlier one
        for surface in self.surfaces {
            for cell in 0..self.mesh.num_cells() {
                if !self.is_cut(cell, surface) {
                    continue;
                }
                self.override_cell(
                    cell,
                    surface,
                    matrix,
                    rhs,
                    reference_diagonal,
                    initial_step,
                    &mut rows,
                );
            }
        }
        rows.sort_unstable();
        rows.dedup();
        debug!("sharp-edge override rewrote {} rows", rows.len());
        rows
    }

    /// Residual-only form for reassemblies during the line search: the
    /// overridden equations have zero rhs on every step after the first,
    /// so the residual norm is measured on the same equation set the
    /// matrix solves.
    pub fn apply_rhs_only(&self, rhs: &mut [f64]) -> Vec<usize> {
        let mut rows = Vec::new();
        for surface in self.surfaces {
            for cell in 0..self.mesh.num_cells() {
                if !self.is_cut(cell, surface) {
                    continue;
                }
                let cell_dofs = self
                    .dofh
                    .cell_dof_indices(&self.mesh.connectivity.quad_cells[cell]);
                for component in 0..DIM {
                    let mut l = component;
                    while l < DOFS_PER_CELL {
                        rhs[cell_dofs[l]] = 0.0;
                        rows.push(cell_dofs[l]);
                        l += COMPONENTS;
                    }
                }
            }
        }
        rows.sort_unstable();
        rows.dedup();
        rows
    }

    #[allow(clippy::too_many_arguments)]
    fn override_cell(
        &self,
        cell: usize,
        surface: &ImmersedCircle,
        matrix: &mut CsMat<f64>,
        rhs: &mut [f64],
        reference_diagonal: &[f64],
        initial_step: bool,
        rows: &mut Vec<usize>,
    ) {
        let quad = &self.mesh.connectivity.quad_cells[cell];
        let cell_dofs = self.dofh.cell_dof_indices(quad);

        for component in 0..DIM {
            let mut l = component;
            while l < DOFS_PER_CELL {
                let dof = cell_dofs[l];
                let support = *self.dofh.support_point(dof);
                let (projection, distance, _) = surface.project(&support);

                let scale = reference_diagonal[dof];
                sparse::zero_row(matrix, dof);

                if distance > 0.0 {
                    // collinear stencil point one projection distance
                    // beyond the dof, away from the surface
                    let stencil_point = support + (support - projection);
                    let vertex = quad.vertices[DofHandler::local_vertex(l)];

                    match self.locate_stencil_cell(vertex, &stencil_point) {
                        Some((host, xi)) => {
                            let host_dofs = self
                                .dofh
                                .cell_dof_indices(&self.mesh.connectivity.quad_cells[host]);
                            let shape = Q1Basis::shape_functions(&xi);

                            sparse::set_entry(matrix, dof, dof, -2.0 * scale);
                            let mut n = component;
                            while n < DOFS_PER_CELL {
                                sparse::add_entry(
                                    matrix,
                                    dof,
                                    host_dofs[n],
                                    scale * shape[DofHandler::local_vertex(n)],
                                );
                                n += COMPONENTS;
                            }

                            // linear extrapolation through the dof and the
                            // stencil point hits g at the projection:
                            //   2 u_i - u_m = g  =>  -2 u_i + u_m = -g
                            rhs[dof] = if initial_step {
                                -scale * surface.boundary_velocity(&projection)[component]
                            } else {
                                0.0
                            };
                        }
                        None => {
                            // every candidate refused the inverse map;
                            // keep the assembled diagonal as a plain row
                            warn!(
                                "no stencil cell found for dof {} at ({:.4}, {:.4})",
                                dof, support.x, support.y
                            );
                            sparse::set_entry(matrix, dof, dof, scale);
                            rhs[dof] = 0.0;
                        }
                    }
                } else {
                    // dof sits exactly on the surface: plain Dirichlet row
                    sparse::set_entry(matrix, dof, dof, scale);
                    rhs[dof] = if initial_step {
                        scale * surface.boundary_velocity(&support)[component]
                    } else {
                        0.0
                    };
                }

                rows.push(dof);
                l += COMPONENTS;
            }
        }
    }

    /// Search the vertex's cell patch for the cell containing the
    /// stencil point.
    ///
    /// Accepts the first candidate whose reference coordinates land in
    /// the unit cell; candidates whose inverse map fails are skipped.
    /// When no candidate contains the point (it may lie outside the
    /// domain), the last mappable candidate is used; the resulting
    /// stencil extrapolates from that cell's dofs.
    fn locate_stencil_cell(
        &self,
        vertex: usize,
        stencil_point: &Point2<f64>,
    ) -> Option<(usize, Point2<f64>)> {
        let candidates = self.vertex_cells.cells_of(vertex);
        let mut last_mappable = None;
        for &candidate in candidates {
            let map = BilinearMap::from_cell(self.mesh, candidate);
            match map.inverse_map(stencil_point) {
                Ok(xi) => {
                    if distance_to_unit_cell(&xi) == 0.0 {
                        return Some((candidate, xi));
                    }
                    last_mappable = Some((candidate, xi));
                }
                Err(_) => continue,
            }
        }
        if last_mappable.is_some() {
            debug!(
                "stencil point ({:.4}, {:.4}) outside the patch of vertex {}, \
                 falling back to the last candidate",
                stencil_point.x, stencil_point.y, vertex
            );
        }
        last_mappable
    }
}
