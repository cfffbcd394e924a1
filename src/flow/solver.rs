use log::info;
use nalgebra::Point2;
use sprs::CsMat;

use super::assembler::GlsAssembler;
use super::cases::CaseSetup;
use super::newton::NewtonStats;
use super::sharp::SharpEdgeOverrider;
use super::traction::{SamplingSide, TractionIntegrator, TractionReport};
use crate::config::{CaseKind, LinearSolverKind, SolverConfig};
use crate::error::SolveError;
use crate::fem::{ConstraintSet, DofHandler, FeValues};
use crate::linalg::{sparse, BiCgStab, DirectSolver, LinearSolver};
use crate::mesh::{Mesh, VertexCellIndex};
use crate::mesh_generator::MeshGenerator;

/// Velocity error norms against the case's exact solution.
#[derive(Debug, Clone)]
pub struct L2ErrorReport {
    /// Over the whole background mesh.
    pub global: f64,
    /// Restricted to the annulus between the immersed circles, one
    /// minimal cell diameter away from each.
    pub annulus: Option<f64>,
}

/// Results of one refinement cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u32,
    pub refinement: u32,
    pub newton: NewtonStats,
    pub l2_error: Option<L2ErrorReport>,
}

/// The steady Navier-Stokes solver: owns the background mesh, the dof
/// chain, the assembled system and the solution vectors, and wires the
/// assembler, the sharp-edge overrider and the Newton driver together.
pub struct FlowSolver {
    pub(crate) config: SolverConfig,
    pub(crate) case: CaseSetup,
    pub(crate) refinement: u32,
    pub(crate) mesh: Mesh,
    pub(crate) dofh: DofHandler,
    pub(crate) vertex_cells: VertexCellIndex,
    pub(crate) nonzero_constraints: ConstraintSet,
    pub(crate) zero_constraints: ConstraintSet,
    pub(crate) system_matrix: CsMat<f64>,
    pub(crate) assembled_diagonal: Vec<f64>,
    pub(crate) present_solution: Vec<f64>,
    pub(crate) newton_update: Vec<f64>,
    pub(crate) system_rhs: Vec<f64>,
    pub(crate) evaluation_point: Vec<f64>,
}

impl FlowSolver {
    pub fn new(config: SolverConfig) -> Self {
        let case = CaseSetup::from_config(&config);
        let refinement = config.refinement;
        let (mesh, dofh, vertex_cells, nonzero, zero, matrix) =
            Self::build_chain(&config, &case, refinement);
        let n = dofh.n_dofs();

        info!(
            "{:?}: {} cells, {} dofs ({} velocity + {} pressure)",
            config.case,
            mesh.num_cells(),
            n,
            dofh.n_velocity_dofs(),
            dofh.n_pressure_dofs()
        );

        Self {
            config,
            case,
            refinement,
            mesh,
            dofh,
            vertex_cells,
            nonzero_constraints: nonzero,
            zero_constraints: zero,
            system_matrix: matrix,
            assembled_diagonal: vec![0.0; n],
            present_solution: vec![0.0; n],
            newton_update: vec![0.0; n],
            system_rhs: vec![0.0; n],
            evaluation_point: vec![0.0; n],
        }
    }

    /// Mesh-change rebuild chain: dof distribution, vertex-to-cell
    /// index, constraints, sparsity pattern.
    fn build_chain(
        config: &SolverConfig,
        case: &CaseSetup,
        refinement: u32,
    ) -> (
        Mesh,
        DofHandler,
        VertexCellIndex,
        ConstraintSet,
        ConstraintSet,
        CsMat<f64>,
    ) {
        let p1 = Point2::new(config.domain.p1[0], config.domain.p1[1]);
        let p2 = Point2::new(config.domain.p2[0], config.domain.p2[1]);
        let mesh = MeshGenerator::rectangle(p1, p2, refinement);
        let dofh = DofHandler::distribute(&mesh);
        let vertex_cells = VertexCellIndex::build(&mesh);
        let nonzero = case.boundary_constraints(config, &mesh, &dofh);
        let zero = nonzero.homogeneous();
        let matrix = sparse::build_patch_pattern(&mesh, &dofh, &vertex_cells);
        (mesh, dofh, vertex_cells, nonzero, zero, matrix)
    }

    /// Uniformly refine the background mesh one level and rebuild
    /// everything derived from it. The solution restarts from zero;
    /// the next `newton_iterate` must run with `is_initial_step`.
    pub fn refine_uniform(&mut self) {
        self.refinement += 1;
        let (mesh, dofh, vertex_cells, nonzero, zero, matrix) =
            Self::build_chain(&self.config, &self.case, self.refinement);
        let n = dofh.n_dofs();
        self.mesh = mesh;
        self.dofh = dofh;
        self.vertex_cells = vertex_cells;
        self.nonzero_constraints = nonzero;
        self.zero_constraints = zero;
        self.system_matrix = matrix;
        self.assembled_diagonal = vec![0.0; n];
        self.present_solution = vec![0.0; n];
        self.newton_update = vec![0.0; n];
        self.system_rhs = vec![0.0; n];
        self.evaluation_point = vec![0.0; n];
        info!(
            "refined to level {}: {} cells, {} dofs",
            self.refinement,
            self.mesh.num_cells(),
            n
        );
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn dof_handler(&self) -> &DofHandler {
        &self.dofh
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn case(&self) -> &CaseSetup {
        &self.case
    }

    pub fn present_solution(&self) -> &[f64] {
        &self.present_solution
    }

    pub fn vertex_cell_index(&self) -> &VertexCellIndex {
        &self.vertex_cells
    }

    /// Replace the immersed surfaces, e.g. to study a single obstacle
    /// with the boundary conditions of another case.
    pub fn set_surfaces(&mut self, surfaces: Vec<super::surface::ImmersedCircle>) {
        self.case.surfaces = surfaces;
    }

    /// Cells currently cut by any immersed surface.
    pub fn cut_cells(&self) -> Vec<usize> {
        SharpEdgeOverrider::new(
            &self.mesh,
            &self.dofh,
            &self.vertex_cells,
            &self.case.surfaces,
        )
        .cut_cells()
    }

    pub fn system_matrix(&self) -> &CsMat<f64> {
        &self.system_matrix
    }

    pub fn residual_norm(&self) -> f64 {
        crate::linalg::SolverUtils::norm(&self.system_rhs)
    }

    /// Assemble Jacobian and residual at the evaluation point, honoring
    /// the step's constraint set, and snapshot the diagonal for the
    /// sharp-edge row scaling.
    pub fn assemble_system(&mut self, initial_step: bool) {
        let constraints = if initial_step {
            &self.nonzero_constraints
        } else {
            &self.zero_constraints
        };
        let assembler = GlsAssembler::new(
            &self.mesh,
            &self.dofh,
            self.config.viscosity,
            self.config.supg,
        );
        if self.config.parallel_assembly {
            assembler.assemble_system_parallel(
                &self.evaluation_point,
                self.case.forcing.as_ref(),
                constraints,
                &mut self.system_matrix,
                &mut self.system_rhs,
            );
        } else {
            assembler.assemble_system(
                &self.evaluation_point,
                self.case.forcing.as_ref(),
                constraints,
                &mut self.system_matrix,
                &mut self.system_rhs,
            );
        }
        for i in 0..self.dofh.n_dofs() {
            self.assembled_diagonal[i] = sparse::get_entry(&self.system_matrix, i, i);
        }
    }

    /// Assemble the residual only.
    pub fn assemble_rhs(&mut self, initial_step: bool) {
        let constraints = if initial_step {
            &self.nonzero_constraints
        } else {
            &self.zero_constraints
        };
        let assembler = GlsAssembler::new(
            &self.mesh,
            &self.dofh,
            self.config.viscosity,
            self.config.supg,
        );
        assembler.assemble_rhs(
            &self.evaluation_point,
            self.case.forcing.as_ref(),
            constraints,
            &mut self.system_rhs,
        );
    }

    /// Run the sharp-edge override on the assembled system. Must follow
    /// `assemble_system` and precede `solve_linear`.
    pub fn apply_sharp_edge(&mut self, initial_step: bool) -> Vec<usize> {
        let overrider = SharpEdgeOverrider::new(
            &self.mesh,
            &self.dofh,
            &self.vertex_cells,
            &self.case.surfaces,
        );
        overrider.apply(
            &mut self.system_matrix,
            &mut self.system_rhs,
            &self.assembled_diagonal,
            initial_step,
        )
    }

    /// Residual-only override for line-search reassemblies.
    pub fn apply_sharp_edge_rhs_only(&mut self) -> Vec<usize> {
        let overrider = SharpEdgeOverrider::new(
            &self.mesh,
            &self.dofh,
            &self.vertex_cells,
            &self.case.surfaces,
        );
        overrider.apply_rhs_only(&mut self.system_rhs)
    }

    /// Solve the post-override system for the Newton update and apply
    /// the step's constraints to it.
    pub fn solve_linear(&mut self, initial_step: bool) -> Result<(), SolveError> {
        let mut solver: Box<dyn LinearSolver> = match self.config.linear_solver {
            LinearSolverKind::Direct => Box::new(DirectSolver::new()),
            LinearSolverKind::BiCgStab => Box::new(BiCgStab::new()),
        };
        let (x, stats) = solver.solve(&self.system_matrix, &self.system_rhs)?;
        self.newton_update = x;
        let constraints = if initial_step {
            &self.nonzero_constraints
        } else {
            &self.zero_constraints
        };
        constraints.distribute(&mut self.newton_update);
        info!(
            "{}: residual {:.3e}",
            solver.name(),
            stats.residual_norm
        );
        Ok(())
    }

    /// Velocity L2 error against the case's exact solution, by
    /// quadrature over the background mesh.
    pub fn velocity_l2_error(&self) -> Option<L2ErrorReport> {
        let exact = self.case.exact_solution.as_deref()?;
        let annulus_bounds = match self.config.case {
            CaseKind::TaylorCouette => {
                let h_min = self.mesh.min_cell_diameter();
                self.config
                    .immersed
                    .outer_radius
                    .map(|r2| (self.config.immersed.inner_radius + h_min, r2 - h_min))
            }
            _ => None,
        };
        let center = Point2::new(self.config.immersed.center[0], self.config.immersed.center[1]);

        let mut fe = FeValues::new(GlsAssembler::quadrature());
        let mut global = 0.0;
        let mut annulus = 0.0;
        for cell in 0..self.mesh.num_cells() {
            fe.reinit(&self.mesh, cell);
            let velocity = fe.velocity_values(&self.mesh, &self.dofh, cell, &self.present_solution);
            for q in 0..fe.n_q_points() {
                let x = fe.quadrature_point(q);
                let du = velocity[q].x - exact.value(x, 0);
                let dv = velocity[q].y - exact.value(x, 1);
                let contribution = (du * du + dv * dv) * fe.jxw(q);
                global += contribution;
                if let Some((lo, hi)) = annulus_bounds {
                    let r = (x - center).norm();
                    if r > lo && r < hi {
                        annulus += contribution;
                    }
                }
            }
        }

        Some(L2ErrorReport {
            global: global.sqrt(),
            annulus: annulus_bounds.map(|_| annulus.sqrt()),
        })
    }

    /// Surface loads on one immersed circle of the converged solution.
    pub fn compute_traction(&self, surface_index: usize, side: SamplingSide) -> TractionReport {
        let integrator = TractionIntegrator::new(
            &self.mesh,
            &self.dofh,
            self.config.viscosity,
            self.config.traction.n_samples,
            self.config.traction.pressure_extrapolation,
        );
        integrator.integrate(
            &self.case.surfaces[surface_index],
            &self.present_solution,
            side,
        )
    }

    /// Run `cycles` uniform-refinement cycles, solving each from
    /// scratch, invoking `output` with the converged solution.
    pub fn run<F>(&mut self, cycles: u32, mut output: F) -> Result<Vec<CycleReport>, SolveError>
    where
        F: FnMut(u32, &FlowSolver),
    {
        let mut reports = Vec::new();
        for cycle in 0..cycles {
            if cycle != 0 {
                self.refine_uniform();
            }
            let newton = self.newton_iterate(
                self.config.newton.tolerance,
                self.config.newton.max_iterations,
                true,
            )?;
            output(cycle, self);
            let l2_error = self.velocity_l2_error();
            if let Some(report) = &l2_error {
                info!(
                    "cycle {}: L2 velocity error {:.4e}",
                    cycle, report.global
                );
            }
            reports.push(CycleReport {
                cycle,
                refinement: self.refinement,
                newton,
                l2_error,
            });
        }
        Ok(reports)
    }
}
