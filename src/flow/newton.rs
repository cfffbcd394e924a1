use log::{debug, info, warn};

use super::solver::FlowSolver;
use crate::error::SolveError;
use crate::linalg::SolverUtils;

const LINE_SEARCH_FLOOR: f64 = 1e-3;

/// Where the Newton iteration ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonState {
    FirstStep,
    Refining,
    Converged,
    Diverged,
}

/// Outcome of one `newton_iterate` call.
#[derive(Debug, Clone)]
pub struct NewtonStats {
    pub iterations: usize,
    pub residual_norm: f64,
    pub converged: bool,
    pub state: NewtonState,
}

impl FlowSolver {
    /// Drive the coupled system to a steady state.
    ///
    /// Each step assembles the system at the current iterate, applies
    /// the sharp-edge override, solves for the update and commits it
    /// through a backtracking line search. The first step instead
    /// carries the inhomogeneous boundary values: the solve produces
    /// the full initial iterate, and later steps work with homogeneous
    /// constraints.
    pub fn newton_iterate(
        &mut self,
        tolerance: f64,
        max_iterations: usize,
        is_initial_step: bool,
    ) -> Result<NewtonStats, SolveError> {
        let mut first_step = is_initial_step;
        let mut outer_iteration = 0;
        let mut last_res = 1.0;
        let mut current_res = 1.0;

        while (first_step || current_res > tolerance) && outer_iteration < max_iterations {
            if first_step {
                self.evaluation_point.copy_from_slice(&self.present_solution);
                self.assemble_system(true);
                self.apply_sharp_edge(true);
                self.solve_linear(true)?;

                self.present_solution.copy_from_slice(&self.newton_update);
                self.nonzero_constraints.distribute(&mut self.present_solution);
                first_step = false;

                self.evaluation_point.copy_from_slice(&self.present_solution);
                self.assemble_rhs(false);
                self.apply_sharp_edge_rhs_only();
                current_res = SolverUtils::norm(&self.system_rhs);
                last_res = current_res;
                info!("Newton initial step: residual {:.3e}", current_res);
            } else {
                self.evaluation_point.copy_from_slice(&self.present_solution);
                self.assemble_system(false);
                self.apply_sharp_edge(false);
                self.solve_linear(false)?;

                let mut alpha = 1.0;
                loop {
                    for i in 0..self.evaluation_point.len() {
                        self.evaluation_point[i] =
                            self.present_solution[i] + alpha * self.newton_update[i];
                    }
                    self.nonzero_constraints.distribute(&mut self.evaluation_point);
                    self.assemble_rhs(false);
                    self.apply_sharp_edge_rhs_only();
                    current_res = SolverUtils::norm(&self.system_rhs);
                    debug!("  line search: alpha {:.5} residual {:.3e}", alpha, current_res);

                    if current_res < last_res {
                        break;
                    }
                    if alpha <= LINE_SEARCH_FLOOR {
                        warn!(
                            "line search exhausted, accepting alpha {:.0e} with residual {:.3e}",
                            LINE_SEARCH_FLOOR, current_res
                        );
                        break;
                    }
                    alpha = (alpha * 0.5).max(LINE_SEARCH_FLOOR);
                }

                self.present_solution.copy_from_slice(&self.evaluation_point);
                last_res = current_res;
                info!(
                    "Newton iteration {}: residual {:.3e} (alpha {:.4})",
                    outer_iteration, current_res, alpha
                );
            }
            outer_iteration += 1;
        }

        let converged = current_res <= tolerance;
        let state = if converged {
            NewtonState::Converged
        } else {
            NewtonState::Diverged
        };
        if !converged {
            warn!(
                "Newton did not converge in {} iterations (residual {:.3e})",
                outer_iteration, current_res
            );
        }

        Ok(NewtonStats {
            iterations: outer_iteration,
            residual_norm: current_res,
            converged,
            state,
        })
    }
}
