use std::time::Instant;

use sprs::CsMat;

use super::preconditioner::{IdentityPreconditioner, JacobiPreconditioner, Preconditioner};
use super::solver::{LinearSolver, SolverStats, SolverUtils};
use crate::error::SolveError;

/// BiCGSTAB solver for the nonsymmetric Newton systems.
///
/// Kept as the iterative alternative to the direct solver for larger
/// meshes; stalling is fatal, matching the direct solver's contract.
pub struct BiCgStab {
    max_iterations: usize,
    tolerance: f64,
    abs_tolerance: f64,
    use_preconditioner: bool,
    name: String,
}

impl BiCgStab {
    pub fn new() -> Self {
        Self {
            max_iterations: 5000,
            tolerance: 1e-10,
            abs_tolerance: 1e-14,
            use_preconditioner: true,
            name: "BiCGSTAB".to_string(),
        }
    }

    pub fn with_max_iterations(mut self, max_iter: usize) -> Self {
        self.max_iterations = max_iter;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_abs_tolerance(mut self, abs_tol: f64) -> Self {
        self.abs_tolerance = abs_tol;
        self
    }

    pub fn with_preconditioner(mut self, use_precond: bool) -> Self {
        self.use_preconditioner = use_precond;
        self
    }

    fn solve_preconditioned<P: Preconditioner>(
        &self,
        a: &CsMat<f64>,
        b: &[f64],
        precond: &P,
    ) -> (Vec<f64>, SolverStats, bool) {
        let n = b.len();
        let start = Instant::now();
        let b_norm = SolverUtils::norm(b);

        if b_norm < 1e-25 {
            return (
                vec![0.0; n],
                SolverStats {
                    iterations: 0,
                    residual_norm: 0.0,
                    relative_residual: 0.0,
                    solve_time: start.elapsed().as_secs_f64(),
                },
                true,
            );
        }

        let mut x = vec![0.0; n];
        let mut r = b.to_vec();
        let r_hat = r.clone();

        let mut rho = 1.0;
        let mut alpha = 1.0;
        let mut omega = 1.0;
        let mut v = vec![0.0; n];
        let mut p = vec![0.0; n];

        let mut total_iter = 0;
        let mut converged = false;
        let mut final_res = b_norm;

        while total_iter < self.max_iterations {
            let rho_prev = rho;
            rho = r_hat
                .iter()
                .zip(r.iter())
                .map(|(&rh, &ri)| rh * ri)
                .sum::<f64>();
            if rho.abs() < 1e-40 {
                break;
            }

            if total_iter == 0 {
                p = r.clone();
            } else {
                let beta = (rho / rho_prev) * (alpha / omega);
                for i in 0..n {
                    p[i] = r[i] + beta * (p[i] - omega * v[i]);
                }
            }

            let p_hat = precond.apply(&p);
            v = SolverUtils::mat_vec(a, &p_hat);

            let rhat_v = r_hat
                .iter()
                .zip(v.iter())
                .map(|(&rh, &vi)| rh * vi)
                .sum::<f64>();
            if rhat_v.abs() < 1e-40 {
                break;
            }
            alpha = rho / rhat_v;

            let mut s = vec![0.0; n];
            for i in 0..n {
                s[i] = r[i] - alpha * v[i];
            }

            let s_norm = SolverUtils::norm(&s);
            if s_norm < self.tolerance * b_norm || s_norm < self.abs_tolerance {
                for i in 0..n {
                    x[i] += alpha * p_hat[i];
                }
                final_res = s_norm;
                converged = true;
                break;
            }

            let s_hat = precond.apply(&s);
            let t = SolverUtils::mat_vec(a, &s_hat);

            let t_t = t.iter().map(|&ti| ti * ti).sum::<f64>();
            let t_s = t.iter().zip(s.iter()).map(|(&ti, &si)| ti * si).sum::<f64>();
            if t_t.abs() < 1e-40 {
                break;
            }
            omega = t_s / t_t;

            for i in 0..n {
                x[i] += alpha * p_hat[i] + omega * s_hat[i];
                r[i] = s[i] - omega * t[i];
            }

            final_res = SolverUtils::norm(&r);
            total_iter += 1;

            if final_res < self.tolerance * b_norm || final_res < self.abs_tolerance {
                converged = true;
                break;
            }
            if omega.abs() < 1e-40 {
                break;
            }
        }

        (
            x,
            SolverStats {
                iterations: total_iter,
                residual_norm: final_res,
                relative_residual: final_res / b_norm,
                solve_time: start.elapsed().as_secs_f64(),
            },
            converged,
        )
    }
}

impl Default for BiCgStab {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for BiCgStab {
    fn solve(&mut self, a: &CsMat<f64>, b: &[f64]) -> Result<(Vec<f64>, SolverStats), SolveError> {
        let (x, stats, converged) = if self.use_preconditioner {
            let precond = JacobiPreconditioner::new(a);
            self.solve_preconditioned(a, b, &precond)
        } else {
            self.solve_preconditioned(a, b, &IdentityPreconditioner)
        };

        if converged {
            Ok((x, stats))
        } else {
            Err(SolveError::LinearSolverDiverged {
                iterations: stats.iterations,
                residual: stats.residual_norm,
            })
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
