use std::time::Instant;

use sprs::CsMat;

use super::solver::{LinearSolver, SolverStats, SolverUtils};
use crate::error::SolveError;

/// Direct solver via dense LU factorization.
///
/// The Newton systems this crate produces stay small (a few thousand
/// dofs on the test meshes), where densifying and factoring with
/// nalgebra is simple and robust.
pub struct DirectSolver {
    name: String,
}

impl DirectSolver {
    pub fn new() -> Self {
        Self {
            name: "Direct (dense LU)".to_string(),
        }
    }
}

impl Default for DirectSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearSolver for DirectSolver {
    fn solve(&mut self, a: &CsMat<f64>, b: &[f64]) -> Result<(Vec<f64>, SolverStats), SolveError> {
        let start = Instant::now();
        let n = b.len();

        let mut a_dense = nalgebra::DMatrix::zeros(n, n);
        for (row_idx, row) in a.outer_iterator().enumerate() {
            for (col_idx, &val) in row.iter() {
                a_dense[(row_idx, col_idx)] = val;
            }
        }

        let lu = a_dense.lu();
        let b_vec = nalgebra::DVector::from_column_slice(b);
        let x_vec = lu.solve(&b_vec).ok_or(SolveError::SingularMatrix)?;
        let x: Vec<f64> = x_vec.iter().copied().collect();

        if x.iter().any(|v| !v.is_finite()) {
            return Err(SolveError::SingularMatrix);
        }

        let solve_time = start.elapsed().as_secs_f64();
        let residual_norm = SolverUtils::residual_norm(a, &x, b);
        let relative_residual = SolverUtils::relative_residual(a, &x, b);

        Ok((
            x,
            SolverStats {
                iterations: 0,
                residual_norm,
                relative_residual,
                solve_time,
            },
        ))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use sprs::TriMat;

    #[test]
    fn test_direct_solver_simple() {
        // [2 1; 1 2] x = [3; 3] has solution [1; 1]
        let mut triplets = TriMat::new((2, 2));
        triplets.add_triplet(0, 0, 2.0);
        triplets.add_triplet(0, 1, 1.0);
        triplets.add_triplet(1, 0, 1.0);
        triplets.add_triplet(1, 1, 2.0);
        let a = triplets.to_csr();

        let b = vec![3.0, 3.0];
        let mut solver = DirectSolver::new();
        let (x, stats) = solver.solve(&a, &b).unwrap();

        assert_relative_eq!(x[0], 1.0, epsilon = 1e-10);
        assert_relative_eq!(x[1], 1.0, epsilon = 1e-10);
        assert!(stats.relative_residual < 1e-10);
    }

    #[test]
    fn test_direct_solver_nonsymmetric() {
        let mut triplets = TriMat::new((3, 3));
        triplets.add_triplet(0, 0, 4.0);
        triplets.add_triplet(0, 1, -1.0);
        triplets.add_triplet(1, 0, 2.0);
        triplets.add_triplet(1, 1, 5.0);
        triplets.add_triplet(1, 2, 1.0);
        triplets.add_triplet(2, 1, -3.0);
        triplets.add_triplet(2, 2, 6.0);
        let a = triplets.to_csr();

        let x_exact = vec![1.0, -2.0, 0.5];
        let b = SolverUtils::mat_vec(&a, &x_exact);

        let mut solver = DirectSolver::new();
        let (x, _) = solver.solve(&a, &b).unwrap();
        for i in 0..3 {
            assert_relative_eq!(x[i], x_exact[i], epsilon = 1e-10);
        }
    }

    #[test]
    fn test_singular_matrix_reported() {
        let mut triplets = TriMat::new((2, 2));
        triplets.add_triplet(0, 0, 1.0);
        triplets.add_triplet(0, 1, 2.0);
        triplets.add_triplet(1, 0, 2.0);
        triplets.add_triplet(1, 1, 4.0);
        let a = triplets.to_csr();

        let mut solver = DirectSolver::new();
        assert!(matches!(
            solver.solve(&a, &[1.0, 0.0]),
            Err(SolveError::SingularMatrix)
        ));
    }
}
