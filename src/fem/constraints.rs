use std::collections::HashSet;

use nalgebra::{DMatrix, DVector};
use sprs::CsMat;

use super::dof::DOFS_PER_CELL;
use crate::linalg::sparse;

/// A set of Dirichlet constraints on individual dofs, applied by
/// elimination during the local-to-global scatter.
///
/// Two instances drive a Newton solve: one carrying the inhomogeneous
/// boundary values (first step) and a homogeneous copy on the same dofs
/// (every later step).
#[derive(Debug, Clone)]
pub struct ConstraintSet {
    constrained: HashSet<usize>,
    values: Vec<f64>,
}

impl ConstraintSet {
    pub fn new(n_dofs: usize) -> Self {
        Self {
            constrained: HashSet::new(),
            values: vec![0.0; n_dofs],
        }
    }

    /// Constrain a dof to a prescribed value.
    pub fn constrain(&mut self, dof: usize, value: f64) {
        debug_assert!(dof < self.values.len(), "dof index out of bounds");
        self.constrained.insert(dof);
        self.values[dof] = value;
    }

    pub fn is_constrained(&self, dof: usize) -> bool {
        self.constrained.contains(&dof)
    }

    pub fn value(&self, dof: usize) -> f64 {
        self.values[dof]
    }

    pub fn num_constraints(&self) -> usize {
        self.constrained.len()
    }

    /// A copy with the same constrained dofs but all values zeroed.
    pub fn homogeneous(&self) -> Self {
        Self {
            constrained: self.constrained.clone(),
            values: vec![0.0; self.values.len()],
        }
    }

    /// Write the prescribed values into a solution vector.
    pub fn distribute(&self, vec: &mut [f64]) {
        for &dof in &self.constrained {
            vec[dof] = self.values[dof];
        }
    }

    /// Scatter a local matrix and rhs into the global system.
    ///
    /// Constrained rows and columns are eliminated: the column times the
    /// prescribed value moves to the rhs, and the constrained diagonal
    /// accumulates the local diagonal so the row solves to the
    /// prescribed value at the original scale.
    pub fn distribute_local_to_global(
        &self,
        local_matrix: &DMatrix<f64>,
        local_rhs: &DVector<f64>,
        dofs: &[usize; DOFS_PER_CELL],
        matrix: &mut CsMat<f64>,
        rhs: &mut [f64],
    ) {
        for (i, &gi) in dofs.iter().enumerate() {
            if self.is_constrained(gi) {
                sparse::add_entry(matrix, gi, gi, local_matrix[(i, i)]);
                rhs[gi] += local_matrix[(i, i)] * self.values[gi];
                continue;
            }
            rhs[gi] += local_rhs[i];
            for (j, &gj) in dofs.iter().enumerate() {
                if self.is_constrained(gj) {
                    rhs[gi] -= local_matrix[(i, j)] * self.values[gj];
                } else {
                    sparse::add_entry(matrix, gi, gj, local_matrix[(i, j)]);
                }
            }
        }
    }

    /// Scatter a local rhs only, dropping constrained rows.
    pub fn distribute_local_rhs(
        &self,
        local_rhs: &DVector<f64>,
        dofs: &[usize; DOFS_PER_CELL],
        rhs: &mut [f64],
    ) {
        for (i, &gi) in dofs.iter().enumerate() {
            if !self.is_constrained(gi) {
                rhs[gi] += local_rhs[i];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constrain_and_distribute() {
        let mut constraints = ConstraintSet::new(10);
        constraints.constrain(3, 2.5);
        constraints.constrain(7, -1.0);

        assert!(constraints.is_constrained(3));
        assert!(!constraints.is_constrained(4));
        assert_eq!(constraints.num_constraints(), 2);

        let mut v = vec![0.0; 10];
        constraints.distribute(&mut v);
        assert_relative_eq!(v[3], 2.5);
        assert_relative_eq!(v[7], -1.0);
        assert_relative_eq!(v[0], 0.0);
    }

    #[test]
    fn test_homogeneous_copy_keeps_dofs_zeroes_values() {
        let mut constraints = ConstraintSet::new(5);
        constraints.constrain(2, 4.0);
        let zero = constraints.homogeneous();
        assert!(zero.is_constrained(2));
        assert_relative_eq!(zero.value(2), 0.0);
    }
}
