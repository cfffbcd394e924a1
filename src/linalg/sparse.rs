use std::collections::BTreeSet;

use sprs::CsMat;

use crate::fem::dof::DofHandler;
use crate::mesh::{Mesh, VertexCellIndex};

/// Build the global sparsity pattern as a CSR matrix of explicit zeros.
///
/// The pattern is patch-aware: a dof row holds entries for every dof of
/// every cell incident to one of its cell's vertices, a superset of the
/// plain finite-element stencil. The sharp-edge overrider can therefore
/// write its cross-cell stencil couplings in place without introducing
/// new column indices.
pub fn build_patch_pattern(
    mesh: &Mesh,
    dofh: &DofHandler,
    vertex_cells: &VertexCellIndex,
) -> CsMat<f64> {
    let n = dofh.n_dofs();
    let mut columns: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];

    for cell in &mesh.connectivity.quad_cells {
        let row_dofs = dofh.cell_dof_indices(cell);
        let patch = vertex_cells.patch_of_vertices(&cell.vertices);
        for &neighbor in &patch {
            let col_dofs = dofh.cell_dof_indices(&mesh.connectivity.quad_cells[neighbor]);
            for &i in &row_dofs {
                for &j in &col_dofs {
                    columns[i].insert(j);
                }
            }
        }
    }

    let mut indptr = Vec::with_capacity(n + 1);
    let mut indices = Vec::new();
    indptr.push(0usize);
    for cols in &columns {
        indices.extend(cols.iter().copied());
        indptr.push(indices.len());
    }
    let data = vec![0.0; indices.len()];
    CsMat::new((n, n), indptr, indices, data)
}

/// Reset every stored value to zero, keeping the pattern.
pub fn zero_values(matrix: &mut CsMat<f64>) {
    for v in matrix.data_mut() {
        *v = 0.0;
    }
}

/// Zero every stored entry of one row.
pub fn zero_row(matrix: &mut CsMat<f64>, row: usize) {
    if let Some(mut view) = matrix.outer_view_mut(row) {
        for (_, v) in view.iter_mut() {
            *v = 0.0;
        }
    }
}

/// Add into an entry of the pattern. Returns false when the entry is not
/// part of the pattern.
pub fn add_entry(matrix: &mut CsMat<f64>, row: usize, col: usize, value: f64) -> bool {
    match matrix.get_mut(row, col) {
        Some(v) => {
            *v += value;
            true
        }
        None => false,
    }
}

/// Overwrite an entry of the pattern. Returns false when the entry is
/// not part of the pattern.
pub fn set_entry(matrix: &mut CsMat<f64>, row: usize, col: usize, value: f64) -> bool {
    match matrix.get_mut(row, col) {
        Some(v) => {
            *v = value;
            true
        }
        None => false,
    }
}

/// Stored value at (row, col), zero when outside the pattern.
pub fn get_entry(matrix: &CsMat<f64>, row: usize, col: usize) -> f64 {
    matrix.get(row, col).copied().unwrap_or(0.0)
}

/// Sum of absolute values of one row's stored entries.
pub fn row_abs_sum(matrix: &CsMat<f64>, row: usize) -> f64 {
    matrix
        .outer_view(row)
        .map(|view| view.iter().map(|(_, v)| v.abs()).sum())
        .unwrap_or(0.0)
}
