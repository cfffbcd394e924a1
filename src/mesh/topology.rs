use std::collections::HashSet;

use super::Mesh;

/// A 4-node bilinear quadrilateral cell.
///
/// Vertex numbering follows the reference-cell layout
///   2 --- 3
///   |     |
///   0 --- 1
/// i.e. vertex i sits at reference coordinates ((i & 1), (i >> 1)).
#[derive(Debug, Clone)]
pub struct QuadCell {
    /// Global vertex indices for this cell
    pub vertices: [usize; 4],
}

impl QuadCell {
    pub fn new(vertices: [usize; 4]) -> Self {
        Self { vertices }
    }

    /// Edges as pairs of local vertex indices, counterclockwise.
    pub fn edges() -> [(usize, usize); 4] {
        [(0, 1), (1, 3), (3, 2), (2, 0)]
    }
}

/// Connectivity information for the mesh
#[derive(Debug, Clone)]
pub struct Connectivity {
    pub quad_cells: Vec<QuadCell>,
}

impl Connectivity {
    pub fn new() -> Self {
        Self {
            quad_cells: Vec::new(),
        }
    }

    pub fn add_cell(&mut self, cell: QuadCell) {
        self.quad_cells.push(cell);
    }

    pub fn num_cells(&self) -> usize {
        self.quad_cells.len()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Reverse index from each mesh vertex to the cells incident to it.
///
/// Derived state: owned by the solver, rebuilt whenever the mesh changes.
/// The sharp-edge overrider walks it to locate the cell containing a
/// stencil point, and the sparsity pattern uses it to reserve the
/// cross-cell couplings those stencils write.
#[derive(Debug, Clone)]
pub struct VertexCellIndex {
    cells_of_vertex: Vec<Vec<usize>>,
}

impl VertexCellIndex {
    /// Build the index in one pass over the active cells.
    pub fn build(mesh: &Mesh) -> Self {
        let mut sets: Vec<HashSet<usize>> = vec![HashSet::new(); mesh.num_vertices()];
        for (cell_idx, cell) in mesh.connectivity.quad_cells.iter().enumerate() {
            for &v in &cell.vertices {
                sets[v].insert(cell_idx);
            }
        }
        let cells_of_vertex = sets
            .into_iter()
            .map(|s| {
                let mut cells: Vec<usize> = s.into_iter().collect();
                cells.sort_unstable();
                cells
            })
            .collect();
        Self { cells_of_vertex }
    }

    /// Cells incident to the given vertex, deduplicated and sorted.
    pub fn cells_of(&self, vertex: usize) -> &[usize] {
        &self.cells_of_vertex[vertex]
    }

    pub fn num_vertices(&self) -> usize {
        self.cells_of_vertex.len()
    }

    /// Union of the cell patches of the given vertices.
    pub fn patch_of_vertices(&self, vertices: &[usize]) -> Vec<usize> {
        let mut patch: Vec<usize> = vertices
            .iter()
            .flat_map(|&v| self.cells_of_vertex[v].iter().copied())
            .collect();
        patch.sort_unstable();
        patch.dedup();
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_generator::MeshGenerator;
    use nalgebra::Point2;

    #[test]
    fn test_every_cell_listed_under_its_vertices() {
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 3);
        let index = VertexCellIndex::build(&mesh);

        assert_eq!(index.num_vertices(), mesh.num_vertices());
        for (cell_idx, cell) in mesh.connectivity.quad_cells.iter().enumerate() {
            for &v in &cell.vertices {
                assert!(
                    index.cells_of(v).contains(&cell_idx),
                    "cell {} missing from vertex {} entry",
                    cell_idx,
                    v
                );
            }
        }
    }

    #[test]
    fn test_interior_vertex_has_four_cells() {
        let mesh = MeshGenerator::subdivided_rectangle(
            2,
            2,
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
        );
        let index = VertexCellIndex::build(&mesh);
        // vertex 4 is the center of a 2x2 mesh (3x3 vertices)
        assert_eq!(index.cells_of(4).len(), 4);
        // corners touch one cell
        assert_eq!(index.cells_of(0).len(), 1);
    }
}
