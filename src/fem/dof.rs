use nalgebra::Point2;

use crate::mesh::{Mesh, QuadCell};

/// Number of velocity components.
pub const DIM: usize = 2;
/// Scalar fields per vertex under Q1/Q1: two velocity components plus
/// pressure.
pub const COMPONENTS: usize = DIM + 1;
/// Dofs on one quadrilateral cell.
pub const DOFS_PER_CELL: usize = COMPONENTS * 4;

/// Degree-of-freedom handler for the Q1/Q1 velocity-pressure element.
///
/// Global numbering is block-wise: all velocity dofs first
/// (`vertex * 2 + component`), then all pressure dofs
/// (`2 * n_vertices + vertex`). The local cell layout interleaves per
/// vertex instead: local dof `l` belongs to vertex `l / 3` and carries
/// component `l % 3` (0, 1 velocity; 2 pressure).
#[derive(Debug, Clone)]
pub struct DofHandler {
    n_vertices: usize,
    /// Physical location of each dof; for Q1 these are vertex coordinates.
    support_points: Vec<Point2<f64>>,
}

impl DofHandler {
    /// Distribute dofs over the mesh and record their support points.
    pub fn distribute(mesh: &Mesh) -> Self {
        let n_vertices = mesh.num_vertices();
        let mut support_points = vec![Point2::origin(); n_vertices * COMPONENTS];
        for (v, p) in mesh.geometry.vertices.iter().enumerate() {
            for comp in 0..DIM {
                support_points[v * DIM + comp] = *p;
            }
            support_points[n_vertices * DIM + v] = *p;
        }
        Self {
            n_vertices,
            support_points,
        }
    }

    pub fn n_dofs(&self) -> usize {
        self.n_vertices * COMPONENTS
    }

    pub fn n_velocity_dofs(&self) -> usize {
        self.n_vertices * DIM
    }

    pub fn n_pressure_dofs(&self) -> usize {
        self.n_vertices
    }

    pub fn n_vertices(&self) -> usize {
        self.n_vertices
    }

    /// Global index of a velocity dof.
    pub fn velocity_dof(&self, vertex: usize, component: usize) -> usize {
        debug_assert!(vertex < self.n_vertices);
        debug_assert!(component < DIM);
        vertex * DIM + component
    }

    /// Global index of a pressure dof.
    pub fn pressure_dof(&self, vertex: usize) -> usize {
        debug_assert!(vertex < self.n_vertices);
        self.n_vertices * DIM + vertex
    }

    pub fn is_pressure_dof(&self, dof: usize) -> bool {
        dof >= self.n_vertices * DIM
    }

    /// Vertex carrying a local cell dof.
    pub fn local_vertex(local_dof: usize) -> usize {
        local_dof / COMPONENTS
    }

    /// Component (0, 1 velocity; 2 pressure) of a local cell dof.
    pub fn local_component(local_dof: usize) -> usize {
        local_dof % COMPONENTS
    }

    /// Global dof indices of a cell, in the interleaved local order.
    pub fn cell_dof_indices(&self, cell: &QuadCell) -> [usize; DOFS_PER_CELL] {
        let mut dofs = [0usize; DOFS_PER_CELL];
        for (lv, &v) in cell.vertices.iter().enumerate() {
            dofs[lv * COMPONENTS] = self.velocity_dof(v, 0);
            dofs[lv * COMPONENTS + 1] = self.velocity_dof(v, 1);
            dofs[lv * COMPONENTS + 2] = self.pressure_dof(v);
        }
        dofs
    }

    pub fn support_point(&self, dof: usize) -> &Point2<f64> {
        &self.support_points[dof]
    }

    pub fn support_points(&self) -> &[Point2<f64>] {
        &self.support_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh_generator::MeshGenerator;

    #[test]
    fn test_block_numbering() {
        let mesh = MeshGenerator::subdivided_rectangle(
            2,
            2,
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
        );
        let dofh = DofHandler::distribute(&mesh);
        assert_eq!(dofh.n_vertices(), 9);
        assert_eq!(dofh.n_dofs(), 27);
        assert_eq!(dofh.n_velocity_dofs(), 18);

        assert_eq!(dofh.velocity_dof(0, 0), 0);
        assert_eq!(dofh.velocity_dof(0, 1), 1);
        assert_eq!(dofh.velocity_dof(4, 1), 9);
        // pressure block starts after all velocities
        assert_eq!(dofh.pressure_dof(0), 18);
        assert_eq!(dofh.pressure_dof(8), 26);
        assert!(dofh.is_pressure_dof(18));
        assert!(!dofh.is_pressure_dof(17));
    }

    #[test]
    fn test_cell_dof_layout_interleaved() {
        let mesh = MeshGenerator::subdivided_rectangle(
            1,
            1,
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 1.0),
        );
        let dofh = DofHandler::distribute(&mesh);
        let dofs = dofh.cell_dof_indices(&mesh.connectivity.quad_cells[0]);
        // vertex 0: (u, v, p)
        assert_eq!(dofs[0], 0);
        assert_eq!(dofs[1], 1);
        assert_eq!(dofs[2], 8);
        // vertex 1
        assert_eq!(dofs[3], 2);
        assert_eq!(dofs[4], 3);
        assert_eq!(dofs[5], 9);
        assert_eq!(DofHandler::local_vertex(7), 2);
        assert_eq!(DofHandler::local_component(7), 1);
    }

    #[test]
    fn test_support_points_cover_all_dofs() {
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 2);
        let dofh = DofHandler::distribute(&mesh);
        assert_eq!(dofh.support_points().len(), dofh.n_dofs());
        for v in 0..mesh.num_vertices() {
            let p = mesh.geometry.vertices[v];
            assert_eq!(*dofh.support_point(dofh.velocity_dof(v, 0)), p);
            assert_eq!(*dofh.support_point(dofh.velocity_dof(v, 1)), p);
            assert_eq!(*dofh.support_point(dofh.pressure_dof(v)), p);
        }
    }
}
