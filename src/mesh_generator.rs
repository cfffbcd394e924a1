use nalgebra::Point2;

use crate::mesh::{Mesh, QuadCell};

/// Structured quadrilateral mesh generator for rectangular domains.
///
/// The solver represents obstacles with immersed boundaries, so the only
/// meshes it ever needs are regular subdivisions of a rectangle.
pub struct MeshGenerator;

impl MeshGenerator {
    /// Rectangle `[p1, p2]` uniformly refined `level` times: `2^level`
    /// cells per side.
    pub fn rectangle(p1: Point2<f64>, p2: Point2<f64>, level: u32) -> Mesh {
        let n = 1usize << level;
        Self::subdivided_rectangle(n, n, p1, p2)
    }

    /// Rectangle `[p1, p2]` split into `nx * ny` equal cells.
    pub fn subdivided_rectangle(nx: usize, ny: usize, p1: Point2<f64>, p2: Point2<f64>) -> Mesh {
        assert!(nx > 0 && ny > 0, "mesh must have at least one cell per side");
        let mut mesh = Mesh::new();

        let dx = (p2.x - p1.x) / nx as f64;
        let dy = (p2.y - p1.y) / ny as f64;

        for j in 0..=ny {
            for i in 0..=nx {
                mesh.geometry
                    .add_vertex(p1.x + i as f64 * dx, p1.y + j as f64 * dy);
            }
        }

        let vid = |i: usize, j: usize| j * (nx + 1) + i;
        for j in 0..ny {
            for i in 0..nx {
                mesh.connectivity.add_cell(QuadCell::new([
                    vid(i, j),
                    vid(i + 1, j),
                    vid(i, j + 1),
                    vid(i + 1, j + 1),
                ]));
            }
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_counts() {
        let mesh = MeshGenerator::subdivided_rectangle(
            4,
            3,
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 3.0),
        );
        assert_eq!(mesh.num_vertices(), 5 * 4);
        assert_eq!(mesh.num_cells(), 12);
    }

    #[test]
    fn test_refinement_level() {
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 5);
        assert_eq!(mesh.num_cells(), 32 * 32);
        assert_eq!(mesh.num_vertices(), 33 * 33);
    }

    #[test]
    fn test_vertex_ordering_matches_reference_cell() {
        let mesh = MeshGenerator::subdivided_rectangle(
            1,
            1,
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 2.0),
        );
        let v = mesh.cell_vertices(0);
        assert_relative_eq!(v[0].x, 0.0);
        assert_relative_eq!(v[0].y, 0.0);
        assert_relative_eq!(v[1].x, 1.0);
        assert_relative_eq!(v[1].y, 0.0);
        assert_relative_eq!(v[2].x, 0.0);
        assert_relative_eq!(v[2].y, 2.0);
        assert_relative_eq!(v[3].x, 1.0);
        assert_relative_eq!(v[3].y, 2.0);
    }
}
