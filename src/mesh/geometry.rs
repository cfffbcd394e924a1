use nalgebra::Point2;

/// Geometric information for the mesh
#[derive(Debug, Clone)]
pub struct Geometry {
    /// Vertex coordinates
    pub vertices: Vec<Point2<f64>>,
}

impl Geometry {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
        }
    }

    pub fn add_vertex(&mut self, x: f64, y: f64) -> usize {
        let idx = self.vertices.len();
        self.vertices.push(Point2::new(x, y));
        idx
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn get_vertex(&self, idx: usize) -> Option<&Point2<f64>> {
        self.vertices.get(idx)
    }
}

impl Default for Geometry {
    fn default() -> Self {
        Self::new()
    }
}
