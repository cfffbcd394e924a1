use nalgebra::Point2;

/// Tensor-product Gauss-Legendre quadrature on the reference cell [0,1]^2.
#[derive(Debug, Clone)]
pub struct GaussQuadrature {
    /// Integration point coordinates on the reference cell
    pub points: Vec<Point2<f64>>,
    /// Integration weights (sum to 1, the reference-cell area)
    pub weights: Vec<f64>,
}

impl GaussQuadrature {
    /// Tensor rule with `n` points per direction, exact for polynomials
    /// of degree `2n - 1` in each variable. The assembler uses `n = 3`
    /// (element degree + 2) so the stabilization products on Q1/Q1 are
    /// integrated exactly.
    pub fn tensor(n: usize) -> Self {
        let (nodes, weights_1d) = Self::gauss_1d(n);
        let mut points = Vec::with_capacity(n * n);
        let mut weights = Vec::with_capacity(n * n);
        for j in 0..n {
            for i in 0..n {
                points.push(Point2::new(nodes[i], nodes[j]));
                weights.push(weights_1d[i] * weights_1d[j]);
            }
        }
        Self { points, weights }
    }

    /// 1D Gauss-Legendre nodes and weights on [0,1].
    pub fn gauss_1d(n: usize) -> (Vec<f64>, Vec<f64>) {
        // standard nodes on [-1,1], shifted to [0,1]
        let (nodes, weights): (Vec<f64>, Vec<f64>) = match n {
            1 => (vec![0.0], vec![2.0]),
            2 => {
                let a = 1.0 / 3.0_f64.sqrt();
                (vec![-a, a], vec![1.0, 1.0])
            }
            3 => {
                let a = (3.0_f64 / 5.0).sqrt();
                (vec![-a, 0.0, a], vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0])
            }
            4 => {
                let a = (3.0 / 7.0 - 2.0 / 7.0 * (6.0 / 5.0_f64).sqrt()).sqrt();
                let b = (3.0 / 7.0 + 2.0 / 7.0 * (6.0 / 5.0_f64).sqrt()).sqrt();
                let wa = (18.0 + 30.0_f64.sqrt()) / 36.0;
                let wb = (18.0 - 30.0_f64.sqrt()) / 36.0;
                (vec![-b, -a, a, b], vec![wb, wa, wa, wb])
            }
            _ => panic!("Gauss rule with {} points per direction not tabulated", n),
        };
        (
            nodes.iter().map(|x| 0.5 * (x + 1.0)).collect(),
            weights.iter().map(|w| 0.5 * w).collect(),
        )
    }

    pub fn num_points(&self) -> usize {
        self.points.len()
    }
}
