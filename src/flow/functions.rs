use std::f64::consts::PI;

use nalgebra::{Matrix2, Point2, Vector2};

/// Pointwise function of space with `dim + 1` components
/// (velocity, then pressure).
///
/// Forcing terms, exact solutions and boundary values all come through
/// this trait; the assembler and the error evaluation only ever see the
/// capability, never the concrete case.
pub trait FlowFunction {
    fn value(&self, p: &Point2<f64>, component: usize) -> f64;

    fn vector_value(&self, p: &Point2<f64>) -> [f64; 3] {
        [self.value(p, 0), self.value(p, 1), self.value(p, 2)]
    }

    fn vector_value_list(&self, points: &[Point2<f64>], values: &mut [[f64; 3]]) {
        debug_assert_eq!(points.len(), values.len());
        for (p, v) in points.iter().zip(values.iter_mut()) {
            *v = self.vector_value(p);
        }
    }
}

/// Identically zero; the no-forcing and no-slip default.
pub struct ZeroFlow;

impl FlowFunction for ZeroFlow {
    fn value(&self, _p: &Point2<f64>, _component: usize) -> f64 {
        0.0
    }
}

/// Uniform horizontal stream, used for the channel inlet.
pub struct UniformFlow {
    pub speed: f64,
}

impl FlowFunction for UniformFlow {
    fn value(&self, _p: &Point2<f64>, component: usize) -> f64 {
        if component == 0 {
            self.speed
        } else {
            0.0
        }
    }
}

/// Manufactured solution used for code verification.
///
/// The velocity derives from the stream function
/// psi = sin^2(pi x) sin^2(pi y) / (2 pi), so it is divergence free and
/// vanishes on the boundary of [-1,1]^2:
///   u = ( sin^2(pi x) sin(2 pi y), -sin(2 pi x) sin^2(pi y) )
///   p = cos(pi x) cos(pi y)
pub struct MmsSolution;

impl MmsSolution {
    pub fn velocity(&self, p: &Point2<f64>) -> Vector2<f64> {
        let (x, y) = (p.x, p.y);
        Vector2::new(
            (PI * x).sin().powi(2) * (2.0 * PI * y).sin(),
            -(2.0 * PI * x).sin() * (PI * y).sin().powi(2),
        )
    }

    /// Entry (a, b) is du_a/dx_b.
    pub fn velocity_gradient(&self, p: &Point2<f64>) -> Matrix2<f64> {
        let (x, y) = (p.x, p.y);
        Matrix2::new(
            PI * (2.0 * PI * x).sin() * (2.0 * PI * y).sin(),
            2.0 * PI * (PI * x).sin().powi(2) * (2.0 * PI * y).cos(),
            -2.0 * PI * (2.0 * PI * x).cos() * (PI * y).sin().powi(2),
            -PI * (2.0 * PI * x).sin() * (2.0 * PI * y).sin(),
        )
    }

    pub fn velocity_laplacian(&self, p: &Point2<f64>) -> Vector2<f64> {
        let (x, y) = (p.x, p.y);
        let pi2 = PI * PI;
        Vector2::new(
            2.0 * pi2 * (2.0 * PI * x).cos() * (2.0 * PI * y).sin()
                - 4.0 * pi2 * (PI * x).sin().powi(2) * (2.0 * PI * y).sin(),
            4.0 * pi2 * (2.0 * PI * x).sin() * (PI * y).sin().powi(2)
                - 2.0 * pi2 * (2.0 * PI * x).sin() * (2.0 * PI * y).cos(),
        )
    }

    pub fn pressure(&self, p: &Point2<f64>) -> f64 {
        (PI * p.x).cos() * (PI * p.y).cos()
    }

    pub fn pressure_gradient(&self, p: &Point2<f64>) -> Vector2<f64> {
        let (x, y) = (p.x, p.y);
        Vector2::new(
            -PI * (PI * x).sin() * (PI * y).cos(),
            -PI * (PI * x).cos() * (PI * y).sin(),
        )
    }
}

impl FlowFunction for MmsSolution {
    fn value(&self, p: &Point2<f64>, component: usize) -> f64 {
        match component {
            0 | 1 => self.velocity(p)[component],
            _ => self.pressure(p),
        }
    }
}

/// Forcing that makes `MmsSolution` an exact steady Navier-Stokes
/// solution: f = (u . grad) u - nu lap u + grad p.
pub struct MmsForcing {
    pub viscosity: f64,
}

impl FlowFunction for MmsForcing {
    fn value(&self, p: &Point2<f64>, component: usize) -> f64 {
        if component >= 2 {
            return 0.0;
        }
        let exact = MmsSolution;
        let u = exact.velocity(p);
        let grad = exact.velocity_gradient(p);
        let f = grad * u - self.viscosity * exact.velocity_laplacian(p)
            + exact.pressure_gradient(p);
        f[component]
    }
}

/// Analytic Taylor-Couette velocity between two concentric cylinders,
/// the inner rotating at `omega`, the outer fixed:
///   u_theta(r) = A r + B / r
///   A = -omega r1^2 / (r2^2 - r1^2),  B = omega r1^2 r2^2 / (r2^2 - r1^2)
/// Rigid rotation inside the inner cylinder, rest outside the outer one.
pub struct TaylorCouetteSolution {
    pub center: Point2<f64>,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub omega: f64,
}

impl TaylorCouetteSolution {
    pub fn tangential_speed(&self, r: f64) -> f64 {
        let (r1, r2) = (self.inner_radius, self.outer_radius);
        if r < r1 {
            return self.omega * r;
        }
        if r > r2 {
            return 0.0;
        }
        let denom = r2 * r2 - r1 * r1;
        let a = -self.omega * r1 * r1 / denom;
        let b = self.omega * r1 * r1 * r2 * r2 / denom;
        a * r + b / r
    }
}

impl FlowFunction for TaylorCouetteSolution {
    fn value(&self, p: &Point2<f64>, component: usize) -> f64 {
        if component >= 2 {
            return 0.0;
        }
        let rel = p - self.center;
        let r = rel.norm();
        if r < 1e-14 {
            return 0.0;
        }
        let u_theta = self.tangential_speed(r);
        let theta = rel.y.atan2(rel.x);
        match component {
            0 => -theta.sin() * u_theta,
            _ => theta.cos() * u_theta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mms_velocity_vanishes_on_boundary() {
        let exact = MmsSolution;
        for &(x, y) in &[(-1.0, 0.3), (1.0, -0.7), (0.4, -1.0), (0.9, 1.0)] {
            let u = exact.velocity(&Point2::new(x, y));
            assert_relative_eq!(u.norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mms_is_divergence_free() {
        let exact = MmsSolution;
        for &(x, y) in &[(0.1, 0.2), (-0.5, 0.8), (0.33, -0.77)] {
            let g = exact.velocity_gradient(&Point2::new(x, y));
            assert_relative_eq!(g.m11 + g.m22, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_mms_derivatives_match_finite_differences() {
        let exact = MmsSolution;
        let p = Point2::new(0.312, -0.441);
        let h = 1e-6;

        let gx = (exact.velocity(&Point2::new(p.x + h, p.y))
            - exact.velocity(&Point2::new(p.x - h, p.y)))
            / (2.0 * h);
        let gy = (exact.velocity(&Point2::new(p.x, p.y + h))
            - exact.velocity(&Point2::new(p.x, p.y - h)))
            / (2.0 * h);
        let g = exact.velocity_gradient(&p);
        assert_relative_eq!(g.m11, gx.x, epsilon = 1e-7);
        assert_relative_eq!(g.m21, gx.y, epsilon = 1e-7);
        assert_relative_eq!(g.m12, gy.x, epsilon = 1e-7);
        assert_relative_eq!(g.m22, gy.y, epsilon = 1e-7);

        let lap_fd = (exact.velocity(&Point2::new(p.x + h, p.y))
            + exact.velocity(&Point2::new(p.x - h, p.y))
            + exact.velocity(&Point2::new(p.x, p.y + h))
            + exact.velocity(&Point2::new(p.x, p.y - h))
            - 4.0 * exact.velocity(&p))
            / (h * h);
        let lap = exact.velocity_laplacian(&p);
        assert_relative_eq!(lap.x, lap_fd.x, epsilon = 1e-3);
        assert_relative_eq!(lap.y, lap_fd.y, epsilon = 1e-3);

        let px = (exact.pressure(&Point2::new(p.x + h, p.y))
            - exact.pressure(&Point2::new(p.x - h, p.y)))
            / (2.0 * h);
        assert_relative_eq!(exact.pressure_gradient(&p).x, px, epsilon = 1e-7);
    }

    #[test]
    fn test_couette_profile_matches_boundary_speeds() {
        let sol = TaylorCouetteSolution {
            center: Point2::origin(),
            inner_radius: 0.21,
            outer_radius: 0.91,
            omega: 1.0 / 0.21,
        };
        // no-slip at both cylinders
        assert_relative_eq!(sol.tangential_speed(0.21), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sol.tangential_speed(0.91), 0.0, epsilon = 1e-12);
        // tangential direction at theta = 0 is +y
        let u = sol.vector_value(&Point2::new(0.21, 0.0));
        assert_relative_eq!(u[0], 0.0, epsilon = 1e-12);
        assert_relative_eq!(u[1], 1.0, epsilon = 1e-12);
    }
}
