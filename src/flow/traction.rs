use std::f64::consts::PI;

use log::warn;
use nalgebra::{Point2, Vector2};

use super::surface::ImmersedCircle;
use crate::config::PressureExtrapolation;
use crate::fem::fe_values::{interpolate_pressure, interpolate_velocity};
use crate::fem::mapping::find_cell_around_point;
use crate::fem::DofHandler;
use crate::mesh::Mesh;

/// Which side of the surface carries fluid to sample from: outward for
/// an interior obstacle, inward for an enclosing wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingSide {
    Outward,
    Inward,
}

/// Surface-integrated loads on one immersed circle.
#[derive(Debug, Clone)]
pub struct TractionReport {
    /// Viscous torque about the circle center.
    pub torque: f64,
    /// Viscous force resultant.
    pub viscous_force: Vector2<f64>,
    /// Pressure force resultant.
    pub pressure_force: Vector2<f64>,
}

/// Integrates pressure and viscous tractions along an immersed circle
/// by sampling the converged solution on equally spaced arc points.
///
/// The shear estimate differences the angular velocity between the
/// analytic surface value and an interpolated sample one step along the
/// normal; the pressure next to a sharp-edge boundary carries an O(h)
/// error, which the extrapolation variants push away from the surface.
pub struct TractionIntegrator<'a> {
    mesh: &'a Mesh,
    dofh: &'a DofHandler,
    viscosity: f64,
    n_samples: usize,
    extrapolation: PressureExtrapolation,
}

impl<'a> TractionIntegrator<'a> {
    pub fn new(
        mesh: &'a Mesh,
        dofh: &'a DofHandler,
        viscosity: f64,
        n_samples: usize,
        extrapolation: PressureExtrapolation,
    ) -> Self {
        assert!(n_samples > 1);
        Self {
            mesh,
            dofh,
            viscosity,
            n_samples,
            extrapolation,
        }
    }

    pub fn integrate(
        &self,
        surface: &ImmersedCircle,
        solution: &[f64],
        side: SamplingSide,
    ) -> TractionReport {
        let n = self.n_samples;
        let r = surface.radius;
        let mu = self.viscosity;
        let dr = self.mesh.min_cell_diameter() / 2.0_f64.sqrt();
        let arc = 2.0 * PI * r / (n - 1) as f64;
        let sign = match side {
            SamplingSide::Outward => 1.0,
            SamplingSide::Inward => -1.0,
        };

        let mut torque = 0.0;
        let mut viscous_force = Vector2::zeros();
        let mut pressure_force = Vector2::zeros();

        for i in 0..n {
            let theta = 2.0 * PI * i as f64 / n as f64;
            let normal = Vector2::new(theta.cos(), theta.sin());
            let tangent = Vector2::new(-theta.sin(), theta.cos());
            let surface_point = surface.center + r * normal;

            // tangential speed at the wall from the prescribed value,
            // one step into the fluid from the interpolated field
            let u_wall = surface.boundary_velocity(&surface_point).dot(&tangent);
            let sample_point = surface_point + sign * dr * normal;
            let r_sample = r + sign * dr;

            if let Some((cell, xi)) = find_cell_around_point(self.mesh, &sample_point) {
                let u_sample =
                    interpolate_velocity(self.mesh, self.dofh, cell, &xi, solution).dot(&tangent);
                let d_omega = (u_sample / r_sample - u_wall / r) / dr;
                torque += r * d_omega * mu * r * arc;
                viscous_force += mu * r * d_omega * arc * tangent;
            } else {
                warn!(
                    "shear sample ({:.4}, {:.4}) outside the mesh, skipped",
                    sample_point.x, sample_point.y
                );
            }

            if let Some(p) = self.sample_pressure(&surface_point, &(sign * normal), dr, solution) {
                pressure_force += -p * normal * arc;
            }
        }

        TractionReport {
            torque,
            viscous_force,
            pressure_force,
        }
    }

    /// Pressure at a surface point, optionally extrapolated from
    /// samples at dr, 2 dr, 3 dr along the sampling direction.
    fn sample_pressure(
        &self,
        surface_point: &Point2<f64>,
        direction: &Vector2<f64>,
        dr: f64,
        solution: &[f64],
    ) -> Option<f64> {
        let at = |offset: f64| -> Option<f64> {
            let p = surface_point + offset * direction;
            let (cell, xi) = find_cell_around_point(self.mesh, &p)?;
            Some(interpolate_pressure(self.mesh, self.dofh, cell, &xi, solution))
        };

        let value = match self.extrapolation {
            PressureExtrapolation::None => at(0.0)?,
            PressureExtrapolation::Linear => {
                let p1 = at(dr)?;
                let p2 = at(2.0 * dr)?;
                2.0 * p1 - p2
            }
            PressureExtrapolation::Quadratic => {
                let p1 = at(dr)?;
                let p2 = at(2.0 * dr)?;
                let p3 = at(3.0 * dr)?;
                3.0 * p1 - 3.0 * p2 + p3
            }
        };
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PressureExtrapolation;
    use crate::flow::functions::{FlowFunction, TaylorCouetteSolution};
    use crate::mesh_generator::MeshGenerator;
    use approx::assert_relative_eq;

    /// Interpolate an analytic field onto the dofs, then check the
    /// integrator against the closed-form Couette torque.
    #[test]
    fn test_torque_on_interpolated_couette_field() {
        let (r1, r2) = (0.21, 0.91);
        let omega = 1.0 / r1;
        let exact = TaylorCouetteSolution {
            center: Point2::origin(),
            inner_radius: r1,
            outer_radius: r2,
            omega,
        };

        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 6);
        let dofh = DofHandler::distribute(&mesh);
        let mut solution = vec![0.0; dofh.n_dofs()];
        for (v, p) in mesh.geometry.vertices.iter().enumerate() {
            solution[dofh.velocity_dof(v, 0)] = exact.value(p, 0);
            solution[dofh.velocity_dof(v, 1)] = exact.value(p, 1);
        }

        let mu = 1.0;
        let integrator =
            TractionIntegrator::new(&mesh, &dofh, mu, 200, PressureExtrapolation::None);
        let surface = ImmersedCircle::rotating(Point2::origin(), r1, omega);
        let report = integrator.integrate(&surface, &solution, SamplingSide::Outward);

        // the forward difference samples the shear half a step off the
        // wall, which on the 1/r^2 angular-velocity profile biases the
        // estimate by O(dr); the bound below covers that bias
        let b = omega * r1 * r1 * r2 * r2 / (r2 * r2 - r1 * r1);
        let expected = 4.0 * PI * mu * b;
        assert_relative_eq!(report.torque.abs(), expected, max_relative = 0.25);
        // pure rotation: viscous force resultant cancels
        assert!(report.viscous_force.norm() < 0.05 * expected);
    }

    #[test]
    fn test_constant_pressure_yields_zero_force() {
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 4);
        let dofh = DofHandler::distribute(&mesh);
        let mut solution = vec![0.0; dofh.n_dofs()];
        for v in 0..mesh.num_vertices() {
            solution[dofh.pressure_dof(v)] = 7.3;
        }

        for extrapolation in [
            PressureExtrapolation::None,
            PressureExtrapolation::Linear,
            PressureExtrapolation::Quadratic,
        ] {
            let integrator = TractionIntegrator::new(&mesh, &dofh, 1.0, 64, extrapolation);
            let surface = ImmersedCircle::fixed(Point2::origin(), 0.35);
            let report = integrator.integrate(&surface, &solution, SamplingSide::Outward);
            assert!(
                report.pressure_force.norm() < 1e-10,
                "constant pressure produced a net force under {:?}",
                extrapolation
            );
        }
    }

    #[test]
    fn test_linear_pressure_recovers_buoyancy_direction() {
        // p = x gives a force in -x on any closed surface
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 5);
        let dofh = DofHandler::distribute(&mesh);
        let mut solution = vec![0.0; dofh.n_dofs()];
        for (v, p) in mesh.geometry.vertices.iter().enumerate() {
            solution[dofh.pressure_dof(v)] = p.x;
        }

        let r = 0.3;
        let integrator =
            TractionIntegrator::new(&mesh, &dofh, 1.0, 200, PressureExtrapolation::None);
        let surface = ImmersedCircle::fixed(Point2::origin(), r);
        let report = integrator.integrate(&surface, &solution, SamplingSide::Outward);

        // - closed-surface integral of p n for p = x is (-pi r^2, 0)
        assert_relative_eq!(report.pressure_force.x, -PI * r * r, max_relative = 0.05);
        assert!(report.pressure_force.y.abs() < 1e-10);
    }
}
