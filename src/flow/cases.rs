use nalgebra::Point2;

use super::functions::{
    FlowFunction, MmsForcing, MmsSolution, TaylorCouetteSolution, UniformFlow, ZeroFlow,
};
use super::surface::ImmersedCircle;
use crate::config::{CaseKind, SolverConfig};
use crate::fem::dof::DIM;
use crate::fem::{ConstraintSet, DofHandler};
use crate::mesh::Mesh;

const BOUNDARY_TOLERANCE: f64 = 1e-10;

/// Everything that distinguishes one simulation case from another:
/// background-boundary conditions, immersed surfaces, forcing and the
/// exact solution used for verification.
pub struct CaseSetup {
    pub forcing: Box<dyn FlowFunction + Sync>,
    pub exact_solution: Option<Box<dyn FlowFunction + Sync>>,
    pub surfaces: Vec<ImmersedCircle>,
}

impl CaseSetup {
    pub fn from_config(config: &SolverConfig) -> Self {
        let center = Point2::new(config.immersed.center[0], config.immersed.center[1]);
        match config.case {
            CaseKind::Mms => Self {
                forcing: Box::new(MmsForcing {
                    viscosity: config.viscosity,
                }),
                exact_solution: Some(Box::new(MmsSolution)),
                surfaces: Vec::new(),
            },
            CaseKind::TaylorCouette => {
                let outer_radius = config
                    .immersed
                    .outer_radius
                    .expect("Taylor-Couette needs an outer radius");
                Self {
                    forcing: Box::new(ZeroFlow),
                    exact_solution: Some(Box::new(TaylorCouetteSolution {
                        center,
                        inner_radius: config.immersed.inner_radius,
                        outer_radius,
                        omega: config.immersed.angular_velocity,
                    })),
                    surfaces: vec![
                        ImmersedCircle::rotating(
                            center,
                            config.immersed.inner_radius,
                            config.immersed.angular_velocity,
                        ),
                        ImmersedCircle::fixed(center, outer_radius),
                    ],
                }
            }
            CaseKind::CylinderInChannel => Self {
                forcing: Box::new(ZeroFlow),
                exact_solution: None,
                surfaces: vec![ImmersedCircle::fixed(center, config.immersed.inner_radius)],
            },
        }
    }

    /// Build the inhomogeneous constraint set on the background-mesh
    /// boundary; the homogeneous twin is derived from it.
    ///
    /// Velocity components only; pressure is never constrained.
    pub fn boundary_constraints(
        &self,
        config: &SolverConfig,
        mesh: &Mesh,
        dofh: &DofHandler,
    ) -> ConstraintSet {
        let mut constraints = ConstraintSet::new(dofh.n_dofs());
        let p1 = Point2::new(config.domain.p1[0], config.domain.p1[1]);
        let p2 = Point2::new(config.domain.p2[0], config.domain.p2[1]);

        for (v, p) in mesh.geometry.vertices.iter().enumerate() {
            let on_left = (p.x - p1.x).abs() < BOUNDARY_TOLERANCE;
            let on_right = (p.x - p2.x).abs() < BOUNDARY_TOLERANCE;
            let on_bottom = (p.y - p1.y).abs() < BOUNDARY_TOLERANCE;
            let on_top = (p.y - p2.y).abs() < BOUNDARY_TOLERANCE;
            if !(on_left || on_right || on_bottom || on_top) {
                continue;
            }

            match config.case {
                CaseKind::Mms => {
                    // exact solution traced onto the boundary
                    let exact = MmsSolution;
                    for comp in 0..DIM {
                        constraints.constrain(dofh.velocity_dof(v, comp), exact.value(p, comp));
                    }
                }
                CaseKind::TaylorCouette => {
                    // outer walls at rest; both cylinders are immersed
                    for comp in 0..DIM {
                        constraints.constrain(dofh.velocity_dof(v, comp), 0.0);
                    }
                }
                CaseKind::CylinderInChannel => {
                    let inlet = UniformFlow {
                        speed: config.inlet_speed,
                    };
                    if on_left {
                        for comp in 0..DIM {
                            constraints.constrain(dofh.velocity_dof(v, comp), inlet.value(p, comp));
                        }
                    } else if on_bottom || on_top {
                        // symmetry: no normal flow, tangential left free
                        constraints.constrain(dofh.velocity_dof(v, 1), 0.0);
                    }
                    // outlet (right) is traction free
                }
            }
        }

        constraints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SolverConfig;
    use crate::mesh_generator::MeshGenerator;
    use approx::assert_relative_eq;

    #[test]
    fn test_taylor_couette_setup() {
        let config = SolverConfig::taylor_couette();
        let setup = CaseSetup::from_config(&config);
        assert_eq!(setup.surfaces.len(), 2);
        assert!(setup.exact_solution.is_some());

        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 3);
        let dofh = DofHandler::distribute(&mesh);
        let constraints = setup.boundary_constraints(&config, &mesh, &dofh);

        // 8 cells per side -> 32 boundary vertices, 2 components each
        assert_eq!(constraints.num_constraints(), 32 * 2);
        for v in 0..mesh.num_vertices() {
            if constraints.is_constrained(dofh.velocity_dof(v, 0)) {
                assert_relative_eq!(constraints.value(dofh.velocity_dof(v, 0)), 0.0);
            }
            assert!(!constraints.is_constrained(dofh.pressure_dof(v)));
        }
    }

    #[test]
    fn test_cylinder_symmetry_walls_constrain_only_normal_component() {
        let config = SolverConfig::cylinder_in_channel();
        let setup = CaseSetup::from_config(&config);
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 3);
        let dofh = DofHandler::distribute(&mesh);
        let constraints = setup.boundary_constraints(&config, &mesh, &dofh);

        for (v, p) in mesh.geometry.vertices.iter().enumerate() {
            let on_left = (p.x + 1.0).abs() < 1e-12;
            let on_wall = (p.y + 1.0).abs() < 1e-12 || (p.y - 1.0).abs() < 1e-12;
            let on_right = (p.x - 1.0).abs() < 1e-12;
            if on_left {
                assert!(constraints.is_constrained(dofh.velocity_dof(v, 0)));
                assert_relative_eq!(constraints.value(dofh.velocity_dof(v, 0)), 1.0);
            } else if on_wall {
                assert!(!constraints.is_constrained(dofh.velocity_dof(v, 0)));
                assert!(constraints.is_constrained(dofh.velocity_dof(v, 1)));
            } else if !on_right {
                assert!(!constraints.is_constrained(dofh.velocity_dof(v, 0)));
                assert!(!constraints.is_constrained(dofh.velocity_dof(v, 1)));
            }
        }
    }

    #[test]
    fn test_mms_boundary_values_are_zero_on_default_domain() {
        // the manufactured velocity vanishes on the boundary of [-1,1]^2
        let config = SolverConfig::mms();
        let setup = CaseSetup::from_config(&config);
        let mesh = MeshGenerator::rectangle(Point2::new(-1.0, -1.0), Point2::new(1.0, 1.0), 2);
        let dofh = DofHandler::distribute(&mesh);
        let constraints = setup.boundary_constraints(&config, &mesh, &dofh);
        for dof in 0..dofh.n_dofs() {
            if constraints.is_constrained(dof) {
                assert_relative_eq!(constraints.value(dof), 0.0, epsilon = 1e-12);
            }
        }
    }
}
