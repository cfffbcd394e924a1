//! Solver configuration.
//!
//! Plain data, loadable from TOML; the case constructors carry the
//! standard geometry of the verification problems.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SolveError;

/// Which verification problem to set up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseKind {
    /// Manufactured solution on the plain square, no immersed surface.
    Mms,
    /// Annular flow between two immersed concentric circles.
    TaylorCouette,
    /// Uniform stream past a fixed immersed circle.
    CylinderInChannel,
}

/// Linear solver backend for the Newton systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearSolverKind {
    Direct,
    BiCgStab,
}

/// Treatment of the pressure samples next to a sharp-edge boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureExtrapolation {
    /// Sample directly on the surface.
    None,
    /// Two samples along the normal, linearly extrapolated back.
    Linear,
    /// Three samples along the normal, quadratically extrapolated back.
    Quadratic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainConfig {
    pub p1: [f64; 2],
    pub p2: [f64; 2],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewtonConfig {
    /// Absolute residual norm below which the iteration stops.
    pub tolerance: f64,
    pub max_iterations: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImmersedConfig {
    pub center: [f64; 2],
    pub inner_radius: f64,
    /// Second concentric circle; present for the Taylor-Couette case.
    pub outer_radius: Option<f64>,
    /// Angular velocity of the inner circle.
    pub angular_velocity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TractionConfig {
    /// Number of sampling points on a circle.
    pub n_samples: usize,
    pub pressure_extrapolation: PressureExtrapolation,
}

/// Everything the solver needs to set up and run one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    pub case: CaseKind,
    pub viscosity: f64,
    /// Uniform refinement level of the background mesh: 2^level cells
    /// per side.
    pub refinement: u32,
    /// Enable the SUPG/Jacobian-completeness branch of the GLS
    /// stabilization. Both settings are supported; results differ
    /// quantitatively.
    pub supg: bool,
    /// Compute cell contributions with Rayon, scatter serially.
    pub parallel_assembly: bool,
    /// Inlet speed for the channel case.
    pub inlet_speed: f64,
    pub linear_solver: LinearSolverKind,
    pub domain: DomainConfig,
    pub newton: NewtonConfig,
    pub immersed: ImmersedConfig,
    pub traction: TractionConfig,
}

impl SolverConfig {
    /// Taylor-Couette setup: concentric circles r1 = 0.21 and
    /// r2 = 0.91 about the origin, inner surface speed 1.
    pub fn taylor_couette() -> Self {
        Self {
            case: CaseKind::TaylorCouette,
            viscosity: 1.0,
            refinement: 5,
            domain: DomainConfig {
                p1: [-1.0, -1.0],
                p2: [1.0, 1.0],
            },
            supg: true,
            parallel_assembly: false,
            inlet_speed: 0.0,
            newton: NewtonConfig {
                tolerance: 1e-9,
                max_iterations: 20,
            },
            linear_solver: LinearSolverKind::Direct,
            immersed: ImmersedConfig {
                center: [0.0, 0.0],
                inner_radius: 0.21,
                outer_radius: Some(0.91),
                angular_velocity: 1.0 / 0.21,
            },
            traction: TractionConfig {
                n_samples: 100,
                pressure_extrapolation: PressureExtrapolation::Quadratic,
            },
        }
    }

    /// Manufactured-solution verification setup on [-1,1]^2.
    pub fn mms() -> Self {
        Self {
            case: CaseKind::Mms,
            viscosity: 1.0,
            refinement: 4,
            domain: DomainConfig {
                p1: [-1.0, -1.0],
                p2: [1.0, 1.0],
            },
            supg: true,
            parallel_assembly: false,
            inlet_speed: 0.0,
            newton: NewtonConfig {
                tolerance: 1e-9,
                max_iterations: 10,
            },
            linear_solver: LinearSolverKind::Direct,
            immersed: ImmersedConfig {
                center: [0.0, 0.0],
                inner_radius: 0.0,
                outer_radius: None,
                angular_velocity: 0.0,
            },
            traction: TractionConfig {
                n_samples: 100,
                pressure_extrapolation: PressureExtrapolation::None,
            },
        }
    }

    /// Fixed cylinder at (0.2, 0), radius 0.21, in a uniform stream.
    pub fn cylinder_in_channel() -> Self {
        Self {
            case: CaseKind::CylinderInChannel,
            viscosity: 1.0,
            refinement: 5,
            domain: DomainConfig {
                p1: [-1.0, -1.0],
                p2: [1.0, 1.0],
            },
            supg: true,
            parallel_assembly: false,
            inlet_speed: 1.0,
            newton: NewtonConfig {
                tolerance: 1e-9,
                max_iterations: 20,
            },
            linear_solver: LinearSolverKind::Direct,
            immersed: ImmersedConfig {
                center: [0.2, 0.0],
                inner_radius: 0.21,
                outer_radius: None,
                angular_velocity: 0.0,
            },
            traction: TractionConfig {
                n_samples: 100,
                pressure_extrapolation: PressureExtrapolation::Linear,
            },
        }
    }

    /// Load a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SolveError> {
        let text = fs::read_to_string(path).map_err(|e| SolveError::Config(e.to_string()))?;
        toml::from_str(&text).map_err(|e| SolveError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_through_toml() {
        let config = SolverConfig::taylor_couette();
        let text = toml::to_string(&config).unwrap();
        let back: SolverConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.case, CaseKind::TaylorCouette);
        assert_eq!(back.immersed.outer_radius, Some(0.91));
        assert_eq!(back.linear_solver, LinearSolverKind::Direct);
    }

    #[test]
    fn test_couette_surface_speed() {
        let config = SolverConfig::taylor_couette();
        // inner surface speed = omega * r1 = 1
        let speed = config.immersed.angular_velocity * config.immersed.inner_radius;
        assert!((speed - 1.0).abs() < 1e-12);
    }
}
