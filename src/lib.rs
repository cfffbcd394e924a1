pub mod config;
pub mod error;
pub mod mesh;
pub mod mesh_generator;
pub mod fem;
pub mod linalg;
pub mod flow;

pub use config::{CaseKind, LinearSolverKind, PressureExtrapolation, SolverConfig};
pub use error::SolveError;
pub use mesh::{Mesh, QuadCell, VertexCellIndex};
pub use mesh_generator::MeshGenerator;
pub use fem::{BilinearMap, ConstraintSet, DofHandler, FeValues, GaussQuadrature, Q1Basis};
pub use linalg::{BiCgStab, DirectSolver, LinearSolver, SolverStats};
pub use flow::{
    FlowFunction, FlowSolver, GlsAssembler, ImmersedCircle, NewtonStats, SharpEdgeOverrider,
    SurfaceVelocity, TractionReport,
};
