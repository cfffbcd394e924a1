pub mod assembler;
pub mod cases;
pub mod functions;
pub mod newton;
pub mod sharp;
pub mod solver;
pub mod surface;
pub mod traction;

pub use assembler::GlsAssembler;
pub use cases::CaseSetup;
pub use functions::{
    FlowFunction, MmsForcing, MmsSolution, TaylorCouetteSolution, UniformFlow, ZeroFlow,
};
pub use newton::{NewtonState, NewtonStats};
pub use sharp::SharpEdgeOverrider;
pub use solver::{CycleReport, FlowSolver, L2ErrorReport};
pub use surface::{ImmersedCircle, SurfaceVelocity};
pub use traction::{SamplingSide, TractionIntegrator, TractionReport};
