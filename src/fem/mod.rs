pub mod basis;
pub mod constraints;
pub mod dof;
pub mod fe_values;
pub mod mapping;
pub mod quadrature;

pub use basis::Q1Basis;
pub use constraints::ConstraintSet;
pub use dof::DofHandler;
pub use fe_values::{interpolate_pressure, interpolate_velocity, FeValues};
pub use mapping::{distance_to_unit_cell, find_cell_around_point, BilinearMap, InverseMapError};
pub use quadrature::GaussQuadrature;
