use thiserror::Error;

/// Fatal failures of the solve pipeline.
///
/// Accepted fallbacks (line-search exhaustion, inverse-mapping misses,
/// dofs sitting exactly on an immersed surface) are handled in place and
/// never surface here.
#[derive(Debug, Error)]
pub enum SolveError {
    /// The assembled system matrix could not be factored.
    #[error("system matrix is singular")]
    SingularMatrix,

    /// An iterative linear solver ran out of iterations.
    #[error("linear solver stalled after {iterations} iterations (residual {residual:.3e})")]
    LinearSolverDiverged { iterations: usize, residual: f64 },

    /// Configuration file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    Config(String),
}
