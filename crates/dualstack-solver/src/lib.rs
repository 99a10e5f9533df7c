mod backend;
mod simplex;
mod solution;
mod standard;

pub use backend::{check_capabilities, BackendKind, Capabilities, SimplexBackend, SolveError, SolverBackend, SolverConfig};
pub use simplex::{Outcome, Solver};
pub use solution::{Solution, SolutionStatus};
pub use standard::{Origin, Row, StandardForm};
