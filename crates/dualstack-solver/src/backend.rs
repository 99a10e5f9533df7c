use std::fmt;
use std::str::FromStr;

use dualstack_model::{Model, Sense};
use thiserror::Error;

use crate::simplex::Solver;
use crate::solution::{Solution, SolutionStatus};
use crate::standard::StandardForm;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    #[error("Unknown solver backend: {0}")]
    UnknownBackend(String),
    #[error("Solver backend '{0}' is not available in this build")]
    BackendUnavailable(BackendKind),
    #[error("Solver backend '{backend}' does not support {capability}")]
    Unsupported { backend: BackendKind, capability: String },
}

/// What a backend can handle beyond plain continuous LPs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub integer_variables: bool,
    pub quadratic_objective: bool,
}

/// Adapter between a transformed model and an LP/MILP engine
pub trait SolverBackend {
    fn kind(&self) -> BackendKind;

    fn capabilities(&self) -> Capabilities;

    fn solve(&self, model: &Model) -> Result<Solution, SolveError>;
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// Built-in dense simplex (continuous LP only)
    #[default]
    Simplex,
    Gurobi,
    Cplex,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Simplex => write!(f, "simplex"),
            BackendKind::Gurobi => write!(f, "gurobi"),
            BackendKind::Cplex => write!(f, "cplex"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = SolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simplex" => Ok(BackendKind::Simplex),
            "gurobi" | "gurobipy" => Ok(BackendKind::Gurobi),
            "cplex" => Ok(BackendKind::Cplex),
            other => Err(SolveError::UnknownBackend(other.to_string())),
        }
    }
}

/// Backend selection and tuning
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub backend: BackendKind,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Treat integer variables as continuous
    pub relax_integrality: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Simplex,
            max_iterations: 10000,
            tolerance: 1e-9,
            relax_integrality: false,
        }
    }
}

impl SolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_relaxed_integrality(mut self, relax: bool) -> Self {
        self.relax_integrality = relax;
        self
    }

    /// Instantiate the configured backend
    pub fn build(&self) -> Result<Box<dyn SolverBackend>, SolveError> {
        match self.backend {
            BackendKind::Simplex => Ok(Box::new(SimplexBackend {
                solver: Solver::new()
                    .with_max_iterations(self.max_iterations)
                    .with_tolerance(self.tolerance),
                relax_integrality: self.relax_integrality,
            })),
            other => Err(SolveError::BackendUnavailable(other)),
        }
    }
}

/// Reject models that need features the backend lacks
pub fn check_capabilities(
    backend: &dyn SolverBackend,
    model: &Model,
    relax_integrality: bool,
) -> Result<(), SolveError> {
    let caps = backend.capabilities();
    if !caps.integer_variables && !relax_integrality {
        if let Some(v) = model.variables().find(|v| v.is_integer()) {
            return Err(SolveError::Unsupported {
                backend: backend.kind(),
                capability: format!("integer variables (first: {})", v.id),
            });
        }
    }
    if !caps.quadratic_objective && model.variables().any(|v| v.quadratic_coefficient.is_some()) {
        return Err(SolveError::Unsupported {
            backend: backend.kind(),
            capability: "quadratic objectives".to_string(),
        });
    }
    Ok(())
}

pub struct SimplexBackend {
    solver: Solver,
    relax_integrality: bool,
}

impl SolverBackend for SimplexBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simplex
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::default()
    }

    fn solve(&self, model: &Model) -> Result<Solution, SolveError> {
        check_capabilities(self, model, self.relax_integrality)?;

        let form = StandardForm::from_model(model, model.sense == Sense::Minimize);
        let outcome = self.solver.solve(&form);

        tracing::debug!(
            component = "solver",
            backend = %self.kind(),
            model = %model.name,
            columns = form.num_columns(),
            rows = form.rows.len(),
            status = ?outcome.status,
            "Solved standard form"
        );

        if outcome.status != SolutionStatus::Optimal {
            return Ok(Solution::without_values(outcome.status, f64::NAN));
        }

        let values = model
            .variables()
            .map(|v| v.id.clone())
            .zip(form.recover(&outcome.columns))
            .collect();
        let objective_value = model.objective_value(&values);

        Ok(Solution {
            status: SolutionStatus::Optimal,
            values,
            objective_value,
        })
    }
}
