use indexmap::IndexMap;

/// The result of solving a model
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone)]
pub struct Solution {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal value of each model variable, keyed by id in model order
    pub values: IndexMap<String, f64>,
    /// Optimal objective value
    pub objective_value: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// An optimal solution was found
    Optimal,
    /// The problem is infeasible (no solution exists)
    Infeasible,
    /// The problem is unbounded
    Unbounded,
    /// Solver gave up (iteration limit or numerical trouble)
    Error,
}

impl Solution {
    pub(crate) fn without_values(status: SolutionStatus, objective_value: f64) -> Self {
        Self {
            status,
            values: IndexMap::new(),
            objective_value,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn value(&self, id: &str) -> Option<f64> {
        self.values.get(id).copied()
    }
}
