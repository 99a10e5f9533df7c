//! Two-regime coefficients switched by a binary indicator.
//!
//! The coefficient of `x` in row `c` is `a1` while the indicator is off and
//! `a2` while it is on:
//! ```text
//!   a1 x + (a2 - a1) z [<=>] b        z = x if y = 1, z = 0 if y = 0
//! ```
//! The same rewrite is applied to the transposed entry of the dual
//! (`wa_<c>` in `dual_<x>`) under the same indicator, so the duality-gap row
//! of the merged model stays valid in both regimes.

use dualstack_model::{CoefficientMode, ModelError, ModelStore, Variable};

use crate::dual::{dual_constraint_id, wa_id, wl_id, wu_id};
use crate::error::TransformError;
use crate::links::{self, LinkRows};
use crate::scenario::{scenario_suffix, ScenarioStack};

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DisjunctivePair {
    pub constraint: String,
    pub variable: String,
    /// Coefficient while the indicator is 0
    pub a1: f64,
    /// Coefficient while the indicator is 1
    pub a2: f64,
}

impl DisjunctivePair {
    pub fn new(constraint: impl Into<String>, variable: impl Into<String>, a1: f64, a2: f64) -> Self {
        Self {
            constraint: constraint.into(),
            variable: variable.into(),
            a1,
            a2,
        }
    }
}

pub fn indicator_id(constraint: &str, variable: &str) -> String {
    format!("binary_{constraint}_{variable}")
}

#[derive(Debug, Clone)]
pub struct DisjunctiveEncoder {
    big_m: f64,
}

impl Default for DisjunctiveEncoder {
    fn default() -> Self {
        Self { big_m: 1e4 }
    }
}

impl DisjunctiveEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    /// Rewrite every pair on a model that already carries its dual.
    ///
    /// Indicators and slices that already exist are reused.
    pub fn encode<S: ModelStore + ?Sized>(&self, store: &mut S, pairs: &[DisjunctivePair]) -> Result<(), TransformError> {
        for pair in pairs {
            let y = store.ensure_variable(Variable::binary(indicator_id(&pair.constraint, &pair.variable)))?;
            self.encode_pair(store, &y.id, &pair.constraint, &pair.variable, pair, CoefficientMode::Replace)?;
        }
        tracing::debug!(
            component = "disjunctive",
            operation = "encode",
            pairs = pairs.len(),
            big_m = self.big_m,
            "Encoded disjunctive pairs"
        );
        Ok(())
    }

    /// Rewrite every pair once per scenario in a single merged store, all
    /// scenarios sharing one indicator per pair. For a [`ScenarioStack`] use
    /// [`encode_scenarios`](Self::encode_scenarios).
    ///
    /// Pair ids name the reference entities; scenario `s` rewrites
    /// `<constraint>_<s>` and `<variable>_<s>`. Indicator coefficients are
    /// accumulated into the link rows rather than replaced.
    pub fn encode_stacked<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        pairs: &[DisjunctivePair],
        scenarios: &[impl AsRef<str>],
    ) -> Result<(), TransformError> {
        for pair in pairs {
            let y = store.ensure_variable(Variable::binary(indicator_id(&pair.constraint, &pair.variable)))?;
            for scenario in scenarios {
                let suffix = scenario_suffix(scenario.as_ref());
                let constraint = format!("{}{suffix}", pair.constraint);
                let variable = format!("{}{suffix}", pair.variable);
                self.encode_pair(store, &y.id, &constraint, &variable, pair, CoefficientMode::Accumulate)?;
            }
        }
        tracing::debug!(
            component = "disjunctive",
            operation = "encode_stacked",
            pairs = pairs.len(),
            scenarios = scenarios.len(),
            big_m = self.big_m,
            "Encoded stacked disjunctive pairs"
        );
        Ok(())
    }

    /// Rewrite every pair in each scenario clone of `stack`.
    ///
    /// One indicator per pair is held by the canonical model and shared by all
    /// clones. Slices and link rows are written through each scenario's scope,
    /// so a clone sees the same coefficients as the canonical model.
    pub fn encode_scenarios(&self, stack: &mut ScenarioStack, pairs: &[DisjunctivePair]) -> Result<(), TransformError> {
        let scenarios: Vec<(String, String)> = stack
            .suffixes()
            .map(|(key, suffix)| (key.to_string(), suffix.to_string()))
            .collect();
        for pair in pairs {
            let y = stack
                .canonical_mut()
                .ensure_variable(Variable::binary(indicator_id(&pair.constraint, &pair.variable)))?;
            for (scenario, suffix) in &scenarios {
                let constraint = format!("{}{suffix}", pair.constraint);
                let variable = format!("{}{suffix}", pair.variable);
                let mut scope = stack.scope(scenario)?;
                self.encode_pair(&mut scope, &y.id, &constraint, &variable, pair, CoefficientMode::Accumulate)?;
            }
        }
        tracing::debug!(
            component = "disjunctive",
            operation = "encode_scenarios",
            pairs = pairs.len(),
            scenarios = scenarios.len(),
            big_m = self.big_m,
            "Encoded disjunctive pairs per scenario"
        );
        Ok(())
    }

    fn encode_pair<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        y: &str,
        constraint: &str,
        variable: &str,
        pair: &DisjunctivePair,
        y_mode: CoefficientMode,
    ) -> Result<(), TransformError> {
        let key = format!("{constraint}_{variable}");
        let delta = pair.a2 - pair.a1;

        // Primal entry
        let x = require_variable(&*store, variable)?;
        if store.constraint(constraint).is_none() {
            return Err(ModelError::UnknownConstraint(constraint.to_string()).into());
        }
        let (lower, upper) = links::slice_bounds(x.lower_bound, x.upper_bound);
        let z = store.ensure_variable(Variable::new(format!("z_{key}"), lower, upper))?;
        store.set_coefficient(&x.id, constraint, pair.a1)?;
        store.set_coefficient(&z.id, constraint, delta)?;
        links::link_slice(
            store,
            &LinkRows::new("z_big_m", "z", &key),
            &x.id,
            &z.id,
            y,
            (x.lower_bound, x.upper_bound),
            self.big_m,
            y_mode,
        )?;

        // Transposed entry in the dual
        let row = dual_constraint_id(variable);
        if store.constraint(&row).is_none() {
            return Err(ModelError::UnknownConstraint(row).into());
        }
        let wa = require_variable(&*store, &wa_id(constraint))?;
        require_variable(&*store, &wl_id(variable))?;
        require_variable(&*store, &wu_id(variable))?;

        let (lower, upper) = links::slice_bounds(wa.lower_bound, wa.upper_bound);
        let za = store.ensure_variable(Variable::new(format!("za_{key}"), lower, upper))?;
        store.set_coefficient(&wa.id, &row, pair.a1)?;
        store.set_coefficient(&za.id, &row, delta)?;
        links::link_slice(
            store,
            &LinkRows::new("za_big_m", "za", &key),
            &wa.id,
            &za.id,
            y,
            (wa.lower_bound, wa.upper_bound),
            self.big_m,
            y_mode,
        )?;
        Ok(())
    }
}

fn require_variable<S: ModelStore + ?Sized>(store: &S, id: &str) -> Result<Variable, TransformError> {
    store
        .variable(id)
        .cloned()
        .ok_or_else(|| ModelError::UnknownVariable(id.to_string()).into())
}
