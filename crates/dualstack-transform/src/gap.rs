//! Strong-duality constraint.
//!
//! Merges a primal with its dual and ties the two objectives together:
//! ```text
//!   c'x - (dual objective) = 0
//! ```
//! Every feasible point of the merged model is then an optimal primal/dual pair,
//! which lets an outer problem perturb the inner LP while keeping it optimal.

use dualstack_model::{Constraint, Model, ModelStore, Sense};

use crate::dual::DualityTransformer;
use crate::error::TransformError;

#[derive(Debug, Clone)]
pub struct DualityGapComposer {
    primal_sense: Sense,
    transformer: DualityTransformer,
    index: Option<String>,
}

impl DualityGapComposer {
    pub fn new(primal_sense: Sense) -> Self {
        Self {
            primal_sense,
            transformer: DualityTransformer::new(),
            index: None,
        }
    }

    /// Suffix the gap constraint id, for models carrying several gaps
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_infinity(mut self, infinity: f64) -> Self {
        self.transformer = self.transformer.with_infinity(infinity);
        self
    }

    /// Id of the equality row added by this composer
    pub fn gap_id(&self) -> String {
        match &self.index {
            Some(index) => format!("duality_gap_{index}"),
            None => "duality_gap".to_string(),
        }
    }

    /// Add the dual and the gap row to `model` itself
    pub fn add_duality_gap_in_place(&self, model: &mut Model) -> Result<(), TransformError> {
        self.add_duality_gap_to(model)
    }

    /// Build a fresh model named `duality_gap` holding a copy of `primal`,
    /// its dual and the gap row. `primal` is left untouched.
    pub fn add_duality_gap(&self, primal: &Model) -> Result<Model, TransformError> {
        let mut merged = Model::new("duality_gap").with_sense(primal.sense);
        merged.add_variables(primal.variables().cloned())?;
        merged.add_constraints(primal.constraints().cloned())?;
        for (variable, constraint, coef) in primal.matrix().iter() {
            merged.set_coefficient(variable, constraint, coef)?;
        }
        self.add_duality_gap_to(&mut merged)?;
        Ok(merged)
    }

    /// Derive the dual of the store's local model and write it, together with
    /// the gap row, through the store.
    pub fn add_duality_gap_to<S: ModelStore + ?Sized>(&self, store: &mut S) -> Result<(), TransformError> {
        let dual = self.transformer.derive_dual(store.local(), self.primal_sense)?;
        let primal_terms: Vec<(String, f64)> = store
            .local()
            .variables()
            .filter(|v| v.objective_coefficient != 0.0)
            .map(|v| (v.id.clone(), v.objective_coefficient))
            .collect();

        let gap = self.gap_id();
        store.add_constraint(Constraint::eq(gap.as_str(), 0.0))?;
        for (variable, coef) in &primal_terms {
            store.set_coefficient(variable, &gap, *coef)?;
        }

        for w in dual.variables() {
            store.add_variable(w.clone())?;
            if w.objective_coefficient != 0.0 {
                store.set_coefficient(&w.id, &gap, -w.objective_coefficient)?;
            }
        }
        for row in dual.constraints() {
            store.add_constraint(row.clone())?;
            for (variable, coef) in dual.row(&row.id) {
                store.set_coefficient(variable, &row.id, coef)?;
            }
        }

        tracing::debug!(
            component = "gap",
            operation = "add_duality_gap",
            gap = %gap,
            primal_terms = primal_terms.len(),
            dual_variables = dual.num_variables(),
            dual_constraints = dual.num_constraints(),
            "Added duality gap"
        );
        Ok(())
    }
}
