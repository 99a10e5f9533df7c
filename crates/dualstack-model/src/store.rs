//! Entity stores that transformations write through.
//!
//! A plain [`Model`] is a store on its own. A [`LayeredModel`] pairs a local
//! model with a canonical model shared by a whole family of models: lookups try
//! the local model first and fall back to the canonical one, and every write
//! lands in both, so ids stay unique across the family.

use crate::entity::{Constraint, Entity, EntityKind, Variable};
use crate::error::ModelError;
use crate::matrix::CoefficientMode;
use crate::model::Model;

pub trait ModelStore {
    /// The model whose entities this store owns directly
    fn local(&self) -> &Model;

    fn variable(&self, id: &str) -> Option<&Variable>;

    fn constraint(&self, id: &str) -> Option<&Constraint>;

    fn register(&mut self, entity: Entity) -> Result<(), ModelError>;

    fn update_variable(&mut self, id: &str, update: &mut dyn FnMut(&mut Variable)) -> Result<(), ModelError>;

    fn insert_coefficient(
        &mut self,
        variable: &str,
        constraint: &str,
        value: f64,
        mode: CoefficientMode,
    ) -> Result<f64, ModelError>;

    fn remove_coefficient(&mut self, variable: &str, constraint: &str) -> Option<f64>;

    fn coefficient(&self, variable: &str, constraint: &str) -> f64;

    fn lookup(&self, kind: EntityKind, id: &str) -> Option<Entity> {
        match kind {
            EntityKind::Variable => self.variable(id).cloned().map(Entity::Variable),
            EntityKind::Constraint => self.constraint(id).cloned().map(Entity::Constraint),
        }
    }

    fn add_variable(&mut self, variable: Variable) -> Result<(), ModelError> {
        self.register(Entity::Variable(variable))
    }

    fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ModelError> {
        self.register(Entity::Constraint(constraint))
    }

    /// Fetch-and-continue: add the variable unless its id is already known,
    /// returning the stored variable either way.
    fn ensure_variable(&mut self, variable: Variable) -> Result<Variable, ModelError> {
        if let Some(existing) = self.variable(&variable.id) {
            return Ok(existing.clone());
        }
        self.add_variable(variable.clone())?;
        Ok(variable)
    }

    fn set_coefficient(&mut self, variable: &str, constraint: &str, value: f64) -> Result<(), ModelError> {
        self.insert_coefficient(variable, constraint, value, CoefficientMode::Replace)
            .map(|_| ())
    }
}

impl ModelStore for Model {
    fn local(&self) -> &Model {
        self
    }

    fn variable(&self, id: &str) -> Option<&Variable> {
        Model::variable(self, id)
    }

    fn constraint(&self, id: &str) -> Option<&Constraint> {
        Model::constraint(self, id)
    }

    fn register(&mut self, entity: Entity) -> Result<(), ModelError> {
        Model::register(self, entity)
    }

    fn update_variable(&mut self, id: &str, update: &mut dyn FnMut(&mut Variable)) -> Result<(), ModelError> {
        let variable = self
            .variable_mut(id)
            .ok_or_else(|| ModelError::UnknownVariable(id.to_string()))?;
        update(variable);
        Ok(())
    }

    fn insert_coefficient(
        &mut self,
        variable: &str,
        constraint: &str,
        value: f64,
        mode: CoefficientMode,
    ) -> Result<f64, ModelError> {
        Model::insert_coefficient(self, variable, constraint, value, mode)
    }

    fn remove_coefficient(&mut self, variable: &str, constraint: &str) -> Option<f64> {
        Model::remove_coefficient(self, variable, constraint)
    }

    fn coefficient(&self, variable: &str, constraint: &str) -> f64 {
        Model::coefficient(self, variable, constraint)
    }
}

/// A local model backed by a canonical model.
pub struct LayeredModel<'a> {
    local: &'a mut Model,
    canonical: &'a mut Model,
}

impl<'a> LayeredModel<'a> {
    pub fn new(local: &'a mut Model, canonical: &'a mut Model) -> Self {
        Self { local, canonical }
    }

    pub fn canonical(&self) -> &Model {
        &*self.canonical
    }

    /// Make sure a variable known to either layer exists in both.
    fn mirror_variable(&mut self, id: &str) -> Result<(), ModelError> {
        match (self.local.contains_variable(id), self.canonical.contains_variable(id)) {
            (true, true) => Ok(()),
            (false, true) => {
                let v = self.canonical.variable(id).cloned();
                self.local.add_variable(v.ok_or_else(|| ModelError::UnknownVariable(id.to_string()))?)
            }
            (true, false) => {
                let v = self.local.variable(id).cloned();
                self.canonical.add_variable(v.ok_or_else(|| ModelError::UnknownVariable(id.to_string()))?)
            }
            (false, false) => Err(ModelError::UnknownVariable(id.to_string())),
        }
    }

    fn mirror_constraint(&mut self, id: &str) -> Result<(), ModelError> {
        match (self.local.contains_constraint(id), self.canonical.contains_constraint(id)) {
            (true, true) => Ok(()),
            (false, true) => {
                let c = self.canonical.constraint(id).cloned();
                self.local.add_constraint(c.ok_or_else(|| ModelError::UnknownConstraint(id.to_string()))?)
            }
            (true, false) => {
                let c = self.local.constraint(id).cloned();
                self.canonical.add_constraint(c.ok_or_else(|| ModelError::UnknownConstraint(id.to_string()))?)
            }
            (false, false) => Err(ModelError::UnknownConstraint(id.to_string())),
        }
    }
}

impl ModelStore for LayeredModel<'_> {
    fn local(&self) -> &Model {
        &*self.local
    }

    fn variable(&self, id: &str) -> Option<&Variable> {
        self.local.variable(id).or_else(|| self.canonical.variable(id))
    }

    fn constraint(&self, id: &str) -> Option<&Constraint> {
        self.local.constraint(id).or_else(|| self.canonical.constraint(id))
    }

    /// Registers canonically first, so a clash anywhere in the family is
    /// reported before the local model changes.
    fn register(&mut self, entity: Entity) -> Result<(), ModelError> {
        if self.local.lookup(entity.kind(), entity.id()).is_some() {
            return Err(ModelError::DuplicateId {
                kind: entity.kind(),
                id: entity.id().to_string(),
            });
        }
        self.canonical.register(entity.clone())?;
        self.local.register(entity)
    }

    fn update_variable(&mut self, id: &str, update: &mut dyn FnMut(&mut Variable)) -> Result<(), ModelError> {
        self.mirror_variable(id)?;
        ModelStore::update_variable(&mut *self.canonical, id, &mut *update)?;
        ModelStore::update_variable(&mut *self.local, id, &mut *update)
    }

    fn insert_coefficient(
        &mut self,
        variable: &str,
        constraint: &str,
        value: f64,
        mode: CoefficientMode,
    ) -> Result<f64, ModelError> {
        self.mirror_variable(variable)?;
        self.mirror_constraint(constraint)?;
        // Resolve against the canonical value so both layers store the same number.
        let value = self.canonical.insert_coefficient(variable, constraint, value, mode)?;
        self.local
            .insert_coefficient(variable, constraint, value, CoefficientMode::Replace)
    }

    fn remove_coefficient(&mut self, variable: &str, constraint: &str) -> Option<f64> {
        let canonical = self.canonical.remove_coefficient(variable, constraint);
        self.local.remove_coefficient(variable, constraint).or(canonical)
    }

    fn coefficient(&self, variable: &str, constraint: &str) -> f64 {
        if self.local.contains_variable(variable) && self.local.contains_constraint(constraint) {
            self.local.coefficient(variable, constraint)
        } else {
            self.canonical.coefficient(variable, constraint)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layered_writes_reach_both_models() {
        let mut local = Model::new("local");
        let mut canonical = Model::new("canonical");
        {
            let mut store = LayeredModel::new(&mut local, &mut canonical);
            store.add_variable(Variable::new("x_A", 0.0, 1.0)).unwrap();
            store.add_constraint(Constraint::le("c_A", 1.0)).unwrap();
            store.set_coefficient("x_A", "c_A", 2.0).unwrap();
        }
        for model in [&local, &canonical] {
            assert!(model.contains_variable("x_A"));
            assert!(model.contains_constraint("c_A"));
            assert_eq!(model.coefficient("x_A", "c_A"), 2.0);
        }
    }

    #[test]
    fn test_layered_lookup_falls_back_to_canonical() {
        let mut local = Model::new("local");
        let mut canonical = Model::new("canonical");
        canonical.add_variable(Variable::binary("shared")).unwrap();

        let store = LayeredModel::new(&mut local, &mut canonical);
        assert!(store.variable("shared").is_some());
        assert!(store.local().variable("shared").is_none());
    }

    #[test]
    fn test_layered_ids_are_unique_across_family() {
        let mut a = Model::new("a");
        let mut b = Model::new("b");
        let mut canonical = Model::new("canonical");

        LayeredModel::new(&mut a, &mut canonical)
            .add_variable(Variable::binary("y"))
            .unwrap();
        let err = LayeredModel::new(&mut b, &mut canonical)
            .add_variable(Variable::binary("y"))
            .unwrap_err();
        assert!(matches!(err, ModelError::DuplicateId { .. }));
        assert!(!b.contains_variable("y"));
    }

    #[test]
    fn test_coefficient_on_canonical_entity_is_materialized_locally() {
        let mut local = Model::new("local");
        let mut canonical = Model::new("canonical");
        canonical.add_variable(Variable::binary("y")).unwrap();
        {
            let mut store = LayeredModel::new(&mut local, &mut canonical);
            store.add_constraint(Constraint::le("one_hot", 1.0)).unwrap();
            store
                .insert_coefficient("y", "one_hot", 1.0, CoefficientMode::Accumulate)
                .unwrap();
            store
                .insert_coefficient("y", "one_hot", 1.0, CoefficientMode::Accumulate)
                .unwrap();
        }
        assert!(local.contains_variable("y"));
        assert_eq!(local.coefficient("y", "one_hot"), 2.0);
        assert_eq!(canonical.coefficient("y", "one_hot"), 2.0);
    }

    #[test]
    fn test_update_variable_mirrors() {
        let mut local = Model::new("local");
        let mut canonical = Model::new("canonical");
        {
            let mut store = LayeredModel::new(&mut local, &mut canonical);
            store.add_variable(Variable::new("x", 0.0, 1.0)).unwrap();
            store.update_variable("x", &mut |v| v.upper_bound = 7.0).unwrap();
        }
        assert_eq!(local.variable("x").unwrap().upper_bound, 7.0);
        assert_eq!(canonical.variable("x").unwrap().upper_bound, 7.0);
    }

    #[test]
    fn test_ensure_variable_fetches_existing() {
        let mut model = Model::new("m");
        model.add_variable(Variable::new("z", -1.0, 1.0)).unwrap();
        let z = model.ensure_variable(Variable::new("z", 0.0, 9.0)).unwrap();
        assert_eq!(z.upper_bound, 1.0);
        assert_eq!(model.num_variables(), 1);
    }
}
