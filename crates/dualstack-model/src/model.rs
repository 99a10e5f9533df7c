use indexmap::IndexMap;

use crate::entity::{Constraint, Entity, EntityKind, Sense, Variable};
use crate::error::ModelError;
use crate::matrix::{CoefficientMatrix, CoefficientMode};

/// A linear / mixed-integer program.
///
/// Variables keep insertion order: a variable's ordinal position is its row
/// and column index in any matrix built over the model.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Model {
    pub name: String,
    pub sense: Sense,
    variables: IndexMap<String, Variable>,
    constraints: IndexMap<String, Constraint>,
    matrix: CoefficientMatrix,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_sense(mut self, sense: Sense) -> Self {
        self.sense = sense;
        self
    }

    pub fn add_variable(&mut self, variable: Variable) -> Result<(), ModelError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ModelError::DuplicateId {
                kind: EntityKind::Variable,
                id: variable.id,
            });
        }
        tracing::trace!(
            component = "model",
            operation = "add_variable",
            model = %self.name,
            id = %variable.id,
            lower = variable.lower_bound,
            upper = variable.upper_bound,
            is_integer = variable.is_integer(),
        );
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), ModelError> {
        if self.constraints.contains_key(&constraint.id) {
            return Err(ModelError::DuplicateId {
                kind: EntityKind::Constraint,
                id: constraint.id,
            });
        }
        tracing::trace!(
            component = "model",
            operation = "add_constraint",
            model = %self.name,
            id = %constraint.id,
            op = ?constraint.op,
            bound = constraint.bound,
        );
        self.constraints.insert(constraint.id.clone(), constraint);
        Ok(())
    }

    /// Add many variables at once; stops at the first duplicate.
    pub fn add_variables(&mut self, variables: impl IntoIterator<Item = Variable>) -> Result<(), ModelError> {
        let variables = variables.into_iter();
        self.variables.reserve(variables.size_hint().0);
        for variable in variables {
            self.add_variable(variable)?;
        }
        Ok(())
    }

    pub fn add_constraints(&mut self, constraints: impl IntoIterator<Item = Constraint>) -> Result<(), ModelError> {
        let constraints = constraints.into_iter();
        self.constraints.reserve(constraints.size_hint().0);
        for constraint in constraints {
            self.add_constraint(constraint)?;
        }
        Ok(())
    }

    /// Insert a variable or constraint
    pub fn register(&mut self, entity: Entity) -> Result<(), ModelError> {
        match entity {
            Entity::Variable(v) => self.add_variable(v),
            Entity::Constraint(c) => self.add_constraint(c),
        }
    }

    pub fn lookup(&self, kind: EntityKind, id: &str) -> Option<Entity> {
        match kind {
            EntityKind::Variable => self.variable(id).cloned().map(Entity::Variable),
            EntityKind::Constraint => self.constraint(id).cloned().map(Entity::Constraint),
        }
    }

    pub fn variable(&self, id: &str) -> Option<&Variable> {
        self.variables.get(id)
    }

    pub fn variable_mut(&mut self, id: &str) -> Option<&mut Variable> {
        self.variables.get_mut(id)
    }

    pub fn constraint(&self, id: &str) -> Option<&Constraint> {
        self.constraints.get(id)
    }

    pub fn contains_variable(&self, id: &str) -> bool {
        self.variables.contains_key(id)
    }

    pub fn contains_constraint(&self, id: &str) -> bool {
        self.constraints.contains_key(id)
    }

    /// Ordinal position of a variable
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.values()
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn matrix(&self) -> &CoefficientMatrix {
        &self.matrix
    }

    /// Write the coefficient of `variable` in `constraint`. Both must exist.
    pub fn insert_coefficient(
        &mut self,
        variable: &str,
        constraint: &str,
        value: f64,
        mode: CoefficientMode,
    ) -> Result<f64, ModelError> {
        if !self.contains_variable(variable) {
            return Err(ModelError::UnknownVariable(variable.to_string()));
        }
        if !self.contains_constraint(constraint) {
            return Err(ModelError::UnknownConstraint(constraint.to_string()));
        }
        Ok(self.matrix.insert(variable, constraint, value, mode))
    }

    pub fn set_coefficient(&mut self, variable: &str, constraint: &str, value: f64) -> Result<(), ModelError> {
        self.insert_coefficient(variable, constraint, value, CoefficientMode::Replace)
            .map(|_| ())
    }

    /// Coefficient of `variable` in `constraint`, 0 when absent
    pub fn coefficient(&self, variable: &str, constraint: &str) -> f64 {
        self.matrix.get(variable, constraint).unwrap_or(0.0)
    }

    pub fn remove_coefficient(&mut self, variable: &str, constraint: &str) -> Option<f64> {
        self.matrix.remove(variable, constraint)
    }

    pub fn column(&self, variable: &str) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.matrix.column(variable)
    }

    pub fn row(&self, constraint: &str) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.matrix.row(constraint)
    }

    /// Remove a variable together with all of its coefficients.
    ///
    /// Shifts the ordinal of every later variable down by one.
    pub fn remove_variable(&mut self, id: &str) -> Option<Variable> {
        let variable = self.variables.shift_remove(id)?;
        self.matrix.remove_variable(id);
        Some(variable)
    }

    pub fn remove_constraint(&mut self, id: &str) -> Option<Constraint> {
        let constraint = self.constraints.shift_remove(id)?;
        self.matrix.remove_constraint(id);
        Some(constraint)
    }

    /// Linear objective value of an assignment; unassigned variables count as 0.
    pub fn objective_value(&self, values: &IndexMap<String, f64>) -> f64 {
        self.variables
            .values()
            .map(|v| v.objective_coefficient * values.get(&v.id).copied().unwrap_or(0.0))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_model() -> Model {
        let mut model = Model::new("small");
        model
            .add_variables([Variable::new("x", 0.0, 10.0), Variable::new("y", 0.0, 5.0)])
            .unwrap();
        model.add_constraint(Constraint::le("c", 4.0)).unwrap();
        model.set_coefficient("x", "c", 1.0).unwrap();
        model.set_coefficient("y", "c", 2.0).unwrap();
        model
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let mut model = small_model();
        let err = model.add_variable(Variable::new("x", 0.0, 1.0)).unwrap_err();
        assert_eq!(
            err,
            ModelError::DuplicateId {
                kind: EntityKind::Variable,
                id: "x".to_string()
            }
        );
        assert!(model.add_constraint(Constraint::ge("c", 0.0)).is_err());
        // A constraint may share an id with a variable
        assert!(model.add_constraint(Constraint::ge("x", 0.0)).is_ok());
    }

    #[test]
    fn test_coefficients_default_to_zero() {
        let model = small_model();
        assert_eq!(model.coefficient("x", "c"), 1.0);
        assert_eq!(model.coefficient("x", "missing"), 0.0);
    }

    #[test]
    fn test_set_coefficient_requires_both_endpoints() {
        let mut model = small_model();
        assert_eq!(
            model.set_coefficient("z", "c", 1.0),
            Err(ModelError::UnknownVariable("z".to_string()))
        );
        assert_eq!(
            model.set_coefficient("x", "d", 1.0),
            Err(ModelError::UnknownConstraint("d".to_string()))
        );
    }

    #[test]
    fn test_accumulate_mode() {
        let mut model = small_model();
        let stored = model
            .insert_coefficient("x", "c", 0.5, CoefficientMode::Accumulate)
            .unwrap();
        assert_eq!(stored, 1.5);
        assert_eq!(model.row("c").collect::<Vec<_>>(), vec![("x", 1.5), ("y", 2.0)]);
    }

    #[test]
    fn test_remove_coefficient_is_noop_when_absent() {
        let mut model = small_model();
        assert_eq!(model.remove_coefficient("x", "c"), Some(1.0));
        assert_eq!(model.remove_coefficient("x", "c"), None);
        assert_eq!(model.column("x").count(), 0);
        assert_eq!(model.row("c").collect::<Vec<_>>(), vec![("y", 2.0)]);
    }

    #[test]
    fn test_remove_variable_shifts_ordinals() {
        let mut model = small_model();
        model.add_variable(Variable::new("z", 0.0, 1.0)).unwrap();
        assert_eq!(model.variable_index("z"), Some(2));

        let removed = model.remove_variable("x").unwrap();
        assert_eq!(removed.id, "x");
        assert_eq!(model.variable_index("z"), Some(1));
        assert_eq!(model.row("c").collect::<Vec<_>>(), vec![("y", 2.0)]);
    }

    #[test]
    fn test_lookup_and_register() {
        let mut model = Model::new("m");
        model.register(Entity::Variable(Variable::binary("y"))).unwrap();
        let found = model.lookup(EntityKind::Variable, "y").unwrap();
        assert_eq!(found.kind(), EntityKind::Variable);
        assert!(model.lookup(EntityKind::Constraint, "y").is_none());
    }

    #[test]
    fn test_objective_value() {
        let mut model = small_model();
        model.variable_mut("x").unwrap().objective_coefficient = 3.0;
        model.variable_mut("y").unwrap().objective_coefficient = 2.0;
        let values = IndexMap::from([("x".to_string(), 1.0), ("y".to_string(), 0.5)]);
        assert!((model.objective_value(&values) - 4.0).abs() < 1e-12);
    }
}
