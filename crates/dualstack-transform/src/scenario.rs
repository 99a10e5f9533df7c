//! Scenario stacking.
//!
//! A reference model is cloned once per scenario with every id suffixed by
//! `_<scenario>`. Each clone is written through a [`LayeredModel`], so the
//! stack's canonical model holds the union of all clones and ids stay unique
//! across the family. Entities shared between scenarios (indicator binaries,
//! one-hot rows) live in the canonical model and are reached from any scope.

use dualstack_model::{Entity, LayeredModel, Model, ModelStore};
use indexmap::IndexMap;
use sprs::CsMat;

use crate::error::TransformError;
use crate::quadratic::QuadraticObjectiveAssembler;

/// Per-scenario bounds and objective for one reference variable
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct BoundOverride {
    /// Id in the reference model, without the scenario suffix
    pub variable: String,
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

impl BoundOverride {
    pub fn new(variable: impl Into<String>, lower: f64, upper: f64, objective: f64) -> Self {
        Self {
            variable: variable.into(),
            lower,
            upper,
            objective,
        }
    }
}

pub fn scenario_suffix(scenario: &str) -> String {
    format!("_{scenario}")
}

/// Deep copy of `reference` with every variable and constraint id suffixed.
pub fn clone_with_suffix(reference: &Model, suffix: &str) -> Result<Model, TransformError> {
    let mut clone = Model::new(format!("{}{suffix}", reference.name)).with_sense(reference.sense);
    copy_into(&mut clone, reference, suffix)?;
    Ok(clone)
}

fn copy_into<S: ModelStore + ?Sized>(store: &mut S, reference: &Model, suffix: &str) -> Result<(), TransformError> {
    for v in reference.variables() {
        store.register(Entity::Variable(v.clone()).renamed(format!("{}{suffix}", v.id)))?;
    }
    for c in reference.constraints() {
        store.register(Entity::Constraint(c.clone()).renamed(format!("{}{suffix}", c.id)))?;
    }
    for (variable, constraint, coef) in reference.matrix().iter() {
        store.set_coefficient(&format!("{variable}{suffix}"), &format!("{constraint}{suffix}"), coef)?;
    }
    Ok(())
}

fn apply_to<S: ModelStore + ?Sized>(
    store: &mut S,
    suffix: &str,
    overrides: &[BoundOverride],
) -> Result<(), TransformError> {
    for o in overrides {
        store.update_variable(&format!("{}{suffix}", o.variable), &mut |v| {
            v.lower_bound = o.lower;
            v.upper_bound = o.upper;
            v.objective_coefficient = o.objective;
        })?;
    }
    Ok(())
}

#[derive(Debug, Clone)]
struct ScenarioClone {
    suffix: String,
    model: Model,
}

/// Scenario clones over one canonical model
#[derive(Debug, Clone, Default)]
pub struct ScenarioStack {
    canonical: Model,
    scenarios: IndexMap<String, ScenarioClone>,
}

impl ScenarioStack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            canonical: Model::new(name),
            scenarios: IndexMap::new(),
        }
    }

    /// Stack one clone of `reference` per scenario, then apply its overrides.
    pub fn stack(
        name: impl Into<String>,
        reference: &Model,
        conditions: &IndexMap<String, Vec<BoundOverride>>,
    ) -> Result<Self, TransformError> {
        let mut stack = Self::new(name);
        stack.canonical.sense = reference.sense;
        for (scenario, overrides) in conditions {
            stack.add_scenario(scenario.as_str(), reference)?;
            stack.apply_overrides(scenario, overrides)?;
        }
        Ok(stack)
    }

    /// Clone `reference` under `scenario` with the `_<scenario>` suffix.
    pub fn add_scenario(&mut self, scenario: impl Into<String>, reference: &Model) -> Result<(), TransformError> {
        let scenario = scenario.into();
        let suffix = scenario_suffix(&scenario);
        self.add_scenario_with_suffix(scenario, reference, &suffix)
    }

    /// Clone `reference` with every id suffixed by `suffix`, registering every
    /// entity in the canonical model as well.
    ///
    /// The first scenario fixes the sense of the canonical model; later
    /// references must agree with it.
    pub fn add_scenario_with_suffix(
        &mut self,
        scenario: impl Into<String>,
        reference: &Model,
        suffix: &str,
    ) -> Result<(), TransformError> {
        let scenario = scenario.into();
        if self.scenarios.contains_key(&scenario) {
            return Err(TransformError::DuplicateScenario(scenario));
        }
        if self.scenarios.is_empty() {
            self.canonical.sense = reference.sense;
        } else if self.canonical.sense != reference.sense {
            return Err(TransformError::SenseMismatch {
                scenario,
                expected: self.canonical.sense,
                found: reference.sense,
            });
        }

        let mut local = Model::new(format!("{}{suffix}", reference.name)).with_sense(reference.sense);
        copy_into(&mut LayeredModel::new(&mut local, &mut self.canonical), reference, suffix)?;

        tracing::debug!(
            component = "scenario",
            operation = "add_scenario",
            scenario = %scenario,
            suffix,
            variables = local.num_variables(),
            constraints = local.num_constraints(),
            canonical_variables = self.canonical.num_variables(),
            "Stacked scenario"
        );
        self.scenarios.insert(
            scenario,
            ScenarioClone {
                suffix: suffix.to_string(),
                model: local,
            },
        );
        Ok(())
    }

    /// Override bounds and objective of a scenario's variables, in the clone
    /// and in the canonical model.
    pub fn apply_overrides(&mut self, scenario: &str, overrides: &[BoundOverride]) -> Result<(), TransformError> {
        let suffix = self
            .suffix(scenario)
            .ok_or_else(|| TransformError::UnknownScenario(scenario.to_string()))?
            .to_string();
        apply_to(&mut self.scope(scenario)?, &suffix, overrides)
    }

    /// Store writing to `scenario`'s clone and to the canonical model
    pub fn scope(&mut self, scenario: &str) -> Result<LayeredModel<'_>, TransformError> {
        let clone = self
            .scenarios
            .get_mut(scenario)
            .ok_or_else(|| TransformError::UnknownScenario(scenario.to_string()))?;
        Ok(LayeredModel::new(&mut clone.model, &mut self.canonical))
    }

    pub fn scenario(&self, scenario: &str) -> Option<&Model> {
        self.scenarios.get(scenario).map(|c| &c.model)
    }

    pub fn suffix(&self, scenario: &str) -> Option<&str> {
        self.scenarios.get(scenario).map(|c| c.suffix.as_str())
    }

    /// Scenario keys in insertion order, each with its id suffix
    pub fn suffixes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.scenarios.iter().map(|(k, c)| (k.as_str(), c.suffix.as_str()))
    }

    pub fn canonical(&self) -> &Model {
        &self.canonical
    }

    /// Canonical model alone. Writes here are not seen by the clones.
    pub(crate) fn canonical_mut(&mut self) -> &mut Model {
        &mut self.canonical
    }

    /// Q matrix of the canonical model at its current variable order
    pub fn quadratic_objective(&self) -> CsMat<f64> {
        QuadraticObjectiveAssembler::build(&self.canonical)
    }
}

/// Independent suffixed copies of `reference`, one per scenario, with overrides
/// applied. Nothing is shared between the copies.
pub fn split_scenarios<'a>(
    reference: &'a Model,
    conditions: &'a IndexMap<String, Vec<BoundOverride>>,
) -> impl Iterator<Item = Result<(String, Model), TransformError>> + 'a {
    conditions.iter().map(move |(scenario, overrides)| {
        let suffix = scenario_suffix(scenario);
        let mut model = clone_with_suffix(reference, &suffix)?;
        apply_to(&mut model, &suffix, overrides)?;
        Ok((scenario.clone(), model))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::radix::{GroupTerm, RadixLinearizer};
    use dualstack_model::{Constraint, ModelError, Sense, Variable};

    /// 2 variables, 1 constraint
    fn reference() -> Model {
        let mut model = Model::new("ref").with_sense(Sense::Maximize);
        model.add_variable(Variable::new("x", 0.0, 10.0).with_objective(1.0)).unwrap();
        model.add_variable(Variable::new("y", -1.0, 5.0).with_quadratic(0.5)).unwrap();
        model.add_constraint(Constraint::le("c", 4.0)).unwrap();
        model.set_coefficient("x", "c", 1.0).unwrap();
        model.set_coefficient("y", "c", 2.0).unwrap();
        model
    }

    fn ids(model: &Model) -> Vec<&str> {
        model
            .variables()
            .map(|v| v.id.as_str())
            .chain(model.constraints().map(|c| c.id.as_str()))
            .collect()
    }

    #[test]
    fn test_clones_are_isomorphic_and_disjoint() {
        let mut stack = ScenarioStack::new("stacked");
        stack.add_scenario("A", &reference()).unwrap();
        stack.add_scenario("B", &reference()).unwrap();

        let a = stack.scenario("A").unwrap();
        let b = stack.scenario("B").unwrap();
        assert_eq!(ids(a), vec!["x_A", "y_A", "c_A"]);
        assert_eq!(ids(b), vec!["x_B", "y_B", "c_B"]);

        for (model, s) in [(a, "A"), (b, "B")] {
            let y = model.variable(&format!("y_{s}")).unwrap();
            assert_eq!((y.lower_bound, y.upper_bound), (-1.0, 5.0));
            assert_eq!(y.quadratic_coefficient, Some(0.5));
            assert_eq!(model.constraint(&format!("c_{s}")).unwrap().bound, 4.0);
            assert_eq!(model.coefficient(&format!("y_{s}"), &format!("c_{s}")), 2.0);
        }

        let canonical = stack.canonical();
        assert_eq!(canonical.num_variables(), 4);
        assert_eq!(canonical.num_constraints(), 2);
        assert_eq!(canonical.coefficient("x_B", "c_B"), 1.0);
        assert_eq!(canonical.coefficient("x_A", "c_B"), 0.0);
    }

    #[test]
    fn test_scenario_twice_clashes() {
        let mut stack = ScenarioStack::new("stacked");
        stack.add_scenario("A", &reference()).unwrap();
        let err = stack.add_scenario("A", &reference()).unwrap_err();
        assert_eq!(err, TransformError::DuplicateScenario("A".to_string()));
        let err = stack.add_scenario_with_suffix("B", &reference(), "_A").unwrap_err();
        assert!(matches!(err, TransformError::Model(ModelError::DuplicateId { .. })));
        assert!(stack.scenario("B").is_none());
        assert!(matches!(stack.scope("Z"), Err(TransformError::UnknownScenario(_))));
    }

    #[test]
    fn test_first_scenario_sets_canonical_sense() {
        let minimize = reference().with_sense(Sense::Minimize);
        let mut stack = ScenarioStack::new("stacked");
        stack.add_scenario("A", &minimize).unwrap();
        assert_eq!(stack.canonical().sense, Sense::Minimize);
        assert_eq!(stack.scenario("A").unwrap().sense, Sense::Minimize);

        let err = stack.add_scenario("B", &reference()).unwrap_err();
        assert_eq!(
            err,
            TransformError::SenseMismatch {
                scenario: "B".to_string(),
                expected: Sense::Minimize,
                found: Sense::Maximize,
            }
        );
        assert!(!stack.canonical().contains_variable("x_B"));
    }

    #[test]
    fn test_custom_suffix() {
        let mut stack = ScenarioStack::new("stacked");
        stack.add_scenario_with_suffix("wild type", &reference(), "__wt").unwrap();
        stack.add_scenario("B", &reference()).unwrap();

        assert_eq!(ids(stack.scenario("wild type").unwrap()), vec!["x__wt", "y__wt", "c__wt"]);
        assert_eq!(stack.suffixes().collect::<Vec<_>>(), vec![("wild type", "__wt"), ("B", "_B")]);

        stack
            .apply_overrides("wild type", &[BoundOverride::new("x", 0.0, 3.0, 1.0)])
            .unwrap();
        assert_eq!(stack.canonical().variable("x__wt").unwrap().upper_bound, 3.0);
        assert_eq!(stack.scenario("wild type").unwrap().variable("x__wt").unwrap().upper_bound, 3.0);
    }

    #[test]
    fn test_overrides_reach_clone_and_canonical() {
        let conditions = IndexMap::from([
            ("A".to_string(), vec![BoundOverride::new("x", 1.0, 2.0, 3.0)]),
            ("B".to_string(), vec![]),
        ]);
        let stack = ScenarioStack::stack("stacked", &reference(), &conditions).unwrap();

        for model in [stack.scenario("A").unwrap(), stack.canonical()] {
            let x = model.variable("x_A").unwrap();
            assert_eq!((x.lower_bound, x.upper_bound, x.objective_coefficient), (1.0, 2.0, 3.0));
        }
        assert_eq!(stack.canonical().variable("x_B").unwrap().upper_bound, 10.0);
        assert_eq!(stack.canonical().sense, Sense::Maximize);
    }

    #[test]
    fn test_shared_binaries_across_scopes() {
        let mut stack = ScenarioStack::new("stacked");
        stack.add_scenario("A", &reference()).unwrap();
        stack.add_scenario("B", &reference()).unwrap();

        let radix = RadixLinearizer::new(2).with_powers([0]).with_digits([1.0]);
        for s in ["A", "B"] {
            let groups = IndexMap::from([(
                "keff".to_string(),
                vec![GroupTerm::new(format!("x_{s}"), format!("c_{s}"), 1.0)],
            )]);
            radix.apply(&mut stack.scope(s).unwrap(), &groups).unwrap();
        }

        let canonical = stack.canonical();
        assert_eq!(canonical.variables().filter(|v| v.is_binary()).count(), 1);
        assert!(stack.scenario("B").unwrap().contains_variable("binary_keff_0_0"));
        assert!(canonical.contains_variable("z_x_A_c_A_0_0"));
        assert!(canonical.contains_variable("z_x_B_c_B_0_0"));
        assert!(!stack.scenario("A").unwrap().contains_variable("z_x_B_c_B_0_0"));
        assert_eq!(canonical.coefficient("binary_keff_0_0", "zdiff_lower_x_B_c_B_0_0"), 1e3);
        assert_eq!(canonical.coefficient("binary_keff_0_0", "digit_keff_0"), 1.0);
    }

    #[test]
    fn test_split_scenarios_are_independent() {
        let conditions = IndexMap::from([
            ("A".to_string(), vec![BoundOverride::new("y", 0.0, 1.0, -1.0)]),
            ("B".to_string(), vec![BoundOverride::new("missing", 0.0, 1.0, 0.0)]),
        ]);
        let reference = reference();
        let mut split = split_scenarios(&reference, &conditions);

        let (key, a) = split.next().unwrap().unwrap();
        assert_eq!(key, "A");
        assert_eq!(a.name, "ref_A");
        assert_eq!(a.variable("y_A").unwrap().objective_coefficient, -1.0);
        assert_eq!(a.num_variables(), 2);

        let err = split.next().unwrap().unwrap_err();
        assert_eq!(err, TransformError::Model(ModelError::UnknownVariable("missing_B".to_string())));
        assert!(split.next().is_none());
    }

    #[test]
    fn test_stack_quadratic_objective() {
        let mut stack = ScenarioStack::new("stacked");
        stack.add_scenario("A", &reference()).unwrap();
        stack.add_scenario("B", &reference()).unwrap();

        let q = stack.quadratic_objective();
        assert_eq!(q.shape(), (4, 4));
        assert_eq!(q.nnz(), 2);
        assert_eq!(q.get(1, 1), Some(&0.5));
        assert_eq!(q.get(3, 3), Some(&0.5));
    }
}
