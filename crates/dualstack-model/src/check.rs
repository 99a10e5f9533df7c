use indexmap::IndexMap;

use crate::entity::{ConstraintOp, VariableKind};
use crate::model::Model;

/// A constraint row or variable bound broken by an assignment
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    /// Constraint or variable id
    pub name: String,
    /// Required value (right-hand side or bound)
    pub required: f64,
    /// Actual value achieved
    pub actual: f64,
    /// How far the assignment is from satisfying the row
    pub amount: f64,
    pub description: String,
}

impl Model {
    /// Check a full assignment against every row, bound and integrality flag.
    ///
    /// Unassigned variables are read as 0. Violations come back worst first.
    pub fn violations(&self, values: &IndexMap<String, f64>, tolerance: f64) -> Vec<Violation> {
        let value_of = |id: &str| values.get(id).copied().unwrap_or(0.0);
        let mut violations = Vec::new();

        for c in self.constraints() {
            let lhs: f64 = self.row(&c.id).map(|(var, coef)| coef * value_of(var)).sum();

            let violated = match c.op {
                ConstraintOp::Le if lhs > c.bound + tolerance => {
                    let amt = lhs - c.bound;
                    Some((amt, format!("{} exceeds maximum of {:.4} by {:.4}", c.id, c.bound, amt)))
                }
                ConstraintOp::Ge if lhs < c.bound - tolerance => {
                    let amt = c.bound - lhs;
                    Some((amt, format!("{} is below minimum of {:.4} by {:.4}", c.id, c.bound, amt)))
                }
                ConstraintOp::Eq if (lhs - c.bound).abs() > tolerance => Some((
                    (lhs - c.bound).abs(),
                    format!("{} requires exactly {:.4} but got {:.4}", c.id, c.bound, lhs),
                )),
                _ => None,
            };

            if let Some((amount, description)) = violated {
                violations.push(Violation {
                    name: c.id.clone(),
                    required: c.bound,
                    actual: lhs,
                    amount,
                    description,
                });
            }
        }

        for v in self.variables() {
            let x = value_of(&v.id);
            if x < v.lower_bound - tolerance {
                violations.push(Violation {
                    name: v.id.clone(),
                    required: v.lower_bound,
                    actual: x,
                    amount: v.lower_bound - x,
                    description: format!("{} is below its lower bound {:.4}", v.id, v.lower_bound),
                });
            } else if x > v.upper_bound + tolerance {
                violations.push(Violation {
                    name: v.id.clone(),
                    required: v.upper_bound,
                    actual: x,
                    amount: x - v.upper_bound,
                    description: format!("{} is above its upper bound {:.4}", v.id, v.upper_bound),
                });
            }
            if v.kind == VariableKind::Integer && (x - x.round()).abs() > tolerance {
                violations.push(Violation {
                    name: v.id.clone(),
                    required: x.round(),
                    actual: x,
                    amount: (x - x.round()).abs(),
                    description: format!("{} must be integral", v.id),
                });
            }
        }

        violations.sort_by(|a, b| b.amount.partial_cmp(&a.amount).unwrap_or(std::cmp::Ordering::Equal));
        violations
    }

    pub fn is_feasible(&self, values: &IndexMap<String, f64>, tolerance: f64) -> bool {
        self.violations(values, tolerance).is_empty()
    }
}
