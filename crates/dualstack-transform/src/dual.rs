//! LP duality.
//!
//! For a primal
//! ```text
//!   max/min  c'x
//!   s.t.     A x [<=>] b
//!            l <= x <= u
//! ```
//! the dual has one multiplier `wa_<c>` per primal row. Each primal column `x`
//! contributes the bound multipliers `wl_<x>`, `wu_<x>` and the row `dual_<x>`:
//! ```text
//!   max primal:  min  b'wa - l'wl + u'wu   s.t.  A'wa - wl + wu [<=>] c
//!   min primal:  max  b'wa + l'wl - u'wu   s.t.  A'wa + wl - wu [<=>] c
//! ```

use dualstack_model::{Constraint, ConstraintOp, Model, Sense, Variable};

use crate::error::TransformError;

/// Magnitude used in place of an infinite dual bound
pub const DEFAULT_INFINITY: f64 = 1e3;

/// Multiplier of primal constraint `constraint`
pub fn wa_id(constraint: &str) -> String {
    format!("wa_{constraint}")
}

/// Multiplier of the lower bound of primal variable `variable`
pub fn wl_id(variable: &str) -> String {
    format!("wl_{variable}")
}

/// Multiplier of the upper bound of primal variable `variable`
pub fn wu_id(variable: &str) -> String {
    format!("wu_{variable}")
}

/// Dual row generated by primal variable `variable`
pub fn dual_constraint_id(variable: &str) -> String {
    format!("dual_{variable}")
}

#[derive(Debug, Clone)]
pub struct DualityTransformer {
    infinity: f64,
}

impl Default for DualityTransformer {
    fn default() -> Self {
        Self {
            infinity: DEFAULT_INFINITY,
        }
    }
}

impl DualityTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound magnitude for free multipliers
    pub fn with_infinity(mut self, infinity: f64) -> Self {
        self.infinity = infinity;
        self
    }

    /// Build the dual of `primal`, whose optimization direction is `primal_sense`.
    ///
    /// The returned model carries the opposite sense.
    pub fn derive_dual(&self, primal: &Model, primal_sense: Sense) -> Result<Model, TransformError> {
        let inf = self.infinity;
        let (wl_sign, wu_sign) = match primal_sense {
            Sense::Maximize => (-1.0, 1.0),
            Sense::Minimize => (1.0, -1.0),
        };

        let mut dual = Model::new(format!("{}_dual", primal.name)).with_sense(primal_sense.opposite());

        dual.add_variables(primal.constraints().map(|c| {
            let (lower, upper) = multiplier_bounds(primal_sense, c.op, inf);
            Variable::new(wa_id(&c.id), lower, upper).with_objective(c.bound)
        }))?;
        dual.add_variables(
            primal
                .variables()
                .map(|v| Variable::new(wl_id(&v.id), 0.0, inf).with_objective(wl_sign * v.lower_bound)),
        )?;
        dual.add_variables(
            primal
                .variables()
                .map(|v| Variable::new(wu_id(&v.id), 0.0, inf).with_objective(wu_sign * v.upper_bound)),
        )?;

        for v in primal.variables() {
            let row = dual_constraint_id(&v.id);
            let op = dual_row_op(primal_sense, v.lower_bound, v.upper_bound);
            dual.add_constraint(Constraint::new(row.as_str(), op, v.objective_coefficient))?;

            for (constraint, coef) in primal.column(&v.id) {
                dual.set_coefficient(&wa_id(constraint), &row, coef)?;
            }
            dual.set_coefficient(&wl_id(&v.id), &row, wl_sign)?;
            dual.set_coefficient(&wu_id(&v.id), &row, wu_sign)?;
        }

        tracing::debug!(
            component = "dual",
            operation = "derive_dual",
            primal = %primal.name,
            primal_sense = ?primal_sense,
            variables = dual.num_variables(),
            constraints = dual.num_constraints(),
            "Derived dual model"
        );
        Ok(dual)
    }
}

/// Sign restriction of the multiplier of a primal row
fn multiplier_bounds(primal_sense: Sense, op: ConstraintOp, inf: f64) -> (f64, f64) {
    match (primal_sense, op) {
        (_, ConstraintOp::Eq) => (-inf, inf),
        (Sense::Maximize, ConstraintOp::Le) | (Sense::Minimize, ConstraintOp::Ge) => (0.0, inf),
        (Sense::Maximize, ConstraintOp::Ge) | (Sense::Minimize, ConstraintOp::Le) => (-inf, 0.0),
    }
}

/// Sense of the dual row of a primal column with bounds [lower, upper].
///
/// Patterns outside the table fall back to equality, which is always valid
/// because both bound multipliers are present.
fn dual_row_op(primal_sense: Sense, lower: f64, upper: f64) -> ConstraintOp {
    let (nonnegative, nonpositive) = match primal_sense {
        Sense::Maximize => (ConstraintOp::Ge, ConstraintOp::Le),
        Sense::Minimize => (ConstraintOp::Le, ConstraintOp::Ge),
    };
    if lower < 0.0 && upper > 0.0 {
        ConstraintOp::Eq
    } else if lower == 0.0 && upper > 0.0 {
        nonnegative
    } else if lower < 0.0 && upper <= 0.0 {
        nonpositive
    } else {
        ConstraintOp::Eq
    }
}
