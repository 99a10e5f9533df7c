use dualstack_model::{ConstraintOp, Model};

/// Dense LP over nonnegative columns, as consumed by the simplex tableau.
///
/// Every model variable `x` with bounds `[l, u]` becomes
/// `x = offset + sign * plus - minus`:
/// - finite `l`: `x = l + plus`, with a row `plus <= u - l` when `u` is finite
/// - infinite `l`, finite `u`: `x = u - plus`
/// - free: `x = plus - minus`
#[derive(Debug, Clone)]
pub struct StandardForm {
    /// Column names (for diagnostics)
    pub columns: Vec<String>,
    pub objective: Vec<f64>,
    pub minimize: bool,
    pub rows: Vec<Row>,
    /// One entry per model variable, in model order
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub name: String,
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// Where a model variable lives among the nonnegative columns
#[derive(Debug, Clone, Copy)]
pub struct Origin {
    pub offset: f64,
    pub sign: f64,
    pub plus: usize,
    pub minus: Option<usize>,
}

impl Origin {
    pub fn value(&self, columns: &[f64]) -> f64 {
        let minus = self.minus.map(|j| columns[j]).unwrap_or(0.0);
        self.offset + self.sign * columns[self.plus] - minus
    }
}

impl StandardForm {
    pub fn from_model(model: &Model, minimize: bool) -> Self {
        let mut columns = Vec::new();
        let mut origins = Vec::with_capacity(model.num_variables());
        let mut bound_rows: Vec<(usize, f64)> = Vec::new();

        for v in model.variables() {
            let plus = columns.len();
            columns.push(v.id.clone());
            let origin = if v.lower_bound.is_finite() {
                if v.upper_bound.is_finite() {
                    bound_rows.push((plus, v.upper_bound - v.lower_bound));
                }
                Origin { offset: v.lower_bound, sign: 1.0, plus, minus: None }
            } else if v.upper_bound.is_finite() {
                Origin { offset: v.upper_bound, sign: -1.0, plus, minus: None }
            } else {
                let minus = columns.len();
                columns.push(format!("{}_neg", v.id));
                Origin { offset: 0.0, sign: 1.0, plus, minus: Some(minus) }
            };
            origins.push(origin);
        }

        let n = columns.len();
        let mut rows = Vec::with_capacity(model.num_constraints() + bound_rows.len());

        for c in model.constraints() {
            let mut coefficients = vec![0.0; n];
            let mut rhs = c.bound;
            for (var, coef) in model.row(&c.id) {
                let Some(index) = model.variable_index(var) else {
                    continue;
                };
                let origin = origins[index];
                coefficients[origin.plus] += coef * origin.sign;
                if let Some(minus) = origin.minus {
                    coefficients[minus] -= coef;
                }
                rhs -= coef * origin.offset;
            }
            rows.push(Row {
                name: c.id.clone(),
                coefficients,
                op: c.op,
                rhs,
            });
        }

        for (plus, width) in bound_rows {
            let mut coefficients = vec![0.0; n];
            coefficients[plus] = 1.0;
            rows.push(Row {
                name: format!("{}_range", columns[plus]),
                coefficients,
                op: ConstraintOp::Le,
                rhs: width,
            });
        }

        let mut objective = vec![0.0; n];
        for (v, origin) in model.variables().zip(&origins) {
            objective[origin.plus] += v.objective_coefficient * origin.sign;
            if let Some(minus) = origin.minus {
                objective[minus] -= v.objective_coefficient;
            }
        }

        Self {
            columns,
            objective,
            minimize,
            rows,
            origins,
        }
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Map column values back onto the model's variables
    pub fn recover(&self, columns: &[f64]) -> Vec<f64> {
        self.origins.iter().map(|o| o.value(columns)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualstack_model::{Constraint, Variable};

    #[test]
    fn test_shifted_and_free_columns() {
        let mut model = Model::new("m");
        model.add_variable(Variable::new("x", 2.0, 5.0).with_objective(1.0)).unwrap();
        model
            .add_variable(Variable::new("y", f64::NEG_INFINITY, f64::INFINITY).with_objective(3.0))
            .unwrap();
        model.add_constraint(Constraint::le("c", 10.0)).unwrap();
        model.set_coefficient("x", "c", 2.0).unwrap();
        model.set_coefficient("y", "c", 1.0).unwrap();

        let form = StandardForm::from_model(&model, false);

        assert_eq!(form.columns, vec!["x", "y", "y_neg"]);
        // 2(2 + x') + (y+ - y-) <= 10  ->  2x' + y+ - y- <= 6
        assert_eq!(form.rows[0].coefficients, vec![2.0, 1.0, -1.0]);
        assert!((form.rows[0].rhs - 6.0).abs() < 1e-12);
        // x' <= 3
        assert_eq!(form.rows[1].name, "x_range");
        assert!((form.rows[1].rhs - 3.0).abs() < 1e-12);
        assert_eq!(form.objective, vec![1.0, 3.0, -3.0]);

        assert_eq!(form.recover(&[1.0, 4.0, 1.5]), vec![3.0, 2.5]);
    }

    #[test]
    fn test_upper_bounded_only_column_is_mirrored() {
        let mut model = Model::new("m");
        model.add_variable(Variable::new("x", f64::NEG_INFINITY, 4.0)).unwrap();
        let form = StandardForm::from_model(&model, true);
        assert!(form.rows.is_empty());
        assert_eq!(form.recover(&[1.0]), vec![3.0]);
    }
}
