use dualstack_model::ConstraintOp;

use crate::solution::SolutionStatus;
use crate::standard::StandardForm;

/// Dense two-phase simplex over a [`StandardForm`]
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots per phase before giving up
    max_iterations: usize,
    /// Tolerance for floating point comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: 10000,
            tolerance: 1e-9,
        }
    }
}

/// Column values of a solved standard form
#[derive(Debug, Clone)]
pub struct Outcome {
    pub status: SolutionStatus,
    pub columns: Vec<f64>,
}

impl Outcome {
    fn failed(status: SolutionStatus) -> Self {
        Self {
            status,
            columns: Vec::new(),
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve using the two-phase method with Bland's pivoting rule
    pub fn solve(&self, form: &StandardForm) -> Outcome {
        let mut tableau = self.build_tableau(form);

        // Phase 1: Find initial basic feasible solution
        if tableau.n_artificial > 0 {
            match self.phase1(&mut tableau) {
                SimplexResult::Optimal => {}
                SimplexResult::Infeasible => return Outcome::failed(SolutionStatus::Infeasible),
                SimplexResult::Unbounded | SimplexResult::IterationLimit => {
                    return Outcome::failed(SolutionStatus::Error);
                }
            }
        }

        // Phase 2: Optimize
        match self.phase2(&mut tableau) {
            SimplexResult::Optimal => {}
            SimplexResult::Unbounded => return Outcome::failed(SolutionStatus::Unbounded),
            SimplexResult::Infeasible | SimplexResult::IterationLimit => {
                return Outcome::failed(SolutionStatus::Error);
            }
        }

        Outcome {
            status: SolutionStatus::Optimal,
            columns: self.extract_columns(&tableau),
        }
    }

    fn build_tableau(&self, form: &StandardForm) -> Tableau {
        let n_vars = form.num_columns();
        let n_constraints = form.rows.len();

        // Normalize every row to a nonnegative right-hand side
        let rows: Vec<(Vec<f64>, ConstraintOp, f64)> = form
            .rows
            .iter()
            .map(|r| {
                if r.rhs < 0.0 {
                    let op = match r.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (r.coefficients.iter().map(|c| -c).collect(), op, -r.rhs)
                } else {
                    (r.coefficients.clone(), r.op, r.rhs)
                }
            })
            .collect();

        // Count slack and artificial variables needed
        let mut n_slack = 0;
        let mut n_artificial = 0;
        for (_, op, _) in &rows {
            match op {
                ConstraintOp::Le => n_slack += 1,
                ConstraintOp::Ge => {
                    n_slack += 1; // surplus
                    n_artificial += 1;
                }
                ConstraintOp::Eq => n_artificial += 1,
            }
        }

        let total_cols = n_vars + n_slack + n_artificial + 1; // +1 for RHS
        let mut tableau = Tableau {
            data: vec![vec![0.0; total_cols]; n_constraints + 1],
            basic_vars: vec![0; n_constraints],
            n_vars,
            n_slack,
            n_artificial,
        };

        let mut slack_idx = n_vars;
        let mut artificial_idx = n_vars + n_slack;

        for (i, (coefficients, op, rhs)) in rows.iter().enumerate() {
            tableau.data[i][..n_vars].copy_from_slice(coefficients);
            tableau.data[i][total_cols - 1] = *rhs;

            match op {
                ConstraintOp::Le => {
                    tableau.data[i][slack_idx] = 1.0;
                    tableau.basic_vars[i] = slack_idx;
                    slack_idx += 1;
                }
                ConstraintOp::Ge => {
                    tableau.data[i][slack_idx] = -1.0; // surplus
                    slack_idx += 1;
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    tableau.data[i][artificial_idx] = 1.0;
                    tableau.basic_vars[i] = artificial_idx;
                    artificial_idx += 1;
                }
            }
        }

        // Objective row (last row) holds reduced costs of a maximization;
        // minimization negates the coefficients.
        for (j, &coef) in form.objective.iter().enumerate() {
            tableau.data[n_constraints][j] = if form.minimize { -coef } else { coef };
        }

        tableau
    }

    fn phase1(&self, tableau: &mut Tableau) -> SimplexResult {
        let n_constraints = tableau.data.len() - 1;
        let n_cols = tableau.data[0].len();
        let art_start = tableau.art_start();

        let orig_obj = tableau.data[n_constraints].clone();

        // Maximize -sum(artificials)
        tableau.data[n_constraints].fill(0.0);
        for j in art_start..(art_start + tableau.n_artificial) {
            tableau.data[n_constraints][j] = -1.0;
        }
        // Price out the basic artificials
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] += tableau.data[i][j];
                }
            }
        }

        let mut converged = false;
        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_entering(tableau, n_cols - 1) else {
                converged = true;
                break;
            };
            let Some(pivot_row) = self.find_leaving(tableau, pivot_col) else {
                // The phase 1 objective is bounded by zero
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        if !converged {
            return SimplexResult::IterationLimit;
        }

        // Residual artificials are judged more loosely than pivots: big-M rows
        // accumulate rounding error well above the pivot tolerance.
        let feasibility = self.tolerance * 1e3;
        let rhs_col = n_cols - 1;
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start && tableau.data[i][rhs_col].abs() > feasibility {
                return SimplexResult::Infeasible;
            }
        }

        // Drive zero-level artificials out of the basis so phase 2 cannot
        // raise them again; rows with no other support are redundant.
        for i in 0..n_constraints {
            if tableau.basic_vars[i] >= art_start {
                if let Some(j) = (0..art_start).find(|&j| tableau.data[i][j].abs() > self.tolerance) {
                    self.pivot(tableau, i, j);
                }
            }
        }

        // Restore original objective and price out the basis
        tableau.data[n_constraints] = orig_obj;
        for i in 0..n_constraints {
            let basic = tableau.basic_vars[i];
            let ratio = tableau.data[n_constraints][basic];
            if ratio.abs() > self.tolerance {
                for j in 0..n_cols {
                    tableau.data[n_constraints][j] -= ratio * tableau.data[i][j];
                }
            }
        }

        SimplexResult::Optimal
    }

    fn phase2(&self, tableau: &mut Tableau) -> SimplexResult {
        // Artificial columns never re-enter
        let limit = tableau.art_start();

        for _ in 0..self.max_iterations {
            let Some(pivot_col) = self.find_entering(tableau, limit) else {
                return SimplexResult::Optimal;
            };
            let Some(pivot_row) = self.find_leaving(tableau, pivot_col) else {
                return SimplexResult::Unbounded;
            };
            self.pivot(tableau, pivot_row, pivot_col);
        }
        SimplexResult::IterationLimit
    }

    /// Bland's rule: the lowest-index column with a positive reduced cost
    fn find_entering(&self, tableau: &Tableau, limit: usize) -> Option<usize> {
        let obj_row = tableau.data.len() - 1;
        (0..limit).find(|&j| tableau.data[obj_row][j] > self.tolerance)
    }

    /// Minimum ratio test, ties going to the lowest-index basic variable
    fn find_leaving(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let n_constraints = tableau.data.len() - 1;
        let rhs_col = tableau.data[0].len() - 1;

        let mut best: Option<(f64, usize)> = None;

        for i in 0..n_constraints {
            let val = tableau.data[i][col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = tableau.data[i][rhs_col].max(0.0) / val;
            best = match best {
                None => Some((ratio, i)),
                Some((r, _)) if ratio < r - self.tolerance => Some((ratio, i)),
                Some((r, row))
                    if (ratio - r).abs() <= self.tolerance && tableau.basic_vars[i] < tableau.basic_vars[row] =>
                {
                    Some((ratio, i))
                }
                keep => keep,
            };
        }

        best.map(|(_, row)| row)
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        let n_rows = tableau.data.len();

        tableau.basic_vars[row] = col;

        let pivot_val = tableau.data[row][col];
        for v in tableau.data[row].iter_mut() {
            *v /= pivot_val;
        }

        let pivot_row = tableau.data[row].clone();
        for i in 0..n_rows {
            if i == row {
                continue;
            }
            let factor = tableau.data[i][col];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in tableau.data[i].iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
        }
    }

    fn extract_columns(&self, tableau: &Tableau) -> Vec<f64> {
        let rhs_col = tableau.data[0].len() - 1;
        let mut values = vec![0.0; tableau.n_vars];
        for (i, &basic) in tableau.basic_vars.iter().enumerate() {
            if basic < tableau.n_vars {
                values[basic] = tableau.data[i][rhs_col];
            }
        }
        values
    }
}

struct Tableau {
    data: Vec<Vec<f64>>,
    basic_vars: Vec<usize>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
}

impl Tableau {
    fn art_start(&self) -> usize {
        self.n_vars + self.n_slack
    }
}

enum SimplexResult {
    Optimal,
    Unbounded,
    Infeasible,
    IterationLimit,
}
