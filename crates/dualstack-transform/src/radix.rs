//! Radix (positional digit) linearization of a selectable coefficient.
//!
//! A coefficient `a0` of column `x` in row `c` becomes
//! ```text
//!   sum_{k,l} radix^power_l * digit_k * a0 * z_kl
//! ```
//! where each slice `z_kl` equals `x` when its binary `y_kl` is on and 0
//! otherwise. One binary per (digit, power) is shared by every term in a
//! group, and at most one digit is active per power level.

use dualstack_model::{CoefficientMode, Constraint, ModelError, ModelStore, Variable};
use indexmap::IndexMap;

use crate::error::TransformError;
use crate::links::{self, LinkRows};

/// One coefficient that takes part in a group's shared multiplier
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTerm {
    pub variable: String,
    pub constraint: String,
    /// Coefficient before linearization
    pub coefficient: f64,
}

impl GroupTerm {
    pub fn new(variable: impl Into<String>, constraint: impl Into<String>, coefficient: f64) -> Self {
        Self {
            variable: variable.into(),
            constraint: constraint.into(),
            coefficient,
        }
    }
}

/// Digit values available at every power level
#[derive(Debug, Clone, PartialEq)]
pub enum Digits {
    Explicit(Vec<f64>),
    /// `count` values evenly spaced over [1, radix - 1]
    Evenly { count: usize },
}

impl Digits {
    fn resolve(&self, radix: u32) -> Vec<f64> {
        match self {
            Digits::Explicit(values) => values.clone(),
            Digits::Evenly { count } => {
                let (first, last) = (1.0, f64::from(radix) - 1.0);
                match *count {
                    0 => Vec::new(),
                    1 => vec![first],
                    n => {
                        let step = (last - first) / (n - 1) as f64;
                        (0..n).map(|i| first + step * i as f64).collect()
                    }
                }
            }
        }
    }
}

pub fn binary_id(group: &str, digit: usize, power: usize) -> String {
    format!("binary_{group}_{digit}_{power}")
}

pub fn slice_id(variable: &str, constraint: &str, digit: usize, power: usize) -> String {
    format!("z_{variable}_{constraint}_{digit}_{power}")
}

#[derive(Debug, Clone)]
pub struct RadixLinearizer {
    radix: u32,
    powers: Vec<i32>,
    digits: Digits,
    big_m: f64,
    prevent_zero: bool,
}

impl RadixLinearizer {
    /// Base `radix`, a single power level 0 and every digit 1..radix-1
    pub fn new(radix: u32) -> Self {
        Self {
            radix,
            powers: vec![0],
            digits: Digits::Evenly {
                count: radix.saturating_sub(1).max(1) as usize,
            },
            big_m: 1e3,
            prevent_zero: false,
        }
    }

    pub fn with_powers(mut self, powers: impl IntoIterator<Item = i32>) -> Self {
        self.powers = powers.into_iter().collect();
        self
    }

    pub fn with_digits(mut self, digits: impl IntoIterator<Item = f64>) -> Self {
        self.digits = Digits::Explicit(digits.into_iter().collect());
        self
    }

    pub fn with_digit_count(mut self, count: usize) -> Self {
        self.digits = Digits::Evenly { count };
        self
    }

    pub fn with_big_m(mut self, big_m: f64) -> Self {
        self.big_m = big_m;
        self
    }

    /// Require at least one active digit per group
    pub fn with_prevent_zero(mut self, prevent_zero: bool) -> Self {
        self.prevent_zero = prevent_zero;
        self
    }

    pub fn digits(&self) -> Vec<f64> {
        self.digits.resolve(self.radix)
    }

    /// Linearize every group in `groups` through `store`.
    ///
    /// Returns the digit values, needed to decode a solved assignment back into
    /// the chosen multiplier.
    pub fn apply<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        groups: &IndexMap<String, Vec<GroupTerm>>,
    ) -> Result<Vec<f64>, TransformError> {
        let digits = self.digits();
        let mut slices = 0usize;

        for (group, terms) in groups {
            for (l, &power) in self.powers.iter().enumerate() {
                let scale = f64::from(self.radix).powi(power);
                for (k, &digit) in digits.iter().enumerate() {
                    let y = store.ensure_variable(Variable::binary(binary_id(group, k, l)))?;

                    for term in terms {
                        let x = store
                            .variable(&term.variable)
                            .cloned()
                            .ok_or_else(|| ModelError::UnknownVariable(term.variable.clone()))?;
                        store.remove_coefficient(&x.id, &term.constraint);

                        let z = slice_id(&x.id, &term.constraint, k, l);
                        let (lower, upper) = links::slice_bounds(x.lower_bound, x.upper_bound);
                        store.add_variable(Variable::new(z.as_str(), lower, upper))?;
                        store.set_coefficient(&z, &term.constraint, scale * digit * term.coefficient)?;

                        let key = format!("{}_{}_{k}_{l}", x.id, term.constraint);
                        links::link_slice(
                            store,
                            &LinkRows::new("zdiff", "z", &key),
                            &x.id,
                            &z,
                            &y.id,
                            (x.lower_bound, x.upper_bound),
                            self.big_m,
                            CoefficientMode::Replace,
                        )?;
                        slices += 1;
                    }
                }
            }
        }

        self.add_digit_rows(store, groups)?;

        tracing::debug!(
            component = "radix",
            operation = "apply",
            radix = self.radix,
            groups = groups.len(),
            powers = self.powers.len(),
            digits = digits.len(),
            slices,
            prevent_zero = self.prevent_zero,
            "Linearized grouped coefficients"
        );
        Ok(digits)
    }

    /// One-hot rows over the binaries of every group, plus the
    /// `force_nonzero` rows when zero is excluded.
    ///
    /// The binaries must already be visible through `store`, locally or in its
    /// canonical model. Rows that already exist are reused.
    pub fn add_digit_rows<S: ModelStore + ?Sized>(
        &self,
        store: &mut S,
        groups: &IndexMap<String, Vec<GroupTerm>>,
    ) -> Result<(), TransformError> {
        let count = self.digits().len();
        for group in groups.keys() {
            for l in 0..self.powers.len() {
                let row = format!("digit_{group}_{l}");
                links::ensure_row(store, Constraint::le(row.as_str(), 1.0))?;
                for k in 0..count {
                    let y = self.existing_binary(&*store, group, k, l)?;
                    store.set_coefficient(&y, &row, 1.0)?;
                }
            }
        }

        if self.prevent_zero {
            for group in groups.keys() {
                let row = format!("force_nonzero_{group}");
                links::ensure_row(store, Constraint::ge(row.as_str(), 0.9))?;
                for l in 0..self.powers.len() {
                    for k in 0..count {
                        let y = self.existing_binary(&*store, group, k, l)?;
                        store.set_coefficient(&y, &row, 1.0)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn existing_binary<S: ModelStore + ?Sized>(
        &self,
        store: &S,
        group: &str,
        k: usize,
        l: usize,
    ) -> Result<String, TransformError> {
        let id = binary_id(group, k, l);
        match store.variable(&id) {
            Some(_) => Ok(id),
            None => Err(TransformError::MissingBinary(id)),
        }
    }
}
