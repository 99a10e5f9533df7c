use indexmap::IndexMap;

/// How a coefficient write combines with an existing entry
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoefficientMode {
    /// Overwrite whatever the pair held before
    #[default]
    Replace,
    /// Add to the existing value (0 if absent)
    Accumulate,
}

/// Sparse (variable, constraint) -> coefficient map.
///
/// Every entry is stored twice: once in the variable's column and once in the
/// constraint's row. All mutation goes through methods that touch both sides,
/// so the two directions can never disagree.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoefficientMatrix {
    /// variable -> constraint -> value
    columns: IndexMap<String, IndexMap<String, f64>>,
    /// constraint -> variable -> value
    rows: IndexMap<String, IndexMap<String, f64>>,
}

impl CoefficientMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, variable: &str, constraint: &str) -> Option<f64> {
        self.columns.get(variable)?.get(constraint).copied()
    }

    /// Write an entry and return the value now stored.
    pub fn insert(&mut self, variable: &str, constraint: &str, value: f64, mode: CoefficientMode) -> f64 {
        let value = match mode {
            CoefficientMode::Replace => value,
            CoefficientMode::Accumulate => self.get(variable, constraint).unwrap_or(0.0) + value,
        };
        self.columns
            .entry(variable.to_string())
            .or_default()
            .insert(constraint.to_string(), value);
        self.rows
            .entry(constraint.to_string())
            .or_default()
            .insert(variable.to_string(), value);
        value
    }

    pub fn remove(&mut self, variable: &str, constraint: &str) -> Option<f64> {
        let removed = self.columns.get_mut(variable)?.shift_remove(constraint)?;
        if let Some(row) = self.rows.get_mut(constraint) {
            row.shift_remove(variable);
        }
        Some(removed)
    }

    /// Drop a variable's whole column, returning how many entries went with it.
    pub fn remove_variable(&mut self, variable: &str) -> usize {
        let Some(column) = self.columns.shift_remove(variable) else {
            return 0;
        };
        for constraint in column.keys() {
            if let Some(row) = self.rows.get_mut(constraint) {
                row.shift_remove(variable);
            }
        }
        column.len()
    }

    pub fn remove_constraint(&mut self, constraint: &str) -> usize {
        let Some(row) = self.rows.shift_remove(constraint) else {
            return 0;
        };
        for variable in row.keys() {
            if let Some(column) = self.columns.get_mut(variable) {
                column.shift_remove(constraint);
            }
        }
        row.len()
    }

    /// Constraints a variable appears in, with its coefficients
    pub fn column(&self, variable: &str) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.columns
            .get(variable)
            .into_iter()
            .flat_map(|c| c.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    /// Variables appearing in a constraint, with their coefficients
    pub fn row(&self, constraint: &str) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.rows
            .get(constraint)
            .into_iter()
            .flat_map(|r| r.iter().map(|(k, v)| (k.as_str(), *v)))
    }

    /// All entries as (variable, constraint, value)
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, f64)> + '_ {
        self.columns
            .iter()
            .flat_map(|(var, col)| col.iter().map(move |(con, v)| (var.as_str(), con.as_str(), *v)))
    }

    pub fn len(&self) -> usize {
        self.columns.values().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_visible_from_both_sides() {
        let mut m = CoefficientMatrix::new();
        m.insert("x", "c", 2.5, CoefficientMode::Replace);

        assert_eq!(m.get("x", "c"), Some(2.5));
        assert_eq!(m.column("x").collect::<Vec<_>>(), vec![("c", 2.5)]);
        assert_eq!(m.row("c").collect::<Vec<_>>(), vec![("x", 2.5)]);
    }

    #[test]
    fn test_replace_and_accumulate() {
        let mut m = CoefficientMatrix::new();
        m.insert("x", "c", 1.0, CoefficientMode::Replace);
        m.insert("x", "c", 3.0, CoefficientMode::Replace);
        assert_eq!(m.get("x", "c"), Some(3.0));

        let stored = m.insert("x", "c", 2.0, CoefficientMode::Accumulate);
        assert_eq!(stored, 5.0);
        assert_eq!(m.row("c").next(), Some(("x", 5.0)));

        assert_eq!(m.insert("y", "c", 4.0, CoefficientMode::Accumulate), 4.0);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_remove_updates_both_directions() {
        let mut m = CoefficientMatrix::new();
        m.insert("x", "c", 1.0, CoefficientMode::Replace);
        m.insert("x", "d", 2.0, CoefficientMode::Replace);

        assert_eq!(m.remove("x", "c"), Some(1.0));
        assert_eq!(m.remove("x", "c"), None);
        assert_eq!(m.row("c").count(), 0);
        assert_eq!(m.column("x").collect::<Vec<_>>(), vec![("d", 2.0)]);
    }

    #[test]
    fn test_remove_variable_and_constraint() {
        let mut m = CoefficientMatrix::new();
        m.insert("x", "c", 1.0, CoefficientMode::Replace);
        m.insert("y", "c", 2.0, CoefficientMode::Replace);
        m.insert("x", "d", 3.0, CoefficientMode::Replace);

        assert_eq!(m.remove_variable("x"), 2);
        assert_eq!(m.row("c").collect::<Vec<_>>(), vec![("y", 2.0)]);
        assert_eq!(m.row("d").count(), 0);

        assert_eq!(m.remove_constraint("c"), 1);
        assert_eq!(m.column("y").count(), 0);
        assert!(m.is_empty());
    }
}
