use dualstack_model::{CoefficientMode, Constraint, ModelError, ModelStore};

/// Ids of the four rows tying a slice to its source column
pub(crate) struct LinkRows {
    pub track_lower: String,
    pub track_upper: String,
    pub collapse_lower: String,
    pub collapse_upper: String,
}

impl LinkRows {
    pub(crate) fn new(track: &str, collapse: &str, key: &str) -> Self {
        Self {
            track_lower: format!("{track}_lower_{key}"),
            track_upper: format!("{track}_upper_{key}"),
            collapse_lower: format!("{collapse}_lower_{key}"),
            collapse_upper: format!("{collapse}_upper_{key}"),
        }
    }
}

/// Slice `z` of column `x` under indicator `y`:
/// ```text
///   x - z + M y <= M      z - x + M y <= M     (z = x when y = 1)
///   l y - z <= 0          z - u y <= 0         (z = 0 when y = 0)
/// ```
/// `(lower, upper)` are the bounds of `x`. Rows already present are reused;
/// coefficients of `y` are written with `y_mode`.
#[allow(clippy::too_many_arguments)]
pub(crate) fn link_slice<S: ModelStore + ?Sized>(
    store: &mut S,
    rows: &LinkRows,
    x: &str,
    z: &str,
    y: &str,
    (lower, upper): (f64, f64),
    big_m: f64,
    y_mode: CoefficientMode,
) -> Result<(), ModelError> {
    ensure_row(store, Constraint::le(rows.track_lower.as_str(), big_m))?;
    store.set_coefficient(x, &rows.track_lower, 1.0)?;
    store.set_coefficient(z, &rows.track_lower, -1.0)?;
    store.insert_coefficient(y, &rows.track_lower, big_m, y_mode)?;

    ensure_row(store, Constraint::le(rows.track_upper.as_str(), big_m))?;
    store.set_coefficient(x, &rows.track_upper, -1.0)?;
    store.set_coefficient(z, &rows.track_upper, 1.0)?;
    store.insert_coefficient(y, &rows.track_upper, big_m, y_mode)?;

    ensure_row(store, Constraint::le(rows.collapse_lower.as_str(), 0.0))?;
    store.set_coefficient(z, &rows.collapse_lower, -1.0)?;
    store.insert_coefficient(y, &rows.collapse_lower, lower, y_mode)?;

    ensure_row(store, Constraint::le(rows.collapse_upper.as_str(), 0.0))?;
    store.set_coefficient(z, &rows.collapse_upper, 1.0)?;
    store.insert_coefficient(y, &rows.collapse_upper, -upper, y_mode)?;

    Ok(())
}

/// Bounds of a slice: the source bounds widened so that z = 0 stays feasible
pub(crate) fn slice_bounds(lower: f64, upper: f64) -> (f64, f64) {
    (lower.min(0.0), upper.max(0.0))
}

/// Add `row` unless a row with its id is already visible through the store
pub(crate) fn ensure_row<S: ModelStore + ?Sized>(store: &mut S, row: Constraint) -> Result<(), ModelError> {
    if store.constraint(&row.id).is_some() {
        return Ok(());
    }
    store.add_constraint(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualstack_model::{Model, Variable};

    fn linked(mode: CoefficientMode) -> Model {
        let mut model = Model::new("m");
        model.add_variable(Variable::new("x", 2.0, 6.0)).unwrap();
        model.add_variable(Variable::new("z", 0.0, 6.0)).unwrap();
        model.add_variable(Variable::binary("y")).unwrap();
        let rows = LinkRows::new("zdiff", "z", "k");
        link_slice(&mut model, &rows, "x", "z", "y", (2.0, 6.0), 100.0, mode).unwrap();
        link_slice(&mut model, &rows, "x", "z", "y", (2.0, 6.0), 100.0, mode).unwrap();
        model
    }

    #[test]
    fn test_link_rows() {
        let model = linked(CoefficientMode::Replace);
        assert_eq!(model.num_constraints(), 4);
        assert_eq!(model.constraint("zdiff_lower_k").unwrap().bound, 100.0);
        assert_eq!(model.coefficient("y", "zdiff_lower_k"), 100.0);
        assert_eq!(model.coefficient("x", "zdiff_upper_k"), -1.0);
        assert_eq!(model.coefficient("y", "z_lower_k"), 2.0);
        assert_eq!(model.coefficient("y", "z_upper_k"), -6.0);
    }

    #[test]
    fn test_accumulated_indicator_coefficients() {
        let model = linked(CoefficientMode::Accumulate);
        assert_eq!(model.coefficient("y", "zdiff_lower_k"), 200.0);
        assert_eq!(model.coefficient("y", "z_upper_k"), -12.0);
        assert_eq!(model.coefficient("z", "z_upper_k"), 1.0);
    }

    #[test]
    fn test_slice_bounds_include_zero() {
        assert_eq!(slice_bounds(2.0, 6.0), (0.0, 6.0));
        assert_eq!(slice_bounds(-3.0, -1.0), (-3.0, 0.0));
        assert_eq!(slice_bounds(-1.0, 1.0), (-1.0, 1.0));
    }
}
