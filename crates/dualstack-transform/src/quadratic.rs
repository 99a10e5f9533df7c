use dualstack_model::Model;
use sprs::{CsMat, TriMat};

/// Diagonal Q matrix of a model's quadratic objective terms.
pub struct QuadraticObjectiveAssembler;

impl QuadraticObjectiveAssembler {
    /// N x N matrix, N = number of variables, with `Q[i, i]` set to the
    /// quadratic coefficient of the variable at ordinal `i`.
    ///
    /// Ordinals shift when variables are added or removed, so the matrix must be
    /// rebuilt after any such change.
    pub fn build(model: &Model) -> CsMat<f64> {
        let n = model.num_variables();
        let mut triplets = TriMat::new((n, n));
        for (i, v) in model.variables().enumerate() {
            if let Some(q) = v.quadratic_coefficient {
                triplets.add_triplet(i, i, q);
            }
        }
        let matrix = triplets.to_csr();
        tracing::debug!(
            component = "quadratic",
            model = %model.name,
            dimension = n,
            nnz = matrix.nnz(),
            "Assembled quadratic objective"
        );
        matrix
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dualstack_model::Variable;

    fn five_variables() -> Model {
        let mut model = Model::new("qp");
        model
            .add_variables((0..5).map(|i| Variable::new(format!("v{i}"), 0.0, 1.0)))
            .unwrap();
        model
    }

    #[test]
    fn test_single_diagonal_entry() {
        let mut model = five_variables();
        model.variable_mut("v3").unwrap().quadratic_coefficient = Some(2.0);

        let q = QuadraticObjectiveAssembler::build(&model);
        assert_eq!(q.shape(), (5, 5));
        assert_eq!(q.nnz(), 1);
        assert_eq!(q.get(3, 3), Some(&2.0));
        assert_eq!(q.get(2, 2), None);
    }

    #[test]
    fn test_no_quadratic_terms() {
        let q = QuadraticObjectiveAssembler::build(&five_variables());
        assert_eq!(q.shape(), (5, 5));
        assert_eq!(q.nnz(), 0);
    }

    #[test]
    fn test_rebuild_follows_ordinals() {
        let mut model = five_variables();
        model.variable_mut("v3").unwrap().quadratic_coefficient = Some(2.0);
        model.remove_variable("v0");

        let q = QuadraticObjectiveAssembler::build(&model);
        assert_eq!(q.shape(), (4, 4));
        assert_eq!(q.get(2, 2), Some(&2.0));
    }
}
