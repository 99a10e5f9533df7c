mod check;
mod entity;
mod error;
mod matrix;
mod model;
mod store;

pub use check::Violation;
pub use entity::{clone_attributes, Constraint, ConstraintOp, Entity, EntityKind, Extension, Sense, Variable, VariableKind};
pub use error::ModelError;
pub use matrix::{CoefficientMatrix, CoefficientMode};
pub use model::Model;
pub use store::{LayeredModel, ModelStore};
