use thiserror::Error;

use crate::entity::EntityKind;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Duplicate {kind} id: {id}")]
    DuplicateId { kind: EntityKind, id: String },
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Unknown constraint: {0}")]
    UnknownConstraint(String),
    #[error("Cannot clone {source_kind} attributes onto a {target_kind}")]
    InvalidKind {
        source_kind: EntityKind,
        target_kind: EntityKind,
    },
}
