use dualstack_model::{ModelError, Sense};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("Binary {0} is in neither the model nor its canonical store")]
    MissingBinary(String),
    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
    #[error("Scenario {0} is already stacked")]
    DuplicateScenario(String),
    #[error("Scenario {scenario} is a {found:?} model, the stack is {expected:?}")]
    SenseMismatch {
        scenario: String,
        expected: Sense,
        found: Sense,
    },
}
