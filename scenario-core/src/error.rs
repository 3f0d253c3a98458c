use std::fmt;
use thiserror::Error;

/// The entity class an identifier was expected to resolve against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Molecule,
    Gene,
    Reaction,
    ReactionComplex,
    Cell,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityKind::Molecule => "molecule",
            EntityKind::Gene => "gene",
            EntityKind::Reaction => "reaction",
            EntityKind::ReactionComplex => "reaction complex",
            EntityKind::Cell => "cell",
        };
        f.write_str(label)
    }
}

/// Errors produced by the scenario core.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// An id did not resolve to any entity of the expected class.
    #[error("{kind} id '{id}' not found")]
    ReferenceNotFound { kind: EntityKind, id: String },

    /// An add operation would introduce a second entity with the same id.
    #[error("duplicate {kind} id '{id}'")]
    DuplicateId { kind: EntityKind, id: String },

    /// Transition drivers need at least two states before elements exist.
    #[error("transition driver requires at least two states, found {found}")]
    InsufficientStates { found: usize },

    /// A distribution payload was configured with unusable parameters.
    #[error("invalid distribution parameter: {0}")]
    InvalidDistributionParameter(String),

    /// A state index fell outside the driver's state list.
    #[error("state index {index} out of range for {len} states")]
    StateOutOfRange { index: usize, len: usize },

    /// A driver's element matrix does not line up with its state list.
    #[error("malformed transition driver: {0}")]
    MalformedDriver(String),
}

/// Result type alias for scenario core operations.
pub type Result<T> = std::result::Result<T, ScenarioError>;
