//! Error types for the mutation engine.

use celmut_ast::{ExprError, ExprId};
use derive_more::{Display, Error, From};

pub type Result<T> = std::result::Result<T, MutationError>;

#[derive(Clone, Debug, Display, Error, From, PartialEq, Eq)]
pub enum MutationError {
    /// The target id is not present in the tree.
    #[display("expression {id} not found")]
    #[from(ignore)]
    NotFound { id: ExprId },

    #[display("{_0}")]
    InvalidKindAccess(ExprError),

    /// The iteration budget of a single walk was exhausted.
    #[display("Max iteration count reached.")]
    #[from(ignore)]
    MaxIterationExceeded,
}
