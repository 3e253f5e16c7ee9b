//! Errors raised while reading expression trees.

use derive_more::{Display, Error};

use crate::expr::ExprKindTag;
use crate::node_id::ExprId;

/// A kind-guarded accessor was invoked against a node of another kind.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ExprError {
    #[display("Invalid ExprKind: expected {expected}, found {actual}")]
    InvalidKindAccess {
        expected: ExprKindTag,
        actual: ExprKindTag,
    },
}

/// Errors raised while rendering an expression as concrete syntax.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum UnparseError {
    /// A comprehension has no macro call to render it from.
    #[display("comprehension {id} has no macro call")]
    MissingMacroCall { id: ExprId },

    /// A `NOT_SET` node that does not stand for a macro call.
    #[display("unset expression {id} cannot be rendered")]
    UnsetExpr { id: ExprId },

    /// An operator call with the wrong number of operands.
    #[display("operator {function} expects {expected} operands, found {found}")]
    OperatorArity {
        function: String,
        expected: usize,
        found: usize,
    },
}
