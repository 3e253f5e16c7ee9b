//! The frozen AST: an expression tree plus its source metadata.
//!
//! This is the boundary type shared with the parser, checker and evaluator.
//! It is read-only; edits go through the mutable workspace in `celmut`.

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::node_id::ExprId;
use crate::source::SourceInfo;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ast {
    expr: Expr,
    #[serde(default)]
    source: SourceInfo,
    #[serde(default)]
    checked: bool,
}

impl Ast {
    /// An AST as produced by the parser.
    pub fn parsed(expr: Expr, source: SourceInfo) -> Self {
        Self {
            expr,
            source,
            checked: false,
        }
    }

    /// An AST that has gone through the type checker.
    pub fn checked(expr: Expr, source: SourceInfo) -> Self {
        Self {
            expr,
            source,
            checked: true,
        }
    }

    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn is_checked(&self) -> bool {
        self.checked
    }

    pub fn root_id(&self) -> ExprId {
        self.expr.id()
    }

    pub fn into_parts(self) -> (Expr, SourceInfo) {
        (self.expr, self.source)
    }
}
