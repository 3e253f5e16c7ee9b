//! The mutable workspace: an owned tree plus its source metadata.

use celmut_ast::{Ast, Expr, ExprId, SourceInfo};

use crate::id_gen::IdAllocator;

/// An expression tree with metadata, as consumed and produced by the engine.
///
/// Engine operations borrow a workspace and return a new one, so a failed
/// operation never leaves a half-edited value behind.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MutableAst {
    root: Expr,
    source: SourceInfo,
}

impl MutableAst {
    pub fn new(root: Expr, source: SourceInfo) -> Self {
        Self { root, source }
    }

    /// A workspace with no metadata.
    pub fn from_expr(root: Expr) -> Self {
        Self::new(root, SourceInfo::default())
    }

    /// Structural copy of a frozen AST.
    pub fn from_ast(ast: &Ast) -> Self {
        Self::new(ast.expr().clone(), ast.source().clone())
    }

    /// Freeze as a parsed AST. Parse-only fields are dropped: the tree is no
    /// longer literally what the parser saw.
    pub fn to_parsed_ast(&self) -> Ast {
        let mut source = self.source.clone();
        source.clear_parse_only();
        Ast::parsed(self.root.clone(), source)
    }

    /// Freeze as a parsed AST, keeping description, line offsets and
    /// positions.
    pub fn to_parsed_ast_retaining_source(&self) -> Ast {
        Ast::parsed(self.root.clone(), self.source.clone())
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }

    pub fn source(&self) -> &SourceInfo {
        &self.source
    }

    pub fn into_parts(self) -> (Expr, SourceInfo) {
        (self.root, self.source)
    }

    pub fn find(&self, id: ExprId) -> Option<&Expr> {
        self.root.find(id)
    }

    /// Largest id in use by the tree, macro-call keys or macro-call shadows.
    pub fn max_id(&self) -> ExprId {
        IdAllocator::from_ast(self).max()
    }
}

impl From<Ast> for MutableAst {
    fn from(ast: Ast) -> Self {
        let (root, source) = ast.into_parts();
        Self::new(root, source)
    }
}

impl From<Expr> for MutableAst {
    fn from(root: Expr) -> Self {
        Self::from_expr(root)
    }
}
