//! Lazy pre-order navigation with parent links.
//!
//! A [`NavigableExpr`] borrows the tree it walks, so holding a view across a
//! structural edit does not compile. Callers re-navigate after each edit.
//!
//! ```
//! use celmut_ast::{Expr, ExprKindTag, NavigableExpr};
//!
//! let expr = Expr::call("f", vec![Expr::ident("x").with_id(2)]).with_id(1);
//! let idents: Vec<_> = NavigableExpr::new(&expr)
//!     .all_nodes()
//!     .filter(|n| n.kind() == ExprKindTag::Ident && n.parent_kind() == Some(ExprKindTag::Call))
//!     .map(|n| n.id().raw())
//!     .collect();
//! assert_eq!(idents, vec![2]);
//! ```

use std::collections::HashMap;

use crate::expr::{Expr, ExprKindTag};
use crate::node_id::ExprId;

/// A node together with its position in the tree.
#[derive(Clone, Copy, Debug)]
pub struct NavigableExpr<'a> {
    expr: &'a Expr,
    parent: Option<&'a Expr>,
    depth: usize,
}

impl<'a> NavigableExpr<'a> {
    /// Start navigating at `root`.
    pub fn new(root: &'a Expr) -> Self {
        Self {
            expr: root,
            parent: None,
            depth: 0,
        }
    }

    pub fn expr(&self) -> &'a Expr {
        self.expr
    }

    pub fn parent(&self) -> Option<&'a Expr> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn id(&self) -> ExprId {
        self.expr.id()
    }

    pub fn kind(&self) -> ExprKindTag {
        self.expr.kind_tag()
    }

    pub fn parent_kind(&self) -> Option<ExprKindTag> {
        self.parent.map(Expr::kind_tag)
    }

    /// This node followed by all of its descendants, in pre-order.
    pub fn all_nodes(&self) -> PreOrder<'a> {
        PreOrder { stack: vec![*self] }
    }

    /// All descendants of this node, in pre-order.
    pub fn descendants(&self) -> PreOrder<'a> {
        let mut stack: Vec<_> = self.children().collect();
        stack.reverse();
        PreOrder { stack }
    }

    /// Direct children of this node.
    pub fn children(&self) -> impl Iterator<Item = NavigableExpr<'a>> + use<'a> {
        let parent = self.expr;
        let depth = self.depth + 1;
        parent.children().into_iter().map(move |expr| NavigableExpr {
            expr,
            parent: Some(parent),
            depth,
        })
    }
}

/// Iterator returned by [`NavigableExpr::all_nodes`] and
/// [`NavigableExpr::descendants`].
pub struct PreOrder<'a> {
    stack: Vec<NavigableExpr<'a>>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = NavigableExpr<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(node.children());
        self.stack[start..].reverse();
        Some(node)
    }
}

/// Child id to parent id, computed from one traversal.
///
/// Never stored alongside the tree: any structural edit makes it stale.
#[derive(Debug, Default)]
pub struct ParentIndex {
    parents: HashMap<ExprId, ExprId>,
}

impl ParentIndex {
    pub fn build(root: &Expr) -> Self {
        let parents = NavigableExpr::new(root)
            .descendants()
            .filter_map(|node| Some((node.id(), node.parent()?.id())))
            .collect();
        Self { parents }
    }

    pub fn parent_of(&self, id: ExprId) -> Option<ExprId> {
        self.parents.get(&id).copied()
    }

    /// Whether `ancestor` is `id` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: ExprId, id: ExprId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent_of(node);
        }
        false
    }
}
