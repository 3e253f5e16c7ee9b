//! Expression data model.
//!
//! This crate holds everything that reads an expression tree without
//! changing its structure:
//!
//! - [`Expr`] / [`ExprKind`]: the node model, identified by [`ExprId`]
//! - [`SourceInfo`]: side-table metadata (macro calls, extension tags)
//! - [`Ast`]: the frozen tree handed between toolchain stages
//! - [`NavigableExpr`]: lazy pre-order traversal with parent links
//! - [`unparse`]: rendering back to concrete syntax
//!
//! Structural edits live in the `celmut` crate.

pub mod ast;
pub mod constant;
pub mod error;
pub mod expr;
pub mod navigation;
pub mod node_id;
mod printer;
pub mod source;
pub mod unparse;

pub use ast::Ast;
pub use constant::{Constant, FloatBits};
pub use error::{ExprError, UnparseError};
pub use expr::{
    Call, Comprehension, CreateList, CreateMap, CreateStruct, Expr, ExprKind, ExprKindTag, Ident,
    MapEntry, Select, StructEntry,
};
pub use navigation::{NavigableExpr, ParentIndex, PreOrder};
pub use node_id::ExprId;
pub use source::{Component, Extension, SourceInfo, Version};
pub use unparse::{unparse, unparse_expr};
