//! Structural mutation engine for parsed expression trees.
//!
//! The engine edits a [`MutableAst`] (a tree plus its macro-call metadata)
//! through an [`AstMutator`]:
//!
//! - [`AstMutator::replace_subtree`] splices a new expression at a node id
//! - [`AstMutator::replace_subtree_with_new_bind_macro`] synthesizes a
//!   `cel.bind` comprehension at a node id
//! - [`AstMutator::mangle_comprehension_identifier_names`] renames
//!   comprehension variables to tree-wide unique names
//!
//! After every operation node ids are unique, every macro-call key names a
//! node of the tree, and extension tags are unique by `(name, version)`.

mod bind;
pub mod error;
pub mod extensions;
pub mod id_gen;
mod macro_source;
pub mod mangle;
pub mod mutable_ast;
pub mod mutator;

pub use celmut_ast;

pub use error::{MutationError, Result};
pub use extensions::merge_extensions;
pub use id_gen::{IdAllocator, IdGenerator, NoOpIdGenerator, StableIdGenerator};
pub use mangle::{MangledComprehension, MangledComprehensionAst};
pub use mutable_ast::MutableAst;
pub use mutator::{AstMutator, DEFAULT_MAX_ITERATIONS};
