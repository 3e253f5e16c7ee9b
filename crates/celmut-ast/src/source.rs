//! Source metadata attached to an expression tree.
//!
//! Like a span map, this is a side table keyed by [`ExprId`]. The tree itself
//! never points into it, so the metadata can be rebuilt after a structural
//! edit without touching node identity.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::node_id::ExprId;

/// Metadata produced by the parser alongside the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Free-form description of where the source came from.
    pub description: String,
    /// Byte offsets at which each line starts.
    pub line_offsets: Vec<u32>,
    /// Source offset of each node.
    pub positions: BTreeMap<ExprId, u32>,
    /// Original macro syntax, keyed by the id of the node the macro expanded
    /// to. Values are independent trees, never aliases into the real tree.
    pub macro_calls: BTreeMap<ExprId, Expr>,
    /// Optional language features the tree depends on.
    pub extensions: Vec<Extension>,
}

impl SourceInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop the fields that only make sense for freshly parsed text.
    pub fn clear_parse_only(&mut self) {
        self.description.clear();
        self.line_offsets.clear();
        self.positions.clear();
    }

    pub fn macro_call(&self, id: ExprId) -> Option<&Expr> {
        self.macro_calls.get(&id)
    }

    pub fn with_macro_call(mut self, id: u64, call: Expr) -> Self {
        self.macro_calls.insert(ExprId::new(id), call);
        self
    }

    pub fn with_extension(mut self, extension: Extension) -> Self {
        self.extensions.push(extension);
        self
    }
}

/// A `(name, version)` marker for an optional language feature.
///
/// Two extensions are the same tag when name and version match; the affected
/// components are informational.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Extension {
    pub name: String,
    pub version: Version,
    #[serde(default)]
    pub affected_components: Vec<Component>,
}

impl Extension {
    pub fn new(name: impl Into<String>, version: Version) -> Self {
        Self {
            name: name.into(),
            version,
            affected_components: Vec::new(),
        }
    }

    pub fn with_components(mut self, components: impl IntoIterator<Item = Component>) -> Self {
        self.affected_components.extend(components);
        self
    }
}

impl PartialEq for Extension {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.version == other.version
    }
}

impl Eq for Extension {}

impl std::hash::Hash for Extension {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.version.hash(state);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
}

impl Version {
    pub const fn new(major: u64, minor: u64) -> Self {
        Self { major, minor }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Toolchain component affected by an extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Component {
    Parser,
    TypeChecker,
    Runtime,
}
