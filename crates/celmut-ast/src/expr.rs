//! The expression node model.
//!
//! An [`Expr`] is an id plus exactly one [`ExprKind`]. Children are owned, so
//! a tree is a plain value: cloning it yields an independent copy that can be
//! grafted elsewhere without aliasing.
//!
//! ## Cached hash
//!
//! The structural hash of a node is computed on first use and cached. Every
//! mutable access path (`kind_mut`, `set_id`, the typed `*_mut` accessors)
//! drops the cache. Since a descendant can only be reached mutably through
//! its ancestors' mutable accessors, a stale cache is never observable.

use std::cell::OnceCell;
use std::collections::BTreeSet;
use std::hash::{DefaultHasher, Hash, Hasher};

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::constant::Constant;
use crate::error::ExprError;
use crate::node_id::ExprId;

/// An expression node.
#[derive(Clone, Serialize, Deserialize)]
pub struct Expr {
    id: ExprId,
    kind: ExprKind,
    #[serde(skip)]
    hash: OnceCell<u64>,
}

/// The different kinds of expressions.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprKind {
    /// Placeholder with no payload. Inside macro-call shadows it stands for
    /// the nested macro call registered under the same id.
    NotSet,

    /// Literal: `1`, `"a"`, `true`
    Constant(Constant),

    /// Identifier reference: `x`
    Ident(Ident),

    /// Field selection `a.b`, or the presence test produced by `has(a.b)`.
    Select(Select),

    /// Global call `f(a)`, member call `a.f(b)`, or an operator such as `_+_`.
    Call(Call),

    /// List literal: `[a, b, ?c]`
    List(CreateList),

    /// Message construction: `Msg{field: value}`
    Struct(CreateStruct),

    /// Map literal: `{k: v}`
    Map(CreateMap),

    /// Desugared form of iteration macros.
    Comprehension(Box<Comprehension>),
}

/// Discriminant of [`ExprKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ExprKindTag {
    #[display("NOT_SET")]
    NotSet,
    #[display("CONSTANT")]
    Constant,
    #[display("IDENT")]
    Ident,
    #[display("SELECT")]
    Select,
    #[display("CALL")]
    Call,
    #[display("CREATE_LIST")]
    List,
    #[display("CREATE_STRUCT")]
    Struct,
    #[display("CREATE_MAP")]
    Map,
    #[display("COMPREHENSION")]
    Comprehension,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ident {
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Select {
    pub operand: Box<Expr>,
    pub field: String,
    /// Set when the selection only tests for field presence.
    pub test_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Call {
    /// Receiver of a member call.
    pub target: Option<Box<Expr>>,
    pub function: String,
    pub args: Vec<Expr>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateList {
    pub elements: Vec<Expr>,
    /// Positions of elements written as `?elem`.
    pub optional_indices: BTreeSet<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateStruct {
    pub message_name: String,
    pub entries: Vec<StructEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructEntry {
    pub id: ExprId,
    pub field_key: String,
    pub value: Expr,
    pub optional_entry: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CreateMap {
    pub entries: Vec<MapEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapEntry {
    pub id: ExprId,
    pub key: Expr,
    pub value: Expr,
    pub optional_entry: bool,
}

/// A fold over `iter_range`.
///
/// `iter_range` and `accu_init` are evaluated in the enclosing scope.
/// `accu_var` is in scope for `loop_condition`, `loop_step` and `result`;
/// `iter_var` is in scope for `loop_condition` and `loop_step`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comprehension {
    pub iter_var: String,
    pub iter_range: Expr,
    pub accu_var: String,
    pub accu_init: Expr,
    pub loop_condition: Expr,
    pub loop_step: Expr,
    pub result: Expr,
}

impl ExprKind {
    pub fn tag(&self) -> ExprKindTag {
        match self {
            ExprKind::NotSet => ExprKindTag::NotSet,
            ExprKind::Constant(_) => ExprKindTag::Constant,
            ExprKind::Ident(_) => ExprKindTag::Ident,
            ExprKind::Select(_) => ExprKindTag::Select,
            ExprKind::Call(_) => ExprKindTag::Call,
            ExprKind::List(_) => ExprKindTag::List,
            ExprKind::Struct(_) => ExprKindTag::Struct,
            ExprKind::Map(_) => ExprKindTag::Map,
            ExprKind::Comprehension(_) => ExprKindTag::Comprehension,
        }
    }
}

// ============================================================================
// Construction
// ============================================================================

impl Expr {
    /// Create an expression with the given id and kind.
    pub fn new(id: ExprId, kind: ExprKind) -> Self {
        Self {
            id,
            kind,
            hash: OnceCell::new(),
        }
    }

    /// Replace the id, consuming and returning `self`.
    pub fn with_id(mut self, id: u64) -> Self {
        self.set_id(ExprId::new(id));
        self
    }

    pub fn not_set() -> Self {
        Self::new(ExprId::UNSET, ExprKind::NotSet)
    }

    pub fn constant(value: impl Into<Constant>) -> Self {
        Self::new(ExprId::UNSET, ExprKind::Constant(value.into()))
    }

    pub fn ident(name: impl Into<String>) -> Self {
        Self::new(ExprId::UNSET, ExprKind::Ident(Ident { name: name.into() }))
    }

    pub fn select(operand: Expr, field: impl Into<String>) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::Select(Select {
                operand: Box::new(operand),
                field: field.into(),
                test_only: false,
            }),
        )
    }

    /// A presence test, the desugared form of `has(operand.field)`.
    pub fn presence_test(operand: Expr, field: impl Into<String>) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::Select(Select {
                operand: Box::new(operand),
                field: field.into(),
                test_only: true,
            }),
        )
    }

    /// A global call, including operators such as `_+_`.
    pub fn call(function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::Call(Call {
                target: None,
                function: function.into(),
                args,
            }),
        )
    }

    /// A receiver-style call: `target.function(args)`.
    pub fn member_call(target: Expr, function: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::Call(Call {
                target: Some(Box::new(target)),
                function: function.into(),
                args,
            }),
        )
    }

    pub fn list(elements: Vec<Expr>) -> Self {
        Self::list_with_optionals(elements, BTreeSet::new())
    }

    pub fn list_with_optionals(elements: Vec<Expr>, optional_indices: BTreeSet<usize>) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::List(CreateList {
                elements,
                optional_indices,
            }),
        )
    }

    pub fn create_struct(message_name: impl Into<String>, entries: Vec<StructEntry>) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::Struct(CreateStruct {
                message_name: message_name.into(),
                entries,
            }),
        )
    }

    pub fn create_map(entries: Vec<MapEntry>) -> Self {
        Self::new(ExprId::UNSET, ExprKind::Map(CreateMap { entries }))
    }

    pub fn comprehension(comprehension: Comprehension) -> Self {
        Self::new(
            ExprId::UNSET,
            ExprKind::Comprehension(Box::new(comprehension)),
        )
    }
}

impl Default for Expr {
    fn default() -> Self {
        Self::not_set()
    }
}

impl StructEntry {
    pub fn new(id: u64, field_key: impl Into<String>, value: Expr) -> Self {
        Self {
            id: ExprId::new(id),
            field_key: field_key.into(),
            value,
            optional_entry: false,
        }
    }
}

impl MapEntry {
    pub fn new(id: u64, key: Expr, value: Expr) -> Self {
        Self {
            id: ExprId::new(id),
            key,
            value,
            optional_entry: false,
        }
    }
}

// ============================================================================
// Identity and kind access
// ============================================================================

impl Expr {
    pub fn id(&self) -> ExprId {
        self.id
    }

    pub fn set_id(&mut self, id: ExprId) {
        self.hash.take();
        self.id = id;
    }

    pub fn kind(&self) -> &ExprKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut ExprKind {
        self.hash.take();
        &mut self.kind
    }

    pub fn set_kind(&mut self, kind: ExprKind) {
        self.hash.take();
        self.kind = kind;
    }

    pub fn into_kind(self) -> ExprKind {
        self.kind
    }

    pub fn kind_tag(&self) -> ExprKindTag {
        self.kind.tag()
    }

    fn invalid_kind(&self, expected: ExprKindTag) -> ExprError {
        ExprError::InvalidKindAccess {
            expected,
            actual: self.kind_tag(),
        }
    }

    pub fn as_constant(&self) -> Result<&Constant, ExprError> {
        match &self.kind {
            ExprKind::Constant(constant) => Ok(constant),
            _ => Err(self.invalid_kind(ExprKindTag::Constant)),
        }
    }

    pub fn as_ident(&self) -> Result<&Ident, ExprError> {
        match &self.kind {
            ExprKind::Ident(ident) => Ok(ident),
            _ => Err(self.invalid_kind(ExprKindTag::Ident)),
        }
    }

    pub fn as_ident_mut(&mut self) -> Result<&mut Ident, ExprError> {
        let err = self.invalid_kind(ExprKindTag::Ident);
        match self.kind_mut() {
            ExprKind::Ident(ident) => Ok(ident),
            _ => Err(err),
        }
    }

    pub fn as_select(&self) -> Result<&Select, ExprError> {
        match &self.kind {
            ExprKind::Select(select) => Ok(select),
            _ => Err(self.invalid_kind(ExprKindTag::Select)),
        }
    }

    pub fn as_select_mut(&mut self) -> Result<&mut Select, ExprError> {
        let err = self.invalid_kind(ExprKindTag::Select);
        match self.kind_mut() {
            ExprKind::Select(select) => Ok(select),
            _ => Err(err),
        }
    }

    pub fn as_call(&self) -> Result<&Call, ExprError> {
        match &self.kind {
            ExprKind::Call(call) => Ok(call),
            _ => Err(self.invalid_kind(ExprKindTag::Call)),
        }
    }

    pub fn as_call_mut(&mut self) -> Result<&mut Call, ExprError> {
        let err = self.invalid_kind(ExprKindTag::Call);
        match self.kind_mut() {
            ExprKind::Call(call) => Ok(call),
            _ => Err(err),
        }
    }

    pub fn as_list(&self) -> Result<&CreateList, ExprError> {
        match &self.kind {
            ExprKind::List(list) => Ok(list),
            _ => Err(self.invalid_kind(ExprKindTag::List)),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut CreateList, ExprError> {
        let err = self.invalid_kind(ExprKindTag::List);
        match self.kind_mut() {
            ExprKind::List(list) => Ok(list),
            _ => Err(err),
        }
    }

    pub fn as_struct(&self) -> Result<&CreateStruct, ExprError> {
        match &self.kind {
            ExprKind::Struct(create_struct) => Ok(create_struct),
            _ => Err(self.invalid_kind(ExprKindTag::Struct)),
        }
    }

    pub fn as_struct_mut(&mut self) -> Result<&mut CreateStruct, ExprError> {
        let err = self.invalid_kind(ExprKindTag::Struct);
        match self.kind_mut() {
            ExprKind::Struct(create_struct) => Ok(create_struct),
            _ => Err(err),
        }
    }

    pub fn as_map(&self) -> Result<&CreateMap, ExprError> {
        match &self.kind {
            ExprKind::Map(map) => Ok(map),
            _ => Err(self.invalid_kind(ExprKindTag::Map)),
        }
    }

    pub fn as_map_mut(&mut self) -> Result<&mut CreateMap, ExprError> {
        let err = self.invalid_kind(ExprKindTag::Map);
        match self.kind_mut() {
            ExprKind::Map(map) => Ok(map),
            _ => Err(err),
        }
    }

    pub fn as_comprehension(&self) -> Result<&Comprehension, ExprError> {
        match &self.kind {
            ExprKind::Comprehension(comprehension) => Ok(comprehension),
            _ => Err(self.invalid_kind(ExprKindTag::Comprehension)),
        }
    }

    pub fn as_comprehension_mut(&mut self) -> Result<&mut Comprehension, ExprError> {
        let err = self.invalid_kind(ExprKindTag::Comprehension);
        match self.kind_mut() {
            ExprKind::Comprehension(comprehension) => Ok(comprehension),
            _ => Err(err),
        }
    }
}

// ============================================================================
// Structure
// ============================================================================

impl Expr {
    /// Direct children in traversal order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::NotSet | ExprKind::Constant(_) | ExprKind::Ident(_) => Vec::new(),
            ExprKind::Select(select) => vec![&*select.operand],
            ExprKind::Call(call) => call
                .target
                .as_deref()
                .into_iter()
                .chain(call.args.iter())
                .collect(),
            ExprKind::List(list) => list.elements.iter().collect(),
            ExprKind::Struct(create_struct) => {
                create_struct.entries.iter().map(|e| &e.value).collect()
            }
            ExprKind::Map(map) => map
                .entries
                .iter()
                .flat_map(|e| [&e.key, &e.value])
                .collect(),
            ExprKind::Comprehension(c) => vec![
                &c.iter_range,
                &c.accu_init,
                &c.loop_condition,
                &c.loop_step,
                &c.result,
            ],
        }
    }

    /// Direct children in traversal order, mutably.
    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match self.kind_mut() {
            ExprKind::NotSet | ExprKind::Constant(_) | ExprKind::Ident(_) => Vec::new(),
            ExprKind::Select(select) => vec![&mut *select.operand],
            ExprKind::Call(call) => call
                .target
                .as_deref_mut()
                .into_iter()
                .chain(call.args.iter_mut())
                .collect(),
            ExprKind::List(list) => list.elements.iter_mut().collect(),
            ExprKind::Struct(create_struct) => create_struct
                .entries
                .iter_mut()
                .map(|e| &mut e.value)
                .collect(),
            ExprKind::Map(map) => map
                .entries
                .iter_mut()
                .flat_map(|e| [&mut e.key, &mut e.value])
                .collect(),
            ExprKind::Comprehension(c) => {
                let Comprehension {
                    iter_range,
                    accu_init,
                    loop_condition,
                    loop_step,
                    result,
                    ..
                } = &mut **c;
                vec![iter_range, accu_init, loop_condition, loop_step, result]
            }
        }
    }

    /// Ids of struct and map entries owned directly by this node.
    pub fn entry_ids(&self) -> Vec<ExprId> {
        match &self.kind {
            ExprKind::Struct(create_struct) => create_struct.entries.iter().map(|e| e.id).collect(),
            ExprKind::Map(map) => map.entries.iter().map(|e| e.id).collect(),
            _ => Vec::new(),
        }
    }

    /// Find the first node (pre-order) with the given id.
    pub fn find(&self, id: ExprId) -> Option<&Expr> {
        if self.id == id {
            return Some(self);
        }
        self.children().into_iter().find_map(|child| child.find(id))
    }

    /// Find the first node (pre-order) with the given id, mutably.
    pub fn find_mut(&mut self, id: ExprId) -> Option<&mut Expr> {
        if self.id == id {
            return Some(self);
        }
        self.children_mut()
            .into_iter()
            .find_map(|child| child.find_mut(id))
    }

    /// Largest id in this tree, entry ids included.
    pub fn max_id(&self) -> ExprId {
        let own = self.entry_ids().into_iter().fold(self.id, Ord::max);
        self.children()
            .into_iter()
            .map(Expr::max_id)
            .fold(own, Ord::max)
    }

    /// Number of expression nodes in this tree.
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .into_iter()
            .map(Expr::node_count)
            .sum::<usize>()
    }

    fn cached_hash(&self) -> u64 {
        *self.hash.get_or_init(|| {
            let mut hasher = DefaultHasher::new();
            self.id.hash(&mut hasher);
            self.kind.hash(&mut hasher);
            hasher.finish()
        })
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        if self.id != other.id || self.kind_tag() != other.kind_tag() {
            return false;
        }
        // Both hashes cached and different: the payloads cannot be equal.
        if let (Some(lhs), Some(rhs)) = (self.hash.get(), other.hash.get())
            && lhs != rhs
        {
            return false;
        }
        self.kind == other.kind
    }
}

impl Eq for Expr {}

impl Hash for Expr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.cached_hash());
    }
}

impl std::fmt::Debug for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Expr")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}
