//! Id allocation and renumbering.
//!
//! Ids are minted from an explicit [`IdAllocator`] value threaded through an
//! operation, never from global state. Renumbering walks go through an
//! [`IdGenerator`], which decides how an old id maps to a new one.

use std::collections::HashMap;

use celmut_ast::{Expr, ExprId, ExprKind};

use crate::error::{MutationError, Result};
use crate::mutable_ast::MutableAst;

/// Tracks the largest id in use and hands out the next one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IdAllocator {
    max: u64,
}

impl IdAllocator {
    /// An allocator whose next id is `max + 1`.
    pub fn new(max: ExprId) -> Self {
        Self { max: max.raw() }
    }

    /// Seeded above every node and entry id of `expr`.
    pub fn from_expr(expr: &Expr) -> Self {
        Self::new(expr.max_id())
    }

    /// Seeded above every id the workspace mentions, metadata included.
    pub fn from_ast(ast: &MutableAst) -> Self {
        let macro_max = ast
            .source()
            .macro_calls
            .iter()
            .map(|(key, call)| (*key).max(call.max_id()))
            .max()
            .unwrap_or_default();
        Self::new(ast.root().max_id().max(macro_max))
    }

    pub fn max(&self) -> ExprId {
        ExprId::new(self.max)
    }

    /// Return `max + 1` and advance.
    pub fn allocate(&mut self) -> ExprId {
        self.max += 1;
        ExprId::new(self.max)
    }
}

/// Maps ids encountered during a walk to the ids they should carry after it.
pub trait IdGenerator {
    fn generate(&mut self, id: ExprId) -> ExprId;
}

/// Keeps every id as is.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpIdGenerator;

impl IdGenerator for NoOpIdGenerator {
    fn generate(&mut self, id: ExprId) -> ExprId {
        id
    }
}

/// Mints fresh ids, remembering what each old id became.
///
/// The same non-zero id always maps to the same fresh id, which keeps
/// cross-references (macro-call keys, shadow nodes mirroring real nodes)
/// aligned across separate walks. `UNSET` is never memoized: each occurrence
/// gets a brand-new id.
#[derive(Clone, Debug, Default)]
pub struct StableIdGenerator {
    allocator: IdAllocator,
    renumbered: HashMap<ExprId, ExprId>,
}

impl StableIdGenerator {
    /// A generator whose first fresh id is `seed + 1`.
    pub fn new(seed: ExprId) -> Self {
        Self {
            allocator: IdAllocator::new(seed),
            renumbered: HashMap::new(),
        }
    }

    /// Pin `old` to `new` for the rest of this generator's life.
    pub fn memoize(&mut self, old: ExprId, new: ExprId) {
        self.renumbered.insert(old, new);
    }

    /// Always a fresh id, regardless of memoized mappings.
    pub fn next_id(&mut self) -> ExprId {
        self.allocator.allocate()
    }

    /// What `old` was renumbered to, if it has been seen.
    pub fn renumbered(&self, old: ExprId) -> Option<ExprId> {
        self.renumbered.get(&old).copied()
    }

    /// Largest id minted so far, or the seed.
    pub fn max_id(&self) -> ExprId {
        self.allocator.max()
    }
}

impl IdGenerator for StableIdGenerator {
    fn generate(&mut self, id: ExprId) -> ExprId {
        if !id.is_set() {
            return self.allocator.allocate();
        }
        if let Some(&renumbered) = self.renumbered.get(&id) {
            return renumbered;
        }
        let fresh = self.allocator.allocate();
        self.renumbered.insert(id, fresh);
        fresh
    }
}

/// Hands every id in a walk a fresh value, ignoring the old one.
pub(crate) struct FreshIds<'g>(pub(crate) &'g mut StableIdGenerator);

impl IdGenerator for FreshIds<'_> {
    fn generate(&mut self, _id: ExprId) -> ExprId {
        self.0.next_id()
    }
}

/// Iteration budget of a single walk.
#[derive(Debug)]
pub(crate) struct Budget {
    remaining: usize,
}

impl Budget {
    pub(crate) fn new(max_iterations: usize) -> Self {
        Self {
            remaining: max_iterations,
        }
    }

    /// Account for one visited node.
    pub(crate) fn tick(&mut self) -> Result<()> {
        if self.remaining == 0 {
            return Err(MutationError::MaxIterationExceeded);
        }
        self.remaining -= 1;
        Ok(())
    }
}

/// Renumber every node and entry id of `expr` in pre-order.
pub(crate) fn renumber(
    expr: &mut Expr,
    generator: &mut dyn IdGenerator,
    budget: &mut Budget,
) -> Result<()> {
    budget.tick()?;
    expr.set_id(generator.generate(expr.id()));
    renumber_entries(expr, generator);
    for child in expr.children_mut() {
        renumber(child, generator, budget)?;
    }
    Ok(())
}

/// Renumber the struct or map entry ids owned directly by `expr`.
pub(crate) fn renumber_entries(expr: &mut Expr, generator: &mut dyn IdGenerator) {
    match expr.kind_mut() {
        ExprKind::Struct(create_struct) => {
            for entry in &mut create_struct.entries {
                entry.id = generator.generate(entry.id);
            }
        }
        ExprKind::Map(map) => {
            for entry in &mut map.entries {
                entry.id = generator.generate(entry.id);
            }
        }
        _ => {}
    }
}

/// Like [`renumber`], but `UNSET` ids stay unset.
///
/// Used for macro-call shadows, whose root is deliberately unassigned.
pub(crate) fn renumber_assigned(
    expr: &mut Expr,
    generator: &mut dyn IdGenerator,
    budget: &mut Budget,
) -> Result<()> {
    let mut assigned_only = AssignedOnly(generator);
    renumber(expr, &mut assigned_only, budget)
}

struct AssignedOnly<'g>(&'g mut dyn IdGenerator);

impl IdGenerator for AssignedOnly<'_> {
    fn generate(&mut self, id: ExprId) -> ExprId {
        if id.is_set() { self.0.generate(id) } else { id }
    }
}

struct Unassigned;

impl IdGenerator for Unassigned {
    fn generate(&mut self, _id: ExprId) -> ExprId {
        ExprId::UNSET
    }
}

/// Set every node and entry id of `expr` to `UNSET`.
pub(crate) fn clear_ids(expr: &mut Expr) {
    expr.set_id(ExprId::UNSET);
    renumber_entries(expr, &mut Unassigned);
    for child in expr.children_mut() {
        clear_ids(child);
    }
}

#[cfg(test)]
mod tests {
    use celmut_ast::{MapEntry, SourceInfo};

    use super::*;

    #[test]
    fn test_allocator_allocates_above_max() {
        let expr = Expr::call(
            "f",
            vec![Expr::ident("a").with_id(3), Expr::ident("b").with_id(7)],
        )
        .with_id(2);
        let mut allocator = IdAllocator::from_expr(&expr);
        assert_eq!(allocator.max(), ExprId::new(7));
        assert_eq!(allocator.allocate(), ExprId::new(8));
        assert_eq!(allocator.allocate(), ExprId::new(9));
        assert_eq!(allocator.max(), ExprId::new(9));
    }

    #[test]
    fn test_allocator_counts_macro_calls() {
        let ast = MutableAst::new(
            Expr::ident("x").with_id(1),
            SourceInfo::new().with_macro_call(4, Expr::ident("y").with_id(12)),
        );
        assert_eq!(IdAllocator::from_ast(&ast).max(), ExprId::new(12));
    }

    #[test]
    fn test_stable_generator_memoizes() {
        let mut generator = StableIdGenerator::new(ExprId::new(10));
        let first = generator.generate(ExprId::new(3));
        assert_eq!(first, ExprId::new(11));
        assert_eq!(generator.generate(ExprId::new(3)), first);
        assert_eq!(generator.generate(ExprId::new(4)), ExprId::new(12));

        generator.memoize(ExprId::new(5), ExprId::new(1));
        assert_eq!(generator.generate(ExprId::new(5)), ExprId::new(1));
    }

    #[test]
    fn test_stable_generator_never_memoizes_unset() {
        let mut generator = StableIdGenerator::new(ExprId::UNSET);
        assert_eq!(generator.generate(ExprId::UNSET), ExprId::new(1));
        assert_eq!(generator.generate(ExprId::UNSET), ExprId::new(2));
        assert_eq!(generator.next_id(), ExprId::new(3));
    }

    #[test]
    fn test_renumber_covers_entry_ids() {
        let mut map = Expr::create_map(vec![MapEntry::new(
            2,
            Expr::constant(5i64).with_id(3),
            Expr::constant(1i64).with_id(4),
        )])
        .with_id(1);
        let mut generator = StableIdGenerator::new(ExprId::new(100));
        renumber(&mut map, &mut generator, &mut Budget::new(10)).unwrap();
        assert_eq!(map.id(), ExprId::new(101));
        let entry = &map.as_map().unwrap().entries[0];
        assert_eq!(entry.id, ExprId::new(102));
        assert_eq!(entry.key.id(), ExprId::new(103));
        assert_eq!(entry.value.id(), ExprId::new(104));
    }

    #[test]
    fn test_renumber_assigned_keeps_unset() {
        let mut shadow = Expr::member_call(
            Expr::ident("cel").with_id(1),
            "bind",
            vec![Expr::ident("x").with_id(2)],
        );
        let mut generator = StableIdGenerator::new(ExprId::new(5));
        renumber_assigned(&mut shadow, &mut generator, &mut Budget::new(10)).unwrap();
        assert_eq!(shadow.id(), ExprId::UNSET);
        assert_eq!(shadow.children()[0].id(), ExprId::new(6));
        assert_eq!(shadow.children()[1].id(), ExprId::new(7));
    }

    #[test]
    fn test_budget_is_per_node() {
        let mut expr = Expr::call(
            "_&&_",
            vec![
                Expr::constant(true).with_id(1),
                Expr::constant(false).with_id(3),
            ],
        )
        .with_id(2);
        let err = renumber(&mut expr, &mut NoOpIdGenerator, &mut Budget::new(2)).unwrap_err();
        assert_eq!(err, MutationError::MaxIterationExceeded);
        renumber(&mut expr, &mut NoOpIdGenerator, &mut Budget::new(3)).unwrap();
    }

    #[test]
    fn test_clear_ids() {
        let mut expr = Expr::call("f", vec![Expr::ident("a").with_id(3)]).with_id(2);
        clear_ids(&mut expr);
        assert_eq!(expr, Expr::call("f", vec![Expr::ident("a")]));
    }
}
