//! Structural edits over a [`MutableAst`].
//!
//! Every operation borrows its input and builds the result on a copy. Target
//! lookup happens before any work, and renumbering runs on the copy, so an
//! error leaves the caller's workspace exactly as it was.
//!
//! ## Renumbering on replacement
//!
//! A replacement renumbers the whole resulting tree. The donor is first
//! stabilized: its ids are moved above every id used by host or donor. A
//! second memoizing generator then walks the host, handing out fresh ids;
//! the donor root receives the id the target was mapped to. Because every
//! old id maps to exactly one new id, macro-call keys and shadow nodes can
//! be carried over by mapping them through the same generator.

use std::collections::BTreeMap;

use celmut_ast::{Expr, ExprId, SourceInfo};
use tracing::{debug, warn};

use crate::error::{MutationError, Result};
use crate::extensions::merge_extensions;
use crate::id_gen::{
    Budget, IdGenerator, NoOpIdGenerator, StableIdGenerator, clear_ids, renumber,
    renumber_entries,
};
use crate::macro_source::normalize_macro_calls;
use crate::mutable_ast::MutableAst;

/// Iteration budget used by [`AstMutator::default`].
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Applies edits to expression trees while keeping their macro metadata
/// consistent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AstMutator {
    max_iterations: usize,
}

impl Default for AstMutator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ITERATIONS)
    }
}

impl AstMutator {
    /// An engine whose walks each visit at most `max_iterations` nodes.
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub(crate) fn budget(&self) -> Budget {
        Budget::new(self.max_iterations)
    }

    /// Replace the node `target` with `new_expr`.
    pub fn replace_subtree(
        &self,
        ast: &MutableAst,
        new_expr: &Expr,
        target: ExprId,
    ) -> Result<MutableAst> {
        self.replace_subtree_with_ast(ast, &MutableAst::from_expr(new_expr.clone()), target)
    }

    /// Replace the node `target` with the root of `donor`, carrying over the
    /// donor's macro calls and extension tags.
    pub fn replace_subtree_with_ast(
        &self,
        ast: &MutableAst,
        donor: &MutableAst,
        target: ExprId,
    ) -> Result<MutableAst> {
        let existing = target
            .is_set()
            .then(|| ast.find(target))
            .flatten()
            .ok_or(MutationError::NotFound { id: target })?;

        debug!(
            target = %target,
            donor_nodes = donor.root().node_count(),
            donor_macro_calls = donor.source().macro_calls.len(),
            "replacing subtree"
        );

        if donor.root().id() == target && existing == donor.root() {
            debug!(target = %target, "replacement is identical to the target");
            return self.rebuild_unchanged(ast, donor);
        }

        let seed = ast.max_id().max(donor.max_id());
        let mut stabilizer = StableIdGenerator::new(seed);
        let (donor_root, donor_source) = self.stabilize(donor, &mut stabilizer)?.into_parts();

        let mut generator = StableIdGenerator::new(stabilizer.max_id());
        let mut root = ast.root().clone();
        let mut pending = Some(donor_root);
        graft(
            &mut root,
            target,
            &mut pending,
            &mut generator,
            &mut self.budget(),
        )?;
        if pending.is_some() {
            return Err(MutationError::NotFound { id: target });
        }
        let replaced = generator.generate(target);

        let mut combined: BTreeMap<ExprId, Expr> = ast
            .source()
            .macro_calls
            .iter()
            .filter(|(key, _)| **key != target)
            .map(|(key, call)| (*key, call.clone()))
            .collect();
        for (key, call) in donor_source.macro_calls {
            if combined.insert(key, call).is_some() {
                warn!(key = %key, "donor macro call overrides an existing entry");
            }
        }

        let mut source = ast.source().clone();
        source.macro_calls = normalize_macro_calls(
            &combined,
            Some(replaced),
            &root,
            &mut generator,
            self.max_iterations,
        )?;
        source.extensions = merge_extensions(&ast.source().extensions, &donor_source.extensions);
        source.clear_parse_only();

        debug!(
            replaced = %replaced,
            nodes = root.node_count(),
            macro_calls = source.macro_calls.len(),
            "subtree replaced"
        );
        Ok(MutableAst::new(root, source))
    }

    fn rebuild_unchanged(&self, ast: &MutableAst, donor: &MutableAst) -> Result<MutableAst> {
        let mut source = ast.source().clone();
        source.macro_calls = normalize_macro_calls(
            &ast.source().macro_calls,
            None,
            ast.root(),
            &mut NoOpIdGenerator,
            self.max_iterations,
        )?;
        source.extensions = merge_extensions(&ast.source().extensions, &donor.source().extensions);
        source.clear_parse_only();
        Ok(MutableAst::new(ast.root().clone(), source))
    }

    /// Move every id of `ast` into the range handed out by `generator`.
    pub(crate) fn stabilize(
        &self,
        ast: &MutableAst,
        generator: &mut StableIdGenerator,
    ) -> Result<MutableAst> {
        let mut root = ast.root().clone();
        renumber(&mut root, generator, &mut self.budget())?;
        let macro_calls = normalize_macro_calls(
            &ast.source().macro_calls,
            None,
            &root,
            generator,
            self.max_iterations,
        )?;
        let source = SourceInfo {
            macro_calls,
            extensions: ast.source().extensions.clone(),
            ..SourceInfo::default()
        };
        Ok(MutableAst::new(root, source))
    }

    /// Renumber the tree to `1..=n` in pre-order, remapping metadata.
    pub fn renumber_ids_consecutively(&self, ast: &MutableAst) -> Result<MutableAst> {
        let mut generator = StableIdGenerator::new(ExprId::UNSET);
        let mut root = ast.root().clone();
        renumber(&mut root, &mut generator, &mut self.budget())?;

        let mut source = ast.source().clone();
        source.positions = ast
            .source()
            .positions
            .iter()
            .filter_map(|(id, offset)| Some((generator.renumbered(*id)?, *offset)))
            .collect();
        source.macro_calls = normalize_macro_calls(
            &ast.source().macro_calls,
            None,
            &root,
            &mut generator,
            self.max_iterations,
        )?;
        Ok(MutableAst::new(root, source))
    }

    /// A copy of `expr` with every id set to `UNSET`.
    pub fn clear_expr_ids(&self, expr: &Expr) -> Expr {
        let mut cleared = expr.clone();
        clear_ids(&mut cleared);
        cleared
    }

    /// Build `function(args...)` from independent trees.
    ///
    /// Each argument is renumbered above the previous ones, so their ids
    /// and macro calls can live in one tree.
    pub fn new_global_call(&self, function: &str, args: &[MutableAst]) -> Result<MutableAst> {
        self.new_call_ast(None, function, args)
    }

    /// Build `target.function(args...)` from independent trees.
    pub fn new_member_call(
        &self,
        target: &MutableAst,
        function: &str,
        args: &[MutableAst],
    ) -> Result<MutableAst> {
        self.new_call_ast(Some(target), function, args)
    }

    fn new_call_ast(
        &self,
        target: Option<&MutableAst>,
        function: &str,
        args: &[MutableAst],
    ) -> Result<MutableAst> {
        let mut max_id = ExprId::UNSET;
        let mut source = SourceInfo::default();
        let mut stable_args = Vec::with_capacity(args.len());

        let mut absorb = |ast: &MutableAst, max_id: &mut ExprId| -> Result<Expr> {
            let mut generator = StableIdGenerator::new(*max_id);
            let (root, arg_source) = self.stabilize(ast, &mut generator)?.into_parts();
            *max_id = generator.max_id();
            source.macro_calls.extend(arg_source.macro_calls);
            source.extensions = merge_extensions(&source.extensions, &arg_source.extensions);
            Ok(root)
        };

        for arg in args {
            stable_args.push(absorb(arg, &mut max_id)?);
        }
        let call = match target {
            Some(target) => Expr::member_call(absorb(target, &mut max_id)?, function, stable_args),
            None => Expr::call(function, stable_args),
        };
        Ok(MutableAst::new(call.with_id(max_id.raw() + 1), source))
    }
}

/// Renumber `expr` while swapping the node `target` for `donor`.
fn graft(
    expr: &mut Expr,
    target: ExprId,
    donor: &mut Option<Expr>,
    generator: &mut StableIdGenerator,
    budget: &mut Budget,
) -> Result<()> {
    budget.tick()?;
    if expr.id() == target
        && let Some(mut replacement) = donor.take()
    {
        let new_id = generator.generate(target);
        generator.memoize(replacement.id(), new_id);
        renumber(&mut replacement, generator, budget)?;
        *expr = replacement;
        return Ok(());
    }
    expr.set_id(generator.generate(expr.id()));
    renumber_entries(expr, generator);
    for child in expr.children_mut() {
        graft(child, target, donor, generator, budget)?;
    }
    Ok(())
}
