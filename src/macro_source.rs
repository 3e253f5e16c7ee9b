//! Macro registry reconciliation.
//!
//! `macro_calls` maps the id of a node produced by a macro expansion to a
//! shadow tree holding the macro's original syntax. Shadows are independent
//! copies: after every structural edit they are re-derived from the real tree
//! by id instead of being patched through references.
//!
//! For each entry, [`normalize_macro_calls`]:
//!
//! 1. maps the key and every assigned shadow id through the walk's generator,
//! 2. drops the entry if its key no longer names a node of the tree,
//! 3. replaces each shadow node that mirrors a real node with a fresh copy of
//!    that node, so edits below a macro show up in its syntax,
//! 4. collapses comprehensions inside the shadow to `NOT_SET` placeholders;
//!    nested macros are rendered through their own entries instead.

use std::collections::{BTreeMap, HashMap};

use celmut_ast::{Expr, ExprId, ExprKind, NavigableExpr};
use tracing::trace;

use crate::error::Result;
use crate::id_gen::{Budget, IdGenerator, renumber_assigned};

/// Re-derive `macro_calls` against `root`.
///
/// `replaced` is the id (after renumbering) of the node that was just
/// swapped in, if any.
pub(crate) fn normalize_macro_calls(
    macro_calls: &BTreeMap<ExprId, Expr>,
    replaced: Option<ExprId>,
    root: &Expr,
    generator: &mut dyn IdGenerator,
    max_iterations: usize,
) -> Result<BTreeMap<ExprId, Expr>> {
    let nodes: HashMap<ExprId, &Expr> = NavigableExpr::new(root)
        .all_nodes()
        .map(|node| (node.id(), node.expr()))
        .collect();

    let mut normalized = BTreeMap::new();
    for (&key, call) in macro_calls {
        let new_key = generator.generate(key);
        let Some(&expanded) = nodes.get(&new_key) else {
            trace!(key = %key, new_key = %new_key, "dropping macro call of removed node");
            continue;
        };

        let mut shadow = call.clone();
        renumber_assigned(&mut shadow, generator, &mut Budget::new(max_iterations))?;
        mirror_real_nodes(&mut shadow, &nodes);
        if let Some(replaced) = replaced {
            update_map_macro_step(&mut shadow, expanded, replaced);
        }
        collapse_comprehensions(&mut shadow);

        trace!(key = %new_key, "normalized macro call");
        normalized.insert(new_key, shadow);
    }
    Ok(normalized)
}

fn mirror_real_nodes(shadow: &mut Expr, nodes: &HashMap<ExprId, &Expr>) {
    if shadow.id().is_set()
        && let Some(&real) = nodes.get(&shadow.id())
    {
        if *real != *shadow {
            *shadow = real.clone();
        }
        return;
    }
    for child in shadow.children_mut() {
        mirror_real_nodes(child, nodes);
    }
}

fn collapse_comprehensions(shadow: &mut Expr) {
    if let ExprKind::Comprehension(_) = shadow.kind() {
        shadow.set_kind(ExprKind::NotSet);
        return;
    }
    for child in shadow.children_mut() {
        collapse_comprehensions(child);
    }
}

/// `map(x, f)` expands its step to `accu + [f]`. The list exists only in the
/// expansion, so when it is replaced the shadow's `f` argument is taken from
/// the new list's elements.
fn update_map_macro_step(shadow: &mut Expr, expanded: &Expr, replaced: ExprId) {
    let Ok(comprehension) = expanded.as_comprehension() else {
        return;
    };
    let Ok(step) = comprehension.loop_step.as_call() else {
        return;
    };
    if step.function != "_+_" || step.args.len() != 2 || step.args[1].id() != replaced {
        return;
    }
    let Ok(list) = step.args[1].as_list() else {
        return;
    };
    let Ok(call) = shadow.as_call_mut() else {
        return;
    };
    if call.args.len() != 2 {
        return;
    }
    call.args.truncate(1);
    call.args.extend(list.elements.iter().cloned());
}
