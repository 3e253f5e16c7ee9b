//! Renaming of comprehension variables.
//!
//! Every comprehension gets an ordinal `k` in pre-order; its iteration
//! variable becomes `iter_prefix + k` and its accumulator `accu_prefix + k`.
//! References are rewritten through a scope stack, so a nested comprehension
//! that reuses an outer name only captures references inside its own body.

use std::collections::HashMap;

use celmut_ast::{Expr, ExprId, ExprKind};
use tracing::debug;

use crate::error::Result;
use crate::id_gen::{Budget, NoOpIdGenerator};
use crate::macro_source::normalize_macro_calls;
use crate::mutable_ast::MutableAst;
use crate::mutator::AstMutator;

/// Names before and after mangling for one comprehension.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MangledComprehension {
    pub id: ExprId,
    pub original_iter_var: String,
    pub iter_var: String,
    pub original_accu_var: String,
    pub accu_var: String,
}

/// Result of [`AstMutator::mangle_comprehension_identifier_names`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MangledComprehensionAst {
    pub ast: MutableAst,
    /// One record per comprehension, in visitation order.
    pub mangled: Vec<MangledComprehension>,
}

impl AstMutator {
    /// Give every comprehension variable a tree-wide unique name.
    pub fn mangle_comprehension_identifier_names(
        &self,
        ast: &MutableAst,
        iter_prefix: &str,
        accu_prefix: &str,
    ) -> Result<MangledComprehensionAst> {
        let mut root = ast.root().clone();
        let mut mangler = Mangler {
            iter_prefix,
            accu_prefix,
            scopes: Vec::new(),
            mangled: Vec::new(),
            budget: self.budget(),
        };
        mangler.visit(&mut root)?;
        let mangled = mangler.mangled;

        if mangled.is_empty() {
            return Ok(MangledComprehensionAst {
                ast: ast.clone(),
                mangled,
            });
        }
        debug!(comprehensions = mangled.len(), iter_prefix, accu_prefix, "mangled comprehension variables");

        let mut source = ast.source().clone();
        source.macro_calls = normalize_macro_calls(
            &ast.source().macro_calls,
            None,
            &root,
            &mut NoOpIdGenerator,
            self.max_iterations(),
        )?;
        for record in &mangled {
            if let Some(call) = source.macro_calls.get_mut(&record.id) {
                rename_macro_variable(call, record);
            }
        }

        Ok(MangledComprehensionAst {
            ast: MutableAst::new(root, source),
            mangled,
        })
    }
}

/// The first argument of a comprehension macro names its variable.
fn rename_macro_variable(call: &mut Expr, record: &MangledComprehension) {
    let Ok(call) = call.as_call_mut() else {
        return;
    };
    let Some(Ok(variable)) = call.args.first_mut().map(Expr::as_ident_mut) else {
        return;
    };
    if variable.name == record.original_accu_var {
        variable.name = record.accu_var.clone();
    } else if variable.name == record.original_iter_var {
        variable.name = record.iter_var.clone();
    }
}

struct Mangler<'p> {
    iter_prefix: &'p str,
    accu_prefix: &'p str,
    /// Innermost scope last.
    scopes: Vec<HashMap<String, String>>,
    mangled: Vec<MangledComprehension>,
    budget: Budget,
}

impl Mangler<'_> {
    fn push_scope(&mut self, original: &str, mangled: &str) {
        self.scopes
            .push(HashMap::from([(original.to_owned(), mangled.to_owned())]));
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn lookup(&self, name: &str) -> Option<&String> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn visit(&mut self, expr: &mut Expr) -> Result<()> {
        self.budget.tick()?;
        let id = expr.id();
        match expr.kind_mut() {
            ExprKind::Ident(ident) => {
                if let Some(mangled) = self.lookup(&ident.name) {
                    ident.name = mangled.clone();
                }
            }
            ExprKind::Comprehension(c) => {
                let ordinal = self.mangled.len();
                let record = MangledComprehension {
                    id,
                    original_iter_var: c.iter_var.clone(),
                    iter_var: format!("{}{ordinal}", self.iter_prefix),
                    original_accu_var: c.accu_var.clone(),
                    accu_var: format!("{}{ordinal}", self.accu_prefix),
                };
                self.mangled.push(record.clone());

                self.visit(&mut c.iter_range)?;
                self.visit(&mut c.accu_init)?;

                self.push_scope(&record.original_accu_var, &record.accu_var);
                self.push_scope(&record.original_iter_var, &record.iter_var);
                self.visit(&mut c.loop_condition)?;
                self.visit(&mut c.loop_step)?;
                self.pop_scope();
                self.visit(&mut c.result)?;
                self.pop_scope();

                c.iter_var = record.iter_var;
                c.accu_var = record.accu_var;
            }
            _ => {
                for child in expr.children_mut() {
                    self.visit(child)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use celmut_ast::Comprehension;

    use super::*;

    fn comprehension(iter_var: &str, range: Expr, step: Expr, result: Expr) -> Expr {
        Expr::comprehension(Comprehension {
            iter_var: iter_var.to_owned(),
            iter_range: range,
            accu_var: "__result__".to_owned(),
            accu_init: Expr::constant(false),
            loop_condition: Expr::constant(true),
            loop_step: step,
            result,
        })
    }

    #[test]
    fn test_iter_range_resolves_in_enclosing_scope() {
        // the inner range `x` refers to the outer iteration variable
        let inner = comprehension(
            "x",
            Expr::ident("x"),
            Expr::ident("x"),
            Expr::ident("__result__"),
        )
        .with_id(2);
        let outer = comprehension(
            "x",
            Expr::ident("items"),
            inner,
            Expr::ident("__result__"),
        )
        .with_id(1);

        let result = AstMutator::default()
            .mangle_comprehension_identifier_names(&MutableAst::from_expr(outer), "@it", "@ac")
            .unwrap();

        let outer = result.ast.root().as_comprehension().unwrap();
        assert_eq!(outer.iter_var, "@it0");
        assert_eq!(outer.iter_range, Expr::ident("items"));
        assert_eq!(outer.result, Expr::ident("@ac0"));

        let inner = outer.loop_step.as_comprehension().unwrap();
        assert_eq!(inner.iter_var, "@it1");
        assert_eq!(inner.iter_range, Expr::ident("@it0"));
        assert_eq!(inner.loop_step, Expr::ident("@it1"));
        assert_eq!(inner.result, Expr::ident("@ac1"));

        let ids: Vec<_> = result.mangled.iter().map(|m| m.id.raw()).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_no_comprehension_is_unchanged() {
        let ast = MutableAst::from_expr(
            Expr::presence_test(Expr::ident("msg").with_id(1), "field").with_id(2),
        );
        let result = AstMutator::default()
            .mangle_comprehension_identifier_names(&ast, "@it", "@ac")
            .unwrap();
        assert_eq!(result.ast, ast);
        assert!(result.mangled.is_empty());
    }

    #[test]
    fn test_free_identifiers_are_untouched() {
        let expr = comprehension(
            "x",
            Expr::ident("list"),
            Expr::call("_+_", vec![Expr::ident("x"), Expr::ident("y")]),
            Expr::ident("y"),
        );
        let result = AstMutator::default()
            .mangle_comprehension_identifier_names(&MutableAst::from_expr(expr), "@it", "@ac")
            .unwrap();
        let c = result.ast.root().as_comprehension().unwrap();
        assert_eq!(
            c.loop_step,
            Expr::call("_+_", vec![Expr::ident("@it0"), Expr::ident("y")])
        );
        assert_eq!(c.result, Expr::ident("y"));
    }
}
