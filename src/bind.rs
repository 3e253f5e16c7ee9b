//! Synthesis of `cel.bind` macros.
//!
//! `cel.bind(v, init, result)` desugars to a comprehension that binds `v` as
//! its accumulator and never iterates:
//!
//! ```text
//! iter_var:       v
//! iter_range:     [null]
//! accu_var:       v
//! accu_init:      init
//! loop_condition: false
//! loop_step:      v
//! result:         result
//! ```

use celmut_ast::{Comprehension, Constant, Expr, ExprId, SourceInfo};
use tracing::debug;

use crate::error::Result;
use crate::id_gen::{FreshIds, StableIdGenerator, renumber};
use crate::macro_source::normalize_macro_calls;
use crate::mutable_ast::MutableAst;
use crate::mutator::AstMutator;

impl AstMutator {
    /// Replace `target` with `cel.bind(var_name, var_init, result_expr)`.
    ///
    /// `result_expr` may embed nodes of `ast`, including comprehensions from
    /// earlier binds; their ids are kept aligned so the macro calls recorded
    /// for them carry over. With `populate_macro_source`, the new
    /// comprehension is registered with a `cel.bind(...)` macro call.
    pub fn replace_subtree_with_new_bind_macro(
        &self,
        ast: &MutableAst,
        var_name: &str,
        var_init: &Expr,
        result_expr: &Expr,
        target: ExprId,
        populate_macro_source: bool,
    ) -> Result<MutableAst> {
        debug!(target = %target, var_name, populate_macro_source, "synthesizing bind macro");

        let seed = var_init.max_id().max(ast.max_id());
        let mut generator = StableIdGenerator::new(seed);
        let bind = self.new_bind_comprehension(var_name, var_init, result_expr, &mut generator)?;

        let source = if populate_macro_source {
            self.bind_macro_source(&bind, var_name, ast.source(), &mut generator)?
        } else {
            SourceInfo::default()
        };

        self.replace_subtree_with_ast(ast, &MutableAst::new(bind, source), target)
    }

    fn new_bind_comprehension(
        &self,
        var_name: &str,
        var_init: &Expr,
        result_expr: &Expr,
        generator: &mut StableIdGenerator,
    ) -> Result<Expr> {
        let mut accu_init = var_init.clone();
        renumber(&mut accu_init, &mut FreshIds(&mut *generator), &mut self.budget())?;
        let mut result = result_expr.clone();
        renumber(&mut result, generator, &mut self.budget())?;

        let null = Expr::constant(Constant::Null).with_id(generator.next_id().raw());
        let iter_range = Expr::list(vec![null]).with_id(generator.next_id().raw());
        let loop_condition = Expr::constant(false).with_id(generator.next_id().raw());
        let loop_step = Expr::ident(var_name).with_id(generator.next_id().raw());

        let comprehension = Expr::comprehension(Comprehension {
            iter_var: var_name.to_owned(),
            iter_range,
            accu_var: var_name.to_owned(),
            accu_init,
            loop_condition,
            loop_step,
            result,
        });
        Ok(comprehension.with_id(generator.next_id().raw()))
    }

    /// Macro calls for the donor: the host's entries that still apply inside
    /// `bind`, plus the `cel.bind(...)` call for `bind` itself.
    fn bind_macro_source(
        &self,
        bind: &Expr,
        var_name: &str,
        host: &SourceInfo,
        generator: &mut StableIdGenerator,
    ) -> Result<SourceInfo> {
        let comprehension = bind.as_comprehension()?;
        let call = Expr::member_call(
            Expr::ident("cel").with_id(generator.next_id().raw()),
            "bind",
            vec![
                Expr::ident(var_name).with_id(generator.next_id().raw()),
                comprehension.accu_init.clone(),
                comprehension.result.clone(),
            ],
        );

        let mut macro_calls = normalize_macro_calls(
            &host.macro_calls,
            None,
            bind,
            generator,
            self.max_iterations(),
        )?;
        macro_calls.insert(bind.id(), call);

        Ok(SourceInfo {
            macro_calls,
            extensions: host.extensions.clone(),
            ..SourceInfo::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_comprehension_shape() {
        let ast = MutableAst::from_expr(Expr::constant(1i64).with_id(1));
        let result = AstMutator::default()
            .replace_subtree_with_new_bind_macro(
                &ast,
                "@r0",
                &Expr::constant(3i64),
                &Expr::ident("@r0"),
                ExprId::new(1),
                true,
            )
            .unwrap();

        let comprehension = result.root().as_comprehension().unwrap();
        assert_eq!(comprehension.iter_var, "@r0");
        assert_eq!(comprehension.accu_var, "@r0");
        assert_eq!(
            comprehension.iter_range.as_list().unwrap().elements.len(),
            1
        );
        assert_eq!(
            comprehension.loop_condition.as_constant().unwrap(),
            &Constant::Bool(false)
        );
        assert!(
            result
                .source()
                .macro_call(result.root().id())
                .is_some_and(|call| call.as_call().unwrap().function == "bind")
        );
    }

    #[test]
    fn test_bind_without_macro_source() {
        let ast = MutableAst::from_expr(Expr::constant(1i64).with_id(1));
        let result = AstMutator::default()
            .replace_subtree_with_new_bind_macro(
                &ast,
                "@r0",
                &Expr::constant(3i64),
                &Expr::ident("@r0"),
                ExprId::new(1),
                false,
            )
            .unwrap();
        assert!(result.source().macro_calls.is_empty());
    }
}
