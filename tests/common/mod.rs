//! Common test utilities: parser-shaped trees and macro expansions.
//!
//! Ids follow the parser's allocation order: an operator's id is allocated
//! between its operands, and a macro's expansion takes consecutive ids
//! starting right after the macro's arguments.

#![allow(dead_code)]

use std::collections::BTreeMap;

use celmut::MutableAst;
use celmut::celmut_ast::{
    Comprehension, Constant, Expr, ExprId, NavigableExpr, SourceInfo, unparse_expr,
};

pub const RESULT: &str = "__result__";

pub fn constant(value: impl Into<Constant>, id: u64) -> Expr {
    Expr::constant(value).with_id(id)
}

pub fn ident(name: &str, id: u64) -> Expr {
    Expr::ident(name).with_id(id)
}

pub fn binary(function: &str, lhs: Expr, rhs: Expr, id: u64) -> Expr {
    Expr::call(function, vec![lhs, rhs]).with_id(id)
}

pub fn list(elements: Vec<Expr>, id: u64) -> Expr {
    Expr::list(elements).with_id(id)
}

/// A workspace without macro calls.
pub fn ast(expr: Expr) -> MutableAst {
    MutableAst::from_expr(expr)
}

/// A workspace with the given macro calls.
pub fn ast_with_macros(expr: Expr, macro_calls: Vec<(Expr, Expr)>) -> MutableAst {
    let macro_calls = macro_calls
        .into_iter()
        .map(|(key, call)| (key.id(), call))
        .collect::<BTreeMap<_, _>>();
    let mut source = SourceInfo {
        description: "<input>".to_owned(),
        line_offsets: vec![0],
        ..SourceInfo::default()
    };
    source.macro_calls = macro_calls;
    MutableAst::new(expr, source)
}

/// Render a workspace as concrete syntax.
pub fn unparse(ast: &MutableAst) -> String {
    unparse_expr(ast.root(), &ast.source().macro_calls).expect("unparse failed")
}

/// `1 + 2 + x`: `1[1] +[2] 2[3] +[4] x[5]`
pub fn one_plus_two_plus_x() -> MutableAst {
    ast(binary(
        "_+_",
        binary("_+_", constant(1i64, 1), constant(2i64, 3), 2),
        ident("x", 5),
        4,
    ))
}

/// `range.exists(var, predicate)`; the expansion starts at id `next`.
///
/// Returns the comprehension and the macro-call shadow.
pub fn exists_macro(
    range: Expr,
    var: &str,
    var_id: u64,
    predicate: Expr,
    next: u64,
) -> (Expr, Expr) {
    let shadow = Expr::member_call(
        range.clone(),
        "exists",
        vec![ident(var, var_id), predicate.clone()],
    );
    let comprehension = Expr::comprehension(Comprehension {
        iter_var: var.to_owned(),
        iter_range: range,
        accu_var: RESULT.to_owned(),
        accu_init: constant(false, next),
        loop_condition: Expr::call(
            "@not_strictly_false",
            vec![Expr::call("!_", vec![ident(RESULT, next + 1)]).with_id(next + 2)],
        )
        .with_id(next + 3),
        loop_step: binary("_||_", ident(RESULT, next + 4), predicate, next + 5),
        result: ident(RESULT, next + 6),
    })
    .with_id(next + 7);
    (comprehension, shadow)
}

/// `range.all(var, predicate)`; the expansion starts at id `next`.
pub fn all_macro(
    range: Expr,
    var: &str,
    var_id: u64,
    predicate: Expr,
    next: u64,
) -> (Expr, Expr) {
    let shadow = Expr::member_call(
        range.clone(),
        "all",
        vec![ident(var, var_id), predicate.clone()],
    );
    let comprehension = Expr::comprehension(Comprehension {
        iter_var: var.to_owned(),
        iter_range: range,
        accu_var: RESULT.to_owned(),
        accu_init: constant(true, next),
        loop_condition: Expr::call("@not_strictly_false", vec![ident(RESULT, next + 1)])
            .with_id(next + 2),
        loop_step: binary("_&&_", ident(RESULT, next + 3), predicate, next + 4),
        result: ident(RESULT, next + 5),
    })
    .with_id(next + 6);
    (comprehension, shadow)
}

/// `range.map(var, transform)`; the expansion starts at id `next`.
pub fn map_macro(
    range: Expr,
    var: &str,
    var_id: u64,
    transform: Expr,
    next: u64,
) -> (Expr, Expr) {
    let shadow = Expr::member_call(
        range.clone(),
        "map",
        vec![ident(var, var_id), transform.clone()],
    );
    let comprehension = Expr::comprehension(Comprehension {
        iter_var: var.to_owned(),
        iter_range: range,
        accu_var: RESULT.to_owned(),
        accu_init: list(vec![], next),
        loop_condition: constant(true, next + 1),
        loop_step: binary(
            "_+_",
            ident(RESULT, next + 2),
            list(vec![transform], next + 3),
            next + 4,
        ),
        result: ident(RESULT, next + 5),
    })
    .with_id(next + 6);
    (comprehension, shadow)
}

/// `has(operand.field)`: the shadow keeps the plain selection `select_id`,
/// the expansion is a presence test with id `next`.
pub fn has_macro(operand: Expr, field: &str, select_id: u64, next: u64) -> (Expr, Expr) {
    let shadow = Expr::call(
        "has",
        vec![Expr::select(operand.clone(), field).with_id(select_id)],
    );
    let presence = Expr::presence_test(operand, field).with_id(next);
    (presence, shadow)
}

/// `cel.bind(var, init, result)` with `cel` at `cel_id` and the declared
/// variable at `var_id`; the expansion starts at id `next`.
pub fn bind_macro(
    var: &str,
    cel_id: u64,
    var_id: u64,
    init: Expr,
    result: Expr,
    next: u64,
) -> (Expr, Expr) {
    let shadow = Expr::member_call(
        ident("cel", cel_id),
        "bind",
        vec![ident(var, var_id), init.clone(), result.clone()],
    );
    let comprehension = Expr::comprehension(Comprehension {
        iter_var: var.to_owned(),
        iter_range: list(vec![constant(Constant::Null, next)], next + 1),
        accu_var: var.to_owned(),
        accu_init: init,
        loop_condition: constant(false, next + 2),
        loop_step: ident(var, next + 3),
        result,
    })
    .with_id(next + 4);
    (comprehension, shadow)
}

/// Every macro-call key names a node of the tree, and node ids are unique.
pub fn assert_consistent_macro_calls(ast: &MutableAst) {
    let ids: Vec<ExprId> = NavigableExpr::new(ast.root())
        .all_nodes()
        .map(|node| node.id())
        .collect();
    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len(), "duplicate ids in {ids:?}");

    for key in ast.source().macro_calls.keys() {
        assert!(
            ids.contains(key),
            "macro call {key} does not name a node of the tree"
        );
    }
}

/// Serialize a workspace to a temporary JSON file for the CLI.
pub fn write_ast(ast: &MutableAst) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::with_suffix(".json").expect("Failed to create temp file");
    let json = serde_json::to_string(&ast.to_parsed_ast_retaining_source())
        .expect("Failed to serialize AST");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("Failed to write AST");
    file
}
