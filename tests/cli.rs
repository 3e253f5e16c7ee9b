//! End-to-end tests for the `celmut` binary.

mod common;

use std::process::{Command, Output};

use celmut::celmut_ast::{Ast, unparse};
use common::*;

fn celmut(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_celmut"))
        .args(args)
        .output()
        .expect("Failed to execute celmut")
}

fn path(file: &tempfile::NamedTempFile) -> &str {
    file.path().to_str().expect("non-UTF-8 temp path")
}

fn stdout(output: &Output) -> String {
    assert!(
        output.status.success(),
        "celmut failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_owned()
}

#[test]
fn test_unparse_command() {
    let file = write_ast(&one_plus_two_plus_x());
    let output = celmut(&["unparse", path(&file)]);
    assert_eq!(stdout(&output), "1 + 2 + x");
}

#[test]
fn test_dump_command() {
    let file = write_ast(&ast(constant(10i64, 1)));
    let output = celmut(&["dump", path(&file)]);
    assert_eq!(stdout(&output), "CONSTANT [1] { value: 10 }");
}

#[test]
fn test_replace_command() {
    let host = write_ast(&one_plus_two_plus_x());
    let donor = write_ast(&ast(constant(10i64, 1)));
    let output = celmut(&[
        "replace",
        path(&host),
        "--target",
        "2",
        "--with",
        path(&donor),
    ]);

    let result: Ast = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(unparse(&result).unwrap(), "10 + x");
    assert!(result.source().description.is_empty());
}

#[test]
fn test_mangle_command() {
    let (comprehension, shadow) = exists_macro(
        list(vec![constant(false, 2)], 1),
        "i",
        4,
        ident("i", 5),
        6,
    );
    let file = write_ast(&ast_with_macros(
        comprehension.clone(),
        vec![(comprehension, shadow)],
    ));
    let output = celmut(&["mangle", path(&file)]);

    let result: Ast = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(unparse(&result).unwrap(), "[false].exists(@it0, @it0)");
}

#[test]
fn test_missing_target_exits_with_error() {
    let host = write_ast(&one_plus_two_plus_x());
    let donor = write_ast(&ast(constant(10i64, 1)));
    let output = celmut(&[
        "replace",
        path(&host),
        "--target",
        "99",
        "--with",
        path(&donor),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("expression #99 not found"), "{stderr}");
}

#[test]
fn test_invalid_json_exits_with_error() {
    let mut file = tempfile::NamedTempFile::with_suffix(".json").unwrap();
    std::io::Write::write_all(&mut file, b"{\"expr\": 5}").unwrap();
    let output = celmut(&["unparse", path(&file)]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid AST JSON"), "{stderr}");
}

#[test]
fn test_budget_flag() {
    let file = write_ast(&one_plus_two_plus_x());
    let output = celmut(&[
        "--max-iterations",
        "2",
        "mangle",
        path(&file),
    ]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Max iteration count reached."), "{stderr}");
}
