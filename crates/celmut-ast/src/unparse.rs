//! Render an expression back to concrete syntax.
//!
//! Nodes registered in `macro_calls` render as their original macro syntax.
//! Inside a macro-call shadow, a `NOT_SET` placeholder stands for the nested
//! macro call registered under the placeholder's id.

use std::collections::BTreeMap;

use crate::ast::Ast;
use crate::constant::Constant;
use crate::error::UnparseError;
use crate::expr::{Call, Expr, ExprKind};
use crate::node_id::ExprId;

/// Render a frozen AST.
pub fn unparse(ast: &Ast) -> Result<String, UnparseError> {
    unparse_expr(ast.expr(), &ast.source().macro_calls)
}

/// Render an expression with the given macro calls.
pub fn unparse_expr(
    expr: &Expr,
    macro_calls: &BTreeMap<ExprId, Expr>,
) -> Result<String, UnparseError> {
    let mut unparser = Unparser {
        macro_calls,
        expanding: Vec::new(),
        out: String::new(),
    };
    unparser.expr(expr)?;
    Ok(unparser.out)
}

/// Binding strength of an operator; lower binds tighter.
fn precedence(function: &str) -> Option<u8> {
    let prec = match function {
        "_?_:_" => 8,
        "_||_" => 7,
        "_&&_" => 6,
        "_==_" | "_!=_" | "_<_" | "_<=_" | "_>_" | "_>=_" | "@in" => 5,
        "_+_" | "_-_" => 4,
        "_*_" | "_/_" | "_%_" => 3,
        "!_" | "-_" => 2,
        "_[_]" | "_[?_]" | "_?._" => 1,
        _ => return None,
    };
    Some(prec)
}

fn binary_symbol(function: &str) -> Option<&'static str> {
    let symbol = match function {
        "_||_" => "||",
        "_&&_" => "&&",
        "_==_" => "==",
        "_!=_" => "!=",
        "_<_" => "<",
        "_<=_" => "<=",
        "_>_" => ">",
        "_>=_" => ">=",
        "@in" => "in",
        "_+_" => "+",
        "_-_" => "-",
        "_*_" => "*",
        "_/_" => "/",
        "_%_" => "%",
        _ => return None,
    };
    Some(symbol)
}

struct Unparser<'a> {
    macro_calls: &'a BTreeMap<ExprId, Expr>,
    /// Macro-call keys currently being rendered.
    expanding: Vec<ExprId>,
    out: String,
}

impl Unparser<'_> {
    fn macro_call_for(&self, id: ExprId) -> Option<&Expr> {
        if !id.is_set() || self.expanding.contains(&id) {
            return None;
        }
        self.macro_calls.get(&id)
    }

    fn expr(&mut self, expr: &Expr) -> Result<(), UnparseError> {
        if let Some(call) = self.macro_call_for(expr.id()).cloned() {
            self.expanding.push(expr.id());
            let result = self.expr(&call);
            self.expanding.pop();
            return result;
        }

        match expr.kind() {
            ExprKind::NotSet => return Err(UnparseError::UnsetExpr { id: expr.id() }),
            ExprKind::Constant(value) => self.out.push_str(&value.to_source()),
            ExprKind::Ident(ident) => self.out.push_str(&ident.name),
            ExprKind::Select(select) => {
                if select.test_only {
                    self.out.push_str("has(");
                }
                self.operand(&select.operand, 1)?;
                self.out.push('.');
                self.out.push_str(&select.field);
                if select.test_only {
                    self.out.push(')');
                }
            }
            ExprKind::Call(call) => self.call(call)?,
            ExprKind::List(list) => {
                self.out.push('[');
                for (index, element) in list.elements.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    if list.optional_indices.contains(&index) {
                        self.out.push('?');
                    }
                    self.expr(element)?;
                }
                self.out.push(']');
            }
            ExprKind::Struct(create_struct) => {
                self.out.push_str(&create_struct.message_name);
                self.out.push('{');
                for (index, entry) in create_struct.entries.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    if entry.optional_entry {
                        self.out.push('?');
                    }
                    self.out.push_str(&entry.field_key);
                    self.out.push_str(": ");
                    self.expr(&entry.value)?;
                }
                self.out.push('}');
            }
            ExprKind::Map(map) => {
                self.out.push('{');
                for (index, entry) in map.entries.iter().enumerate() {
                    if index > 0 {
                        self.out.push_str(", ");
                    }
                    if entry.optional_entry {
                        self.out.push('?');
                    }
                    self.expr(&entry.key)?;
                    self.out.push_str(": ");
                    self.expr(&entry.value)?;
                }
                self.out.push('}');
            }
            ExprKind::Comprehension(_) => {
                return Err(UnparseError::MissingMacroCall { id: expr.id() });
            }
        }
        Ok(())
    }

    /// Render `expr`, parenthesized if it binds looser than `limit` allows.
    fn operand(&mut self, expr: &Expr, limit: u8) -> Result<(), UnparseError> {
        let needs_parens = self.macro_call_for(expr.id()).is_none()
            && matches!(
                expr.kind(),
                ExprKind::Call(call) if call.target.is_none()
                    && precedence(&call.function).is_some_and(|p| p > limit)
            );
        if needs_parens {
            self.out.push('(');
            self.expr(expr)?;
            self.out.push(')');
            Ok(())
        } else {
            self.expr(expr)
        }
    }

    fn expect_args<'c>(call: &'c Call, expected: usize) -> Result<&'c [Expr], UnparseError> {
        if call.args.len() != expected {
            return Err(UnparseError::OperatorArity {
                function: call.function.clone(),
                expected,
                found: call.args.len(),
            });
        }
        Ok(&call.args)
    }

    fn call(&mut self, call: &Call) -> Result<(), UnparseError> {
        if let Some(target) = &call.target {
            self.operand(target, 1)?;
            self.out.push('.');
            return self.call_args(&call.function, &call.args);
        }

        let Some(prec) = precedence(&call.function) else {
            return self.call_args(&call.function, &call.args);
        };

        if let Some(symbol) = binary_symbol(&call.function) {
            let args = Self::expect_args(call, 2)?;
            self.operand(&args[0], prec)?;
            self.out.push(' ');
            self.out.push_str(symbol);
            self.out.push(' ');
            return self.operand(&args[1], prec - 1);
        }

        match call.function.as_str() {
            "_?_:_" => {
                let args = Self::expect_args(call, 3)?;
                self.operand(&args[0], prec - 1)?;
                self.out.push_str(" ? ");
                self.operand(&args[1], prec)?;
                self.out.push_str(" : ");
                self.operand(&args[2], prec)
            }
            "!_" | "-_" => {
                let args = Self::expect_args(call, 1)?;
                self.out.push_str(&call.function[..1]);
                self.operand(&args[0], prec)
            }
            "_?._" => {
                let args = Self::expect_args(call, 2)?;
                self.operand(&args[0], prec)?;
                self.out.push_str(".?");
                match args[1].kind() {
                    ExprKind::Constant(Constant::String(field)) => {
                        self.out.push_str(field);
                        Ok(())
                    }
                    _ => self.expr(&args[1]),
                }
            }
            _ => {
                let args = Self::expect_args(call, 2)?;
                self.operand(&args[0], prec)?;
                self.out
                    .push_str(if call.function == "_[?_]" { "[?" } else { "[" });
                self.expr(&args[1])?;
                self.out.push(']');
                Ok(())
            }
        }
    }

    fn call_args(&mut self, function: &str, args: &[Expr]) -> Result<(), UnparseError> {
        self.out.push_str(function);
        self.out.push('(');
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            self.expr(arg)?;
        }
        self.out.push(')');
        Ok(())
    }
}
