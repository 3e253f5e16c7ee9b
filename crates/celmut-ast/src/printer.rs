//! Debug tree printer.
//!
//! `Display` for [`Expr`] renders one node per block, tagged with its kind
//! and id:
//!
//! ```text
//! CALL [2] {
//!   function: _+_
//!   args: {
//!     CONSTANT [1] { value: 1 }
//!     IDENT [3] {
//!       name: x
//!     }
//!   }
//! }
//! ```

use std::fmt::{self, Write};

use crate::expr::{Expr, ExprKind};

struct TreePrinter<'w, W: Write> {
    out: &'w mut W,
    indent: usize,
}

impl<W: Write> TreePrinter<'_, W> {
    fn line(&mut self, text: &str) -> fmt::Result {
        for _ in 0..self.indent {
            self.out.write_str("  ")?;
        }
        self.out.write_str(text)?;
        self.out.write_char('\n')
    }

    fn nested(&mut self, f: impl FnOnce(&mut Self) -> fmt::Result) -> fmt::Result {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }

    fn block(&mut self, label: &str, expr: &Expr) -> fmt::Result {
        self.line(&format!("{label}: {{"))?;
        self.nested(|p| p.expr(expr))?;
        self.line("}")
    }

    fn expr(&mut self, expr: &Expr) -> fmt::Result {
        let header = format!("{} [{}]", expr.kind_tag(), expr.id().raw());
        match expr.kind() {
            ExprKind::NotSet => self.line(&format!("{header} {{}}")),
            ExprKind::Constant(value) => {
                self.line(&format!("{header} {{ value: {} }}", value.to_source()))
            }
            ExprKind::Ident(ident) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| p.line(&format!("name: {}", ident.name)))?;
                self.line("}")
            }
            ExprKind::Select(select) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| p.expr(&select.operand))?;
                let presence = if select.test_only {
                    "~presence_test"
                } else {
                    ""
                };
                self.line(&format!("}}.{}{presence}", select.field))
            }
            ExprKind::Call(call) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| {
                    if let Some(target) = &call.target {
                        p.block("target", target)?;
                    }
                    p.line(&format!("function: {}", call.function))?;
                    if !call.args.is_empty() {
                        p.line("args: {")?;
                        p.nested(|p| call.args.iter().try_for_each(|arg| p.expr(arg)))?;
                        p.line("}")?;
                    }
                    Ok(())
                })?;
                self.line("}")
            }
            ExprKind::List(list) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| {
                    p.line("elements: {")?;
                    p.nested(|p| list.elements.iter().try_for_each(|e| p.expr(e)))?;
                    p.line("}")?;
                    if !list.optional_indices.is_empty() {
                        let indices: Vec<_> =
                            list.optional_indices.iter().map(usize::to_string).collect();
                        p.line(&format!("optional_indices: [{}]", indices.join(", ")))?;
                    }
                    Ok(())
                })?;
                self.line("}")
            }
            ExprKind::Struct(create_struct) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| {
                    p.line(&format!("name: {}", create_struct.message_name))?;
                    p.line("entries: {")?;
                    p.nested(|p| {
                        create_struct.entries.iter().try_for_each(|entry| {
                            p.line(&format!("ENTRY [{}] {{", entry.id.raw()))?;
                            p.nested(|p| {
                                p.line(&format!("field_key: {}", entry.field_key))?;
                                if entry.optional_entry {
                                    p.line("optional_entry: true")?;
                                }
                                p.block("value", &entry.value)
                            })?;
                            p.line("}")
                        })
                    })?;
                    p.line("}")
                })?;
                self.line("}")
            }
            ExprKind::Map(map) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| {
                    map.entries.iter().try_for_each(|entry| {
                        p.line(&format!("MAP_ENTRY [{}] {{", entry.id.raw()))?;
                        p.nested(|p| {
                            p.block("key", &entry.key)?;
                            if entry.optional_entry {
                                p.line("optional_entry: true")?;
                            }
                            p.block("value", &entry.value)
                        })?;
                        p.line("}")
                    })
                })?;
                self.line("}")
            }
            ExprKind::Comprehension(c) => {
                self.line(&format!("{header} {{"))?;
                self.nested(|p| {
                    p.line(&format!("iter_var: {}", c.iter_var))?;
                    p.block("iter_range", &c.iter_range)?;
                    p.line(&format!("accu_var: {}", c.accu_var))?;
                    p.block("accu_init", &c.accu_init)?;
                    p.block("loop_condition", &c.loop_condition)?;
                    p.block("loop_step", &c.loop_step)?;
                    p.block("result", &c.result)
                })?;
                self.line("}")
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rendered = String::new();
        TreePrinter {
            out: &mut rendered,
            indent: 0,
        }
        .expr(self)?;
        f.write_str(rendered.trim_end())
    }
}
