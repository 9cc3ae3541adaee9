// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Line-based writer producing Boogie text with indentation.
//!
//! Expressions, types and attributes print through `Display` since they always fit on one line.
//! Statements and declarations may span several lines and are rendered here.

use crate::decl::{attrs_prefix, Decl, DeclKind, Procedure};
use crate::stmt::{Block, Stmt};
use itertools::Itertools;
use std::fmt;

const INDENT: &str = "  ";

/// Accumulates Boogie text, tracking the indentation level.
pub struct BoogieWriter {
    out: String,
    indent: usize,
    at_line_start: bool,
}

impl Default for BoogieWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl BoogieWriter {
    pub fn new() -> Self {
        Self {
            out: String::new(),
            indent: 0,
            at_line_start: true,
        }
    }

    pub fn into_string(self) -> String {
        self.out
    }

    /// Write a string, indenting every line it starts.
    pub fn write(&mut self, s: &str) {
        for c in s.chars() {
            if c == '\n' {
                self.out.push('\n');
                self.at_line_start = true;
            } else {
                if self.at_line_start {
                    for _ in 0..self.indent {
                        self.out.push_str(INDENT);
                    }
                    self.at_line_start = false;
                }
                self.out.push(c);
            }
        }
    }

    /// Write a complete line.
    pub fn line(&mut self, s: &str) {
        self.write(s);
        self.write("\n");
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Assert { expr, attrs } => {
                self.line(&format!("assert {}{};", attrs_prefix(attrs), expr))
            }
            Stmt::Assume { expr, attrs } => {
                self.line(&format!("assume {}{};", attrs_prefix(attrs), expr))
            }
            Stmt::Assign { lhs, rhs } => self.line(&format!(
                "{} := {};",
                lhs.iter().join(", "),
                rhs.iter().join(", ")
            )),
            Stmt::Havoc(vars) => self.line(&format!("havoc {};", vars.join(", "))),
            Stmt::Call {
                procedure,
                args,
                returns,
                attrs,
            } => {
                let bound = if returns.is_empty() {
                    String::new()
                } else {
                    format!("{} := ", returns.join(", "))
                };
                self.line(&format!(
                    "call {}{}{}({});",
                    attrs_prefix(attrs),
                    bound,
                    procedure,
                    args.iter().join(", ")
                ))
            }
            Stmt::Goto(labels) => self.line(&format!("goto {};", labels.join(", "))),
            Stmt::Return => self.line("return;"),
            Stmt::Comment(text) => {
                for line in text.lines() {
                    self.line(&format!("// {}", line));
                }
            }
            Stmt::IfElse {
                cond,
                then_block,
                else_block,
            } => {
                let cond = cond
                    .as_ref()
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "*".to_string());
                self.line(&format!("if ({}) {{", cond));
                self.nested_block(then_block);
                match else_block {
                    Some(else_block) => {
                        self.line("} else {");
                        self.nested_block(else_block);
                        self.line("}");
                    }
                    None => self.line("}"),
                }
            }
            Stmt::While {
                cond,
                invariants,
                body,
            } => {
                self.line(&format!("while ({})", cond));
                self.indent();
                for inv in invariants {
                    self.line(&format!("invariant {};", inv));
                }
                self.dedent();
                self.line("{");
                self.nested_block(body);
                self.line("}");
            }
            Stmt::Break => self.line("break;"),
            Stmt::Label(label) => self.line(&format!("{}:", label)),
        }
    }

    fn nested_block(&mut self, block: &Block) {
        self.indent();
        self.block(block);
        self.dedent();
    }

    pub fn block(&mut self, block: &Block) {
        if let Some(label) = &block.label {
            self.line(&format!("{}:", label));
        }
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    pub fn decl(&mut self, decl: &Decl) {
        let attrs = attrs_prefix(&decl.attrs);
        match &decl.kind {
            DeclKind::Constant { ty, unique } => {
                let unique = if *unique { "unique " } else { "" };
                self.line(&format!("const {}{}{}: {};", attrs, unique, decl.name, ty))
            }
            DeclKind::Variable { ty } => {
                self.line(&format!("var {}{}: {};", attrs, decl.name, ty))
            }
            DeclKind::TypeAlias { alias_of } => match alias_of {
                Some(ty) => self.line(&format!("type {}{} = {};", attrs, decl.name, ty)),
                None => self.line(&format!("type {}{};", attrs, decl.name)),
            },
            DeclKind::Axiom(expr) => self.line(&format!("axiom {}{};", attrs, expr)),
            DeclKind::Function(function) => {
                let signature = format!(
                    "function {}{}({}) returns ({})",
                    attrs,
                    decl.name,
                    function.params.iter().join(", "),
                    function.return_type
                );
                match &function.body {
                    Some(body) => self.line(&format!("{} {{ {} }}", signature, body)),
                    None => self.line(&format!("{};", signature)),
                }
            }
            DeclKind::Procedure(procedure) => self.procedure(&decl.name, &attrs, procedure),
            DeclKind::Comment(text) => {
                for line in text.lines() {
                    self.line(&format!("// {}", line));
                }
            }
            DeclKind::RawCode(text) => self.line(text.trim_end()),
        }
    }

    fn procedure(&mut self, name: &str, attrs: &str, procedure: &Procedure) {
        let has_body = !procedure.blocks.is_empty();
        let terminator = if has_body { "" } else { ";" };
        let params = procedure.params.iter().join(", ");
        if procedure.returns.is_empty() {
            self.line(&format!("procedure {}{}({}){}", attrs, name, params, terminator));
        } else {
            self.line(&format!("procedure {}{}({})", attrs, name, params));
            self.indent();
            self.line(&format!(
                "returns ({}){}",
                procedure.returns.iter().join(", "),
                terminator
            ));
            self.dedent();
        }

        self.indent();
        if !procedure.modifies.is_empty() {
            self.line(&format!("modifies {};", procedure.modifies.join(", ")));
        }
        for spec in &procedure.requires {
            self.line(&format!("requires {};", spec));
        }
        for spec in &procedure.ensures {
            self.line(&format!("ensures {};", spec));
        }
        self.dedent();

        if !has_body {
            return;
        }
        self.line("{");
        self.indent();
        for local in &procedure.locals {
            self.decl(local);
        }
        for block in &procedure.blocks {
            self.block(block);
        }
        self.dedent();
        self.line("}");
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = BoogieWriter::new();
        writer.stmt(self);
        write!(f, "{}", writer.into_string())
    }
}

impl fmt::Display for Decl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut writer = BoogieWriter::new();
        writer.decl(self);
        write!(f, "{}", writer.into_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Expr, Type};

    fn render(stmt: &Stmt) -> String {
        let mut writer = BoogieWriter::new();
        writer.stmt(stmt);
        writer.into_string()
    }

    #[test]
    fn nondeterministic_if() {
        let stmt = Stmt::IfElse {
            cond: None,
            then_block: Block::new(vec![Stmt::assign(Expr::id("r"), Expr::bool(true))]),
            else_block: Some(Block::new(vec![Stmt::assign(Expr::id("r"), Expr::bool(false))])),
        };
        assert_eq!(
            render(&stmt),
            "if (*) {\n  r := true;\n} else {\n  r := false;\n}\n"
        );
    }

    #[test]
    fn call_without_returns() {
        let stmt = Stmt::call("__transfer", vec![Expr::id("a"), Expr::int(5)], vec![]);
        assert_eq!(render(&stmt), "call __transfer(a, 5);\n");
    }

    #[test]
    fn bodiless_procedure_ends_signature() {
        let decl = Decl::procedure(
            "f",
            Procedure {
                params: vec![crate::Binding::new("x", Type::Int)],
                ..Default::default()
            },
        );
        let mut writer = BoogieWriter::new();
        writer.decl(&decl);
        assert_eq!(writer.into_string(), "procedure f(x: int);\n");
    }
}
