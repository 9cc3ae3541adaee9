// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::decl::{Attr, Specification};
use crate::expr::ExprRef;

/// Boogie statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Assert {
        expr: ExprRef,
        attrs: Vec<Attr>,
    },
    Assume {
        expr: ExprRef,
        attrs: Vec<Attr>,
    },
    /// Parallel assignment `x, y := a, b`
    Assign {
        lhs: Vec<ExprRef>,
        rhs: Vec<ExprRef>,
    },
    Havoc(Vec<String>),
    /// `call r1, r2 := proc(args)`
    Call {
        procedure: String,
        args: Vec<ExprRef>,
        returns: Vec<String>,
        attrs: Vec<Attr>,
    },
    Goto(Vec<String>),
    Return,
    Comment(String),
    /// A missing condition is the nondeterministic choice `*`
    IfElse {
        cond: Option<ExprRef>,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: ExprRef,
        invariants: Vec<Specification>,
        body: Block,
    },
    Break,
    Label(String),
}

impl Stmt {
    pub fn assert(expr: ExprRef, attrs: Vec<Attr>) -> Self {
        Stmt::Assert { expr, attrs }
    }

    pub fn assume(expr: ExprRef) -> Self {
        Stmt::Assume {
            expr,
            attrs: vec![],
        }
    }

    pub fn assign(lhs: ExprRef, rhs: ExprRef) -> Self {
        Stmt::Assign {
            lhs: vec![lhs],
            rhs: vec![rhs],
        }
    }

    pub fn assign_many(lhs: Vec<ExprRef>, rhs: Vec<ExprRef>) -> Self {
        debug_assert_eq!(lhs.len(), rhs.len(), "BUG: unbalanced parallel assignment");
        Stmt::Assign { lhs, rhs }
    }

    pub fn call(procedure: impl Into<String>, args: Vec<ExprRef>, returns: Vec<String>) -> Self {
        Stmt::Call {
            procedure: procedure.into(),
            args,
            returns,
            attrs: vec![],
        }
    }

    pub fn goto(label: impl Into<String>) -> Self {
        Stmt::Goto(vec![label.into()])
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Stmt::Comment(text.into())
    }

    pub fn if_then(cond: ExprRef, then_block: Block) -> Self {
        Stmt::IfElse {
            cond: Some(cond),
            then_block,
            else_block: None,
        }
    }

    pub fn if_else(cond: ExprRef, then_block: Block, else_block: Block) -> Self {
        Stmt::IfElse {
            cond: Some(cond),
            then_block,
            else_block: Some(else_block),
        }
    }

    /// Calls `visitor` on this statement and on every statement nested in it, in order.
    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a Stmt)) {
        visitor(self);
        match self {
            Stmt::IfElse {
                then_block,
                else_block,
                ..
            } => {
                then_block.walk(visitor);
                if let Some(else_block) = else_block {
                    else_block.walk(visitor);
                }
            }
            Stmt::While { body, .. } => body.walk(visitor),
            _ => {}
        }
    }
}

/// Optionally labelled sequence of statements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    pub label: Option<String>,
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>) -> Self {
        Self { label: None, stmts }
    }

    pub fn labelled(label: impl Into<String>, stmts: Vec<Stmt>) -> Self {
        Self {
            label: Some(label.into()),
            stmts,
        }
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.stmts.push(stmt);
    }

    pub fn walk<'a>(&'a self, visitor: &mut impl FnMut(&'a Stmt)) {
        for stmt in &self.stmts {
            stmt.walk(visitor);
        }
    }
}
