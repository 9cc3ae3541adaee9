// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Boogie Abstract Syntax
//!
//! This crate holds the target language of the Solidity translation: declarations, statements,
//! expressions and specifications, together with a deterministic printer. Expression trees are
//! immutable and shared through `Rc`, so a subexpression may appear in several places of the
//! program without being copied.
//!
//! The crate does no translation work of its own; it is a pure data and serialization layer.

mod decl;
mod expr;
mod program;
mod stmt;
mod types;
mod writer;

pub use decl::{Attr, AttrValue, Binding, Decl, DeclKind, Function, Procedure, Specification};
pub use expr::{BinaryOp, Expr, ExprRef, Literal, QuantifierKind, UnaryOp};
pub use program::Program;
pub use stmt::{Block, Stmt};
pub use types::Type;
pub use writer::BoogieWriter;
