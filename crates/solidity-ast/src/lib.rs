// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Solidity source model
//!
//! The translation trusts an upstream compiler for parsing, name resolution and type checking.
//! This crate fixes the shape of what it receives: a closed set of node kinds, each expression
//! annotated with its type and each name resolved to the id of its declaration.
//! [`SourceModel`] indexes all declarations by id so translators can follow those references.

pub mod ast;
pub mod builder;
pub mod model;
pub mod types;

pub use ast::*;
pub use builder::AstBuilder;
pub use model::{ContractInfo, Declaration, FunctionInfo, SourceModel};
pub use types::{DataLocation, MagicKind, SolType};

/// Unique id of an AST node. Negative ids are reserved for built-in (magic) declarations.
pub type NodeId = i64;
