// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Translation of Solidity source units to Boogie
//!
//! This module provides specialized translators:
//! - expression_translator: Solidity expressions → Boogie expressions plus side effects
//! - call_translator: function calls, builtins, type conversions and contract creation
//! - struct_copy: reference and member-wise struct assignment
//! - statement_translator: function and modifier bodies → Boogie statements
//! - contract_translator: contracts and their members → Boogie declarations

pub mod call_translator;
pub mod contract_translator;
pub mod expression_translator;
pub mod statement_translator;
pub mod struct_copy;

use crate::helpers::HelperProcedure;
use boogie_ast::{Decl, ExprRef, Stmt};

pub use contract_translator::{translate_model, ContractTranslator, DocTagResolver, EmbeddedDocTags};
pub use expression_translator::ExpressionTranslator;
pub use statement_translator::StatementTranslator;

/// Everything evaluating an expression needs besides its value. The statements must be
/// emitted before the value is used, in order.
#[derive(Debug, Clone, Default)]
pub struct SideEffects {
    pub stmts: Vec<Stmt>,
    /// Locals introduced by the lowering, hoisted into the enclosing procedure
    pub decls: Vec<Decl>,
    /// Global constants minted for literals
    pub constants: Vec<Decl>,
    /// Range conditions of subexpressions
    pub tccs: Vec<ExprRef>,
    /// Overflow side conditions of the arithmetic performed
    pub ocs: Vec<ExprRef>,
}

/// What a lowered callee expression refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callee {
    /// A procedure of the contract at the receiver address
    Plain,
    /// Accessor of a public state variable, read directly from its map
    Getter,
    /// A library function. Static when called through the library name, otherwise the
    /// receiver is passed as an extra first argument.
    Library { is_static: bool },
    Constructor,
    Helper(HelperProcedure),
}

/// Result of lowering one expression node
#[derive(Debug, Clone)]
pub struct Lowered {
    pub expr: ExprRef,
    /// Receiver of a member function or getter
    pub address: Option<ExprRef>,
    /// Ether attached with `.value(..)`
    pub value: Option<ExprRef>,
    pub callee: Callee,
}

impl Lowered {
    pub fn plain(expr: ExprRef) -> Self {
        Self {
            expr,
            address: None,
            value: None,
            callee: Callee::Plain,
        }
    }

    pub fn with_address(expr: ExprRef, address: ExprRef, callee: Callee) -> Self {
        Self {
            expr,
            address: Some(address),
            value: None,
            callee,
        }
    }
}

/// A fully converted top-level expression
#[derive(Debug, Clone)]
pub struct ConvertedExpression {
    pub expr: ExprRef,
    pub stmts: Vec<Stmt>,
    pub decls: Vec<Decl>,
    pub constants: Vec<Decl>,
    pub tccs: Vec<ExprRef>,
    pub ocs: Vec<ExprRef>,
}

impl ConvertedExpression {
    pub(crate) fn new(expr: ExprRef, fx: SideEffects) -> Self {
        Self {
            expr,
            stmts: fx.stmts,
            decls: fx.decls,
            constants: fx.constants,
            tccs: fx.tccs,
            ocs: fx.ocs,
        }
    }

    /// Whether evaluating the expression needs statements or local variables
    pub fn has_side_effects(&self) -> bool {
        !self.stmts.is_empty() || !self.decls.is_empty()
    }
}
