// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! State shared by all parts of one translation run.

use crate::{
    diagnostics::{DiagnosticKind, Diagnostics},
    helpers::{self, HelperProcedure},
    names,
    options::{BoogieOptions, Encoding},
};
use boogie_ast::{Decl, Expr, ExprRef, Program, Type};
use log::debug;
use num::{BigInt, One, Zero};
use solidity_ast::{NodeId, SourceLocation, SourceModel};
use std::collections::{BTreeMap, BTreeSet};

/// A contract invariant converted to Boogie, with the range conditions of its subexpressions
#[derive(Debug, Clone)]
pub struct DocTagExpr {
    pub text: String,
    pub expr: ExprRef,
    pub tccs: Vec<ExprRef>,
}

pub struct BoogieContext<'env> {
    model: &'env SourceModel,
    encoding: Encoding,
    overflow_checks: bool,
    program: Program,
    diagnostics: Diagnostics,
    /// Names of bitvector builtins already declared
    builtin_functions: BTreeSet<String>,
    helpers: BTreeSet<HelperProcedure>,
    /// Invariants of the contract being translated
    invariants: Vec<DocTagExpr>,
    /// Collections whose sum is referenced, by declaration, with their Boogie name
    sum_registrations: BTreeMap<NodeId, String>,
    declared_sums: BTreeSet<NodeId>,
    next_id: usize,
}

impl<'env> BoogieContext<'env> {
    pub fn new(model: &'env SourceModel, options: &BoogieOptions) -> Self {
        Self::with_encoding(model, options.encoding, options.overflow_checks)
    }

    pub fn with_encoding(model: &'env SourceModel, encoding: Encoding, overflow_checks: bool) -> Self {
        Self {
            model,
            encoding,
            overflow_checks,
            program: Program::default(),
            diagnostics: Diagnostics::new(),
            builtin_functions: BTreeSet::new(),
            helpers: BTreeSet::new(),
            invariants: vec![],
            sum_registrations: BTreeMap::new(),
            declared_sums: BTreeSet::new(),
            next_id: 0,
        }
    }

    pub fn model(&self) -> &'env SourceModel {
        self.model
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn is_bv(&self) -> bool {
        self.encoding == Encoding::Bv
    }

    pub fn overflow_checks(&self) -> bool {
        self.overflow_checks
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn add_decl(&mut self, decl: Decl) {
        self.program.add_decl(decl);
    }

    pub fn add_decls(&mut self, decls: impl IntoIterator<Item = Decl>) {
        self.program.add_decls(decls);
    }

    pub fn set_prelude(&mut self, prelude: impl Into<String>) {
        self.program.prelude = prelude.into();
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn into_parts(self) -> (Program, Diagnostics) {
        (self.program, self.diagnostics)
    }

    pub fn report_error(&mut self, kind: DiagnosticKind, loc: &SourceLocation, message: impl Into<String>) {
        self.diagnostics.error(kind, loc, message);
    }

    pub fn report_unsupported(&mut self, loc: &SourceLocation, message: impl Into<String>) {
        self.diagnostics
            .error(DiagnosticKind::UnsupportedConstruct, loc, message);
    }

    pub fn report_warning(&mut self, loc: &SourceLocation, message: impl Into<String>) {
        self.diagnostics.warning(loc, message);
    }

    // ========================================================================
    // Idempotent inclusion
    // ========================================================================

    /// Declares a builtin function unless one with the same name already is.
    pub fn include_builtin(&mut self, decl: Decl) {
        if self.builtin_functions.insert(decl.name.clone()) {
            self.program.add_decl(decl);
        }
    }

    /// Declares a helper procedure the first time it is requested.
    pub fn include_helper(&mut self, helper: HelperProcedure) {
        if self.helpers.insert(helper) {
            debug!("including helper procedure `{}`", helper.name());
            let decl = helpers::helper_declaration(self, helper);
            self.program.add_decl(decl);
        }
    }

    pub fn is_helper_included(&self, helper: HelperProcedure) -> bool {
        self.helpers.contains(&helper)
    }

    // ========================================================================
    // Per-contract state
    // ========================================================================

    /// Forgets the invariants and sum registrations of the previous contract.
    pub fn enter_contract(&mut self) {
        self.invariants.clear();
        self.sum_registrations.clear();
    }

    pub fn invariants(&self) -> &[DocTagExpr] {
        &self.invariants
    }

    pub fn add_invariant(&mut self, invariant: DocTagExpr) {
        self.invariants.push(invariant);
    }

    /// Registers a collection whose sum is used, returning the name of its sum shadow.
    pub fn register_sum(&mut self, decl: NodeId, mapped_name: &str) -> String {
        self.sum_registrations
            .entry(decl)
            .or_insert_with(|| mapped_name.to_string());
        names::sum_name(mapped_name)
    }

    /// Boogie name of the sum shadow of a declaration, if its sum is used in this contract
    pub fn sum_shadow(&self, decl: NodeId) -> Option<String> {
        self.sum_registrations.get(&decl).map(|name| names::sum_name(name))
    }

    pub fn sum_shadows(&self) -> Vec<String> {
        self.sum_registrations
            .values()
            .map(|name| names::sum_name(name))
            .collect()
    }

    /// Sum registrations without a declaration so far. They count as declared afterwards.
    pub fn take_undeclared_sums(&mut self) -> Vec<String> {
        let mut result = vec![];
        for (id, name) in &self.sum_registrations {
            if self.declared_sums.insert(*id) {
                result.push(names::sum_name(name));
            }
        }
        result
    }

    pub fn fresh_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    // ========================================================================
    // Encoding dependent building blocks
    // ========================================================================

    /// Boogie type of integers of the given width
    pub fn int_type(&self, bits: u32) -> Type {
        if self.is_bv() {
            Type::Bv(bits)
        } else {
            Type::Int
        }
    }

    /// Integer literal of the given width. Negative values become their two's complement in
    /// bitvector encoding.
    pub fn int_lit(&self, value: impl Into<BigInt>, bits: u32) -> ExprRef {
        let value = value.into();
        if self.is_bv() {
            let modulus = BigInt::one() << bits;
            let mut wrapped = value % &modulus;
            if wrapped < BigInt::zero() {
                wrapped += modulus;
            }
            Expr::bv(wrapped, bits)
        } else {
            Expr::int(value)
        }
    }

    pub fn address_type(&self) -> Type {
        Type::named(names::ADDRESS_TYPE)
    }

    /// Type of balances and monetary amounts
    pub fn balance_type(&self) -> Type {
        self.int_type(256)
    }

    pub fn this_expr(&self) -> ExprRef {
        Expr::id(names::THIS)
    }

    pub fn balance_of(&self, address: ExprRef) -> ExprRef {
        Expr::select(Expr::id(names::BALANCE), address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_literals_wrap_in_bv() {
        let model = SourceModel::default();
        let ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        assert_eq!(ctx.int_lit(-1, 8).to_string(), "255bv8");
        assert_eq!(ctx.int_lit(5, 8).to_string(), "5bv8");
        let ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        assert_eq!(ctx.int_lit(-1, 8).to_string(), "-1");
    }

    #[test]
    fn builtins_are_declared_once() {
        let model = SourceModel::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        for _ in 0..3 {
            ctx.include_builtin(Decl::comment("f", "f"));
        }
        assert_eq!(ctx.program().count_decls("f"), 1);
    }

    #[test]
    fn sum_registrations_are_declared_once() {
        let model = SourceModel::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        assert_eq!(ctx.register_sum(5, "balances#5"), "balances#5#sum");
        ctx.register_sum(5, "balances#5");
        assert_eq!(ctx.take_undeclared_sums(), vec!["balances#5#sum".to_string()]);
        assert!(ctx.take_undeclared_sums().is_empty());
        assert_eq!(ctx.sum_shadow(5).as_deref(), Some("balances#5#sum"));
        ctx.enter_contract();
        assert_eq!(ctx.sum_shadow(5), None);
    }
}
