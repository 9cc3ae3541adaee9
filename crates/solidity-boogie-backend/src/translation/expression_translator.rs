// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Expression translation from Solidity expressions to Boogie expressions
//!
//! Boogie expressions cannot have side effects, so lowering an expression yields its value
//! together with the statements that must run first (assignments, calls, checks), the locals
//! those statements use and the side conditions of the arithmetic involved. Each recursive call
//! appends to one [`SideEffects`] buffer in evaluation order.
//!
//! Calls live in `call_translator`, struct assignment in `struct_copy`.

use super::{Callee, ConvertedExpression, Lowered, SideEffects};
use crate::{
    arithmetic::int_shape,
    context::BoogieContext,
    error::{Result, TranslationError},
    helpers::HelperProcedure,
    names,
};
use boogie_ast::{Decl, Expr, ExprRef, Stmt, Type};
use num::BigInt;
use solidity_ast::{
    model::magic, types::parse_number, AssignmentOperator, BinaryOperator, Declaration,
    Expression, ExpressionKind, LiteralKind, MagicKind, SolType, SourceLocation, UnaryOperator,
};

/// `a#length` for `a`, `a#length[i]` for `a[i]`
pub(crate) fn length_shadow(base: &ExprRef) -> Option<ExprRef> {
    match base.as_ref() {
        Expr::Identifier(name) => Some(Expr::id(names::length_name(name))),
        Expr::Select { base, indices } => Some(Expr::select_many(length_shadow(base)?, indices.clone())),
        _ => None,
    }
}

pub struct ExpressionTranslator<'a, 'env> {
    pub(crate) ctx: &'a mut BoogieContext<'env>,
}

impl<'a, 'env> ExpressionTranslator<'a, 'env> {
    pub fn new(ctx: &'a mut BoogieContext<'env>) -> Self {
        Self { ctx }
    }

    /// Converts one expression. Side effects are collected in a fresh buffer per call.
    pub fn convert(&mut self, expr: &Expression) -> Result<ConvertedExpression> {
        let mut fx = SideEffects::default();
        let lowered = self.lower(expr, &mut fx)?;
        Ok(ConvertedExpression::new(lowered.expr, fx))
    }

    /// Converts `expr` and implicitly converts its value to `target`.
    pub fn convert_as(&mut self, expr: &Expression, target: &SolType) -> Result<ConvertedExpression> {
        let mut fx = SideEffects::default();
        let lowered = self.lower(expr, &mut fx)?;
        let value = self.coerce(lowered.expr, &expr.ty, target, &expr.loc)?;
        Ok(ConvertedExpression::new(value, fx))
    }

    pub(crate) fn lower(&mut self, expr: &Expression, fx: &mut SideEffects) -> Result<Lowered> {
        // compile-time constants fold to their value
        if let Some(value) = expr.ty.rational_value() {
            return Ok(Lowered::plain(Expr::int(value)));
        }
        match &expr.kind {
            ExpressionKind::Conditional {
                condition,
                true_expression,
                false_expression,
            } => self.lower_conditional(expr, condition, true_expression, false_expression, fx),
            ExpressionKind::Assignment { operator, lhs, rhs } => {
                self.lower_assignment(expr, *operator, lhs, rhs, fx)
            }
            ExpressionKind::Tuple { components } => self.lower_tuple(expr, components, fx),
            ExpressionKind::UnaryOperation {
                operator,
                prefix,
                sub_expression,
            } => self.lower_unary(expr, *operator, *prefix, sub_expression, fx),
            ExpressionKind::BinaryOperation {
                operator,
                lhs,
                rhs,
                common_type,
            } => self.lower_binary(expr, *operator, lhs, rhs, common_type, fx),
            ExpressionKind::FunctionCall {
                kind,
                expression,
                arguments,
            } => self.lower_call(expr, *kind, expression, arguments, fx),
            ExpressionKind::MemberAccess {
                expression,
                member_name,
                referenced_declaration,
            } => self.lower_member_access(expr, expression, member_name, *referenced_declaration, fx),
            ExpressionKind::IndexAccess { base, index } => {
                self.lower_index_access(expr, base, index.as_deref(), fx)
            }
            ExpressionKind::Identifier {
                name,
                referenced_declaration,
            } => self.lower_identifier(expr, name, *referenced_declaration, fx),
            ExpressionKind::Literal { kind, value } => Ok(self.lower_literal(expr, *kind, value, fx)),
            ExpressionKind::New { .. } => {
                Ok(self.unsupported(&expr.loc, "Contract creation is only supported as a call"))
            }
            ExpressionKind::ElementaryTypeName { type_name } => Ok(self.unsupported(
                &expr.loc,
                format!("Type name '{}' is only supported in conversions", type_name),
            )),
            ExpressionKind::Unsupported { kind } => {
                Ok(self.unsupported(&expr.loc, format!("Unsupported expression: {}", kind)))
            }
        }
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Reports an unsupported construct and returns the sentinel expression.
    pub(crate) fn unsupported(&mut self, loc: &SourceLocation, message: impl Into<String>) -> Lowered {
        self.ctx.report_unsupported(loc, message);
        Lowered::plain(Expr::id(names::ERR_EXPR))
    }

    pub(crate) fn declare_local(&mut self, name: &str, ty: Type, fx: &mut SideEffects) {
        fx.decls.push(Decl::variable(name, ty));
    }

    pub(crate) fn add_tcc(&self, expr: &ExprRef, ty: &SolType, fx: &mut SideEffects) {
        if let Some(tcc) = self.ctx.range_condition(expr, ty) {
            fx.tccs.push(tcc);
        }
    }

    /// Records the overflow condition of an operation, asserting it in place when overflow
    /// checking is enabled.
    pub(crate) fn record_overflow(
        &mut self,
        no_overflow: Option<ExprRef>,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) {
        if let Some(oc) = no_overflow {
            if self.ctx.overflow_checks() {
                fx.stmts.push(Stmt::assert(
                    oc.clone(),
                    names::loc_attrs(loc, "Overflow in computation"),
                ));
            }
            fx.ocs.push(oc);
        }
    }

    /// Implicit conversion that also gives untyped number literals the width of `target`.
    pub(crate) fn coerce(
        &mut self,
        expr: ExprRef,
        from: &SolType,
        target: &SolType,
        loc: &SourceLocation,
    ) -> Result<ExprRef> {
        let expr = self.ctx.implicit_conversion(expr, from, target, loc)?;
        Ok(match (expr.as_int_literal(), int_shape(target)) {
            (Some(value), Some((bits, _))) if self.ctx.is_bv() => self.ctx.int_lit(value.clone(), bits),
            _ => expr,
        })
    }

    /// Assigns to an lvalue. Map lookups become updates of the underlying map variable.
    pub(crate) fn assign_ir(&mut self, lhs: ExprRef, rhs: ExprRef, loc: &SourceLocation, fx: &mut SideEffects) {
        match lhs.as_ref() {
            Expr::Identifier(_) => fx.stmts.push(Stmt::assign(lhs, rhs)),
            Expr::Select { base, indices } => {
                let updated = Expr::update_many(base.clone(), indices.clone(), rhs);
                self.assign_ir(base.clone(), updated, loc, fx)
            }
            _ => {
                self.ctx
                    .report_unsupported(loc, format!("Unsupported assignment target: {}", lhs));
            }
        }
    }

    /// Assigns `value` to the source-level `target`, keeping the sum of the collection up to
    /// date when it is tracked.
    pub(crate) fn assign_to(
        &mut self,
        target: &Expression,
        target_ir: ExprRef,
        value: ExprRef,
        fx: &mut SideEffects,
    ) -> Result<()> {
        if let ExpressionKind::IndexAccess { base, .. } = &target.unparenthesized().kind {
            if let Some((_, Some(decl))) = base.as_identifier() {
                if let Some(sum) = self.ctx.sum_shadow(decl) {
                    self.update_sum(&sum, &target.ty, target_ir.clone(), value.clone(), &target.loc, fx);
                }
            }
        }
        self.assign_ir(target_ir, value, &target.loc, fx);
        Ok(())
    }

    /// `sum[this] := sum[this] + (new - old)`
    fn update_sum(
        &mut self,
        sum: &str,
        element: &SolType,
        old: ExprRef,
        new: ExprRef,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) {
        let (bits, signed) = int_shape(element).unwrap_or((256, false));
        let (old, new) = if self.ctx.is_bv() {
            (
                self.ctx.bv_extend(old, bits, 256, signed),
                self.ctx.bv_extend(new, bits, 256, signed),
            )
        } else {
            (old, new)
        };
        let delta = self
            .ctx
            .encode_binary(BinaryOperator::Sub, new, old, 256, signed, loc)
            .expr;
        let current = Expr::select(Expr::id(sum), self.ctx.this_expr());
        let updated = self
            .ctx
            .encode_binary(BinaryOperator::Add, current, delta, 256, signed, loc)
            .expr;
        fx.stmts.push(Stmt::assign(
            Expr::id(sum),
            Expr::update(Expr::id(sum), self.ctx.this_expr(), updated),
        ));
    }

    /// Shadow variable holding the length of the array `base` evaluates to.
    pub(crate) fn length_of(&mut self, base: &ExprRef, loc: &SourceLocation) -> ExprRef {
        length_shadow(base).unwrap_or_else(|| {
            self.ctx
                .report_unsupported(loc, "Length of this array expression is not supported");
            Expr::id(names::ERR_EXPR)
        })
    }

    /// Copies the length of the array `value` to the shadow of `target`, when both have one.
    fn copy_length(
        &mut self,
        target: &ExprRef,
        value: &ExprRef,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) {
        if let (Some(target), Some(value)) = (length_shadow(target), length_shadow(value)) {
            self.assign_ir(target, value, loc, fx);
        }
    }

    fn shape(&self, ty: &SolType) -> (u32, bool) {
        int_shape(ty).unwrap_or((256, false))
    }

    // ========================================================================
    // Leaves
    // ========================================================================

    fn lower_literal(&mut self, expr: &Expression, kind: LiteralKind, value: &str, fx: &mut SideEffects) -> Lowered {
        match kind {
            LiteralKind::Bool => Lowered::plain(Expr::bool(value == "true")),
            LiteralKind::Number if expr.ty.is_address() => {
                let name = format!("address_{}#{}", value, expr.id);
                fx.constants
                    .push(Decl::constant(&name, self.ctx.address_type(), false));
                Lowered::plain(Expr::id(name))
            }
            LiteralKind::Number => match (parse_number(value), &expr.ty) {
                (Some(number), SolType::Integer { bits, .. }) => {
                    Lowered::plain(self.ctx.int_lit(number, *bits))
                }
                (Some(number), _) => Lowered::plain(Expr::int(number)),
                (None, _) => self.unsupported(&expr.loc, format!("Malformed number literal '{}'", value)),
            },
            LiteralKind::String | LiteralKind::HexString => {
                let name = format!("literal_string#{}", expr.id);
                fx.constants
                    .push(Decl::constant(&name, Type::named(names::STRING_TYPE), false));
                Lowered::plain(Expr::id(name))
            }
        }
    }

    fn lower_identifier(
        &mut self,
        expr: &Expression,
        name: &str,
        referenced: Option<i64>,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let Some(decl_id) = referenced else {
            return Ok(self.unsupported(&expr.loc, format!("Unresolved identifier '{}'", name)));
        };
        let model = self.ctx.model();
        let lowered = match model.declaration(decl_id) {
            Some(Declaration::Magic { id, name }) => match *id {
                magic::THIS => Lowered::plain(self.ctx.this_expr()),
                magic::NOW => Lowered::plain(Expr::id(names::NOW)),
                _ => Lowered::plain(Expr::id(name)),
            },
            Some(Declaration::Variable(var)) if var.is_constant => match &var.value {
                Some(init) => {
                    let value = self.lower(init, fx)?.expr;
                    Lowered::plain(self.coerce(value, &init.ty, &var.ty, &expr.loc)?)
                }
                None => {
                    return Ok(self.unsupported(&expr.loc, format!("Constant '{}' has no value", name)))
                }
            },
            Some(Declaration::Variable(var)) => {
                let mapped = Expr::id(names::map_decl_name(&var.name, var.id));
                let value = if var.is_state_variable {
                    Expr::select(mapped, self.ctx.this_expr())
                } else {
                    mapped
                };
                self.add_tcc(&value, &var.ty, fx);
                Lowered::plain(value)
            }
            Some(Declaration::Function(fun)) => {
                let name = names::procedure_name(&fun.name, fun.id, fun.kind, fun.contract.id);
                let callee = if fun.in_library() {
                    Callee::Library { is_static: true }
                } else {
                    Callee::Plain
                };
                Lowered {
                    callee,
                    ..Lowered::plain(Expr::id(name))
                }
            }
            Some(Declaration::Contract(contract)) => Lowered::plain(Expr::id(&contract.name)),
            Some(other) => Lowered::plain(Expr::id(names::map_decl_name(other.name(), other.id()))),
            None => {
                return Ok(self.unsupported(
                    &expr.loc,
                    format!("Declaration of '{}' is not available", name),
                ))
            }
        };
        Ok(lowered)
    }

    // ========================================================================
    // Member and index access
    // ========================================================================

    fn lower_member_access(
        &mut self,
        expr: &Expression,
        base: &Expression,
        member: &str,
        referenced: Option<i64>,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let model = self.ctx.model();

        if let SolType::Magic { kind } = &base.ty {
            let name = match (kind, member) {
                (MagicKind::Message, "sender") => names::MSG_SENDER,
                (MagicKind::Message, "value") => names::MSG_VALUE,
                (MagicKind::Block, "number") => names::BLOCK_NUMBER,
                (MagicKind::Block, "timestamp") => names::NOW,
                _ => {
                    return Ok(self.unsupported(
                        loc,
                        format!("Member access to '{}.{}' is not supported", base.ty, member),
                    ))
                }
            };
            return Ok(Lowered::plain(Expr::id(name)));
        }

        if let Some(SolType::Enum { def, .. }) = base.ty.named_type() {
            let ordinal = referenced
                .and_then(|id| match model.declaration(id) {
                    Some(Declaration::EnumValue { ordinal, .. }) => Some(*ordinal),
                    _ => None,
                })
                .or_else(|| {
                    model
                        .enum_definition(*def)
                        .and_then(|e| e.members.iter().position(|m| m.name == member))
                });
            return Ok(match ordinal {
                Some(ordinal) => Lowered::plain(self.ctx.int_lit(BigInt::from(ordinal), 8)),
                None => self.unsupported(loc, format!("Unknown enum member '{}'", member)),
            });
        }

        if matches!(base.ty, SolType::Function { .. }) && (member == "value" || member == "gas") {
            return Ok(self.unsupported(
                loc,
                format!("'.{}' is only supported as part of a call", member),
            ));
        }

        if member == "length" && matches!(base.ty, SolType::Array { .. }) {
            if let ExpressionKind::IndexAccess { base: outer, .. } = &base.unparenthesized().kind {
                if matches!(outer.ty, SolType::Array { .. }) {
                    return Ok(self.unsupported(loc, "Length of nested arrays is not supported"));
                }
            }
        }

        let base_ir = self.lower(base, fx)?.expr;
        match &base.ty {
            SolType::Address { .. } => {
                if member == "balance" {
                    return Ok(Lowered::plain(self.ctx.balance_of(base_ir)));
                }
                if let Some(helper) = HelperProcedure::for_member(member) {
                    self.ctx.include_helper(helper);
                    return Ok(Lowered::with_address(
                        Expr::id(helper.name()),
                        base_ir,
                        Callee::Helper(helper),
                    ));
                }
            }
            SolType::Array { .. } if member == "length" => {
                return Ok(Lowered::plain(self.length_of(&base_ir, loc)));
            }
            SolType::FixedBytes { size } if member == "length" => {
                return Ok(Lowered::plain(self.ctx.int_lit(*size, 8)));
            }
            SolType::Struct { def, location, .. } => {
                let member_decl = referenced.and_then(|id| model.variable(id)).or_else(|| {
                    model
                        .struct_definition(*def)
                        .and_then(|s| s.members.iter().find(|m| m.name == member))
                });
                if let Some(member_decl) = member_decl {
                    let map = names::member_map_name(&member_decl.name, member_decl.id, *location);
                    let value = Expr::select(Expr::id(map), base_ir);
                    self.add_tcc(&value, &member_decl.ty, fx);
                    return Ok(Lowered::plain(value));
                }
            }
            _ => {}
        }

        match referenced.and_then(|id| model.declaration(id)) {
            Some(Declaration::Variable(var)) => Ok(Lowered::with_address(
                Expr::id(names::map_decl_name(&var.name, var.id)),
                base_ir,
                Callee::Getter,
            )),
            Some(Declaration::Function(fun)) => {
                let name = Expr::id(names::procedure_name(&fun.name, fun.id, fun.kind, fun.contract.id));
                let callee = if fun.in_library() {
                    let through_library = matches!(base.ty, SolType::TypeType { .. })
                        || matches!(
                            base.as_identifier().and_then(|(_, d)| d).and_then(|d| model.declaration(d)),
                            Some(Declaration::Contract(_))
                        );
                    Callee::Library {
                        is_static: through_library,
                    }
                } else {
                    Callee::Plain
                };
                Ok(Lowered::with_address(name, base_ir, callee))
            }
            _ => Ok(self.unsupported(
                loc,
                format!("Member access to '{}' of '{}' is not supported", member, base.ty),
            )),
        }
    }

    fn lower_index_access(
        &mut self,
        expr: &Expression,
        base: &Expression,
        index: Option<&Expression>,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let Some(index) = index else {
            return Ok(self.unsupported(loc, "Index access without an index"));
        };
        let base_ir = self.lower(base, fx)?.expr;
        let index_ir = self.lower(index, fx)?.expr;
        let key_type = match &base.ty {
            SolType::FixedBytes { size } => {
                return Ok(self.index_fixed_bytes(base_ir, *size, index_ir, &index.ty, loc, fx));
            }
            SolType::Array { .. } => SolType::uint(256),
            SolType::Mapping { key, .. } => key.as_ref().clone(),
            other => {
                return Ok(self.unsupported(loc, format!("Index access on '{}' is not supported", other)))
            }
        };
        let key = self.coerce(index_ir, &index.ty, &key_type, loc)?;
        let value = Expr::select(base_ir, key);
        self.add_tcc(&value, &expr.ty, fx);
        Ok(Lowered::plain(value))
    }

    /// Bytes of a `bytesN` value, selected by a case split over the index after asserting it
    /// is in bounds.
    fn index_fixed_bytes(
        &mut self,
        base: ExprRef,
        size: u32,
        index: ExprRef,
        index_type: &SolType,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) -> Lowered {
        let (bits, signed, index) = match index.as_int_literal() {
            Some(value) => (256, false, self.ctx.int_lit(value.clone(), 256)),
            None => {
                let (bits, signed) = self.shape(index_type);
                (bits, signed, index)
            }
        };
        let bound = self.ctx.int_lit(size, bits);
        let in_bounds = self
            .ctx
            .encode_binary(BinaryOperator::Lt, index.clone(), bound, bits, signed, loc)
            .expr;
        fx.stmts.push(Stmt::assert(
            in_bounds,
            names::loc_attrs(loc, "Index may be out of bounds"),
        ));
        if size == 1 {
            return Lowered::plain(base);
        }
        let mut result = Expr::select(base.clone(), self.ctx.int_lit(size - 1, 256));
        for k in (0..size - 1).rev() {
            let at_k = Expr::eq(index.clone(), self.ctx.int_lit(k, bits));
            let byte = Expr::select(base.clone(), self.ctx.int_lit(k, 256));
            result = Expr::cond(at_k, byte, result);
        }
        Lowered::plain(result)
    }

    // ========================================================================
    // Operators
    // ========================================================================

    fn lower_conditional(
        &mut self,
        expr: &Expression,
        condition: &Expression,
        true_expr: &Expression,
        false_expr: &Expression,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        // effects of both branches end up in `fx`, whichever branch is taken
        let cond = self.lower(condition, fx)?.expr;
        let then_value = self.lower(true_expr, fx)?.expr;
        let then_value = self.coerce(then_value, &true_expr.ty, &expr.ty, &expr.loc)?;
        let else_value = self.lower(false_expr, fx)?.expr;
        let else_value = self.coerce(else_value, &false_expr.ty, &expr.ty, &expr.loc)?;
        Ok(Lowered::plain(Expr::cond(cond, then_value, else_value)))
    }

    fn lower_tuple(
        &mut self,
        expr: &Expression,
        components: &[Option<Expression>],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        if let [Some(single)] = components {
            return self.lower(single, fx);
        }
        let mut elements = vec![];
        for component in components {
            match component {
                Some(component) => elements.push(self.lower(component, fx)?.expr),
                None => {
                    return Ok(self.unsupported(&expr.loc, "Omitted tuple components are only supported on the left of an assignment"))
                }
            }
        }
        Ok(Lowered::plain(Expr::tuple(elements)))
    }

    fn lower_unary(
        &mut self,
        expr: &Expression,
        operator: UnaryOperator,
        prefix: bool,
        sub: &Expression,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        match operator {
            UnaryOperator::Not => {
                let operand = self.lower(sub, fx)?.expr;
                Ok(Lowered::plain(Expr::not(operand)))
            }
            UnaryOperator::Plus => self.lower(sub, fx),
            UnaryOperator::Neg | UnaryOperator::BitNot => {
                let operand = self.lower(sub, fx)?.expr;
                let (bits, signed) = self.shape(&expr.ty);
                let result = self.ctx.encode_unary(operator, operand, bits, signed, loc);
                self.record_overflow(result.no_overflow, loc, fx);
                Ok(Lowered::plain(result.expr))
            }
            UnaryOperator::Inc | UnaryOperator::Dec => {
                let target = self.lower(sub, fx)?.expr;
                let (bits, signed) = self.shape(&sub.ty);
                let temp = format!("inc#{}", expr.id);
                let temp_type = self.ctx.map_type(&sub.ty, loc);
                self.declare_local(&temp, temp_type, fx);
                let op = if operator == UnaryOperator::Inc {
                    BinaryOperator::Add
                } else {
                    BinaryOperator::Sub
                };
                let one = self.ctx.int_lit(1, bits);
                let result = self.ctx.encode_binary(op, target.clone(), one, bits, signed, loc);
                if prefix {
                    self.record_overflow(result.no_overflow, loc, fx);
                    self.assign_to(sub, target.clone(), result.expr, fx)?;
                    fx.stmts.push(Stmt::assign(Expr::id(&temp), target));
                } else {
                    fx.stmts.push(Stmt::assign(Expr::id(&temp), target.clone()));
                    self.record_overflow(result.no_overflow, loc, fx);
                    self.assign_to(sub, target, result.expr, fx)?;
                }
                Ok(Lowered::plain(Expr::id(temp)))
            }
            UnaryOperator::Delete => {
                let target = self.lower(sub, fx)?.expr;
                match self.ctx.default_value(&sub.ty) {
                    Some(default) => {
                        self.assign_to(sub, target.clone(), default, fx)?;
                        Ok(Lowered::plain(target))
                    }
                    None => Ok(self.unsupported(
                        loc,
                        format!("Delete is not supported on values of type '{}'", sub.ty),
                    )),
                }
            }
        }
    }

    fn lower_binary(
        &mut self,
        expr: &Expression,
        operator: BinaryOperator,
        lhs: &Expression,
        rhs: &Expression,
        common_type: &SolType,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let lhs_ir = self.lower(lhs, fx)?.expr;
        let rhs_ir = self.lower(rhs, fx)?.expr;
        let value = match operator {
            BinaryOperator::And => Expr::and(lhs_ir, rhs_ir),
            BinaryOperator::Or => Expr::or(lhs_ir, rhs_ir),
            _ => self.encode_operation(
                operator,
                (lhs_ir, &lhs.ty),
                (rhs_ir, &rhs.ty),
                common_type,
                &expr.loc,
                fx,
            )?,
        };
        Ok(Lowered::plain(value))
    }

    /// Converts both operands to `common_type` and encodes the operation on them.
    fn encode_operation(
        &mut self,
        operator: BinaryOperator,
        (lhs, lhs_type): (ExprRef, &SolType),
        (rhs, rhs_type): (ExprRef, &SolType),
        common_type: &SolType,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) -> Result<ExprRef> {
        if matches!(
            operator,
            BinaryOperator::Shl | BinaryOperator::Sar | BinaryOperator::Shr
        ) {
            return Ok(self.encode_shift(operator, lhs, lhs_type, rhs, rhs_type, loc, fx));
        }
        let lhs = self.coerce(lhs, lhs_type, common_type, loc)?;
        let rhs = self.coerce(rhs, rhs_type, common_type, loc)?;
        let Some((bits, signed)) = int_shape(common_type) else {
            return Ok(match operator {
                BinaryOperator::Eq => Expr::eq(lhs, rhs),
                BinaryOperator::Neq => Expr::neq(lhs, rhs),
                _ => {
                    self.unsupported(
                        loc,
                        format!("Operator '{}' is not supported on '{}'", operator.symbol(), common_type),
                    )
                    .expr
                }
            });
        };
        let (lhs, rhs) = if self.ctx.is_bv() {
            (self.fit_literal(lhs, bits), self.fit_literal(rhs, bits))
        } else {
            (lhs, rhs)
        };
        let result = self.ctx.encode_binary(operator, lhs, rhs, bits, signed, loc);
        self.record_overflow(result.no_overflow, loc, fx);
        Ok(result.expr)
    }

    fn fit_literal(&self, expr: ExprRef, bits: u32) -> ExprRef {
        match expr.as_int_literal() {
            Some(value) => self.ctx.int_lit(value.clone(), bits),
            None => expr,
        }
    }

    /// Shifts keep the type of the shifted value. The amount is an unsigned integer of any
    /// width, brought to the width of the value.
    #[allow(clippy::too_many_arguments)]
    fn encode_shift(
        &mut self,
        operator: BinaryOperator,
        value: ExprRef,
        value_type: &SolType,
        amount: ExprRef,
        amount_type: &SolType,
        loc: &SourceLocation,
        fx: &mut SideEffects,
    ) -> ExprRef {
        let (bits, signed) = self.shape(value_type);
        let amount = match amount.as_int_literal() {
            Some(literal) => self.ctx.int_lit(literal.clone(), bits),
            None if self.ctx.is_bv() => {
                let (amount_bits, _) = self.shape(amount_type);
                if amount_bits > bits {
                    return self
                        .unsupported(loc, "Shift amounts wider than the shifted value are not supported")
                        .expr;
                }
                self.ctx.bv_extend(amount, amount_bits, bits, false)
            }
            None => amount,
        };
        let result = self.ctx.encode_binary(operator, value, amount, bits, signed, loc);
        self.record_overflow(result.no_overflow, loc, fx);
        result.expr
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn lower_assignment(
        &mut self,
        expr: &Expression,
        operator: AssignmentOperator,
        lhs: &Expression,
        rhs: &Expression,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let lhs = lhs.unparenthesized();
        if let ExpressionKind::Tuple { components } = &lhs.kind {
            return self.lower_tuple_assignment(expr, components, rhs, fx);
        }
        let target = self.lower(lhs, fx)?.expr;
        let value = self.lower(rhs, fx)?.expr;

        if matches!(lhs.ty, SolType::Struct { .. }) {
            if operator != AssignmentOperator::Assign {
                return Ok(self.unsupported(loc, "Compound assignment to structs is not supported"));
            }
            self.copy_struct(target.clone(), &lhs.ty, value, &rhs.ty, loc, fx)?;
            return Ok(Lowered::plain(target));
        }

        let value = match operator.binary_operator() {
            None => self.coerce(value, &rhs.ty, &lhs.ty, loc)?,
            Some(op) => self.encode_operation(
                op,
                (target.clone(), &lhs.ty),
                (value, &rhs.ty),
                &lhs.ty,
                loc,
                fx,
            )?,
        };
        self.assign_to(lhs, target.clone(), value.clone(), fx)?;
        if matches!(lhs.ty, SolType::Array { .. }) && operator == AssignmentOperator::Assign {
            self.copy_length(&target, &value, loc, fx);
        }
        Ok(Lowered::plain(target))
    }

    /// `(a, b) = e`. Identifiers are assigned in parallel, anything else goes through
    /// temporaries so that later values see the state before the assignment.
    fn lower_tuple_assignment(
        &mut self,
        expr: &Expression,
        components: &[Option<Expression>],
        rhs: &Expression,
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let rhs_ir = self.lower(rhs, fx)?.expr;
        let values = Expr::tuple_elements(&rhs_ir);
        let value_types = rhs.ty.components();
        if values.len() != components.len() {
            return Err(TranslationError::invariant(
                loc,
                format!(
                    "Tuple assignment of {} values to {} targets",
                    values.len(),
                    components.len()
                ),
            ));
        }

        let mut targets = vec![];
        for (i, (component, value)) in components.iter().zip(values).enumerate() {
            let Some(component) = component else { continue };
            let target = self.lower(component, fx)?.expr;
            let value_type = value_types.get(i).unwrap_or(&component.ty).clone();
            // struct values keep their own location
            let (value, value_type) = if matches!(component.ty, SolType::Struct { .. }) {
                (value, value_type)
            } else {
                let value = self.coerce(value, &value_type, &component.ty, loc)?;
                (value, component.ty.clone())
            };
            targets.push((component, target, value, value_type));
        }

        let parallel = targets.iter().all(|(component, target, _, _)| {
            target.as_identifier().is_some() && !matches!(component.ty, SolType::Struct { .. })
        });
        if parallel {
            let (lhs, rhs): (Vec<_>, Vec<_>) = targets
                .iter()
                .map(|(_, target, value, _)| (target.clone(), value.clone()))
                .unzip();
            if !lhs.is_empty() {
                fx.stmts.push(Stmt::assign_many(lhs, rhs));
            }
        } else {
            let mut temps = vec![];
            for (i, (_, _, value, value_type)) in targets.iter().enumerate() {
                let temp = format!("tmp#{}#{}", expr.id, i);
                let temp_type = self.ctx.map_type(value_type, loc);
                self.declare_local(&temp, temp_type, fx);
                fx.stmts.push(Stmt::assign(Expr::id(&temp), value.clone()));
                temps.push(Expr::id(temp));
            }
            for ((component, target, _, value_type), temp) in targets.iter().zip(temps) {
                if matches!(component.ty, SolType::Struct { .. }) {
                    self.copy_struct(target.clone(), &component.ty, temp, value_type, loc, fx)?;
                } else {
                    self.assign_to(component, target.clone(), temp, fx)?;
                }
            }
        }
        let results = targets.into_iter().map(|(_, target, _, _)| target).collect();
        Ok(Lowered::plain(Expr::tuple(results)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Encoding;
    use solidity_ast::{AstBuilder, ContractNode, SourceModel};

    #[test]
    fn state_variables_are_selected_by_receiver() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.state_var("x", SolType::uint(8));
        let contract = b.contract("A", vec![ContractNode::StateVariable(x.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let read = b.ident(&x);

        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&read).unwrap();
        let name = format!("x#{}", x.id);
        assert_eq!(converted.expr.to_string(), format!("{}[__this]", name));
        assert_eq!(
            converted.tccs[0].to_string(),
            format!("((0 <= {0}[__this]) && ({0}[__this] < 256))", name)
        );
        assert!(!converted.has_side_effects());
    }

    #[test]
    fn literal_subexpressions_fold() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        let two = b.number(2);
        let three = b.number(3);
        let mut sum = b.binary(BinaryOperator::Add, two, three);
        sum.ty = SolType::rational(5);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert_as(&sum, &SolType::uint(8)).unwrap();
        assert_eq!(converted.expr.to_string(), "5bv8");
    }

    #[test]
    fn identical_expressions_translate_identically() {
        let mut b = AstBuilder::new("A.sol");
        let a = b.param("a", SolType::int(16));
        let body = b.block(vec![]);
        let f = b.function("f", vec![a.clone()], vec![], body);
        let contract = b.contract("A", vec![ContractNode::Function(f)]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let lhs = b.ident(&a);
        let rhs = b.ident(&a);
        let product = b.binary(BinaryOperator::Mul, lhs, rhs);
        let render = |encoding| {
            let mut ctx = BoogieContext::with_encoding(&model, encoding, true);
            let converted = ExpressionTranslator::new(&mut ctx).convert(&product).unwrap();
            (converted.expr.to_string(), converted.stmts.len())
        };
        assert_eq!(render(Encoding::Bv), render(Encoding::Bv));
        assert_eq!(render(Encoding::Mod), render(Encoding::Mod));
        assert_eq!(render(Encoding::Bv).1, 1);
    }

    #[test]
    fn address_literals_are_minted_per_occurrence() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        let first = b.address_lit("0x12");
        let second = b.address_lit("0x12");
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let mut translator = ExpressionTranslator::new(&mut ctx);
        let c1 = translator.convert(&first).unwrap();
        let c2 = translator.convert(&second).unwrap();
        assert_ne!(c1.expr, c2.expr);
        assert_eq!(c1.constants.len(), 1);
        assert_eq!(c1.constants[0].to_string(), format!("const address_0x12#{}: address_t;\n", first.id));
    }
}
