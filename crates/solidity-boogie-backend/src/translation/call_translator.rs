// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Function calls, built-in functions, type conversions and contract creation.
//!
//! Procedure calls are statements in Boogie. Each call is emitted as a call statement whose
//! results are bound to fresh locals, and the call expression evaluates to those locals.

use super::{Callee, ExpressionTranslator, Lowered, SideEffects};
use crate::{
    arithmetic::int_shape,
    error::{Result, TranslationError},
    helpers::HelperProcedure,
    names,
    options::Encoding,
};
use boogie_ast::{Block, Expr, ExprRef, Stmt};
use log::debug;
use num::Zero;
use solidity_ast::{
    model::magic, BinaryOperator, Expression, ExpressionKind, FunctionCallKind, NodeId, SolType,
    SourceLocation,
};

/// Parameter and return types a call is checked against
struct Signature {
    params: Vec<SolType>,
    returns: Vec<SolType>,
}

/// Built-in functions handled without a procedure call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Builtin {
    Assert,
    Require,
    Revert,
    Sum,
    Old,
}

impl Builtin {
    fn of(callee: &Expression) -> Option<Self> {
        let (name, decl) = callee.as_identifier()?;
        match decl {
            Some(magic::ASSERT) => return Some(Builtin::Assert),
            Some(magic::REQUIRE) => return Some(Builtin::Require),
            Some(magic::REVERT) => return Some(Builtin::Revert),
            _ => {}
        }
        if name.starts_with(names::VERIFIER_SUM) {
            Some(Builtin::Sum)
        } else if name.starts_with(names::VERIFIER_OLD) {
            Some(Builtin::Old)
        } else {
            None
        }
    }
}

/// Declaration a callee expression refers to
fn referenced_declaration(callee: &Expression) -> Option<NodeId> {
    match &callee.unparenthesized().kind {
        ExpressionKind::Identifier {
            referenced_declaration,
            ..
        }
        | ExpressionKind::MemberAccess {
            referenced_declaration,
            ..
        } => *referenced_declaration,
        _ => None,
    }
}

impl<'a, 'env> ExpressionTranslator<'a, 'env> {
    pub(crate) fn lower_call(
        &mut self,
        expr: &Expression,
        kind: FunctionCallKind,
        callee: &Expression,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        match kind {
            FunctionCallKind::TypeConversion => return self.lower_type_conversion(expr, args, fx),
            FunctionCallKind::StructConstructorCall => return self.construct_struct(expr, args, fx),
            FunctionCallKind::FunctionCall => {}
        }

        if let Some(builtin) = Builtin::of(callee) {
            return self.lower_builtin(expr, builtin, args, fx);
        }

        // `f.value(v)` and `f.gas(g)` evaluate to `f` with the call options attached
        if let ExpressionKind::MemberAccess {
            expression: inner,
            member_name,
            ..
        } = &callee.kind
        {
            if matches!(inner.ty, SolType::Function { .. }) {
                match member_name.as_str() {
                    "value" => {
                        let [amount] = args else {
                            return Err(TranslationError::arity(&expr.loc, "value", "1", args.len()));
                        };
                        let mut lowered = self.lower(inner, fx)?;
                        let value = self.lower(amount, fx)?.expr;
                        let value = self.coerce(value, &amount.ty, &SolType::uint(256), &expr.loc)?;
                        lowered.value = Some(value);
                        return Ok(lowered);
                    }
                    "gas" => {
                        self.ctx
                            .report_warning(&callee.loc, "Ignored call to gas() function");
                        return self.lower(inner, fx);
                    }
                    _ => {}
                }
            }
        }

        if let ExpressionKind::New { type_name } = &callee.kind {
            return self.lower_new(expr, type_name, args, fx);
        }

        let target = self.lower(callee, fx)?;
        match target.callee {
            Callee::Getter => self.lower_getter(expr, callee, target, args, fx),
            _ => self.lower_procedure_call(expr, callee, target, args, fx),
        }
    }

    // ========================================================================
    // Built-in functions
    // ========================================================================

    fn lower_builtin(
        &mut self,
        expr: &Expression,
        builtin: Builtin,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        match builtin {
            Builtin::Assert => {
                let [cond] = args else {
                    return Err(TranslationError::arity(loc, "assert", "1", args.len()));
                };
                let cond = self.lower(cond, fx)?.expr;
                fx.stmts.push(Stmt::assert(
                    cond,
                    names::loc_attrs(loc, "Assertion might not hold."),
                ));
            }
            Builtin::Require => {
                if args.is_empty() || args.len() > 2 {
                    return Err(TranslationError::arity(loc, "require", "1 or 2", args.len()));
                }
                // the optional message is not translated
                let cond = self.lower(&args[0], fx)?.expr;
                fx.stmts.push(Stmt::assume(cond));
            }
            Builtin::Revert => {
                if args.len() > 1 {
                    return Err(TranslationError::arity(loc, "revert", "at most 1", args.len()));
                }
                fx.stmts.push(Stmt::assume(Expr::bool(false)));
            }
            Builtin::Sum => return self.lower_sum(expr, args),
            Builtin::Old => {
                let [inner] = args else {
                    return Err(TranslationError::arity(loc, names::VERIFIER_OLD, "1", args.len()));
                };
                let inner = self.lower(inner, fx)?.expr;
                return Ok(Lowered::plain(Expr::old(inner)));
            }
        }
        Ok(Lowered::plain(Expr::tuple(vec![])))
    }

    /// `__verifier_sum(c)` reads the sum shadow of the state variable `c`, which is maintained
    /// on every write to `c` from now on.
    fn lower_sum(&mut self, expr: &Expression, args: &[Expression]) -> Result<Lowered> {
        let loc = &expr.loc;
        let [collection] = args else {
            return Err(TranslationError::arity(loc, names::VERIFIER_SUM, "1", args.len()));
        };
        if !matches!(
            collection.ty,
            SolType::Mapping { .. } | SolType::Array { .. }
        ) {
            return Ok(self.unsupported(loc, "Argument of sum must be an array or a mapping"));
        }
        let model = self.ctx.model();
        let var = collection
            .as_identifier()
            .and_then(|(_, decl)| decl)
            .and_then(|decl| model.variable(decl))
            .filter(|var| var.is_state_variable);
        let Some(var) = var else {
            return Ok(self.unsupported(loc, "Argument of sum must be a state variable identifier"));
        };
        let sum = self
            .ctx
            .register_sum(var.id, &names::map_decl_name(&var.name, var.id));
        Ok(Lowered::plain(Expr::select(Expr::id(sum), self.ctx.this_expr())))
    }

    // ========================================================================
    // Getters and procedure calls
    // ========================================================================

    /// Public state variables are read directly instead of calling their accessor.
    fn lower_getter(
        &mut self,
        expr: &Expression,
        callee: &Expression,
        target: Lowered,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let address = target.address.unwrap_or_else(|| self.ctx.this_expr());
        let mut value = Expr::select(target.expr, address);
        let param_types = match &callee.ty {
            SolType::Function { params, .. } => params.clone(),
            _ => vec![],
        };
        if param_types.len() != args.len() {
            return Ok(self.unsupported(&expr.loc, "Getter arguments do not match the accessor"));
        }
        for (arg, param_type) in args.iter().zip(&param_types) {
            let key = self.lower(arg, fx)?.expr;
            let key = self.coerce(key, &arg.ty, param_type, &expr.loc)?;
            value = Expr::select(value, key);
        }
        self.add_tcc(&value, &expr.ty, fx);
        Ok(Lowered::plain(value))
    }

    fn signature(&self, callee: &Expression, target: &Lowered) -> Signature {
        let uint256 = SolType::uint(256);
        match target.callee {
            Callee::Helper(HelperProcedure::Transfer) => {
                return Signature {
                    params: vec![uint256],
                    returns: vec![],
                }
            }
            Callee::Helper(HelperProcedure::Send) => {
                return Signature {
                    params: vec![uint256],
                    returns: vec![SolType::Bool],
                }
            }
            Callee::Helper(HelperProcedure::Call) => {
                return Signature {
                    params: vec![],
                    returns: vec![SolType::Bool],
                }
            }
            _ => {}
        }
        let model = self.ctx.model();
        if let Some(fun) = referenced_declaration(callee).and_then(|id| model.function(id)) {
            let skip = usize::from(matches!(target.callee, Callee::Library { is_static: false }));
            return Signature {
                params: fun.params.iter().skip(skip).map(|p| p.ty.clone()).collect(),
                returns: fun.returns.iter().map(|r| r.ty.clone()).collect(),
            };
        }
        match &callee.ty {
            SolType::Function { params, returns } => Signature {
                params: params.clone(),
                returns: returns.clone(),
            },
            _ => Signature {
                params: vec![],
                returns: vec![],
            },
        }
    }

    fn lower_procedure_call(
        &mut self,
        expr: &Expression,
        callee: &Expression,
        target: Lowered,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let Some(procedure) = target.expr.as_identifier().map(str::to_string) else {
            return Ok(self.unsupported(loc, "Only identifiers are supported as function calls"));
        };
        let signature = self.signature(callee, &target);
        let is_call = target.callee == Callee::Helper(HelperProcedure::Call);
        let this = self.ctx.this_expr();

        let receiver = match (target.callee, &target.address) {
            (Callee::Library { .. }, _) | (_, None) => this.clone(),
            (_, Some(address)) => address.clone(),
        };
        let value = target.value.clone().unwrap_or_else(|| self.ctx.int_lit(0, 256));
        let mut call_args = vec![receiver, this.clone(), value];
        if target.callee == (Callee::Library { is_static: false }) {
            call_args.push(target.address.clone().unwrap_or_else(|| this.clone()));
        }

        // the arguments of a low-level call are not modelled
        if !is_call {
            if args.len() != signature.params.len() {
                return Err(TranslationError::invariant(
                    loc,
                    format!(
                        "Call to `{}` with {} arguments, expected {}",
                        procedure,
                        args.len(),
                        signature.params.len()
                    ),
                ));
            }
            for (arg, param_type) in args.iter().zip(&signature.params) {
                let value = self.lower(arg, fx)?.expr;
                let value = self.coerce(value, &arg.ty, param_type, &arg.loc)?;
                let is_array = matches!(arg.ty, SolType::Array { .. });
                call_args.push(value.clone());
                if is_array {
                    call_args.push(self.length_of(&value, &arg.loc));
                }
            }
        }

        let mut results = vec![];
        let mut values: Vec<ExprRef> = vec![];
        for (k, ret) in signature.returns.iter().enumerate() {
            let name = if signature.returns.len() == 1 {
                format!("{}#{}", procedure, expr.id)
            } else {
                format!("{}#{}#{}", procedure, expr.id, k)
            };
            let ty = self.ctx.map_type(ret, loc);
            self.declare_local(&name, ty, fx);
            results.push(name.clone());
            values.push(Expr::id(&name));
            if matches!(ret, SolType::Array { .. }) {
                let length = names::length_name(&name);
                let length_type = self.ctx.int_type(256);
                self.declare_local(&length, length_type, fx);
                results.push(length);
            }
        }

        if is_call {
            // `(bool success, bytes data) = a.call(..)` also binds the returned data
            if let SolType::Tuple { components } = &expr.ty {
                if let [_, data] = components.as_slice() {
                    let name = format!("{}#{}#data", procedure, expr.id);
                    let ty = self.ctx.map_type(data, loc);
                    self.declare_local(&name, ty, fx);
                }
            }
        }

        if is_call {
            self.check_invariants_before_call(loc, fx);
        }
        if let Some(value) = &target.value {
            self.debit(value.clone(), loc, fx);
        }

        debug!("call to `{}` at {}", procedure, loc);
        fx.stmts.push(Stmt::call(procedure, call_args, results.clone()));

        if is_call {
            for invariant in self.ctx.invariants() {
                fx.stmts.push(Stmt::assume(invariant.expr.clone()));
            }
            if let (Some(value), Some(success)) = (&target.value, results.first()) {
                let credit = self.balance_change(BinaryOperator::Add, value.clone(), loc);
                fx.stmts.push(Stmt::if_then(
                    Expr::not(Expr::id(success)),
                    Block::new(vec![credit]),
                ));
            }
        }

        if is_call {
            if let SolType::Tuple { components } = &expr.ty {
                if components.len() == 2 {
                    values.push(Expr::id(format!("{}#{}#data", names::CALL, expr.id)));
                }
            }
        }
        Ok(Lowered::plain(match values.len() {
            1 => values.remove(0),
            _ => Expr::tuple(values),
        }))
    }

    fn check_invariants_before_call(&mut self, loc: &SourceLocation, fx: &mut SideEffects) {
        for invariant in self.ctx.invariants() {
            fx.stmts.push(Stmt::assert(
                invariant.expr.clone(),
                names::loc_attrs(
                    loc,
                    format!(
                        "Invariant '{}' might not hold before external call.",
                        invariant.text
                    ),
                ),
            ));
            fx.stmts.push(Stmt::assume(invariant.expr.clone()));
        }
    }

    /// Sending ether along with a call takes it from the balance of the calling contract.
    fn debit(&mut self, value: ExprRef, loc: &SourceLocation, fx: &mut SideEffects) {
        let balance = self.ctx.balance_of(self.ctx.this_expr());
        let enough = self
            .ctx
            .encode_binary(BinaryOperator::Gte, balance, value.clone(), 256, false, loc)
            .expr;
        fx.stmts.push(Stmt::assert(
            enough,
            names::loc_attrs(loc, "Calling payable function might fail due to insufficient ether"),
        ));
        let debit = self.balance_change(BinaryOperator::Sub, value, loc);
        fx.stmts.push(debit);
    }

    fn balance_change(&mut self, op: BinaryOperator, value: ExprRef, loc: &SourceLocation) -> Stmt {
        let this = self.ctx.this_expr();
        let balance = self.ctx.balance_of(this.clone());
        let updated = self.ctx.encode_binary(op, balance, value, 256, false, loc).expr;
        Stmt::assign(
            Expr::id(names::BALANCE),
            Expr::update(Expr::id(names::BALANCE), this, updated),
        )
    }

    // ========================================================================
    // Contract creation
    // ========================================================================

    /// `new C(args)` picks a fresh address and runs the constructor of `C` on it.
    fn lower_new(
        &mut self,
        expr: &Expression,
        type_name: &SolType,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let model = self.ctx.model();
        let Some(contract) = model.contract_of_type(type_name) else {
            return Ok(self.unsupported(loc, format!("Cannot create instances of '{}'", type_name)));
        };
        let constructor = contract.constructor();
        let param_types: Vec<SolType> = constructor
            .map(|c| c.params.iter().map(|p| p.ty.clone()).collect())
            .unwrap_or_default();
        if param_types.len() != args.len() {
            return Err(TranslationError::invariant(
                loc,
                format!(
                    "Creation of `{}` with {} arguments, expected {}",
                    contract.name,
                    args.len(),
                    param_types.len()
                ),
            ));
        }

        let address = format!("new#{}", expr.id);
        let address_type = self.ctx.address_type();
        self.declare_local(&address, address_type, fx);
        let mut call_args = vec![
            Expr::id(&address),
            self.ctx.this_expr(),
            self.ctx.int_lit(0, 256),
        ];
        for (arg, param_type) in args.iter().zip(&param_types) {
            let value = self.lower(arg, fx)?.expr;
            let value = self.coerce(value, &arg.ty, param_type, &arg.loc)?;
            let is_array = matches!(arg.ty, SolType::Array { .. });
            call_args.push(value.clone());
            if is_array {
                call_args.push(self.length_of(&value, &arg.loc));
            }
        }
        fx.stmts.push(Stmt::Havoc(vec![address.clone()]));
        fx.stmts.push(Stmt::call(
            names::constructor_name(contract.id),
            call_args,
            vec![],
        ));
        Ok(Lowered {
            callee: Callee::Constructor,
            ..Lowered::plain(Expr::id(address))
        })
    }

    // ========================================================================
    // Type conversions
    // ========================================================================

    fn lower_type_conversion(
        &mut self,
        expr: &Expression,
        args: &[Expression],
        fx: &mut SideEffects,
    ) -> Result<Lowered> {
        let loc = &expr.loc;
        let [arg] = args else {
            return Err(TranslationError::arity(loc, "type conversion", "1", args.len()));
        };
        let target = &expr.ty;
        let value = self.lower(arg, fx)?.expr;

        if let Some(number) = arg.ty.rational_value() {
            return Ok(Lowered::plain(match target {
                SolType::Address { .. } | SolType::Contract { .. } if number.is_zero() => {
                    Expr::id(names::ZERO_ADDRESS)
                }
                SolType::Address { .. } | SolType::Contract { .. } => {
                    return Ok(self.unsupported(
                        loc,
                        "Conversion of nonzero literals to addresses is not supported",
                    ))
                }
                _ => match int_shape(target) {
                    Some((bits, _)) => self.ctx.int_lit(number, bits),
                    None => value,
                },
            }));
        }

        if matches!(target, SolType::Address { .. } | SolType::Contract { .. })
            && matches!(arg.ty, SolType::Address { .. } | SolType::Contract { .. })
        {
            return Ok(Lowered::plain(value));
        }
        if arg.ty == *target {
            return Ok(Lowered::plain(value));
        }

        match (int_shape(&arg.ty), target) {
            (Some((from_bits, from_signed)), SolType::Enum { def, .. }) => {
                let members = self
                    .ctx
                    .model()
                    .enum_definition(*def)
                    .map(|e| e.members.len())
                    .unwrap_or(0);
                let zero = self.ctx.int_lit(0, from_bits);
                let count = self.ctx.int_lit(members, from_bits);
                let non_negative = self
                    .ctx
                    .encode_binary(BinaryOperator::Lte, zero, value.clone(), from_bits, from_signed, loc)
                    .expr;
                let below_count = self
                    .ctx
                    .encode_binary(BinaryOperator::Lt, value.clone(), count, from_bits, from_signed, loc)
                    .expr;
                let in_range = Expr::and(non_negative, below_count);
                fx.stmts.push(Stmt::assert(
                    in_range,
                    names::loc_attrs(loc, "Conversion to enum might be out of range"),
                ));
                Ok(Lowered::plain(self.resize(value, from_bits, from_signed, 8, false)))
            }
            (Some((from_bits, from_signed)), SolType::Integer { bits, signed }) => {
                Ok(Lowered::plain(self.resize(value, from_bits, from_signed, *bits, *signed)))
            }
            _ => Ok(self.unsupported(
                loc,
                format!("Unsupported type conversion from '{}' to '{}'", arg.ty, target),
            )),
        }
    }

    /// Explicit integer conversion: wraps in bitvector and modular encodings, keeps the value
    /// with unbounded integers.
    fn resize(&mut self, value: ExprRef, from_bits: u32, from_signed: bool, to_bits: u32, to_signed: bool) -> ExprRef {
        if self.ctx.is_bv() {
            return self.ctx.bv_resize(value, from_bits, from_signed, to_bits);
        }
        if self.ctx.encoding() == Encoding::Mod
            && (to_bits < from_bits || from_signed != to_signed)
        {
            return self.ctx.normalized(value, to_bits, to_signed).expr;
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::BoogieContext;
    use boogie_ast::{Decl, Type};
    use solidity_ast::{AstBuilder, ContractNode, SourceModel};

    #[test]
    fn assert_becomes_assertion() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        b.set_line(7);
        let callee = b.builtin("assert");
        let cond = b.bool_lit(true);
        let call = b.call(callee, vec![cond], SolType::tuple(vec![]));
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&call).unwrap();
        assert_eq!(converted.stmts.len(), 1);
        assert_eq!(
            converted.stmts[0].to_string(),
            "assert {:sourceloc \"A.sol\", 7, 1} {:message \"Assertion might not hold.\"} true;\n"
        );
    }

    #[test]
    fn builtin_arity_is_checked() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        let callee = b.builtin("assert");
        let call = b.call(callee, vec![], SolType::tuple(vec![]));
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let err = ExpressionTranslator::new(&mut ctx).convert(&call).unwrap_err();
        assert!(matches!(err, TranslationError::StructuralArityError { found: 0, .. }));

        let callee = b.builtin("require");
        let args = vec![b.bool_lit(true), b.string_lit("a"), b.string_lit("b")];
        let call = b.call(callee, args, SolType::tuple(vec![]));
        let err = ExpressionTranslator::new(&mut ctx).convert(&call).unwrap_err();
        assert!(matches!(err, TranslationError::StructuralArityError { found: 3, .. }));
    }

    #[test]
    fn require_and_revert_assume() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        let callee = b.builtin("require");
        let args = vec![b.bool_lit(false), b.string_lit("reason")];
        let require = b.call(callee, args, SolType::tuple(vec![]));
        let callee = b.builtin("revert");
        let revert = b.call(callee, vec![], SolType::tuple(vec![]));
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let mut translator = ExpressionTranslator::new(&mut ctx);
        let converted = translator.convert(&require).unwrap();
        assert_eq!(converted.stmts[0].to_string(), "assume false;\n");
        let converted = translator.convert(&revert).unwrap();
        assert_eq!(converted.stmts[0].to_string(), "assume false;\n");
    }

    #[test]
    fn internal_call_binds_result() {
        let mut b = AstBuilder::new("A.sol");
        let p = b.param("p", SolType::uint(8));
        let r = b.param("r", SolType::uint(8));
        let body = b.block(vec![]);
        let f = b.function("f", vec![p], vec![r], body);
        let arg = b.number(3);
        let call = b.call_function(&f, vec![arg]);
        let contract = b.contract("A", vec![ContractNode::Function(f.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);

        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&call).unwrap();
        let result = format!("f#{}#{}", f.id, call.id);
        assert_eq!(converted.expr.to_string(), result);
        assert_eq!(converted.decls, vec![Decl::variable(&result, Type::Bv(8))]);
        assert_eq!(
            converted.stmts[0].to_string(),
            format!("call {} := f#{}(__this, __this, 0bv256, 3bv8);\n", result, f.id)
        );
    }

    #[test]
    fn conversion_to_smaller_type_truncates() {
        let mut b = AstBuilder::new("A.sol");
        let x = b.state_var("x", SolType::uint(16));
        let contract = b.contract("A", vec![ContractNode::StateVariable(x.clone())]);
        let unit = b.source_unit(vec![contract]);
        let model = SourceModel::new(vec![unit]);
        let arg = b.ident(&x);
        let conversion = b.type_conversion(SolType::uint(8), arg);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&conversion).unwrap();
        assert_eq!(
            converted.expr.to_string(),
            format!("bv16extract7to0(x#{}[__this])", x.id)
        );
        assert_eq!(ctx.program().count_decls("bv16extract7to0"), 1);
        assert!(!ctx.diagnostics().has_errors());
    }

    #[test]
    fn zero_literal_converts_to_zero_address() {
        let model = SourceModel::default();
        let mut b = AstBuilder::new("A.sol");
        let zero = b.number(0);
        let conversion = b.type_conversion(SolType::address(), zero);
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        let converted = ExpressionTranslator::new(&mut ctx).convert(&conversion).unwrap();
        assert_eq!(converted.expr.to_string(), names::ZERO_ADDRESS);
    }
}
