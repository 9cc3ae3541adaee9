// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Encoding of Solidity arithmetic in the three integer representations.
//!
//! Every operation yields its result together with an optional side condition that holds
//! exactly when the operation did not overflow:
//! - `int`: unbounded integers, no side conditions.
//! - `bv`: operations on bitvectors of the operand width. The side condition compares the
//!   result, extended by enough bits, with the operation performed on extended operands, where
//!   it cannot wrap.
//! - `mod`: unbounded integers normalized modulo 2^width. The side condition states that the
//!   mathematical result is in the range of the type.

use crate::{
    context::BoogieContext,
    error::{Result, TranslationError},
    names,
    options::Encoding,
};
use boogie_ast::{Attr, Binding, Decl, Expr, ExprRef, Literal, Type};
use num::{BigInt, One, ToPrimitive};
use solidity_ast::{BinaryOperator, SolType, SourceLocation, UnaryOperator};

/// Encoded operation together with the condition under which it did not overflow
#[derive(Debug, Clone)]
pub struct ArithResult {
    pub expr: ExprRef,
    pub no_overflow: Option<ExprRef>,
}

impl ArithResult {
    fn exact(expr: ExprRef) -> Self {
        Self {
            expr,
            no_overflow: None,
        }
    }

    fn checked(expr: ExprRef, no_overflow: ExprRef) -> Self {
        Self {
            expr,
            no_overflow: Some(no_overflow),
        }
    }
}

/// Width and signedness of the values of a type, as far as arithmetic is concerned
pub fn int_shape(ty: &SolType) -> Option<(u32, bool)> {
    match ty {
        SolType::Integer { bits, signed } => Some((*bits, *signed)),
        SolType::Enum { .. } => Some((8, false)),
        SolType::FixedBytes { size: 1 } => Some((8, false)),
        _ => None,
    }
}

/// Value of an integer or bitvector literal
pub fn literal_value(expr: &ExprRef) -> Option<BigInt> {
    match expr.as_ref() {
        Expr::Literal(Literal::Int(value)) => Some(value.clone()),
        Expr::Literal(Literal::Bv { value, .. }) => Some(value.clone()),
        _ => None,
    }
}

fn pow2(bits: u32) -> BigInt {
    BigInt::one() << bits
}

fn error_expr() -> ExprRef {
    Expr::id(names::ERR_EXPR)
}

impl<'env> BoogieContext<'env> {
    // ========================================================================
    // Operators
    // ========================================================================

    pub fn encode_binary(
        &mut self,
        op: BinaryOperator,
        lhs: ExprRef,
        rhs: ExprRef,
        bits: u32,
        signed: bool,
        loc: &SourceLocation,
    ) -> ArithResult {
        use BinaryOperator::*;
        match op {
            And => return ArithResult::exact(Expr::and(lhs, rhs)),
            Or => return ArithResult::exact(Expr::or(lhs, rhs)),
            Eq => return ArithResult::exact(Expr::eq(lhs, rhs)),
            Neq => return ArithResult::exact(Expr::neq(lhs, rhs)),
            Exp => return self.fold_exp(lhs, rhs, bits, loc),
            _ => {}
        }
        match self.encoding() {
            Encoding::Int => match op {
                Add => ArithResult::exact(Expr::plus(lhs, rhs)),
                Sub => ArithResult::exact(Expr::minus(lhs, rhs)),
                Mul => ArithResult::exact(Expr::times(lhs, rhs)),
                Div => ArithResult::exact(Expr::int_div(lhs, rhs)),
                Mod => ArithResult::exact(Expr::modulo(lhs, rhs)),
                Lt => ArithResult::exact(Expr::lt(lhs, rhs)),
                Gt => ArithResult::exact(Expr::gt(lhs, rhs)),
                Lte => ArithResult::exact(Expr::lte(lhs, rhs)),
                Gte => ArithResult::exact(Expr::gte(lhs, rhs)),
                _ => self.unsupported_operator(op.symbol(), loc),
            },
            Encoding::Mod => match op {
                Add => self.normalized(Expr::plus(lhs, rhs), bits, signed),
                Sub => self.normalized(Expr::minus(lhs, rhs), bits, signed),
                Mul => self.normalized(Expr::times(lhs, rhs), bits, signed),
                Div if signed => self.normalized(Expr::int_div(lhs, rhs), bits, signed),
                Div => ArithResult::exact(Expr::int_div(lhs, rhs)),
                Mod => ArithResult::exact(Expr::modulo(lhs, rhs)),
                Lt => ArithResult::exact(Expr::lt(lhs, rhs)),
                Gt => ArithResult::exact(Expr::gt(lhs, rhs)),
                Lte => ArithResult::exact(Expr::lte(lhs, rhs)),
                Gte => ArithResult::exact(Expr::gte(lhs, rhs)),
                _ => self.unsupported_operator(op.symbol(), loc),
            },
            Encoding::Bv => self.encode_bv_binary(op, lhs, rhs, bits, signed, loc),
        }
    }

    fn encode_bv_binary(
        &mut self,
        op: BinaryOperator,
        lhs: ExprRef,
        rhs: ExprRef,
        bits: u32,
        signed: bool,
        loc: &SourceLocation,
    ) -> ArithResult {
        use BinaryOperator::*;
        let cmp = |s: &'static str, u: &'static str| if signed { s } else { u };
        let name = match op {
            Add => "add",
            Sub => "sub",
            Mul => "mul",
            Div => cmp("sdiv", "udiv"),
            Mod => cmp("srem", "urem"),
            BitAnd => "and",
            BitOr => "or",
            BitXor => "xor",
            Shl => "shl",
            Sar => cmp("ashr", "lshr"),
            Shr => "lshr",
            Lt => cmp("slt", "ult"),
            Gt => cmp("sgt", "ugt"),
            Lte => cmp("sle", "ule"),
            Gte => cmp("sge", "uge"),
            _ => return self.unsupported_operator(op.symbol(), loc),
        };
        if op.is_comparison() {
            return ArithResult::exact(self.bv_binary(name, bits, lhs, rhs, true));
        }
        let result = self.bv_binary(name, bits, lhs.clone(), rhs.clone(), false);
        let ext_bits = match op {
            Add | Sub => bits + 1,
            Mul => 2 * bits,
            Div if signed => bits + 1,
            _ => return ArithResult::exact(result),
        };
        let ext_lhs = self.bv_extend(lhs, bits, ext_bits, signed);
        let ext_rhs = self.bv_extend(rhs, bits, ext_bits, signed);
        let ext_result = self.bv_extend(result.clone(), bits, ext_bits, signed);
        let wide = self.bv_binary(name, ext_bits, ext_lhs, ext_rhs, false);
        ArithResult::checked(result, Expr::eq(ext_result, wide))
    }

    pub fn encode_unary(
        &mut self,
        op: UnaryOperator,
        operand: ExprRef,
        bits: u32,
        signed: bool,
        loc: &SourceLocation,
    ) -> ArithResult {
        match (op, self.encoding()) {
            (UnaryOperator::Neg, Encoding::Int) => ArithResult::exact(Expr::neg(operand)),
            (UnaryOperator::Neg, Encoding::Mod) => self.normalized(Expr::neg(operand), bits, signed),
            (UnaryOperator::Neg, Encoding::Bv) => {
                let result = self.bv_unary("neg", bits, operand.clone());
                let ext_operand = self.bv_extend(operand, bits, bits + 1, signed);
                let ext_result = self.bv_extend(result.clone(), bits, bits + 1, signed);
                let wide = self.bv_unary("neg", bits + 1, ext_operand);
                ArithResult::checked(result, Expr::eq(ext_result, wide))
            }
            (UnaryOperator::BitNot, Encoding::Bv) => {
                ArithResult::exact(self.bv_unary("not", bits, operand))
            }
            (UnaryOperator::Not, _) => ArithResult::exact(Expr::not(operand)),
            (UnaryOperator::Plus, _) => ArithResult::exact(operand),
            (op, _) => self.unsupported_operator(&format!("{:?}", op), loc),
        }
    }

    fn unsupported_operator(&mut self, op: &str, loc: &SourceLocation) -> ArithResult {
        let message = format!(
            "Unsupported operator '{}' in '{}' encoding",
            op,
            self.encoding()
        );
        self.report_unsupported(loc, message);
        ArithResult::exact(error_expr())
    }

    /// `**` is only supported on literals
    fn fold_exp(&mut self, lhs: ExprRef, rhs: ExprRef, bits: u32, loc: &SourceLocation) -> ArithResult {
        let folded = literal_value(&lhs).zip(literal_value(&rhs).and_then(|e| e.to_usize()));
        match folded {
            Some((base, exp)) => {
                let value = num::pow(base, exp);
                if self.is_bv() {
                    ArithResult::exact(self.int_lit(value, bits))
                } else {
                    ArithResult::exact(Expr::int(value))
                }
            }
            None => {
                self.report_unsupported(loc, "Exponentiation is only supported on literals");
                ArithResult::exact(error_expr())
            }
        }
    }

    pub(crate) fn normalized(&mut self, math: ExprRef, bits: u32, signed: bool) -> ArithResult {
        let modulus = Expr::int(pow2(bits));
        let expr = if signed {
            let offset = Expr::int(pow2(bits - 1));
            Expr::minus(
                Expr::modulo(Expr::plus(math.clone(), offset.clone()), modulus),
                offset,
            )
        } else {
            Expr::modulo(math.clone(), modulus)
        };
        ArithResult::checked(expr, in_range(math, bits, signed))
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Converts `expr` of type `from` to the wider or equal type `to`, as the compiler does
    /// implicitly. Literals become literals of the target width.
    pub fn implicit_conversion(
        &mut self,
        expr: ExprRef,
        from: &SolType,
        to: &SolType,
        loc: &SourceLocation,
    ) -> Result<ExprRef> {
        let (to_bits, to_signed) = match to {
            SolType::Integer { bits, signed } => (*bits, *signed),
            _ => return Ok(expr),
        };
        if let Some(value) = expr.as_int_literal() {
            return Ok(if self.is_bv() {
                self.int_lit(value.clone(), to_bits)
            } else {
                expr
            });
        }
        let (from_bits, from_signed) = match from {
            SolType::Integer { bits, signed } => (*bits, *signed),
            _ => return Ok(expr),
        };
        if from_bits == to_bits && from_signed == to_signed {
            return Ok(expr);
        }
        if from_signed && !to_signed {
            return Err(TranslationError::invariant(
                loc,
                format!("Implicit conversion from signed {} to unsigned {}", from, to),
            ));
        }
        if to_bits < from_bits || (to_bits == from_bits && !from_signed && to_signed) {
            return Err(TranslationError::invariant(
                loc,
                format!("Implicit conversion from {} to smaller type {}", from, to),
            ));
        }
        if !self.is_bv() {
            return Ok(expr);
        }
        Ok(self.bv_extend(expr, from_bits, to_bits, from_signed))
    }

    /// Changes the width of a bitvector, extending by the signedness of the source or cutting
    /// off the high bits.
    pub fn bv_resize(&mut self, expr: ExprRef, from_bits: u32, from_signed: bool, to_bits: u32) -> ExprRef {
        if to_bits >= from_bits {
            self.bv_extend(expr, from_bits, to_bits, from_signed)
        } else {
            self.bv_extract(expr, from_bits, to_bits - 1, 0)
        }
    }

    /// Condition that `expr` lies in the range of the integer type `ty`. Only needed when
    /// integers are unbounded, bitvectors are in range by construction.
    pub fn range_condition(&self, expr: &ExprRef, ty: &SolType) -> Option<ExprRef> {
        match ty {
            SolType::Integer { bits, signed } if !self.is_bv() => {
                Some(in_range(expr.clone(), *bits, *signed))
            }
            _ => None,
        }
    }

    // ========================================================================
    // Bitvector builtins
    // ========================================================================

    fn bv_binary(&mut self, op: &str, bits: u32, lhs: ExprRef, rhs: ExprRef, predicate: bool) -> ExprRef {
        let name = format!("bv{}{}", bits, op);
        let result = if predicate { Type::Bool } else { Type::Bv(bits) };
        self.include_builtin(Decl::function(
            name.clone(),
            vec![Binding::anonymous(Type::Bv(bits)), Binding::anonymous(Type::Bv(bits))],
            result,
            None,
            vec![Attr::bv_builtin(format!("bv{}", op))],
        ));
        Expr::app(name, vec![lhs, rhs])
    }

    fn bv_unary(&mut self, op: &str, bits: u32, operand: ExprRef) -> ExprRef {
        let name = format!("bv{}{}", bits, op);
        self.include_builtin(Decl::function(
            name.clone(),
            vec![Binding::anonymous(Type::Bv(bits))],
            Type::Bv(bits),
            None,
            vec![Attr::bv_builtin(format!("bv{}", op))],
        ));
        Expr::app(name, vec![operand])
    }

    pub fn bv_extend(&mut self, expr: ExprRef, from_bits: u32, to_bits: u32, signed: bool) -> ExprRef {
        if from_bits == to_bits {
            return expr;
        }
        let (kind, smt) = if signed {
            ("signext", "sign_extend")
        } else {
            ("zeroext", "zero_extend")
        };
        let name = format!("bv{}{}to{}", kind, from_bits, to_bits);
        self.include_builtin(Decl::function(
            name.clone(),
            vec![Binding::anonymous(Type::Bv(from_bits))],
            Type::Bv(to_bits),
            None,
            vec![Attr::bv_builtin(format!("{} {}", smt, to_bits - from_bits))],
        ));
        Expr::app(name, vec![expr])
    }

    /// Bits `high..=low` of a bitvector of width `bits`
    pub fn bv_extract(&mut self, expr: ExprRef, bits: u32, high: u32, low: u32) -> ExprRef {
        let name = format!("bv{}extract{}to{}", bits, high, low);
        self.include_builtin(Decl::function(
            name.clone(),
            vec![Binding::anonymous(Type::Bv(bits))],
            Type::Bv(high - low + 1),
            None,
            vec![Attr::bv_builtin(format!("extract {} {}", high, low))],
        ));
        Expr::app(name, vec![expr])
    }
}

/// `min <= expr && expr <= max` for the integer type of the given width
pub fn in_range(expr: ExprRef, bits: u32, signed: bool) -> ExprRef {
    let (min, bound) = if signed {
        (-pow2(bits - 1), pow2(bits - 1))
    } else {
        (BigInt::from(0), pow2(bits))
    };
    Expr::and(
        Expr::lte(Expr::int(min), expr.clone()),
        Expr::lt(expr, Expr::int(bound)),
    )
}
