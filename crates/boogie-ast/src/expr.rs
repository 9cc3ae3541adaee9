// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::decl::Binding;
use itertools::Itertools;
use num::BigInt;
use std::fmt;
use std::rc::Rc;

/// Shared reference to an immutable expression tree
pub type ExprRef = Rc<Expr>;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Iff,
    Imp,
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Times,
    /// Real division `/`
    Div,
    /// Integer division `div`
    IntDiv,
    Mod,
}

impl BinaryOp {
    pub fn token(&self) -> &'static str {
        match self {
            BinaryOp::Iff => "<==>",
            BinaryOp::Imp => "==>",
            BinaryOp::Or => "||",
            BinaryOp::And => "&&",
            BinaryOp::Eq => "==",
            BinaryOp::Neq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Lte => "<=",
            BinaryOp::Gte => ">=",
            BinaryOp::Plus => "+",
            BinaryOp::Minus => "-",
            BinaryOp::Times => "*",
            BinaryOp::Div => "/",
            BinaryOp::IntDiv => "div",
            BinaryOp::Mod => "mod",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// Logical negation
    Not,
    /// Arithmetic negation
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantifierKind {
    Forall,
    Exists,
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Bool(bool),
    Int(BigInt),
    /// Bitvector literal, printed as `<value>bv<width>`
    Bv { value: BigInt, width: u32 },
    String(String),
}

/// Boogie expressions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Binary {
        op: BinaryOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },
    Unary {
        op: UnaryOp,
        operand: ExprRef,
    },
    /// `(if cond then then_expr else else_expr)`
    Conditional {
        cond: ExprRef,
        then_expr: ExprRef,
        else_expr: ExprRef,
    },
    /// Application of a declared function
    FunctionApp {
        name: String,
        args: Vec<ExprRef>,
    },
    Literal(Literal),
    Quantifier {
        kind: QuantifierKind,
        bindings: Vec<Binding>,
        body: ExprRef,
    },
    /// Map lookup `base[i, j]`
    Select {
        base: ExprRef,
        indices: Vec<ExprRef>,
    },
    /// Map update `base[i, j := value]`
    Update {
        base: ExprRef,
        indices: Vec<ExprRef>,
        value: ExprRef,
    },
    Identifier(String),
    Old(ExprRef),
    Tuple(Vec<ExprRef>),
}

// ============================================================================
// Constructors
// ============================================================================

impl Expr {
    pub fn id(name: impl Into<String>) -> ExprRef {
        Rc::new(Expr::Identifier(name.into()))
    }

    pub fn bool(value: bool) -> ExprRef {
        Rc::new(Expr::Literal(Literal::Bool(value)))
    }

    pub fn int(value: impl Into<BigInt>) -> ExprRef {
        Rc::new(Expr::Literal(Literal::Int(value.into())))
    }

    pub fn bv(value: impl Into<BigInt>, width: u32) -> ExprRef {
        Rc::new(Expr::Literal(Literal::Bv {
            value: value.into(),
            width,
        }))
    }

    pub fn string(value: impl Into<String>) -> ExprRef {
        Rc::new(Expr::Literal(Literal::String(value.into())))
    }

    pub fn binary(op: BinaryOp, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Rc::new(Expr::Binary { op, lhs, rhs })
    }

    pub fn iff(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Iff, lhs, rhs)
    }

    pub fn implies(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Imp, lhs, rhs)
    }

    pub fn and(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::And, lhs, rhs)
    }

    pub fn or(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Or, lhs, rhs)
    }

    pub fn eq(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Eq, lhs, rhs)
    }

    pub fn neq(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Neq, lhs, rhs)
    }

    pub fn lt(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Lt, lhs, rhs)
    }

    pub fn gt(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Gt, lhs, rhs)
    }

    pub fn lte(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Lte, lhs, rhs)
    }

    pub fn gte(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Gte, lhs, rhs)
    }

    pub fn plus(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Plus, lhs, rhs)
    }

    pub fn minus(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Minus, lhs, rhs)
    }

    pub fn times(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Times, lhs, rhs)
    }

    pub fn int_div(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::IntDiv, lhs, rhs)
    }

    pub fn modulo(lhs: ExprRef, rhs: ExprRef) -> ExprRef {
        Self::binary(BinaryOp::Mod, lhs, rhs)
    }

    pub fn not(operand: ExprRef) -> ExprRef {
        Rc::new(Expr::Unary {
            op: UnaryOp::Not,
            operand,
        })
    }

    pub fn neg(operand: ExprRef) -> ExprRef {
        Rc::new(Expr::Unary {
            op: UnaryOp::Neg,
            operand,
        })
    }

    pub fn cond(cond: ExprRef, then_expr: ExprRef, else_expr: ExprRef) -> ExprRef {
        Rc::new(Expr::Conditional {
            cond,
            then_expr,
            else_expr,
        })
    }

    pub fn app(name: impl Into<String>, args: Vec<ExprRef>) -> ExprRef {
        Rc::new(Expr::FunctionApp {
            name: name.into(),
            args,
        })
    }

    pub fn forall(bindings: Vec<Binding>, body: ExprRef) -> ExprRef {
        debug_assert!(!bindings.is_empty(), "BUG: quantifier without bound variables");
        Rc::new(Expr::Quantifier {
            kind: QuantifierKind::Forall,
            bindings,
            body,
        })
    }

    pub fn exists(bindings: Vec<Binding>, body: ExprRef) -> ExprRef {
        debug_assert!(!bindings.is_empty(), "BUG: quantifier without bound variables");
        Rc::new(Expr::Quantifier {
            kind: QuantifierKind::Exists,
            bindings,
            body,
        })
    }

    /// Single index lookup `base[index]`
    pub fn select(base: ExprRef, index: ExprRef) -> ExprRef {
        Self::select_many(base, vec![index])
    }

    pub fn select_many(base: ExprRef, indices: Vec<ExprRef>) -> ExprRef {
        debug_assert!(!indices.is_empty(), "BUG: select without index");
        Rc::new(Expr::Select { base, indices })
    }

    /// Single index update `base[index := value]`
    pub fn update(base: ExprRef, index: ExprRef, value: ExprRef) -> ExprRef {
        Self::update_many(base, vec![index], value)
    }

    pub fn update_many(base: ExprRef, indices: Vec<ExprRef>, value: ExprRef) -> ExprRef {
        debug_assert!(!indices.is_empty(), "BUG: update without index");
        Rc::new(Expr::Update {
            base,
            indices,
            value,
        })
    }

    pub fn old(expr: ExprRef) -> ExprRef {
        Rc::new(Expr::Old(expr))
    }

    pub fn tuple(elements: Vec<ExprRef>) -> ExprRef {
        Rc::new(Expr::Tuple(elements))
    }

    /// Conjunction of all given expressions, `true` for an empty list.
    pub fn and_all(exprs: impl IntoIterator<Item = ExprRef>) -> ExprRef {
        exprs
            .into_iter()
            .reduce(Self::and)
            .unwrap_or_else(|| Self::bool(true))
    }
}

// ============================================================================
// Queries
// ============================================================================

impl Expr {
    pub fn as_identifier(&self) -> Option<&str> {
        match self {
            Expr::Identifier(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_int_literal(&self) -> Option<&BigInt> {
        match self {
            Expr::Literal(Literal::Int(value)) => Some(value),
            _ => None,
        }
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Expr::Literal(_))
    }

    /// Elements of a tuple; any other expression is a one-element sequence.
    pub fn tuple_elements(expr: &ExprRef) -> Vec<ExprRef> {
        match expr.as_ref() {
            Expr::Tuple(elements) => elements.clone(),
            _ => vec![expr.clone()],
        }
    }
}

// ============================================================================
// Printing
// ============================================================================

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Bool(value) => write!(f, "{}", value),
            Literal::Int(value) => write!(f, "{}", value),
            Literal::Bv { value, width } => write!(f, "{}bv{}", value, width),
            Literal::String(value) => write!(f, "\"{}\"", value),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.token(), rhs),
            Expr::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "!({})", operand),
                UnaryOp::Neg => write!(f, "-({})", operand),
            },
            Expr::Conditional {
                cond,
                then_expr,
                else_expr,
            } => write!(f, "(if {} then {} else {})", cond, then_expr, else_expr),
            Expr::FunctionApp { name, args } => write!(f, "{}({})", name, args.iter().join(", ")),
            Expr::Literal(literal) => write!(f, "{}", literal),
            Expr::Quantifier {
                kind,
                bindings,
                body,
            } => {
                let quantifier = match kind {
                    QuantifierKind::Forall => "forall",
                    QuantifierKind::Exists => "exists",
                };
                write!(f, "({} {} :: {})", quantifier, bindings.iter().join(", "), body)
            }
            Expr::Select { base, indices } => write!(f, "{}[{}]", base, indices.iter().join(", ")),
            Expr::Update {
                base,
                indices,
                value,
            } => write!(f, "{}[{} := {}]", base, indices.iter().join(", "), value),
            Expr::Identifier(name) => write!(f, "{}", name),
            Expr::Old(expr) => write!(f, "old({})", expr),
            Expr::Tuple(elements) => write!(f, "{}", elements.iter().join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Type;

    #[test]
    fn operators_are_fully_parenthesized() {
        let e = Expr::and(
            Expr::lte(Expr::int(0), Expr::id("x#3")),
            Expr::not(Expr::eq(Expr::id("y"), Expr::bv(5, 8))),
        );
        assert_eq!(e.to_string(), "((0 <= x#3) && !((y == 5bv8)))");
    }

    #[test]
    fn map_access() {
        let upd = Expr::update(
            Expr::id("m"),
            Expr::id("__this"),
            Expr::plus(Expr::select(Expr::id("m"), Expr::id("__this")), Expr::int(1)),
        );
        assert_eq!(upd.to_string(), "m[__this := (m[__this] + 1)]");
    }

    #[test]
    fn quantifier_and_conditional() {
        let q = Expr::forall(
            vec![Binding::new("i", Type::Int)],
            Expr::cond(Expr::id("b"), Expr::int(1), Expr::int(-2)),
        );
        assert_eq!(q.to_string(), "(forall i: int :: (if b then 1 else -2))");
    }

    #[test]
    fn shared_subtrees_compare_structurally() {
        let x = Expr::id("x");
        let a = Expr::plus(x.clone(), x.clone());
        let b = Expr::plus(Expr::id("x"), Expr::id("x"));
        assert_eq!(a, b);
        assert_eq!(Expr::and_all(vec![]).to_string(), "true");
    }
}
