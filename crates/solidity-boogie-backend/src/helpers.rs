// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Global declarations every program starts with and the procedures modelling the built-in
//! ether transfer primitives.

use crate::{context::BoogieContext, names};
use boogie_ast::{Attr, Binding, Block, Decl, Expr, ExprRef, Procedure, Specification, Stmt, Type};
use solidity_ast::{BinaryOperator, SourceLocation};

const AMOUNT: &str = "amount";
const RESULT: &str = "__result";

/// Procedures modelling `transfer`, `send` and `call` on addresses. They are only declared
/// when a contract uses them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HelperProcedure {
    Transfer,
    Send,
    Call,
}

impl HelperProcedure {
    pub fn name(&self) -> &'static str {
        match self {
            HelperProcedure::Transfer => names::TRANSFER,
            HelperProcedure::Send => names::SEND,
            HelperProcedure::Call => names::CALL,
        }
    }

    /// The helper behind a member of `address`, if any
    pub fn for_member(member: &str) -> Option<Self> {
        match member {
            "transfer" => Some(HelperProcedure::Transfer),
            "send" => Some(HelperProcedure::Send),
            "call" => Some(HelperProcedure::Call),
            _ => None,
        }
    }
}

/// Declarations of the address type, balances and block data.
pub fn prelude_decls(ctx: &BoogieContext) -> Vec<Decl> {
    vec![
        Decl::comment("", "Global declarations and definitions related to the address type"),
        Decl::opaque_type(names::ADDRESS_TYPE),
        Decl::constant(names::ZERO_ADDRESS, ctx.address_type(), true),
        Decl::variable(
            names::BALANCE,
            Type::map(ctx.address_type(), ctx.balance_type()),
        ),
        Decl::opaque_type(names::STRING_TYPE),
        Decl::variable(names::NOW, ctx.int_type(256)),
        Decl::variable(names::BLOCK_NUMBER, ctx.int_type(256)),
    ]
}

pub fn helper_declaration(ctx: &mut BoogieContext, helper: HelperProcedure) -> Decl {
    let procedure = match helper {
        HelperProcedure::Transfer => transfer_procedure(ctx),
        HelperProcedure::Send => send_procedure(ctx),
        HelperProcedure::Call => call_procedure(ctx),
    };
    Decl::procedure(helper.name(), procedure)
}

fn common_params(ctx: &BoogieContext) -> Vec<Binding> {
    vec![
        Binding::new(names::THIS, ctx.address_type()),
        Binding::new(names::MSG_SENDER, ctx.address_type()),
        Binding::new(names::MSG_VALUE, ctx.balance_type()),
    ]
}

/// Balance arithmetic. Balances are 256 bit unsigned, overflow is not tracked here.
fn balance_op(ctx: &mut BoogieContext, op: BinaryOperator, lhs: ExprRef, rhs: ExprRef) -> ExprRef {
    ctx.encode_binary(op, lhs, rhs, 256, false, &SourceLocation::default())
        .expr
}

fn balance_update(ctx: &mut BoogieContext, who: &str, op: BinaryOperator, amount: ExprRef) -> Stmt {
    let current = ctx.balance_of(Expr::id(who));
    let value = balance_op(ctx, op, current, amount);
    Stmt::assign(
        Expr::id(names::BALANCE),
        Expr::update(Expr::id(names::BALANCE), Expr::id(who), value),
    )
}

/// Balances moved by `amount` from the sender to this contract, compared to the pre-state
fn transferred(ctx: &mut BoogieContext, amount: ExprRef) -> (ExprRef, ExprRef) {
    let this_bal = ctx.balance_of(Expr::id(names::THIS));
    let sender_bal = ctx.balance_of(Expr::id(names::MSG_SENDER));
    let sender_after = balance_op(ctx, BinaryOperator::Sub, Expr::old(sender_bal.clone()), amount.clone());
    let this_after = balance_op(ctx, BinaryOperator::Add, Expr::old(this_bal.clone()), amount);
    let moved = Expr::and(
        Expr::eq(sender_bal.clone(), sender_after),
        Expr::eq(this_bal.clone(), this_after),
    );
    let unchanged = Expr::and(
        Expr::eq(sender_bal.clone(), Expr::old(sender_bal)),
        Expr::eq(this_bal.clone(), Expr::old(this_bal)),
    );
    (moved, unchanged)
}

fn sufficient_funds(ctx: &mut BoogieContext, message: &str) -> Specification {
    let sender_bal = ctx.balance_of(Expr::id(names::MSG_SENDER));
    let enough = balance_op(ctx, BinaryOperator::Gte, sender_bal, Expr::id(AMOUNT));
    Specification::new(enough, vec![Attr::message(message)])
}

fn transfer_procedure(ctx: &mut BoogieContext) -> Procedure {
    let mut params = common_params(ctx);
    params.push(Binding::new(AMOUNT, ctx.balance_type()));
    let amount = Expr::id(AMOUNT);

    let body = vec![
        balance_update(ctx, names::THIS, BinaryOperator::Add, amount.clone()),
        balance_update(ctx, names::MSG_SENDER, BinaryOperator::Sub, amount.clone()),
    ];
    let requires = sufficient_funds(ctx, "Transfer might fail due to insufficient ether");
    let (moved, unchanged) = transferred(ctx, amount);
    let distinct = Expr::neq(Expr::id(names::THIS), Expr::id(names::MSG_SENDER));

    Procedure {
        params,
        requires: vec![requires],
        ensures: vec![Specification::new(Expr::cond(distinct, moved, unchanged), vec![])],
        modifies: vec![names::BALANCE.to_string()],
        blocks: vec![Block::new(body)],
        ..Default::default()
    }
}

fn send_procedure(ctx: &mut BoogieContext) -> Procedure {
    let mut params = common_params(ctx);
    params.push(Binding::new(AMOUNT, ctx.balance_type()));
    let amount = Expr::id(AMOUNT);
    let result = Expr::id(RESULT);

    let success = vec![
        balance_update(ctx, names::THIS, BinaryOperator::Add, amount.clone()),
        balance_update(ctx, names::MSG_SENDER, BinaryOperator::Sub, amount.clone()),
        Stmt::assign(result.clone(), Expr::bool(true)),
    ];
    let failure = vec![Stmt::assign(result.clone(), Expr::bool(false))];
    let requires = sufficient_funds(ctx, "Send might fail due to insufficient ether");
    let (moved, unchanged) = transferred(ctx, amount);
    let moved_if = Expr::and(
        result,
        Expr::neq(Expr::id(names::THIS), Expr::id(names::MSG_SENDER)),
    );

    Procedure {
        params,
        returns: vec![Binding::new(RESULT, Type::Bool)],
        requires: vec![requires],
        ensures: vec![Specification::new(Expr::cond(moved_if, moved, unchanged), vec![])],
        modifies: vec![names::BALANCE.to_string()],
        blocks: vec![Block::new(vec![nondeterministic(success, failure)])],
        ..Default::default()
    }
}

fn call_procedure(ctx: &mut BoogieContext) -> Procedure {
    let params = common_params(ctx);
    let result = Expr::id(RESULT);

    let success = vec![
        balance_update(ctx, names::THIS, BinaryOperator::Add, Expr::id(names::MSG_VALUE)),
        Stmt::assign(result.clone(), Expr::bool(true)),
    ];
    let failure = vec![Stmt::assign(result.clone(), Expr::bool(false))];
    let balance = Expr::id(names::BALANCE);
    let ensures = Expr::or(result, Expr::eq(balance.clone(), Expr::old(balance)));

    Procedure {
        params,
        returns: vec![Binding::new(RESULT, Type::Bool)],
        ensures: vec![Specification::new(ensures, vec![])],
        modifies: vec![names::BALANCE.to_string()],
        blocks: vec![Block::new(vec![nondeterministic(success, failure)])],
        ..Default::default()
    }
}

fn nondeterministic(then_stmts: Vec<Stmt>, else_stmts: Vec<Stmt>) -> Stmt {
    Stmt::IfElse {
        cond: None,
        then_block: Block::new(then_stmts),
        else_block: Some(Block::new(else_stmts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Encoding;
    use solidity_ast::SourceModel;

    #[test]
    fn transfer_contract() {
        let model = SourceModel::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        ctx.include_helper(HelperProcedure::Transfer);
        let decl = ctx.program().find_decl(names::TRANSFER).unwrap().to_string();
        assert!(decl.starts_with(
            "procedure __transfer(__this: address_t, __msg_sender: address_t, __msg_value: int, amount: int)\n"
        ));
        assert!(decl.contains(
            "requires {:message \"Transfer might fail due to insufficient ether\"} (__balance[__msg_sender] >= amount);"
        ));
        assert!(decl.contains("__balance := __balance[__this := (__balance[__this] + amount)];"));
        assert!(decl.contains("ensures (if (__this != __msg_sender) then"));
    }

    #[test]
    fn send_and_call_return_success() {
        let model = SourceModel::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Bv, false);
        ctx.include_helper(HelperProcedure::Send);
        ctx.include_helper(HelperProcedure::Call);
        let send = ctx.program().find_decl(names::SEND).unwrap().to_string();
        assert!(send.contains("returns (__result: bool)"));
        assert!(send.contains("if (*) {"));
        assert!(send.contains("bv256uge(__balance[__msg_sender], amount)"));
        let call = ctx.program().find_decl(names::CALL).unwrap().to_string();
        assert!(call.contains("ensures (__result || (__balance == old(__balance)));"));
        assert_eq!(ctx.program().count_decls("bv256add"), 1);
    }

    #[test]
    fn helpers_are_included_once() {
        let model = SourceModel::default();
        let mut ctx = BoogieContext::with_encoding(&model, Encoding::Int, false);
        for _ in 0..3 {
            ctx.include_helper(HelperProcedure::Transfer);
        }
        assert!(ctx.is_helper_included(HelperProcedure::Transfer));
        assert!(!ctx.is_helper_included(HelperProcedure::Send));
        assert_eq!(ctx.program().count_decls(names::TRANSFER), 1);
    }
}
