// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Programmatic construction of well-formed ASTs.
//!
//! Producers that do not go through JSON, and tests, use [`AstBuilder`] to get fresh node ids
//! and consistent type annotations without spelling out every field.

use crate::ast::*;
use crate::model::magic;
use crate::types::{MagicKind, SolType};
use crate::NodeId;
use num::BigInt;

pub struct AstBuilder {
    file: String,
    next_id: NodeId,
    line: u32,
}

impl AstBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            next_id: 1,
            line: 1,
        }
    }

    pub fn fresh_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Line reported for nodes created from now on.
    pub fn set_line(&mut self, line: u32) {
        self.line = line;
    }

    pub fn loc(&self) -> SourceLocation {
        SourceLocation {
            file: self.file.clone(),
            start: 0,
            end: 0,
            line: self.line,
            column: 1,
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn variable(&mut self, name: &str, ty: SolType, is_state: bool) -> VariableDeclaration {
        VariableDeclaration {
            id: self.fresh_id(),
            loc: self.loc(),
            name: name.to_string(),
            ty,
            is_state_variable: is_state,
            is_constant: false,
            visibility: Visibility::Internal,
            value: None,
        }
    }

    pub fn state_var(&mut self, name: &str, ty: SolType) -> VariableDeclaration {
        self.variable(name, ty, true)
    }

    pub fn public_state_var(&mut self, name: &str, ty: SolType) -> VariableDeclaration {
        let mut var = self.variable(name, ty, true);
        var.visibility = Visibility::Public;
        var
    }

    pub fn constant(&mut self, name: &str, ty: SolType, value: Expression) -> VariableDeclaration {
        let mut var = self.variable(name, ty, true);
        var.is_constant = true;
        var.value = Some(value);
        var
    }

    pub fn local_var(&mut self, name: &str, ty: SolType) -> VariableDeclaration {
        self.variable(name, ty, false)
    }

    pub fn param(&mut self, name: &str, ty: SolType) -> VariableDeclaration {
        self.variable(name, ty, false)
    }

    pub fn function(
        &mut self,
        name: &str,
        params: Vec<VariableDeclaration>,
        returns: Vec<VariableDeclaration>,
        body: Block,
    ) -> FunctionDefinition {
        FunctionDefinition {
            id: self.fresh_id(),
            loc: self.loc(),
            name: name.to_string(),
            kind: FunctionKind::Function,
            visibility: Visibility::Public,
            state_mutability: StateMutability::NonPayable,
            params,
            returns,
            modifiers: vec![],
            body: Some(body),
        }
    }

    pub fn constructor(&mut self, params: Vec<VariableDeclaration>, body: Block) -> FunctionDefinition {
        let mut fun = self.function("", params, vec![], body);
        fun.kind = FunctionKind::Constructor;
        fun
    }

    pub fn modifier(
        &mut self,
        name: &str,
        params: Vec<VariableDeclaration>,
        body: Block,
    ) -> ModifierDefinition {
        ModifierDefinition {
            id: self.fresh_id(),
            loc: self.loc(),
            name: name.to_string(),
            params,
            body,
        }
    }

    pub fn modifier_invocation(
        &mut self,
        modifier: &ModifierDefinition,
        arguments: Vec<Expression>,
    ) -> ModifierInvocation {
        ModifierInvocation {
            id: self.fresh_id(),
            loc: self.loc(),
            name: modifier.name.clone(),
            referenced_declaration: Some(modifier.id),
            arguments,
        }
    }

    pub fn struct_def(&mut self, name: &str, members: Vec<VariableDeclaration>) -> StructDefinition {
        StructDefinition {
            id: self.fresh_id(),
            loc: self.loc(),
            name: name.to_string(),
            members,
        }
    }

    pub fn enum_def(&mut self, name: &str, members: &[&str]) -> EnumDefinition {
        let members = members
            .iter()
            .map(|member| EnumValue {
                id: self.fresh_id(),
                name: member.to_string(),
            })
            .collect();
        EnumDefinition {
            id: self.fresh_id(),
            loc: self.loc(),
            name: name.to_string(),
            members,
        }
    }

    pub fn contract(&mut self, name: &str, nodes: Vec<ContractNode>) -> ContractDefinition {
        ContractDefinition {
            id: self.fresh_id(),
            loc: self.loc(),
            name: name.to_string(),
            kind: ContractKind::Contract,
            base_contracts: vec![],
            invariants: vec![],
            nodes,
        }
    }

    pub fn library(&mut self, name: &str, nodes: Vec<ContractNode>) -> ContractDefinition {
        let mut contract = self.contract(name, nodes);
        contract.kind = ContractKind::Library;
        contract
    }

    pub fn source_unit(&mut self, contracts: Vec<ContractDefinition>) -> SourceUnit {
        SourceUnit {
            id: self.fresh_id(),
            path: self.file.clone(),
            nodes: contracts.into_iter().map(SourceUnitNode::Contract).collect(),
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    pub fn expr(&mut self, ty: SolType, kind: ExpressionKind) -> Expression {
        Expression {
            id: self.fresh_id(),
            loc: self.loc(),
            ty,
            kind,
        }
    }

    pub fn ident_ref(&mut self, name: &str, id: NodeId, ty: SolType) -> Expression {
        self.expr(
            ty,
            ExpressionKind::Identifier {
                name: name.to_string(),
                referenced_declaration: Some(id),
            },
        )
    }

    /// Reference to a variable
    pub fn ident(&mut self, var: &VariableDeclaration) -> Expression {
        self.ident_ref(&var.name, var.id, var.ty.clone())
    }

    /// Reference to a function, typed with its signature
    pub fn function_ref(&mut self, fun: &FunctionDefinition) -> Expression {
        let ty = function_type(fun);
        self.ident_ref(&fun.name, fun.id, ty)
    }

    pub fn this(&mut self, contract: &ContractDefinition) -> Expression {
        let ty = SolType::Contract {
            def: contract.id,
            name: contract.name.clone(),
            is_library: false,
        };
        self.ident_ref("this", magic::THIS, ty)
    }

    pub fn msg(&mut self) -> Expression {
        self.ident_ref("msg", magic::MSG, SolType::Magic { kind: MagicKind::Message })
    }

    pub fn block_magic(&mut self) -> Expression {
        self.ident_ref("block", magic::BLOCK, SolType::Magic { kind: MagicKind::Block })
    }

    pub fn builtin(&mut self, name: &str) -> Expression {
        let id = magic::NAMES
            .iter()
            .find(|(_, n)| *n == name)
            .map(|(id, _)| *id)
            .unwrap_or(0);
        let ty = SolType::Function {
            params: vec![],
            returns: vec![],
        };
        self.ident_ref(name, id, ty)
    }

    pub fn number(&mut self, value: i64) -> Expression {
        self.expr(
            SolType::rational(BigInt::from(value)),
            ExpressionKind::Literal {
                kind: LiteralKind::Number,
                value: value.to_string(),
            },
        )
    }

    pub fn bool_lit(&mut self, value: bool) -> Expression {
        self.expr(
            SolType::Bool,
            ExpressionKind::Literal {
                kind: LiteralKind::Bool,
                value: value.to_string(),
            },
        )
    }

    pub fn string_lit(&mut self, value: &str) -> Expression {
        self.expr(
            SolType::StringLiteral {
                value: value.to_string(),
            },
            ExpressionKind::Literal {
                kind: LiteralKind::String,
                value: value.to_string(),
            },
        )
    }

    pub fn address_lit(&mut self, value: &str) -> Expression {
        self.expr(
            SolType::address(),
            ExpressionKind::Literal {
                kind: LiteralKind::Number,
                value: value.to_string(),
            },
        )
    }

    /// Binary operation. The common type is the type of the first non-literal operand;
    /// comparisons and logical operators produce `bool`.
    pub fn binary(&mut self, operator: BinaryOperator, lhs: Expression, rhs: Expression) -> Expression {
        let common_type = if lhs.ty.is_rational() { rhs.ty.clone() } else { lhs.ty.clone() };
        let ty = if operator.is_comparison() {
            SolType::Bool
        } else {
            common_type.clone()
        };
        self.expr(
            ty,
            ExpressionKind::BinaryOperation {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                common_type,
            },
        )
    }

    pub fn unary(&mut self, operator: UnaryOperator, prefix: bool, sub: Expression) -> Expression {
        let ty = if operator == UnaryOperator::Not {
            SolType::Bool
        } else {
            sub.ty.clone()
        };
        self.expr(
            ty,
            ExpressionKind::UnaryOperation {
                operator,
                prefix,
                sub_expression: Box::new(sub),
            },
        )
    }

    pub fn assign(&mut self, lhs: Expression, rhs: Expression) -> Expression {
        self.assign_op(AssignmentOperator::Assign, lhs, rhs)
    }

    pub fn assign_op(
        &mut self,
        operator: AssignmentOperator,
        lhs: Expression,
        rhs: Expression,
    ) -> Expression {
        self.expr(
            lhs.ty.clone(),
            ExpressionKind::Assignment {
                operator,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        )
    }

    pub fn conditional(&mut self, cond: Expression, t: Expression, f: Expression) -> Expression {
        let ty = if t.ty.is_rational() { f.ty.clone() } else { t.ty.clone() };
        self.expr(
            ty,
            ExpressionKind::Conditional {
                condition: Box::new(cond),
                true_expression: Box::new(t),
                false_expression: Box::new(f),
            },
        )
    }

    pub fn tuple(&mut self, components: Vec<Expression>) -> Expression {
        let ty = SolType::tuple(components.iter().map(|c| c.ty.clone()).collect());
        self.expr(
            ty,
            ExpressionKind::Tuple {
                components: components.into_iter().map(Some).collect(),
            },
        )
    }

    pub fn index(&mut self, base: Expression, index: Expression, ty: SolType) -> Expression {
        self.expr(
            ty,
            ExpressionKind::IndexAccess {
                base: Box::new(base),
                index: Some(Box::new(index)),
            },
        )
    }

    pub fn member(
        &mut self,
        base: Expression,
        member: &str,
        referenced: Option<NodeId>,
        ty: SolType,
    ) -> Expression {
        self.expr(
            ty,
            ExpressionKind::MemberAccess {
                expression: Box::new(base),
                member_name: member.to_string(),
                referenced_declaration: referenced,
            },
        )
    }

    pub fn call(&mut self, callee: Expression, arguments: Vec<Expression>, ty: SolType) -> Expression {
        self.expr(
            ty,
            ExpressionKind::FunctionCall {
                kind: FunctionCallKind::FunctionCall,
                expression: Box::new(callee),
                arguments,
            },
        )
    }

    /// Call of a function by name, typed with its return values
    pub fn call_function(&mut self, fun: &FunctionDefinition, arguments: Vec<Expression>) -> Expression {
        let callee = self.function_ref(fun);
        let ty = return_type(fun);
        self.call(callee, arguments, ty)
    }

    pub fn type_conversion(&mut self, target: SolType, argument: Expression) -> Expression {
        let callee = self.expr(
            SolType::type_of(target.clone()),
            ExpressionKind::ElementaryTypeName {
                type_name: target.clone(),
            },
        );
        self.expr(
            target,
            ExpressionKind::FunctionCall {
                kind: FunctionCallKind::TypeConversion,
                expression: Box::new(callee),
                arguments: vec![argument],
            },
        )
    }

    pub fn new_contract(&mut self, contract: &ContractDefinition, arguments: Vec<Expression>) -> Expression {
        let ty = SolType::Contract {
            def: contract.id,
            name: contract.name.clone(),
            is_library: false,
        };
        let callee = self.expr(
            SolType::Function {
                params: arguments.iter().map(|a| a.ty.clone()).collect(),
                returns: vec![ty.clone()],
            },
            ExpressionKind::New { type_name: ty.clone() },
        );
        self.call(callee, arguments, ty)
    }

    // ========================================================================
    // Statements
    // ========================================================================

    pub fn stmt(&mut self, kind: StatementKind) -> Statement {
        Statement {
            id: self.fresh_id(),
            loc: self.loc(),
            kind,
        }
    }

    pub fn block(&mut self, statements: Vec<Statement>) -> Block {
        Block {
            id: self.fresh_id(),
            loc: self.loc(),
            statements,
        }
    }

    pub fn block_stmt(&mut self, statements: Vec<Statement>) -> Statement {
        let block = self.block(statements);
        self.stmt(StatementKind::Block(block))
    }

    pub fn expr_stmt(&mut self, expr: Expression) -> Statement {
        self.stmt(StatementKind::Expression(expr))
    }

    pub fn var_decl_stmt(&mut self, decl: VariableDeclaration, init: Option<Expression>) -> Statement {
        self.stmt(StatementKind::VariableDeclaration {
            declarations: vec![Some(decl)],
            initial_value: init,
        })
    }

    pub fn return_stmt(&mut self, expression: Option<Expression>) -> Statement {
        self.stmt(StatementKind::Return { expression })
    }

    pub fn if_stmt(&mut self, condition: Expression, t: Statement, f: Option<Statement>) -> Statement {
        self.stmt(StatementKind::If {
            condition,
            true_body: Box::new(t),
            false_body: f.map(Box::new),
        })
    }

    pub fn while_stmt(&mut self, condition: Expression, body: Statement) -> Statement {
        self.stmt(StatementKind::While {
            condition,
            body: Box::new(body),
        })
    }
}

/// Function type of a definition, as annotated on references to it.
pub fn function_type(fun: &FunctionDefinition) -> SolType {
    SolType::Function {
        params: fun.params.iter().map(|p| p.ty.clone()).collect(),
        returns: fun.returns.iter().map(|r| r.ty.clone()).collect(),
    }
}

/// Type of a call to `fun`: its single return type, or a tuple of all of them.
pub fn return_type(fun: &FunctionDefinition) -> SolType {
    match fun.returns.as_slice() {
        [single] => single.ty.clone(),
        returns => SolType::tuple(returns.iter().map(|r| r.ty.clone()).collect()),
    }
}
