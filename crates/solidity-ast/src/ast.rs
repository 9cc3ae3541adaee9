// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

//! Node kinds of the resolved Solidity AST.
//!
//! Every node carries its id and source location. Names that refer to declarations carry the
//! declaration's id in `referenced_declaration`; [`crate::SourceModel`] maps ids back to
//! declarations.

use crate::types::SolType;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location of a node in its source file. `line` and `column` are 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: String,
    #[serde(default)]
    pub start: usize,
    #[serde(default)]
    pub end: usize,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ============================================================================
// Source units and contracts
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceUnit {
    pub id: NodeId,
    pub path: String,
    pub nodes: Vec<SourceUnitNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceUnitNode {
    Pragma(PragmaDirective),
    Contract(ContractDefinition),
    Unsupported(UnsupportedNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PragmaDirective {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub literals: Vec<String>,
}

/// Node kind the upstream compiler knows but this model has no representation for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsupportedNode {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub kind: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    Contract,
    Interface,
    Library,
}

/// Unparsed documentation tag (e.g. `@notice invariant x >= 0`), optionally shipped together
/// with the expression an upstream resolver produced for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocTag {
    pub text: String,
    #[serde(default)]
    pub expr: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDefinition {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub kind: ContractKind,
    #[serde(default)]
    pub base_contracts: Vec<String>,
    #[serde(default)]
    pub invariants: Vec<DocTag>,
    pub nodes: Vec<ContractNode>,
}

impl ContractDefinition {
    pub fn state_variables(&self) -> impl Iterator<Item = &VariableDeclaration> {
        self.nodes.iter().filter_map(|node| match node {
            ContractNode::StateVariable(var) => Some(var),
            _ => None,
        })
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDefinition> {
        self.nodes.iter().filter_map(|node| match node {
            ContractNode::Function(fun) => Some(fun),
            _ => None,
        })
    }

    pub fn constructor(&self) -> Option<&FunctionDefinition> {
        self.functions()
            .find(|fun| fun.kind == FunctionKind::Constructor)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractNode {
    StateVariable(VariableDeclaration),
    Function(FunctionDefinition),
    Modifier(ModifierDefinition),
    Struct(StructDefinition),
    Enum(EnumDefinition),
    Event(EventDefinition),
    UsingFor(UsingForDirective),
    Unsupported(UnsupportedNode),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    Public,
    External,
    Internal,
    Private,
}

impl Visibility {
    /// Public and external functions are the entry points of a contract.
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::External)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateMutability {
    Pure,
    View,
    NonPayable,
    Payable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Function,
    Constructor,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub ty: SolType,
    #[serde(default)]
    pub is_state_variable: bool,
    #[serde(default)]
    pub is_constant: bool,
    pub visibility: Visibility,
    #[serde(default)]
    pub value: Option<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub kind: FunctionKind,
    pub visibility: Visibility,
    pub state_mutability: StateMutability,
    pub params: Vec<VariableDeclaration>,
    pub returns: Vec<VariableDeclaration>,
    #[serde(default)]
    pub modifiers: Vec<ModifierInvocation>,
    #[serde(default)]
    pub body: Option<Block>,
}

impl FunctionDefinition {
    pub fn is_payable(&self) -> bool {
        self.state_mutability == StateMutability::Payable
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierInvocation {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub referenced_declaration: Option<NodeId>,
    #[serde(default)]
    pub arguments: Vec<Expression>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModifierDefinition {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub params: Vec<VariableDeclaration>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDefinition {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub members: Vec<VariableDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    pub id: NodeId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDefinition {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub members: Vec<EnumValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub name: String,
    pub params: Vec<VariableDeclaration>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsingForDirective {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub library: String,
    #[serde(default)]
    pub type_name: Option<SolType>,
}

// ============================================================================
// Statements
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub kind: StatementKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Block(Block),
    If {
        condition: Expression,
        true_body: Box<Statement>,
        #[serde(default)]
        false_body: Option<Box<Statement>>,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
    },
    For {
        #[serde(default)]
        init: Option<Box<Statement>>,
        #[serde(default)]
        condition: Option<Expression>,
        #[serde(default)]
        loop_expression: Option<Box<Statement>>,
        body: Box<Statement>,
    },
    Continue,
    Break,
    Return {
        #[serde(default)]
        expression: Option<Expression>,
    },
    Throw,
    Emit {
        event_call: Expression,
    },
    /// `T a = e;` or `(T a, , T b) = e;`, unnamed components are `None`
    VariableDeclaration {
        declarations: Vec<Option<VariableDeclaration>>,
        #[serde(default)]
        initial_value: Option<Expression>,
    },
    Expression(Expression),
    /// The `_` of a modifier body
    Placeholder,
    InlineAssembly,
    Unsupported {
        kind: String,
    },
}

// ============================================================================
// Expressions
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub id: NodeId,
    pub loc: SourceLocation,
    pub ty: SolType,
    pub kind: ExpressionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOperator {
    Or,
    And,
    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    BitOr,
    BitXor,
    BitAnd,
    Shl,
    Sar,
    Shr,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
}

impl BinaryOperator {
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Eq
                | BinaryOperator::Neq
                | BinaryOperator::Lt
                | BinaryOperator::Gt
                | BinaryOperator::Lte
                | BinaryOperator::Gte
        )
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Or => "||",
            BinaryOperator::And => "&&",
            BinaryOperator::Eq => "==",
            BinaryOperator::Neq => "!=",
            BinaryOperator::Lt => "<",
            BinaryOperator::Gt => ">",
            BinaryOperator::Lte => "<=",
            BinaryOperator::Gte => ">=",
            BinaryOperator::BitOr => "|",
            BinaryOperator::BitXor => "^",
            BinaryOperator::BitAnd => "&",
            BinaryOperator::Shl => "<<",
            BinaryOperator::Sar => ">>",
            BinaryOperator::Shr => ">>>",
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Exp => "**",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentOperator {
    Assign,
    AssignBitOr,
    AssignBitXor,
    AssignBitAnd,
    AssignShl,
    AssignSar,
    AssignShr,
    AssignAdd,
    AssignSub,
    AssignMul,
    AssignDiv,
    AssignMod,
}

impl AssignmentOperator {
    /// Binary operator of a compound assignment, `None` for plain `=`.
    pub fn binary_operator(&self) -> Option<BinaryOperator> {
        match self {
            AssignmentOperator::Assign => None,
            AssignmentOperator::AssignBitOr => Some(BinaryOperator::BitOr),
            AssignmentOperator::AssignBitXor => Some(BinaryOperator::BitXor),
            AssignmentOperator::AssignBitAnd => Some(BinaryOperator::BitAnd),
            AssignmentOperator::AssignShl => Some(BinaryOperator::Shl),
            AssignmentOperator::AssignSar => Some(BinaryOperator::Sar),
            AssignmentOperator::AssignShr => Some(BinaryOperator::Shr),
            AssignmentOperator::AssignAdd => Some(BinaryOperator::Add),
            AssignmentOperator::AssignSub => Some(BinaryOperator::Sub),
            AssignmentOperator::AssignMul => Some(BinaryOperator::Mul),
            AssignmentOperator::AssignDiv => Some(BinaryOperator::Div),
            AssignmentOperator::AssignMod => Some(BinaryOperator::Mod),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOperator {
    Not,
    BitNot,
    Inc,
    Dec,
    Neg,
    Plus,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCallKind {
    FunctionCall,
    TypeConversion,
    StructConstructorCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralKind {
    Bool,
    Number,
    String,
    HexString,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpressionKind {
    Conditional {
        condition: Box<Expression>,
        true_expression: Box<Expression>,
        false_expression: Box<Expression>,
    },
    Assignment {
        operator: AssignmentOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },
    /// Parenthesized expression or tuple; omitted components (as in `(a, , b) = f()`) are `None`
    Tuple {
        components: Vec<Option<Expression>>,
    },
    UnaryOperation {
        operator: UnaryOperator,
        prefix: bool,
        sub_expression: Box<Expression>,
    },
    BinaryOperation {
        operator: BinaryOperator,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
        /// Type both operands are converted to before the operation
        common_type: SolType,
    },
    FunctionCall {
        kind: FunctionCallKind,
        expression: Box<Expression>,
        arguments: Vec<Expression>,
    },
    /// `new C`, only ever appears as the callee of a function call
    New {
        type_name: SolType,
    },
    MemberAccess {
        expression: Box<Expression>,
        member_name: String,
        #[serde(default)]
        referenced_declaration: Option<NodeId>,
    },
    IndexAccess {
        base: Box<Expression>,
        #[serde(default)]
        index: Option<Box<Expression>>,
    },
    Identifier {
        name: String,
        #[serde(default)]
        referenced_declaration: Option<NodeId>,
    },
    ElementaryTypeName {
        type_name: SolType,
    },
    Literal {
        kind: LiteralKind,
        value: String,
    },
    Unsupported {
        kind: String,
    },
}

impl Expression {
    pub fn as_identifier(&self) -> Option<(&str, Option<NodeId>)> {
        match &self.kind {
            ExpressionKind::Identifier {
                name,
                referenced_declaration,
            } => Some((name, *referenced_declaration)),
            _ => None,
        }
    }

    /// Strips one level of parentheses, i.e. a single component tuple.
    pub fn unparenthesized(&self) -> &Expression {
        match &self.kind {
            ExpressionKind::Tuple { components } if components.len() == 1 => {
                match &components[0] {
                    Some(inner) => inner.unparenthesized(),
                    None => self,
                }
            }
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_resolved_identifier() {
        let json = r#"{
            "id": 3,
            "loc": { "file": "A.sol", "line": 4, "column": 9 },
            "ty": { "integer": { "bits": 8, "signed": false } },
            "kind": { "identifier": { "name": "x", "referenced_declaration": 2 } }
        }"#;
        let expr: Expression = serde_json::from_str(json).expect("valid expression");
        assert_eq!(expr.ty, SolType::uint(8));
        assert_eq!(expr.as_identifier(), Some(("x", Some(2))));
        assert_eq!(expr.loc.line, 4);
    }

    #[test]
    fn strips_parentheses() {
        let inner = Expression {
            id: 1,
            loc: SourceLocation::default(),
            ty: SolType::Bool,
            kind: ExpressionKind::Literal {
                kind: LiteralKind::Bool,
                value: "true".to_string(),
            },
        };
        let outer = Expression {
            id: 2,
            loc: SourceLocation::default(),
            ty: SolType::Bool,
            kind: ExpressionKind::Tuple {
                components: vec![Some(inner.clone())],
            },
        };
        assert_eq!(outer.unparenthesized(), &inner);
    }
}
