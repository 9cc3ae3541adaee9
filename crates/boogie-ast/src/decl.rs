// Copyright (c) Asymptotic Labs
// SPDX-License-Identifier: Apache-2.0

use crate::expr::ExprRef;
use crate::stmt::Block;
use crate::types::Type;
use itertools::Itertools;
use std::fmt;

/// Argument of an attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Int(i64),
    Str(String),
    Expr(ExprRef),
}

/// Attribute `{:name v1, v2}` attached to declarations, specifications and some statements
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub values: Vec<AttrValue>,
}

impl Attr {
    pub fn new(name: impl Into<String>, values: Vec<AttrValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Diagnostic message reported by the prover when the annotated check fails
    pub fn message(message: impl Into<String>) -> Self {
        Self::new("message", vec![AttrValue::Str(message.into())])
    }

    /// Source location in the original file, with 1-based line and column
    pub fn source_loc(file: impl Into<String>, line: u32, column: u32) -> Self {
        Self::new(
            "sourceloc",
            vec![
                AttrValue::Str(file.into()),
                AttrValue::Int(line as i64),
                AttrValue::Int(column as i64),
            ],
        )
    }

    pub fn bv_builtin(smt_name: impl Into<String>) -> Self {
        Self::new("bvbuiltin", vec![AttrValue::Str(smt_name.into())])
    }

    pub fn inline(depth: i64) -> Self {
        Self::new("inline", vec![AttrValue::Int(depth)])
    }

    /// Looks up the first string argument of the attribute with the given name.
    pub fn find_str<'a>(attrs: &'a [Attr], name: &str) -> Option<&'a str> {
        attrs
            .iter()
            .find(|attr| attr.name == name)
            .and_then(|attr| match attr.values.first() {
                Some(AttrValue::Str(s)) => Some(s.as_str()),
                _ => None,
            })
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(value) => write!(f, "{}", value),
            AttrValue::Str(value) => write!(f, "\"{}\"", value.replace('"', "'")),
            AttrValue::Expr(expr) => write!(f, "{}", expr),
        }
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            write!(f, "{{:{}}}", self.name)
        } else {
            write!(f, "{{:{} {}}}", self.name, self.values.iter().join(", "))
        }
    }
}

/// Prints attributes followed by a space, or nothing when there are none.
pub(crate) fn attrs_prefix(attrs: &[Attr]) -> String {
    attrs.iter().map(|attr| format!("{} ", attr)).collect()
}

/// Named and typed variable, used for parameters, returns and quantifier bindings.
/// Function parameters may be anonymous, in which case only the type is printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub ty: Type,
}

impl Binding {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn anonymous(ty: Type) -> Self {
        Self::new("", ty)
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.ty)
        } else {
            write!(f, "{}: {}", self.name, self.ty)
        }
    }
}

/// A requires or ensures clause
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specification {
    pub expr: ExprRef,
    pub attrs: Vec<Attr>,
}

impl Specification {
    pub fn new(expr: ExprRef, attrs: Vec<Attr>) -> Self {
        Self { expr, attrs }
    }
}

impl fmt::Display for Specification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", attrs_prefix(&self.attrs), self.expr)
    }
}

/// Procedure signature, contract and body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Procedure {
    pub params: Vec<Binding>,
    pub returns: Vec<Binding>,
    /// Local variables, all declared upfront at the start of the body
    pub locals: Vec<Decl>,
    pub requires: Vec<Specification>,
    pub ensures: Vec<Specification>,
    pub modifies: Vec<String>,
    pub blocks: Vec<Block>,
}

/// Function signature and optional body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub params: Vec<Binding>,
    pub return_type: Type,
    pub body: Option<ExprRef>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Constant { ty: Type, unique: bool },
    Variable { ty: Type },
    Procedure(Procedure),
    Function(Function),
    /// Opaque type when `alias_of` is `None`, synonym otherwise
    TypeAlias { alias_of: Option<Type> },
    Axiom(ExprRef),
    Comment(String),
    /// Text emitted verbatim
    RawCode(String),
}

/// Top-level (or procedure-local) declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decl {
    pub name: String,
    pub attrs: Vec<Attr>,
    pub kind: DeclKind,
}

impl Decl {
    pub fn constant(name: impl Into<String>, ty: Type, unique: bool) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            kind: DeclKind::Constant { ty, unique },
        }
    }

    pub fn variable(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            kind: DeclKind::Variable { ty },
        }
    }

    pub fn procedure(name: impl Into<String>, procedure: Procedure) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            kind: DeclKind::Procedure(procedure),
        }
    }

    pub fn function(
        name: impl Into<String>,
        params: Vec<Binding>,
        return_type: Type,
        body: Option<ExprRef>,
        attrs: Vec<Attr>,
    ) -> Self {
        Self {
            name: name.into(),
            attrs,
            kind: DeclKind::Function(Function {
                params,
                return_type,
                body,
            }),
        }
    }

    pub fn opaque_type(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            kind: DeclKind::TypeAlias { alias_of: None },
        }
    }

    pub fn type_alias(name: impl Into<String>, alias_of: Type) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            kind: DeclKind::TypeAlias {
                alias_of: Some(alias_of),
            },
        }
    }

    pub fn axiom(expr: ExprRef) -> Self {
        Self {
            name: String::new(),
            attrs: vec![],
            kind: DeclKind::Axiom(expr),
        }
    }

    pub fn comment(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: vec![],
            kind: DeclKind::Comment(text.into()),
        }
    }

    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            attrs: vec![],
            kind: DeclKind::RawCode(text.into()),
        }
    }

    pub fn with_attrs(mut self, attrs: Vec<Attr>) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn as_procedure(&self) -> Option<&Procedure> {
        match &self.kind {
            DeclKind::Procedure(procedure) => Some(procedure),
            _ => None,
        }
    }

    pub fn as_procedure_mut(&mut self) -> Option<&mut Procedure> {
        match &mut self.kind {
            DeclKind::Procedure(procedure) => Some(procedure),
            _ => None,
        }
    }

    /// Type of a constant or variable declaration.
    pub fn value_type(&self) -> Option<&Type> {
        match &self.kind {
            DeclKind::Constant { ty, .. } | DeclKind::Variable { ty } => Some(ty),
            _ => None,
        }
    }
}
